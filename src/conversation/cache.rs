//! Client-side replica of the server's chat history.
//!
//! The replica is only ever replaced wholesale by a full refetch. Mutations
//! go to the server first and then refetch; nothing is patched locally, so
//! after any successful mutation the replica equals what
//! `GET /messages/history` returned.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::common::{MAX_CONTENT_LEN, Message, MessageExchange, MessageId};
use crate::error::{SyncError, SyncResult};
use crate::network::gateway::{Auth, Gateway};
use crate::network::transport::{Method, RequestBody};

pub const HISTORY_PATH: &str = "/messages/history";
pub const MESSAGES_PATH: &str = "/messages";

pub fn message_path(id: MessageId) -> String {
    format!("{MESSAGES_PATH}/{id}")
}

/// What consumers see of the replica.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryState {
    /// Nothing fetched yet (or dropped after logout).
    Idle,
    /// First fetch in flight.
    Loading,
    Ready {
        messages: Vec<Message>,
        fetched_at: DateTime<Utc>,
    },
    Failed {
        error: SyncError,
    },
}

impl HistoryState {
    pub fn messages(&self) -> &[Message] {
        match self {
            HistoryState::Ready { messages, .. } => messages,
            _ => &[],
        }
    }

    pub fn find(&self, id: MessageId) -> Option<&Message> {
        self.messages().iter().find(|message| message.id == id)
    }
}

/// Result of a mutation that passed local validation or was skipped by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Applied,
    /// Blank content: nothing was sent.
    Skipped,
}

struct Replica {
    state: HistoryState,
    /// Ticket handed to the most recently started fetch.
    issued: u64,
    /// Ticket of the fetch whose result is currently shown.
    applied: u64,
}

pub struct ConversationCache {
    gateway: Gateway,
    replica: Mutex<Replica>,
}

impl ConversationCache {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            replica: Mutex::new(Replica {
                state: HistoryState::Idle,
                issued: 0,
                applied: 0,
            }),
        }
    }

    fn replica(&self) -> MutexGuard<'_, Replica> {
        self.replica.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn snapshot(&self) -> HistoryState {
        self.replica().state.clone()
    }

    /// Drops the replica and ignores any fetch still in flight.
    pub fn reset(&self) {
        let mut replica = self.replica();
        replica.applied = replica.issued;
        replica.state = HistoryState::Idle;
    }

    pub async fn fetch_history(&self, cancel: &CancellationToken) -> SyncResult<Vec<Message>> {
        let ticket = {
            let mut replica = self.replica();
            replica.issued += 1;
            if !matches!(replica.state, HistoryState::Ready { .. }) {
                replica.state = HistoryState::Loading;
            }
            replica.issued
        };

        let result = self
            .gateway
            .request_json::<Vec<Message>>(
                Method::Get,
                HISTORY_PATH,
                RequestBody::Empty,
                Auth::Bearer,
                cancel,
            )
            .await;
        self.apply(ticket, &result);
        result
    }

    fn apply(&self, ticket: u64, result: &SyncResult<Vec<Message>>) {
        let mut replica = self.replica();
        if ticket <= replica.applied {
            log::debug!("Discarding history fetch #{ticket}; #{} already applied", replica.applied);
            return;
        }

        match result {
            Ok(messages) => {
                log::debug!("History fetch #{ticket} returned {} messages", messages.len());
                replica.applied = ticket;
                replica.state = HistoryState::Ready {
                    messages: messages.clone(),
                    fetched_at: Utc::now(),
                };
            }
            Err(SyncError::Cancelled) => {
                if replica.state == HistoryState::Loading && ticket == replica.issued {
                    replica.state = HistoryState::Idle;
                }
            }
            Err(err) => {
                replica.applied = ticket;
                replica.state = HistoryState::Failed { error: err.clone() };
            }
        }
    }

    /// Refetch after a successful mutation. A failed refetch shows up in the
    /// history state; the mutation itself already landed.
    async fn invalidate(&self, cancel: &CancellationToken) {
        if let Err(err) = self.fetch_history(cancel).await {
            log::warn!("Refetch after mutation failed: {err}");
        }
    }

    pub async fn send_message(
        &self,
        content: &str,
        cancel: &CancellationToken,
    ) -> SyncResult<Mutation> {
        let Some(content) = prepare_content(content)? else {
            return Ok(Mutation::Skipped);
        };

        let response = self
            .gateway
            .request(
                Method::Post,
                MESSAGES_PATH,
                RequestBody::Json(json!({ "content": content })),
                cancel,
            )
            .await?;
        match serde_json::from_str::<MessageExchange>(&response.body) {
            Ok(exchange) => log::debug!(
                "Message {} stored, bot replied with {}",
                exchange.message.id,
                exchange.reply.id
            ),
            Err(err) => log::debug!("Send succeeded with an unrecognised body: {err}"),
        }

        self.invalidate(cancel).await;
        Ok(Mutation::Applied)
    }

    pub async fn edit_message(
        &self,
        id: MessageId,
        content: &str,
        cancel: &CancellationToken,
    ) -> SyncResult<Mutation> {
        let Some(content) = prepare_content(content)? else {
            return Ok(Mutation::Skipped);
        };

        self.gateway
            .request(
                Method::Put,
                &message_path(id),
                RequestBody::Json(json!({ "content": content })),
                cancel,
            )
            .await?;
        log::debug!("Message {id} edited");

        self.invalidate(cancel).await;
        Ok(Mutation::Applied)
    }

    pub async fn delete_message(
        &self,
        id: MessageId,
        cancel: &CancellationToken,
    ) -> SyncResult<Mutation> {
        self.gateway
            .request(Method::Delete, &message_path(id), RequestBody::Empty, cancel)
            .await?;
        log::debug!("Message {id} deleted");

        self.invalidate(cancel).await;
        Ok(Mutation::Applied)
    }
}

/// Trimmed content to send, `None` when there is nothing to send.
fn prepare_content(content: &str) -> SyncResult<Option<&str>> {
    let content = content.trim();
    if content.is_empty() {
        return Ok(None);
    }
    if content.chars().count() > MAX_CONTENT_LEN {
        return Err(SyncError::Validation(format!(
            "message must be at most {MAX_CONTENT_LEN} characters"
        )));
    }
    Ok(Some(content))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::network::testing::{FakeBackend, VALID_TOKEN};
    use crate::session::SessionStore;

    fn seeded_history() -> Vec<Message> {
        vec![
            Message::user(1, "Hello!"),
            Message::bot(2, "Hi there!", Some(1)).with_buttons(["Option 1", "Option 2"]),
        ]
    }

    fn cache_for(backend: &Arc<FakeBackend>) -> ConversationCache {
        let session = SessionStore::in_memory();
        session.set_token(VALID_TOKEN).unwrap();
        ConversationCache::new(Gateway::new(backend.clone(), session))
    }

    #[tokio::test]
    async fn loads_history_in_server_order() {
        let backend = Arc::new(FakeBackend::with_history(seeded_history()));
        let cache = cache_for(&backend);
        assert_eq!(cache.snapshot(), HistoryState::Idle);

        cache.fetch_history(&CancellationToken::new()).await.unwrap();

        let state = cache.snapshot();
        let messages = state.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Hello!");
        assert!(messages[0].buttons().is_empty());
        assert_eq!(messages[1].buttons(), ["Option 1", "Option 2"]);
    }

    #[tokio::test]
    async fn failed_fetch_is_distinct_from_loading() {
        let backend = Arc::new(FakeBackend::new());
        backend.respond_next(500, "boom");
        let cache = cache_for(&backend);

        let err = cache.fetch_history(&CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, SyncError::Http { status: 500, .. }));
        assert_eq!(cache.snapshot(), HistoryState::Failed { error: err });
    }

    #[tokio::test]
    async fn blank_content_never_reaches_the_network() {
        let backend = Arc::new(FakeBackend::with_history(seeded_history()));
        let cache = cache_for(&backend);
        let cancel = CancellationToken::new();

        for blank in ["", "   ", "\t\n", " \r\n "] {
            assert_eq!(cache.send_message(blank, &cancel).await.unwrap(), Mutation::Skipped);
            assert_eq!(
                cache.edit_message(MessageId(1), blank, &cancel).await.unwrap(),
                Mutation::Skipped
            );
        }
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn overlong_content_is_rejected_locally() {
        let backend = Arc::new(FakeBackend::new());
        let cache = cache_for(&backend);

        let err = cache
            .send_message(&"a".repeat(MAX_CONTENT_LEN + 1), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Validation(_)));
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn send_trims_then_refetches() {
        let backend = Arc::new(FakeBackend::with_history(seeded_history()));
        let cache = cache_for(&backend);

        let outcome = cache
            .send_message("  How are you?  ", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, Mutation::Applied);
        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(
            requests[0].body,
            RequestBody::Json(json!({ "content": "How are you?" }))
        );
        assert_eq!(requests[1].path, HISTORY_PATH);
        assert_eq!(cache.snapshot().messages(), backend.messages().as_slice());
        assert_eq!(cache.snapshot().messages().len(), 4);
    }

    #[tokio::test]
    async fn delete_issues_delete_and_drops_the_message() {
        let backend = Arc::new(FakeBackend::with_history(seeded_history()));
        let cache = cache_for(&backend);
        let cancel = CancellationToken::new();
        cache.fetch_history(&cancel).await.unwrap();

        cache.delete_message(MessageId(1), &cancel).await.unwrap();

        let requests = backend.requests();
        assert_eq!(requests[1].method, Method::Delete);
        assert_eq!(requests[1].path, "/messages/1");
        assert!(cache.snapshot().find(MessageId(1)).is_none());
    }

    #[tokio::test]
    async fn edit_issues_put_with_new_content() {
        let backend = Arc::new(FakeBackend::with_history(seeded_history()));
        let cache = cache_for(&backend);

        cache
            .edit_message(MessageId(1), "Edited message", &CancellationToken::new())
            .await
            .unwrap();

        let requests = backend.requests();
        assert_eq!(requests[0].method, Method::Put);
        assert_eq!(requests[0].path, "/messages/1");
        assert_eq!(
            requests[0].body,
            RequestBody::Json(json!({ "content": "Edited message" }))
        );
        assert_eq!(
            cache.snapshot().find(MessageId(1)).map(|m| m.content.as_str()),
            Some("Edited message")
        );
    }

    #[tokio::test]
    async fn failed_mutation_does_not_refetch() {
        let backend = Arc::new(FakeBackend::with_history(seeded_history()));
        let cache = cache_for(&backend);

        let err = cache
            .delete_message(MessageId(99), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Http { status: 404, .. }));
        assert_eq!(backend.request_count(), 1);
        assert_eq!(cache.snapshot(), HistoryState::Idle);
    }

    #[tokio::test]
    async fn refetch_reflects_server_truth_not_local_merge() {
        let backend = Arc::new(FakeBackend::with_history(seeded_history()));
        let cache = cache_for(&backend);
        let cancel = CancellationToken::new();
        cache.fetch_history(&cancel).await.unwrap();

        backend.insert_behind_clients_back(Message::user(10, "from another tab"));
        cache.send_message("mine", &cancel).await.unwrap();

        assert_eq!(cache.snapshot().messages(), backend.messages().as_slice());
        assert!(cache.snapshot().find(MessageId(10)).is_some());
    }

    #[tokio::test]
    async fn concurrent_sends_each_land() {
        let backend = Arc::new(FakeBackend::new());
        let cache = cache_for(&backend);
        let cancel = CancellationToken::new();

        let (first, second) = tokio::join!(
            cache.send_message("one", &cancel),
            cache.send_message("two", &cancel)
        );
        first.unwrap();
        second.unwrap();

        assert_eq!(cache.snapshot().messages(), backend.messages().as_slice());
        assert_eq!(cache.snapshot().messages().len(), 4);
    }

    #[test]
    fn stale_fetch_does_not_overwrite_newer_one() {
        let backend = Arc::new(FakeBackend::new());
        let cache = cache_for(&backend);
        {
            let mut replica = cache.replica();
            replica.issued = 2;
        }

        cache.apply(2, &Ok(vec![Message::user(1, "new")]));
        cache.apply(1, &Ok(vec![Message::user(1, "old")]));

        assert_eq!(cache.snapshot().messages()[0].content, "new");
    }

    #[tokio::test]
    async fn reset_drops_replica() {
        let backend = Arc::new(FakeBackend::with_history(seeded_history()));
        let cache = cache_for(&backend);
        cache.fetch_history(&CancellationToken::new()).await.unwrap();

        cache.reset();

        assert_eq!(cache.snapshot(), HistoryState::Idle);
    }

    #[tokio::test]
    async fn unauthorized_fetch_clears_session() {
        let backend = Arc::new(FakeBackend::with_history(seeded_history()));
        let session = SessionStore::in_memory();
        session.set_token("expired").unwrap();
        let cache = ConversationCache::new(Gateway::new(backend.clone(), session.clone()));

        let err = cache.fetch_history(&CancellationToken::new()).await.unwrap_err();

        assert_eq!(err, SyncError::Unauthorized);
        assert!(!session.is_authenticated());
    }
}
