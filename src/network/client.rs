use std::sync::Arc;

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::common::{Credentials, MessageId, MutationKind, SyncCommand, SyncEvent};
use crate::conversation::{ConversationCache, HistoryState, Mutation};
use crate::error::{SyncError, SyncResult};
use crate::session::auth;

type Pending = BoxFuture<'static, ()>;

/// Background worker executing UI commands against the server.
///
/// All in-flight operations are polled from this one task, so they interleave
/// only at network awaits. Operations are not coalesced: two sends fired back
/// to back each post and each refetch.
pub struct SyncClient {
    cache: Arc<ConversationCache>,
    event_sender: mpsc::Sender<SyncEvent>,
    command_receiver: mpsc::Receiver<SyncCommand>,
    root: CancellationToken,
}

impl SyncClient {
    pub fn new(
        cache: Arc<ConversationCache>,
        event_sender: mpsc::Sender<SyncEvent>,
        command_receiver: mpsc::Receiver<SyncCommand>,
    ) -> Self {
        Self {
            cache,
            event_sender,
            command_receiver,
            root: CancellationToken::new(),
        }
    }

    pub async fn run(mut self) -> SyncResult<()> {
        let mut in_flight: FuturesUnordered<Pending> = FuturesUnordered::new();
        log::info!("Sync worker started");

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(command) => {
                            if let Some(operation) = self.handle_command(command).await {
                                in_flight.push(operation);
                            }
                        }
                        None => break,
                    }
                }
                Some(()) = in_flight.next(), if !in_flight.is_empty() => {}
            }
        }

        log::info!("Command channel closed; cancelling {} pending operations", in_flight.len());
        self.root.cancel();
        Ok(())
    }

    async fn handle_command(&mut self, command: SyncCommand) -> Option<Pending> {
        log::debug!("Handling {command:?}");
        match command {
            SyncCommand::Register(credentials) => Some(self.register(credentials)),
            SyncCommand::Login(credentials) => Some(self.login(credentials)),
            SyncCommand::Logout => {
                self.cancel_in_flight();
                if let Err(err) = auth::logout(self.cache.gateway()) {
                    log::warn!("Failed to remove persisted token: {err}");
                }
                self.cache.reset();
                emit(&self.event_sender, SyncEvent::LoggedOut).await;
                None
            }
            SyncCommand::CancelAll => {
                self.cancel_in_flight();
                None
            }
            SyncCommand::FetchHistory => {
                if !matches!(self.cache.snapshot(), HistoryState::Ready { .. }) {
                    emit(&self.event_sender, SyncEvent::HistoryUpdated(HistoryState::Loading)).await;
                }
                Some(self.fetch_history())
            }
            SyncCommand::SendMessage(content) => Some(self.mutate(MutationKind::Send, None, content)),
            SyncCommand::EditMessage { id, content } => {
                Some(self.mutate(MutationKind::Edit, Some(id), content))
            }
            SyncCommand::DeleteMessage(id) => {
                Some(self.mutate(MutationKind::Delete, Some(id), String::new()))
            }
            SyncCommand::LoadProfile => Some(self.load_profile()),
        }
    }

    /// Aborts everything started so far; later commands get a fresh token.
    fn cancel_in_flight(&mut self) {
        self.root.cancel();
        self.root = CancellationToken::new();
    }

    fn register(&self, credentials: Credentials) -> Pending {
        let cache = self.cache.clone();
        let events = self.event_sender.clone();
        let cancel = self.root.child_token();
        Box::pin(async move {
            let event = match auth::register(cache.gateway(), &credentials, &cancel).await {
                Ok(profile) => SyncEvent::Registered {
                    username: profile.username,
                },
                Err(SyncError::Cancelled) => return,
                Err(err) => SyncEvent::RegisterFailed(err),
            };
            emit(&events, event).await;
        })
    }

    fn login(&self, credentials: Credentials) -> Pending {
        let cache = self.cache.clone();
        let events = self.event_sender.clone();
        let cancel = self.root.child_token();
        Box::pin(async move {
            let event = match auth::login(cache.gateway(), &credentials, &cancel).await {
                Ok(()) => {
                    cache.reset();
                    SyncEvent::LoggedIn {
                        username: credentials.username.trim().to_string(),
                    }
                }
                Err(SyncError::Cancelled) => return,
                Err(err) => SyncEvent::LoginFailed(err),
            };
            emit(&events, event).await;
        })
    }

    fn load_profile(&self) -> Pending {
        let cache = self.cache.clone();
        let events = self.event_sender.clone();
        let cancel = self.root.child_token();
        Box::pin(async move {
            match auth::current_user(cache.gateway(), &cancel).await {
                Ok(profile) => emit(&events, SyncEvent::Profile(profile)).await,
                Err(err) => log::warn!("Failed to load profile: {err}"),
            }
        })
    }

    fn fetch_history(&self) -> Pending {
        let cache = self.cache.clone();
        let events = self.event_sender.clone();
        let cancel = self.root.child_token();
        Box::pin(async move {
            // Failures are carried by the history state itself.
            let _ = cache.fetch_history(&cancel).await;
            drop_replica_if_logged_out(&cache);
            emit(&events, SyncEvent::HistoryUpdated(cache.snapshot())).await;
        })
    }

    fn mutate(&self, action: MutationKind, id: Option<MessageId>, content: String) -> Pending {
        let cache = self.cache.clone();
        let events = self.event_sender.clone();
        let cancel = self.root.child_token();
        Box::pin(async move {
            let result = match (action, id) {
                (MutationKind::Send, _) => cache.send_message(&content, &cancel).await,
                (MutationKind::Edit, Some(id)) => cache.edit_message(id, &content, &cancel).await,
                (MutationKind::Delete, Some(id)) => cache.delete_message(id, &cancel).await,
                (_, None) => Err(SyncError::Validation("no message selected".to_string())),
            };

            match result {
                Ok(Mutation::Skipped) => {}
                Ok(Mutation::Applied) => {
                    drop_replica_if_logged_out(&cache);
                    if let (MutationKind::Edit, Some(id)) = (action, id) {
                        emit(&events, SyncEvent::MessageEdited { id }).await;
                    }
                    emit(&events, SyncEvent::HistoryUpdated(cache.snapshot())).await;
                }
                // Cancellation is deliberate; 401 is reported by the gateway's handler.
                Err(SyncError::Cancelled) => {}
                Err(SyncError::Unauthorized) => drop_replica_if_logged_out(&cache),
                Err(error) => {
                    log::warn!("Failed to {}: {error}", action.describe());
                    emit(&events, SyncEvent::MutationFailed { action, error }).await;
                }
            }
        })
    }
}

/// Drops the replica once the session is gone so the next login starts clean.
fn drop_replica_if_logged_out(cache: &ConversationCache) {
    if !cache.gateway().session().is_authenticated() {
        cache.reset();
    }
}

async fn emit(events: &mpsc::Sender<SyncEvent>, event: SyncEvent) {
    if let Err(err) = events.send(event).await {
        log::warn!("Failed to notify UI: {err}");
    }
}
