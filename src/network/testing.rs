//! In-memory backend used by the unit tests in place of HTTP.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::json;

use super::transport::{ApiRequest, ApiResponse, Method, RequestBody, Transport, TransportError};
use crate::common::Message;

pub const VALID_TOKEN: &str = "token-john";

struct BackendState {
    messages: Vec<Message>,
    next_id: i64,
    requests: Vec<ApiRequest>,
    /// Canned responses served before the simulated backend is consulted.
    overrides: VecDeque<Result<ApiResponse, TransportError>>,
    hang: bool,
}

/// Mimics the chat backend closely enough for the sync layer: bearer auth,
/// message CRUD with a scripted bot reply, login and registration.
pub struct FakeBackend {
    state: Mutex<BackendState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::with_history(Vec::new())
    }

    pub fn with_history(messages: Vec<Message>) -> Self {
        let next_id = messages.iter().map(|m| m.id.0).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(BackendState {
                messages,
                next_id,
                requests: Vec::new(),
                overrides: VecDeque::new(),
                hang: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    pub fn respond_next(&self, status: u16, body: &str) {
        self.state().overrides.push_back(Ok(ApiResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn fail_next_transport(&self, reason: &str) {
        self.state()
            .overrides
            .push_back(Err(TransportError(reason.to_string())));
    }

    /// Every subsequent request stays pending forever.
    pub fn hang(&self) {
        self.state().hang = true;
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    /// Server-side change the client has not heard about.
    pub fn insert_behind_clients_back(&self, message: Message) {
        let mut state = self.state();
        state.next_id = state.next_id.max(message.id.0 + 1);
        state.messages.push(message);
    }

    fn handle(state: &mut BackendState, request: &ApiRequest) -> ApiResponse {
        match (request.method, request.path.as_str()) {
            (Method::Post, "/token") => return Self::login(request),
            (Method::Post, "/users") => return Self::register(request),
            _ => {}
        }

        if request.bearer.as_deref() != Some(VALID_TOKEN) {
            return respond(401, json!({"detail": "Could not validate credentials"}));
        }

        let content = match &request.body {
            RequestBody::Json(value) => value["content"].as_str().map(str::to_string),
            _ => None,
        };

        match (request.method, request.path.as_str()) {
            (Method::Get, "/messages/history") => respond(200, json!(state.messages)),
            (Method::Get, "/users/me") => respond(200, json!({"id": 1, "username": "john"})),
            (Method::Post, "/messages") => {
                let Some(content) = content else {
                    return respond(422, json!({"detail": "content required"}));
                };
                let user_id = state.next_id;
                let message = Message::user(user_id, content.clone());
                let reply = Message::bot(user_id + 1, format!("Echo: {content}"), Some(user_id))
                    .with_buttons(["Option 1", "Option 2"]);
                state.next_id += 2;
                state.messages.push(message.clone());
                state.messages.push(reply.clone());
                respond(200, json!({"message": message, "reply": reply}))
            }
            (method, path) => {
                let Some(id) = path
                    .strip_prefix("/messages/")
                    .and_then(|id| id.parse::<i64>().ok())
                else {
                    return respond(404, json!({"detail": "Not Found"}));
                };
                let Some(index) = state.messages.iter().position(|m| m.id.0 == id) else {
                    return respond(404, json!({"detail": format!("Message with id {id} not found")}));
                };
                match method {
                    Method::Put => {
                        let Some(content) = content else {
                            return respond(422, json!({"detail": "content required"}));
                        };
                        state.messages[index].content = content;
                        let message = state.messages[index].clone();
                        let reply = state
                            .messages
                            .iter()
                            .find(|m| m.reply_to == Some(message.id))
                            .cloned()
                            .unwrap_or_else(|| Message::bot(0, "", Some(id)));
                        respond(200, json!({"message": message, "reply": reply}))
                    }
                    Method::Delete => {
                        let removed = state.messages.remove(index);
                        state.messages.retain(|m| m.reply_to != Some(removed.id));
                        respond(200, json!(removed))
                    }
                    _ => respond(405, json!({"detail": "Method Not Allowed"})),
                }
            }
        }
    }

    fn login(request: &ApiRequest) -> ApiResponse {
        let RequestBody::Form(pairs) = &request.body else {
            return respond(422, json!({"detail": "form body required"}));
        };
        let field = |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };
        if field("username") == Some("john") && field("password") == Some("secret") {
            respond(200, json!({"access_token": VALID_TOKEN, "token_type": "bearer"}))
        } else {
            respond(401, json!({"detail": "Incorrect username or password"}))
        }
    }

    fn register(request: &ApiRequest) -> ApiResponse {
        let RequestBody::Json(body) = &request.body else {
            return respond(422, json!({"detail": "json body required"}));
        };
        match body["username"].as_str() {
            Some("john") => respond(400, json!({"detail": "Username 'john' is already registered"})),
            Some(username) => respond(200, json!({"id": 2, "username": username})),
            None => respond(422, json!({"detail": "username required"})),
        }
    }
}

fn respond(status: u16, body: serde_json::Value) -> ApiResponse {
    ApiResponse {
        status,
        body: body.to_string(),
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let outcome = {
            let mut state = self.state();
            state.requests.push(request.clone());
            if state.hang {
                None
            } else if let Some(canned) = state.overrides.pop_front() {
                Some(canned)
            } else {
                Some(Ok(Self::handle(&mut state, &request)))
            }
        };
        match outcome {
            Some(outcome) => {
                // Yield so concurrently issued requests interleave like real I/O.
                tokio::task::yield_now().await;
                outcome
            }
            None => futures::future::pending().await,
        }
    }
}
