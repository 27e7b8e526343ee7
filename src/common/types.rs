use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest message body the backend accepts.
pub const MAX_CONTENT_LEN: usize = 1000;
/// Longest username the backend accepts.
pub const MAX_USERNAME_LEN: usize = 50;

/// Server-assigned message identifier, stable for the message's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the conversation history as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireMessage")]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub is_from_user: bool,
    pub reply_to: Option<MessageId>,
    buttons: Vec<String>,
}

/// Message as it arrives over the wire. The backend's response model omits
/// `is_from_user`; bot replies are the only messages with `reply_to` set.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    id: MessageId,
    content: String,
    #[serde(default, alias = "is_from_user")]
    is_from_user: Option<bool>,
    #[serde(default, alias = "reply_to")]
    reply_to: Option<MessageId>,
    #[serde(default)]
    buttons: Vec<String>,
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        Self {
            is_from_user: wire.is_from_user.unwrap_or(wire.reply_to.is_none()),
            id: wire.id,
            content: wire.content,
            reply_to: wire.reply_to,
            buttons: wire.buttons,
        }
    }
}

impl Message {
    pub fn user(id: i64, content: impl Into<String>) -> Self {
        Self {
            id: MessageId(id),
            content: content.into(),
            is_from_user: true,
            reply_to: None,
            buttons: Vec::new(),
        }
    }

    pub fn bot(id: i64, content: impl Into<String>, reply_to: Option<i64>) -> Self {
        Self {
            id: MessageId(id),
            content: content.into(),
            is_from_user: false,
            reply_to: reply_to.map(MessageId),
            buttons: Vec::new(),
        }
    }

    pub fn with_buttons<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buttons = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Button labels attached to a bot message. User messages never carry buttons,
    /// whatever the server sent.
    pub fn buttons(&self) -> &[String] {
        if self.is_from_user {
            &[]
        } else {
            &self.buttons
        }
    }
}

/// Body of `POST /messages` and `PUT /messages/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct ContentPayload<'a> {
    pub content: &'a str,
}

/// The user's message together with the bot reply the server synthesized for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageExchange {
    pub message: Message,
    pub reply: Message,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Checks the limits the backend enforces so obviously bad input never leaves
    /// the client.
    pub fn validate(&self) -> Result<(), String> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err("username is required".to_string());
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(format!("username must be at most {MAX_USERNAME_LEN} characters"));
        }
        if self.password.is_empty() {
            return Err("password is required".to_string());
        }
        Ok(())
    }
}

/// Response of `POST /token`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Response of `POST /users` and `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
}
