use super::types::{Credentials, MessageId};

/// Requests the UI sends down to the sync worker.
#[derive(Debug, Clone)]
pub enum SyncCommand {
    Register(Credentials),
    Login(Credentials),
    Logout,
    /// Refetch the conversation replica from the server.
    FetchHistory,
    SendMessage(String),
    EditMessage {
        id: MessageId,
        content: String,
    },
    DeleteMessage(MessageId),
    LoadProfile,
    /// Abort every request still in flight.
    CancelAll,
}

/// Which mutation a failure belongs to, for the UI banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Send,
    Edit,
    Delete,
}

impl MutationKind {
    pub fn describe(self) -> &'static str {
        match self {
            MutationKind::Send => "send message",
            MutationKind::Edit => "edit message",
            MutationKind::Delete => "delete message",
        }
    }
}
