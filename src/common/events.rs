use super::commands::MutationKind;
use super::types::{MessageId, UserProfile};
use crate::conversation::HistoryState;
use crate::error::SyncError;

/// Notifications the sync worker sends up to the UI.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    Registered { username: String },
    RegisterFailed(SyncError),
    LoggedIn { username: String },
    LoginFailed(SyncError),
    LoggedOut,
    Profile(UserProfile),
    HistoryUpdated(HistoryState),
    MessageEdited { id: MessageId },
    MutationFailed {
        action: MutationKind,
        error: SyncError,
    },
    /// The server rejected the session token; the UI must go back to login.
    Unauthorized,
}
