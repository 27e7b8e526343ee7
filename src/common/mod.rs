pub mod commands;
pub mod events;
pub mod types;

pub use commands::{MutationKind, SyncCommand};
pub use events::SyncEvent;
pub use types::{
    ContentPayload, Credentials, MAX_CONTENT_LEN, Message, MessageExchange, MessageId,
    TokenResponse, UserProfile,
};
