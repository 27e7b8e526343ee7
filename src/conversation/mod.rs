pub mod cache;
pub mod edit;

pub use cache::{ConversationCache, HistoryState, Mutation};
pub use edit::EditSession;
