//! Client-side synchronization layer for a single bot conversation: session
//! handling, an authenticated request gateway, a refetch-only history replica
//! and the edit-session state machine, plus the egui front end consuming them.

pub mod common;
pub mod config;
pub mod conversation;
pub mod error;
pub mod network;
pub mod routing;
pub mod session;
pub mod storage;
pub mod ui;

pub use error::{SyncError, SyncResult};
