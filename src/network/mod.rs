pub mod client;
pub mod gateway;
#[cfg(test)]
pub(crate) mod testing;
pub mod transport;

pub use client::SyncClient;
pub use gateway::{Auth, Gateway};
pub use transport::{HttpTransport, Method, RequestBody, Transport};
