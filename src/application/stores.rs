//! Store traits describing the external key-value adapter.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(String),
    #[error("store rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("store returned malformed payload: {0}")]
    Malformed(String),
    #[error("store is not configured")]
    Disabled,
}

/// Atomic counter operations against the external key-value store.
///
/// Atomicity of `incr` is the store's guarantee; nothing in this crate does
/// read-modify-write on counter keys.
#[async_trait]
pub trait ViewStore: Send + Sync {
    /// Increment the integer at `key` by one, creating it at 1 when absent.
    async fn incr(&self, key: &str) -> Result<u64, StoreError>;

    /// Read the integer at `key`. `None` means the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError>;
}
