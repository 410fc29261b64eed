//! Port for persisting the cart snapshot.
//!
//! The storage surface mirrors a browser key-value store: one named string
//! blob that can be read, replaced, or removed synchronously. Adapters bind
//! the blob to [`CART_STORAGE_KEY`](crate::domain::CART_STORAGE_KEY); the
//! cart store owns the encoding.

use super::define_port_error;

define_port_error! {
    /// Errors raised by cart storage adapters.
    pub enum CartStorageError {
        /// The storage surface does not exist in this execution context.
        Unavailable { message: String } => "cart storage unavailable: {message}",
        /// Reading or writing the blob failed.
        Io { message: String } => "cart storage i/o failed: {message}",
    }
}

/// Synchronous persistence for the cart snapshot blob.
#[cfg_attr(test, mockall::automock)]
pub trait CartStorage: Send + Sync {
    /// Read the stored blob, or `None` when nothing has been stored.
    fn load(&self) -> Result<Option<String>, CartStorageError>;

    /// Replace the stored blob.
    fn save(&self, snapshot: &str) -> Result<(), CartStorageError>;

    /// Remove the stored blob. Removing an absent blob succeeds.
    fn clear(&self) -> Result<(), CartStorageError>;
}

/// Storage for execution contexts without a persistence surface.
///
/// Every call fails with [`CartStorageError::Unavailable`]; the cart store
/// degrades to an in-memory session cart.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedCartStorage;

impl CartStorage for DetachedCartStorage {
    fn load(&self) -> Result<Option<String>, CartStorageError> {
        Err(CartStorageError::unavailable("no storage surface attached"))
    }

    fn save(&self, _snapshot: &str) -> Result<(), CartStorageError> {
        Err(CartStorageError::unavailable("no storage surface attached"))
    }

    fn clear(&self) -> Result<(), CartStorageError> {
        Err(CartStorageError::unavailable("no storage surface attached"))
    }
}
