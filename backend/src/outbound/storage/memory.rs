//! Process-local cart storage.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::ports::{CartStorage, CartStorageError};

/// Keeps the cart snapshot in memory for the life of the process.
#[derive(Debug, Default)]
pub struct InMemoryCartStorage {
    blob: Mutex<Option<String>>,
}

impl InMemoryCartStorage {
    /// Start with a stored snapshot.
    pub fn with_snapshot(snapshot: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(snapshot.into())),
        }
    }

    /// Currently stored snapshot.
    pub fn snapshot(&self) -> Option<String> {
        self.blob().clone()
    }

    fn blob(&self) -> MutexGuard<'_, Option<String>> {
        // A panic while holding the lock cannot leave a partial string behind.
        self.blob.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CartStorage for InMemoryCartStorage {
    fn load(&self) -> Result<Option<String>, CartStorageError> {
        Ok(self.blob().clone())
    }

    fn save(&self, snapshot: &str) -> Result<(), CartStorageError> {
        *self.blob() = Some(snapshot.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), CartStorageError> {
        *self.blob() = None;
        Ok(())
    }
}
