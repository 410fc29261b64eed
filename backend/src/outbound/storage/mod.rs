//! Cart storage adapters.
//!
//! - [`InMemoryCartStorage`]: process-local blob for tests and sessions
//!   without a storage directory.
//! - [`FileCartStorage`]: JSON file inside a capability-scoped directory,
//!   replaced atomically on every save.

mod file;
mod memory;

pub use file::FileCartStorage;
pub use memory::InMemoryCartStorage;
