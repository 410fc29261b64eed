//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of domain port traits:
//!
//! - **storage**: cart snapshot persistence (in-memory and file-backed)
//! - **catalog**: reqwest-backed products API client
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod catalog;
pub mod storage;
