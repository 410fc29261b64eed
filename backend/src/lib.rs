//! Storefront library: cart state, catalogue access, and checkout.

pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(feature = "test-support")]
pub mod test_support;
