//! Catalogue outbound adapters.
//!
//! This module provides the HTTP implementation of the `CatalogService`
//! port against a DummyJSON-compatible products API.

mod dto;
mod http_source;

pub use http_source::HttpCatalogService;
