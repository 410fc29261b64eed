//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod cart_storage;
mod catalog_service;

#[cfg(test)]
pub use cart_storage::MockCartStorage;
pub use cart_storage::{CartStorage, CartStorageError, DetachedCartStorage};
#[cfg(test)]
pub use catalog_service::MockCatalogService;
pub use catalog_service::{
    CatalogService, CatalogServiceError, FixtureCatalogService, ProductsPage,
};
