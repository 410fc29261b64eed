//! Domain primitives, aggregates, and services.
//!
//! Purpose: model the storefront cart and catalogue independently of any
//! transport or storage. Ports in [`ports`] describe the driven edges; the
//! services here are generic over them.
//!
//! Public surface:
//! - Product (alias to `product::Product`): read-only catalogue item.
//! - Cart / CartLineItem (alias to `cart::*`): cart aggregate and lines.
//! - CartStore (alias to `cart_store::CartStore`): owner of all cart mutations.
//! - CatalogQuery (alias to `catalog_query::CatalogQuery`): listing request.
//! - CatalogBrowser (alias to `catalog_browser::CatalogBrowser`): catalogue
//!   reads with filtering and retries.
//! - CheckoutService / OrderSummary (alias to `checkout::*`): pricing and
//!   order placement.
//! - Error (alias to `error::Error`): service-level failure payload.

pub mod cart;
pub mod cart_store;
pub mod catalog_browser;
pub mod catalog_query;
pub mod checkout;
pub mod error;
pub mod ports;
pub mod product;

pub use self::cart::{CART_STORAGE_KEY, Cart, CartLineItem, LineItemId};
pub use self::cart_store::{AddOutcome, AddRejection, CartStore};
pub use self::catalog_browser::{CatalogBrowser, ProductFeed, RetryPolicy};
pub use self::catalog_query::{
    CatalogQuery, CatalogQueryError, ListingEndpoint, SortField, SortOrder,
};
pub use self::checkout::{
    CheckoutRequest, CheckoutService, FieldErrors, Order, OrderId, OrderStatus, OrderSummary,
    PaymentInfo, PaymentMethod, PaymentSummary, ShippingInfo, UnknownPaymentMethod, round_money,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::product::{Dimensions, Product, ProductId, ProductMeta, Review};

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use storefront::domain::{DomainResult, Error};
///
/// fn lookup() -> DomainResult<u32> {
///     Err(Error::not_found("Resource not found"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
