//! Cart aggregate: ordered line items plus derived totals.
//!
//! Totals are never set directly. Every mutation made by
//! [`CartStore`](crate::domain::CartStore) ends with [`Cart::recompute`], so
//! `total_items` and `total_price` always agree with the item list.
//!
//! The persisted snapshot shape is
//! `{ "items": [{ "id", "product", "quantity" }], "totalItems", "totalPrice" }`.
//! Decoding ignores the persisted totals and restores the line invariants
//! (positive quantities, one line per product) before recomputing.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Product, ProductId};

/// Fixed storage key under which the cart snapshot is persisted.
pub const CART_STORAGE_KEY: &str = "nextshop-cart";

/// Generated identifier of a cart line.
///
/// Stable for the life of the line, including across persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(Uuid);

impl LineItemId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for LineItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl From<Uuid> for LineItemId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// One product in the cart with its quantity.
///
/// ## Invariants
/// - `quantity >= 1` for every line held by a [`Cart`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    id: LineItemId,
    product: Product,
    quantity: u32,
}

impl CartLineItem {
    pub(crate) fn new(product: Product, quantity: u32) -> Self {
        Self {
            id: LineItemId::random(),
            product,
            quantity,
        }
    }

    /// Line identifier.
    pub fn id(&self) -> LineItemId {
        self.id
    }

    /// Product snapshot taken when the line was added.
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Units of the product in the cart.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Discounted unit price times quantity.
    pub fn line_total(&self) -> Decimal {
        self.product.discounted_price() * Decimal::from(self.quantity)
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }

    pub(crate) fn replace_product(&mut self, product: Product) {
        self.product = product;
    }
}

/// The shopper's cart.
///
/// # Examples
/// ```
/// use storefront::domain::Cart;
///
/// let cart = Cart::default();
/// assert!(cart.is_empty());
/// assert_eq!(cart.total_items(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<CartLineItem>,
    total_items: u64,
    #[serde(with = "rust_decimal::serde::float")]
    total_price: Decimal,
}

impl Cart {
    /// Line items in insertion order.
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Sum of all line quantities.
    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    /// Sum of discounted line totals.
    pub fn total_price(&self) -> Decimal {
        self.total_price
    }

    /// Whether the cart holds no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Line with the given line identifier.
    pub fn line(&self, id: LineItemId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Line holding the given product.
    pub fn line_for_product(&self, product_id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.product.id == product_id)
    }

    /// Whether the product has a line in the cart.
    pub fn contains_product(&self, product_id: ProductId) -> bool {
        self.line_for_product(product_id).is_some()
    }

    /// Quantity of the product in the cart, zero when absent.
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.line_for_product(product_id)
            .map_or(0, CartLineItem::quantity)
    }

    /// Serialise the persisted snapshot.
    pub fn to_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a persisted snapshot, ignoring any stored totals.
    ///
    /// Lines with a zero quantity are dropped and lines repeating a product
    /// are merged into the first one, so the decoded cart satisfies the same
    /// invariants as a cart built through the store.
    ///
    /// # Errors
    ///
    /// Returns the decode error when the blob is not a cart snapshot.
    pub fn from_snapshot(snapshot: &str) -> Result<Self, serde_json::Error> {
        let dto: PersistedCartDto = serde_json::from_str(snapshot)?;
        let mut cart = Self::default();
        for line in dto.items {
            if line.quantity == 0 {
                continue;
            }
            if let Some(existing) = cart.line_mut_for_product(line.product.id) {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
                continue;
            }
            cart.items.push(CartLineItem {
                id: line.id,
                product: line.product,
                quantity: line.quantity,
            });
        }
        cart.recompute();
        Ok(cart)
    }

    pub(crate) fn push(&mut self, item: CartLineItem) {
        self.items.push(item);
    }

    pub(crate) fn line_mut(&mut self, id: LineItemId) -> Option<&mut CartLineItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub(crate) fn line_mut_for_product(
        &mut self,
        product_id: ProductId,
    ) -> Option<&mut CartLineItem> {
        self.items
            .iter_mut()
            .find(|item| item.product.id == product_id)
    }

    pub(crate) fn remove(&mut self, id: LineItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.recompute();
    }

    /// Restore the derived totals from the item list.
    pub(crate) fn recompute(&mut self) {
        self.total_items = self
            .items
            .iter()
            .map(|item| u64::from(item.quantity))
            .sum();
        self.total_price = self.items.iter().map(CartLineItem::line_total).sum();
    }
}

#[derive(Debug, Deserialize)]
struct PersistedCartDto {
    #[serde(default)]
    items: Vec<PersistedLineDto>,
}

#[derive(Debug, Deserialize)]
struct PersistedLineDto {
    id: LineItemId,
    product: Product,
    quantity: u32,
}
