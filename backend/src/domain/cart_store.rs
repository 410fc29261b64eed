//! Cart store: the single owner of the shopper's cart.
//!
//! Every mutation follows the same sequence: change the item list, restore
//! the derived totals, then write the snapshot through the [`CartStorage`]
//! port. Operations taking `&mut self` serialise mutations, so callers never
//! observe a cart whose totals disagree with its items.
//!
//! Precondition violations (zero or over-stock quantities) leave the cart
//! untouched and are reported through [`AddOutcome::Rejected`] plus a
//! `warn` log. Storage failures are logged and never propagated: the
//! in-memory cart stays authoritative for the session.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::ports::CartStorage;
use crate::domain::{Cart, CartLineItem, LineItemId, Product, ProductId};

/// Why an add request left the cart unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddRejection {
    /// The requested quantity was zero.
    ZeroQuantity,
    /// The cart would hold more units than the product has in stock.
    InsufficientStock {
        /// Units requested by this call.
        requested: u32,
        /// Units already in the cart.
        in_cart: u32,
        /// Stock reported by the product snapshot.
        stock: u32,
    },
}

/// Result of [`CartStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line was appended.
    Added(LineItemId),
    /// The existing line for the product was incremented.
    Incremented(LineItemId),
    /// Nothing changed.
    Rejected(AddRejection),
}

impl AddOutcome {
    /// Line touched by the operation, if any.
    pub fn line_id(&self) -> Option<LineItemId> {
        match self {
            Self::Added(id) | Self::Incremented(id) => Some(*id),
            Self::Rejected(_) => None,
        }
    }

    /// Whether the cart changed.
    pub fn is_applied(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// State container for the cart, persisted through a [`CartStorage`] port.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use rust_decimal::Decimal;
/// use storefront::domain::{CartStore, Product, ProductId};
/// use storefront::outbound::storage::InMemoryCartStorage;
///
/// let mut store = CartStore::new(Arc::new(InMemoryCartStorage::default()));
/// let lamp = Product::new(ProductId::new(1), "Lamp", Decimal::new(100, 0), 5);
/// store.add(&lamp, 2);
/// assert_eq!(store.total_items(), 2);
/// assert_eq!(store.total_price(), Decimal::new(200, 0));
/// ```
#[derive(Debug)]
pub struct CartStore<S> {
    storage: Arc<S>,
    cart: Cart,
}

impl<S> CartStore<S> {
    /// Current cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[CartLineItem] {
        self.cart.items()
    }

    /// Sum of line quantities.
    pub fn total_items(&self) -> u64 {
        self.cart.total_items()
    }

    /// Sum of discounted line totals.
    pub fn total_price(&self) -> Decimal {
        self.cart.total_price()
    }

    /// Whether the product has a line in the cart.
    pub fn contains_product(&self, product_id: ProductId) -> bool {
        self.cart.contains_product(product_id)
    }

    /// Quantity of the product in the cart, zero when absent.
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.cart.quantity_of(product_id)
    }

    /// Line holding the product.
    pub fn line_for_product(&self, product_id: ProductId) -> Option<&CartLineItem> {
        self.cart.line_for_product(product_id)
    }

    /// Line with the given identifier.
    pub fn line(&self, id: LineItemId) -> Option<&CartLineItem> {
        self.cart.line(id)
    }
}

impl<S> CartStore<S>
where
    S: CartStorage,
{
    /// Create a store holding an empty cart. Storage is not read.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            cart: Cart::default(),
        }
    }

    /// Create a store and restore the persisted cart.
    pub fn rehydrated(storage: Arc<S>) -> Self {
        let mut store = Self::new(storage);
        store.rehydrate();
        store
    }

    /// Add `quantity` units of `product`.
    ///
    /// The request is rejected when `quantity` is zero or when the units
    /// already in the cart plus `quantity` exceed `product.stock`. A product
    /// already in the cart has its line incremented; otherwise a new line is
    /// appended with a fresh identifier.
    pub fn add(&mut self, product: &Product, quantity: u32) -> AddOutcome {
        if quantity == 0 {
            warn!(product_id = %product.id, "ignoring add with zero quantity");
            return AddOutcome::Rejected(AddRejection::ZeroQuantity);
        }

        let in_cart = self.cart.quantity_of(product.id);
        let wanted = u64::from(in_cart) + u64::from(quantity);
        let Some(next) = u32::try_from(wanted)
            .ok()
            .filter(|next| product.has_stock_for(*next))
        else {
            warn!(
                product_id = %product.id,
                requested = quantity,
                in_cart,
                stock = product.stock,
                "ignoring add beyond available stock"
            );
            return AddOutcome::Rejected(AddRejection::InsufficientStock {
                requested: quantity,
                in_cart,
                stock: product.stock,
            });
        };

        let outcome = match self.cart.line_mut_for_product(product.id) {
            Some(line) => {
                line.set_quantity(next);
                AddOutcome::Incremented(line.id())
            }
            None => {
                let line = CartLineItem::new(product.clone(), quantity);
                let id = line.id();
                self.cart.push(line);
                AddOutcome::Added(id)
            }
        };
        self.commit();
        outcome
    }

    /// Add a single unit of `product`.
    pub fn add_one(&mut self, product: &Product) -> AddOutcome {
        self.add(product, 1)
    }

    /// Raise the product's line by `quantity`, or add it when absent.
    ///
    /// An existing line is updated through [`CartStore::set_quantity`], so
    /// the stock check applies only when a new line is created.
    pub fn add_or_update(&mut self, product: &Product, quantity: u32) -> AddOutcome {
        match self.cart.line_for_product(product.id) {
            Some(line) => {
                let id = line.id();
                let next = line.quantity().saturating_add(quantity);
                self.set_quantity(id, next);
                AddOutcome::Incremented(id)
            }
            None => self.add(product, quantity),
        }
    }

    /// Remove the line. An unknown identifier leaves the items unchanged.
    pub fn remove(&mut self, id: LineItemId) {
        if !self.cart.remove(id) {
            debug!(line_id = %id, "remove targeted an unknown line");
        }
        self.commit();
    }

    /// Set the line's quantity. Zero removes the line; no stock check applies.
    pub fn set_quantity(&mut self, id: LineItemId, quantity: u32) {
        if quantity == 0 {
            self.remove(id);
            return;
        }
        match self.cart.line_mut(id) {
            Some(line) => line.set_quantity(quantity),
            None => debug!(line_id = %id, "set_quantity targeted an unknown line"),
        }
        self.commit();
    }

    /// Empty the cart and persist the empty snapshot.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.persist();
    }

    /// Replace the embedded snapshot of the product's line.
    ///
    /// Does nothing when the product is not in the cart.
    pub fn refresh_product(&mut self, product: &Product) {
        let Some(line) = self.cart.line_mut_for_product(product.id) else {
            return;
        };
        line.replace_product(product.clone());
        self.commit();
    }

    /// Replace the in-memory cart with the persisted snapshot.
    ///
    /// Never fails: an absent, unreadable, or undecodable snapshot yields an
    /// empty cart. An undecodable snapshot is removed from storage.
    pub fn rehydrate(&mut self) {
        self.cart = match self.storage.load() {
            Ok(Some(snapshot)) => match Cart::from_snapshot(&snapshot) {
                Ok(cart) => cart,
                Err(error) => {
                    warn!(%error, "discarding undecodable cart snapshot");
                    if let Err(error) = self.storage.clear() {
                        warn!(%error, "failed to remove undecodable cart snapshot");
                    }
                    Cart::default()
                }
            },
            Ok(None) => Cart::default(),
            Err(error) => {
                warn!(%error, "cart storage unreadable; starting with an empty cart");
                Cart::default()
            }
        };
        debug!(
            lines = self.cart.items().len(),
            total_items = self.cart.total_items(),
            "cart rehydrated"
        );
    }

    fn commit(&mut self) {
        self.cart.recompute();
        self.persist();
    }

    fn persist(&self) {
        let snapshot = match self.cart.to_snapshot() {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(%error, "failed to encode cart snapshot");
                return;
            }
        };
        if let Err(error) = self.storage.save(&snapshot) {
            warn!(%error, "failed to persist cart snapshot");
        }
    }
}

#[cfg(test)]
#[path = "cart_store_tests.rs"]
mod tests;
