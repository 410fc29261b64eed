//! Behaviour tests for the shopping cart store.
//!
//! These scenarios drive the store through its public operations and check
//! the derived totals and the persisted snapshot after each step.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use rust_decimal::Decimal;
use storefront::domain::{AddOutcome, AddRejection, CartStore, Product, ProductId};
use storefront::outbound::storage::InMemoryCartStorage;
use storefront::test_support::product;

struct CartStoreWorld {
    products: RefCell<HashMap<u64, Product>>,
    storage: Arc<InMemoryCartStorage>,
    store: RefCell<CartStore<InMemoryCartStorage>>,
    last_add: RefCell<Option<AddOutcome>>,
}

impl CartStoreWorld {
    fn new() -> Self {
        let storage = Arc::new(InMemoryCartStorage::default());
        Self {
            products: RefCell::new(HashMap::new()),
            store: RefCell::new(CartStore::new(Arc::clone(&storage))),
            storage,
            last_add: RefCell::new(None),
        }
    }

    fn stock_product(&self, item: Product) {
        self.products.borrow_mut().insert(item.id.get(), item);
    }

    fn product(&self, id: u64) -> Product {
        self.products
            .borrow()
            .get(&id)
            .cloned()
            .unwrap_or_else(|| panic!("product {id} should be in the catalogue"))
    }

    fn restore_session(&self) {
        *self.store.borrow_mut() = CartStore::rehydrated(Arc::clone(&self.storage));
    }
}

#[fixture]
fn world() -> CartStoreWorld {
    CartStoreWorld::new()
}

#[given("a catalogue with product {id} priced {price} with {stock} in stock")]
fn a_catalogue_with_product(world: &CartStoreWorld, id: u64, price: i64, stock: u32) {
    world.stock_product(product(id, "Catalogue item", price, stock));
}

#[given("a discounted product {id} priced {price} with {stock} in stock at {discount} percent off")]
fn a_discounted_product(
    world: &CartStoreWorld,
    id: u64,
    price: i64,
    stock: u32,
    discount: i64,
) {
    world.stock_product(
        product(id, "Discounted item", price, stock).with_discount(Decimal::new(discount, 0)),
    );
}

#[given("an empty cart backed by in-memory storage")]
fn an_empty_cart(world: &CartStoreWorld) {
    assert!(world.store.borrow().cart().is_empty());
    assert!(world.storage.snapshot().is_none());
}

#[when("the shopper adds {quantity} of product {id}")]
fn the_shopper_adds(world: &CartStoreWorld, quantity: u32, id: u64) {
    let item = world.product(id);
    let outcome = world.store.borrow_mut().add(&item, quantity);
    *world.last_add.borrow_mut() = Some(outcome);
}

#[when("the shopper sets the quantity of product {id} to {quantity}")]
fn the_shopper_sets_the_quantity(world: &CartStoreWorld, id: u64, quantity: u32) {
    let mut store = world.store.borrow_mut();
    let line_id = store
        .line_for_product(ProductId::new(id))
        .map(|line| line.id())
        .expect("product should have a cart line");
    store.set_quantity(line_id, quantity);
}

#[when("the shopper removes the line for product {id}")]
fn the_shopper_removes_the_line(world: &CartStoreWorld, id: u64) {
    let mut store = world.store.borrow_mut();
    let line_id = store
        .line_for_product(ProductId::new(id))
        .map(|line| line.id())
        .expect("product should have a cart line");
    store.remove(line_id);
}

#[when("the shopper clears the cart")]
fn the_shopper_clears_the_cart(world: &CartStoreWorld) {
    world.store.borrow_mut().clear();
}

#[when("a new session restores the cart from storage")]
fn a_new_session_restores_the_cart(world: &CartStoreWorld) {
    world.restore_session();
}

#[then("the cart holds {count} items totalling {total}")]
fn the_cart_holds(world: &CartStoreWorld, count: u64, total: String) {
    let expected: Decimal = total.parse().expect("total should be a decimal");
    let store = world.store.borrow();
    assert_eq!(store.total_items(), count);
    assert_eq!(store.total_price(), expected);
}

#[then("the cart line count is {count}")]
fn the_cart_line_count_is(world: &CartStoreWorld, count: usize) {
    assert_eq!(world.store.borrow().items().len(), count);
}

#[then("the last add is rejected for insufficient stock")]
fn the_last_add_is_rejected(world: &CartStoreWorld) {
    let outcome = world.last_add.borrow();
    assert!(matches!(
        outcome.as_ref().expect("an add should have run"),
        AddOutcome::Rejected(AddRejection::InsufficientStock { .. })
    ));
}

#[then("storage holds an empty cart snapshot")]
fn storage_holds_an_empty_snapshot(world: &CartStoreWorld) {
    let snapshot = world.storage.snapshot().expect("snapshot should be stored");
    let value: serde_json::Value = serde_json::from_str(&snapshot).expect("snapshot is JSON");
    assert_eq!(value["items"], serde_json::json!([]));
    assert_eq!(value["totalItems"], 0);
}

#[scenario(
    path = "tests/features/cart_store.feature",
    name = "Totals follow adds, quantity changes and removals"
)]
fn totals_follow_mutations(world: CartStoreWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/cart_store.feature",
    name = "Discounts apply to the line total"
)]
fn discounts_apply_to_the_line_total(world: CartStoreWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/cart_store.feature",
    name = "Adding beyond the available stock is rejected"
)]
fn adding_beyond_stock_is_rejected(world: CartStoreWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/cart_store.feature",
    name = "Stock checks count units already in the cart"
)]
fn stock_checks_are_cumulative(world: CartStoreWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/cart_store.feature",
    name = "Setting a quantity of zero removes the line"
)]
fn zero_quantity_removes_the_line(world: CartStoreWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/cart_store.feature",
    name = "A restored session sees the persisted cart"
)]
fn restored_session_sees_the_cart(world: CartStoreWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/cart_store.feature",
    name = "Clearing the cart persists the empty cart"
)]
fn clearing_persists_the_empty_cart(world: CartStoreWorld) {
    let _ = world;
}
