//! Tests for order pricing and placement.

use std::sync::Arc;

use chrono::{Local, TimeZone};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::MockCartStorage;
use crate::domain::{ErrorCode, Product, ProductId};
use crate::outbound::storage::InMemoryCartStorage;

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

#[fixture]
fn service() -> CheckoutService {
    CheckoutService::new(Arc::new(FixtureClock {
        utc_now: fixture_timestamp(),
    }))
}

#[fixture]
fn request() -> CheckoutRequest {
    CheckoutRequest {
        shipping: ShippingInfo {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@example.com".into(),
            phone: "15551234567".into(),
            address: "1 Compiler Way".into(),
            city: "Arlington".into(),
            state: "Virginia".into(),
            zip_code: "22201-1234".into(),
            country: "United States".into(),
        },
        payment: PaymentInfo {
            payment_method: Some(PaymentMethod::Debit),
            card_number: "5555555555554444".into(),
            expiry_date: "09/27".into(),
            cvv: "321".into(),
            cardholder_name: "Grace Hopper".into(),
            billing_address: None,
        },
    }
}

fn store_with(price: i64, quantity: u32) -> CartStore<InMemoryCartStorage> {
    let mut store = CartStore::new(Arc::new(InMemoryCartStorage::default()));
    let product = Product::new(ProductId::new(1), "Desk", Decimal::new(price, 2), 100);
    store.add(&product, quantity);
    store
}

#[rstest]
#[case::below_threshold(4_999, Decimal::new(999, 2))]
#[case::at_threshold(5_000, Decimal::ZERO)]
#[case::above_threshold(12_000, Decimal::ZERO)]
fn shipping_is_free_from_fifty(#[case] cents: i64, #[case] shipping: Decimal) {
    let store = store_with(cents, 1);
    let summary = OrderSummary::for_cart(store.cart());
    assert_eq!(summary.shipping, shipping);
    assert_eq!(summary.has_free_shipping(), shipping.is_zero());
}

#[test]
fn summary_adds_tax_and_shipping() {
    let store = store_with(2_000, 2);
    let summary = OrderSummary::for_cart(store.cart());

    assert_eq!(summary.total_items, 2);
    assert_eq!(summary.subtotal, Decimal::new(40, 0));
    assert_eq!(summary.tax, Decimal::new(320, 2));
    assert_eq!(summary.total, Decimal::new(5_319, 2));
}

#[test]
fn rounding_is_half_away_from_zero() {
    let store = store_with(1_256, 1);
    let summary = OrderSummary::for_cart(store.cart());
    assert_eq!(summary.tax, Decimal::new(10_048, 4));
    assert_eq!(summary.rounded().tax, Decimal::new(100, 2));
    assert_eq!(round_money(Decimal::new(1_005, 3)), Decimal::new(101, 2));
}

#[rstest]
fn place_order_snapshots_lines_and_clears_the_cart(
    service: CheckoutService,
    request: CheckoutRequest,
) {
    let mut store = store_with(3_000, 2);
    let lines = store.items().to_vec();

    let order = service.place_order(&mut store, request).expect("order placed");

    assert_eq!(order.items, lines);
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.created_at, fixture_timestamp());
    assert_eq!(order.total_amount, Decimal::new(6_480, 2));
    assert_eq!(order.payment_info.card_last_four, "4444");
    assert_eq!(order.payment_info.billing_address, order.shipping_info);
    assert_eq!(order.id.as_str().len(), 8);
    assert!(store.cart().is_empty());
}

#[rstest]
fn order_never_serialises_card_secrets(service: CheckoutService, request: CheckoutRequest) {
    let mut store = store_with(3_000, 1);
    let order = service.place_order(&mut store, request).expect("order placed");

    let encoded = serde_json::to_string(&order).expect("encode");
    assert!(!encoded.contains("5555555555554444"));
    assert!(!encoded.contains("\"cvv\""));
    assert!(encoded.contains("\"cardLastFour\":\"4444\""));
}

#[rstest]
fn empty_cart_is_rejected(service: CheckoutService, request: CheckoutRequest) {
    let mut storage = MockCartStorage::new();
    storage.expect_save().never();
    let mut store = CartStore::new(Arc::new(storage));

    let error = service
        .place_order(&mut store, request)
        .expect_err("empty cart");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(error.message(), "Your cart is empty");
}

#[rstest]
fn invalid_forms_leave_the_cart_intact(service: CheckoutService, mut request: CheckoutRequest) {
    request.shipping.zip_code = "ABCDE".into();
    request.payment.expiry_date = "01/26".into();
    let mut store = store_with(3_000, 1);

    let error = service
        .place_order(&mut store, request)
        .expect_err("invalid forms");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    let fields = error.details().and_then(|d| d.get("fields")).expect("fields");
    assert_eq!(fields["expiryDate"], "Card has expired");
    assert!(fields.get("zipCode").is_some());
    assert_eq!(store.total_items(), 1);
}

#[test]
fn order_ids_are_uppercase_hex() {
    let id = OrderId::generate();
    assert!(
        id.as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    );
}

#[rstest]
fn non_ascii_card_digits_never_reach_an_order(
    service: CheckoutService,
    mut request: CheckoutRequest,
) {
    request.payment.card_number = "\u{661}\u{662}\u{663}\u{664}".repeat(4);
    let mut store = store_with(3_000, 1);

    let error = service
        .place_order(&mut store, request)
        .expect_err("card number rejected");

    let fields = error.details().and_then(|d| d.get("fields")).expect("fields");
    assert_eq!(fields["cardNumber"], "Please enter a valid 16-digit card number");
    assert_eq!(store.total_items(), 1);
}
