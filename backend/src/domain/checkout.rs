//! Checkout: order summary pricing and order placement.
//!
//! Pricing rules: shipping is free from a subtotal of 50, otherwise a flat
//! 9.99; tax is 8 % of the subtotal. Placing an order validates both forms,
//! snapshots the cart lines, and then clears the cart.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::CartStorage;
use crate::domain::{Cart, CartLineItem, CartStore, Error};

mod validation;

pub use validation::{
    FieldErrors, PaymentInfo, PaymentMethod, ShippingInfo, UnknownPaymentMethod,
};

/// Subtotal from which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(50, 0, 0, false, 0);
/// Flat shipping fee below the threshold.
pub const FLAT_SHIPPING_FEE: Decimal = Decimal::from_parts(999, 0, 0, false, 2);
/// Tax rate applied to the subtotal.
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Round a monetary amount to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Priced breakdown of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    /// Units in the cart.
    pub total_items: u64,
    /// Sum of discounted line totals.
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    /// Shipping fee.
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    /// Tax on the subtotal.
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    /// Subtotal plus shipping plus tax.
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl OrderSummary {
    /// Price the cart. Amounts are exact; use [`OrderSummary::rounded`] for
    /// display.
    ///
    /// # Examples
    /// ```
    /// use rust_decimal::Decimal;
    /// use storefront::domain::{Cart, OrderSummary};
    ///
    /// let summary = OrderSummary::for_cart(&Cart::default());
    /// assert_eq!(summary.shipping, Decimal::new(999, 2));
    /// ```
    pub fn for_cart(cart: &Cart) -> Self {
        let subtotal = cart.total_price();
        let shipping = if subtotal >= FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            FLAT_SHIPPING_FEE
        };
        let tax = subtotal * TAX_RATE;
        Self {
            total_items: cart.total_items(),
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    /// Whether shipping is free.
    pub fn has_free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }

    /// Copy with every amount rounded to cents.
    pub fn rounded(&self) -> Self {
        Self {
            total_items: self.total_items,
            subtotal: round_money(self.subtotal),
            shipping: round_money(self.shipping),
            tax: round_money(self.tax),
            total: round_money(self.total),
        }
    }
}

/// Short shopper-facing order reference: eight uppercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generate a fresh reference.
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple[..8].to_ascii_uppercase())
    }

    /// Reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Built but not yet accepted.
    Pending,
    /// Accepted; the cart has been cleared.
    Confirmed,
    /// Handed to the carrier.
    Shipped,
    /// Received by the shopper.
    Delivered,
}

/// Payment details retained on an order. Never holds the full card number
/// or the CVV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    /// Selected method.
    pub payment_method: PaymentMethod,
    /// Last four card digits.
    pub card_last_four: String,
    /// `MM/YY`.
    pub expiry_date: String,
    /// Name printed on the card.
    pub cardholder_name: String,
    /// Billing address.
    pub billing_address: ShippingInfo,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order reference.
    pub id: OrderId,
    /// Cart lines at the time of placement.
    pub items: Vec<CartLineItem>,
    /// Delivery address.
    pub shipping_info: ShippingInfo,
    /// Retained payment details.
    pub payment_info: PaymentSummary,
    /// Amounts charged, rounded to cents.
    pub summary: OrderSummary,
    /// Grand total, rounded to cents.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Placement time.
    pub created_at: DateTime<Utc>,
}

/// Shipping and payment forms submitted together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Delivery address.
    pub shipping: ShippingInfo,
    /// Payment form.
    pub payment: PaymentInfo,
}

impl CheckoutRequest {
    fn validate(&self, clock: &dyn Clock) -> Result<(), Error> {
        let mut errors = FieldErrors::default();
        if let Err(shipping) = self.shipping.validate() {
            errors.merge(shipping);
        }
        if let Err(payment) = self.payment.validate(clock.utc().date_naive()) {
            errors.merge(payment);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into_error())
        }
    }
}

/// Domain service turning a cart into an order.
#[derive(Clone)]
pub struct CheckoutService {
    clock: Arc<dyn Clock>,
}

impl CheckoutService {
    /// Create a service reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Validate the forms, place the order, and clear the cart.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error when the cart is empty or a form
    /// field fails validation. The cart is untouched on error.
    pub fn place_order<S>(
        &self,
        store: &mut CartStore<S>,
        request: CheckoutRequest,
    ) -> Result<Order, Error>
    where
        S: CartStorage,
    {
        if store.cart().is_empty() {
            return Err(Error::invalid_request("Your cart is empty"));
        }
        request.validate(self.clock.as_ref())?;

        let summary = OrderSummary::for_cart(store.cart()).rounded();
        let CheckoutRequest { shipping, payment } = request;
        let payment_info = PaymentSummary {
            payment_method: payment
                .payment_method
                .ok_or_else(|| Error::invalid_request("Please select a payment method"))?,
            card_last_four: payment.card_last_four(),
            expiry_date: payment.expiry_date,
            cardholder_name: payment.cardholder_name,
            billing_address: payment
                .billing_address
                .unwrap_or_else(|| shipping.clone()),
        };
        let mut order = Order {
            id: OrderId::generate(),
            items: store.items().to_vec(),
            shipping_info: shipping,
            payment_info,
            summary,
            total_amount: summary.total,
            status: OrderStatus::Pending,
            created_at: self.clock.utc(),
        };

        store.clear();
        order.status = OrderStatus::Confirmed;
        info!(
            order_id = %order.id,
            items = summary.total_items,
            total = %order.total_amount,
            "order placed"
        );
        Ok(order)
    }
}

#[cfg(test)]
mod tests;
