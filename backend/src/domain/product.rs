//! Catalogue product model.
//!
//! Products are owned by the external catalogue. The cart embeds a snapshot of
//! a product at the time it was added, so this type is also the product shape
//! inside persisted cart snapshots. Only `id`, `title`, `price`, and `stock`
//! are required on decode; the remaining metadata is opaque to the cart and
//! tolerated when absent.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, de};

/// Catalogue product identifier.
///
/// # Examples
/// ```
/// use storefront::domain::ProductId;
///
/// let id = ProductId::new(7);
/// assert_eq!(id.get(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u64);

impl ProductId {
    /// Wrap a raw catalogue identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProductId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Physical dimensions reported by the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in catalogue units.
    pub width: f64,
    /// Height in catalogue units.
    pub height: f64,
    /// Depth in catalogue units.
    pub depth: f64,
}

/// A shopper review attached to a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Star rating, 1 to 5.
    pub rating: u8,
    /// Free-text comment.
    pub comment: String,
    /// ISO-8601 timestamp as supplied by the catalogue.
    pub date: String,
    /// Reviewer display name.
    pub reviewer_name: String,
    /// Reviewer email address.
    pub reviewer_email: String,
}

/// Catalogue bookkeeping metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMeta {
    /// Creation timestamp as supplied by the catalogue.
    pub created_at: String,
    /// Last update timestamp as supplied by the catalogue.
    pub updated_at: String,
    /// Barcode value.
    #[serde(default)]
    pub barcode: String,
    /// QR code image URL.
    #[serde(default)]
    pub qr_code: String,
}

/// A product as served by the catalogue.
///
/// `price` and `discount_percentage` are exact decimals; they travel as JSON
/// numbers to match the catalogue's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique catalogue identifier.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Category slug.
    #[serde(default)]
    pub category: String,
    /// Unit list price; never negative.
    #[serde(
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "non_negative_price"
    )]
    pub price: Decimal,
    /// Discount percentage in `0..=100`.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub discount_percentage: Decimal,
    /// Average rating.
    #[serde(default)]
    pub rating: f64,
    /// Units available.
    pub stock: u32,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Brand name, when the catalogue knows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Stock keeping unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Shipping weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Physical dimensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    /// Warranty summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty_information: Option<String>,
    /// Shipping summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_information: Option<String>,
    /// Availability label such as "In Stock".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_status: Option<String>,
    /// Shopper reviews.
    #[serde(default)]
    pub reviews: Vec<Review>,
    /// Return policy summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_policy: Option<String>,
    /// Minimum quantity per order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_order_quantity: Option<u32>,
    /// Catalogue bookkeeping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ProductMeta>,
    /// Gallery image URLs.
    #[serde(default)]
    pub images: Vec<String>,
    /// Thumbnail image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Product {
    /// Create a product with the fields the cart relies on.
    ///
    /// All other metadata starts empty.
    ///
    /// # Examples
    /// ```
    /// use rust_decimal::Decimal;
    /// use storefront::domain::{Product, ProductId};
    ///
    /// let product = Product::new(ProductId::new(1), "Lamp", Decimal::new(2500, 2), 4);
    /// assert_eq!(product.discounted_price(), Decimal::new(2500, 2));
    /// ```
    pub fn new(id: ProductId, title: impl Into<String>, price: Decimal, stock: u32) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            category: String::new(),
            price,
            discount_percentage: Decimal::ZERO,
            rating: 0.0,
            stock,
            tags: Vec::new(),
            brand: None,
            sku: None,
            weight: None,
            dimensions: None,
            warranty_information: None,
            shipping_information: None,
            availability_status: None,
            reviews: Vec::new(),
            return_policy: None,
            minimum_order_quantity: None,
            meta: None,
            images: Vec::new(),
            thumbnail: None,
        }
    }

    /// Set the discount percentage.
    pub fn with_discount(mut self, discount_percentage: Decimal) -> Self {
        self.discount_percentage = discount_percentage;
        self
    }

    /// Set the category slug.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the stock level.
    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    /// Unit price after applying the discount.
    ///
    /// The discount is clamped into `0..=100` so malformed catalogue data can
    /// neither raise the price nor make it negative.
    pub fn discounted_price(&self) -> Decimal {
        let discount = self
            .discount_percentage
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
        self.price * (Decimal::ONE - discount / Decimal::ONE_HUNDRED)
    }

    /// Whether at least `quantity` units are available.
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        quantity <= self.stock
    }
}

fn non_negative_price<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let price = rust_decimal::serde::float::deserialize(deserializer)?;
    if price < Decimal::ZERO {
        return Err(de::Error::custom("price must not be negative"));
    }
    Ok(price)
}
