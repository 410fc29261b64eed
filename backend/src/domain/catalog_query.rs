//! Catalogue listing query.
//!
//! A [`CatalogQuery`] captures what the shopper asked for: which page, how it
//! is sorted, and any search text, category, price bounds, or stock filter.
//! The upstream catalogue understands only one of search or category per
//! request, plus paging and sorting, so this module also decides which
//! listing endpoint serves a query and which filters must be applied locally.

use std::fmt;
use std::str::FromStr;

use pagination::PageRequest;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Product;

/// Field a listing is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    /// Alphabetical by title.
    #[default]
    Title,
    /// By list price.
    Price,
    /// By average rating.
    Rating,
    /// By catalogue creation time.
    CreatedAt,
}

impl SortField {
    /// Wire name used in the `sortBy` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Price => "price",
            Self::Rating => "rating",
            Self::CreatedAt => "createdAt",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = CatalogQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "price" => Ok(Self::Price),
            "rating" => Ok(Self::Rating),
            "createdAt" => Ok(Self::CreatedAt),
            other => Err(CatalogQueryError::UnknownSortField {
                input: other.to_owned(),
            }),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Wire name used in the `order` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = CatalogQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(CatalogQueryError::UnknownSortOrder {
                input: other.to_owned(),
            }),
        }
    }
}

/// Validation failures for catalogue queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogQueryError {
    /// Minimum price below zero.
    #[error("Minimum price cannot be negative")]
    NegativeMinPrice,
    /// Maximum price below zero.
    #[error("Maximum price cannot be negative")]
    NegativeMaxPrice,
    /// Price bounds in the wrong order.
    #[error("Minimum price cannot be greater than maximum price")]
    InvertedPriceRange,
    /// `sortBy` value not recognised.
    #[error("unknown sort field: {input}")]
    UnknownSortField {
        /// The rejected input.
        input: String,
    },
    /// `order` value not recognised.
    #[error("unknown sort order: {input}")]
    UnknownSortOrder {
        /// The rejected input.
        input: String,
    },
}

/// Upstream listing endpoint selected for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEndpoint {
    /// Unfiltered product listing.
    All,
    /// Free-text search.
    Search {
        /// Search text, trimmed and non-empty.
        text: String,
    },
    /// Listing restricted to one category.
    Category {
        /// Category slug.
        slug: String,
    },
}

/// A catalogue listing request.
///
/// # Examples
/// ```
/// use storefront::domain::{CatalogQuery, ListingEndpoint};
///
/// let query = CatalogQuery::default().with_search("  phone ").with_category("laptops");
/// assert_eq!(
///     query.endpoint(),
///     ListingEndpoint::Search { text: "phone".to_owned() }
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    /// Page address.
    pub page: PageRequest,
    /// Sort field.
    pub sort_by: SortField,
    /// Sort direction.
    pub order: SortOrder,
    /// Free-text search.
    pub search: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound.
    pub max_price: Option<Decimal>,
    /// Only return products with stock.
    #[serde(default)]
    pub in_stock: bool,
}

impl CatalogQuery {
    /// Set the page address.
    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    /// Set the search text; blank text clears it.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = non_blank(search.into());
        self
    }

    /// Set the category; a blank slug clears it.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = non_blank(category.into());
        self
    }

    /// Set the sort field and direction.
    pub fn sorted_by(mut self, sort_by: SortField, order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.order = order;
        self
    }

    /// Set the inclusive price bounds.
    pub fn with_price_range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    /// Restrict results to products with stock.
    pub fn only_in_stock(mut self) -> Self {
        self.in_stock = true;
        self
    }

    /// Check the price bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogQueryError`] for negative or inverted bounds.
    pub fn validate(&self) -> Result<(), CatalogQueryError> {
        if self.min_price.is_some_and(|min| min < Decimal::ZERO) {
            return Err(CatalogQueryError::NegativeMinPrice);
        }
        if self.max_price.is_some_and(|max| max < Decimal::ZERO) {
            return Err(CatalogQueryError::NegativeMaxPrice);
        }
        match (self.min_price, self.max_price) {
            (Some(min), Some(max)) if min > max => Err(CatalogQueryError::InvertedPriceRange),
            _ => Ok(()),
        }
    }

    /// Endpoint serving this query. Search wins over category.
    pub fn endpoint(&self) -> ListingEndpoint {
        if let Some(text) = self.search.as_deref().and_then(trimmed_non_empty) {
            return ListingEndpoint::Search {
                text: text.to_owned(),
            };
        }
        if let Some(slug) = self.category.as_deref().and_then(trimmed_non_empty) {
            return ListingEndpoint::Category {
                slug: slug.to_owned(),
            };
        }
        ListingEndpoint::All
    }

    /// Paging and sorting parameters sent with every listing request.
    pub fn paging_params(&self) -> [(&'static str, String); 4] {
        [
            ("limit", self.page.limit().to_string()),
            ("skip", self.page.offset().to_string()),
            ("sortBy", self.sort_by.as_str().to_owned()),
            ("order", self.order.as_str().to_owned()),
        ]
    }

    /// Whether the query carries filters the upstream cannot apply.
    pub fn has_local_filters(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some() || self.in_stock
    }

    /// Apply the price and stock filters to one product.
    pub fn matches_local_filters(&self, product: &Product) -> bool {
        let above_min = self.min_price.is_none_or(|min| product.price >= min);
        let below_max = self.max_price.is_none_or(|max| product.price <= max);
        let stocked = !self.in_stock || product.stock > 0;
        above_min && below_max && stocked
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn trimmed_non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductId;
    use rstest::rstest;

    #[test]
    fn default_query_lists_first_page_by_title() {
        let query = CatalogQuery::default();
        assert_eq!(query.endpoint(), ListingEndpoint::All);
        assert_eq!(
            query.paging_params(),
            [
                ("limit", "20".to_owned()),
                ("skip", "0".to_owned()),
                ("sortBy", "title".to_owned()),
                ("order", "asc".to_owned()),
            ]
        );
    }

    #[test]
    fn skip_follows_page_number() {
        let query = CatalogQuery::default()
            .with_page(PageRequest::new(3, 12).expect("valid page"))
            .sorted_by(SortField::Price, SortOrder::Desc);
        let params = query.paging_params();
        assert_eq!(params[1], ("skip", "24".to_owned()));
        assert_eq!(params[2], ("sortBy", "price".to_owned()));
        assert_eq!(params[3], ("order", "desc".to_owned()));
    }

    #[rstest]
    #[case(None, Some("beauty"), ListingEndpoint::Category { slug: "beauty".to_owned() })]
    #[case(Some("mascara"), Some("beauty"), ListingEndpoint::Search { text: "mascara".to_owned() })]
    #[case(Some("   "), Some("beauty"), ListingEndpoint::Category { slug: "beauty".to_owned() })]
    #[case(Some(""), Some(" "), ListingEndpoint::All)]
    fn endpoint_prefers_search_over_category(
        #[case] search: Option<&str>,
        #[case] category: Option<&str>,
        #[case] expected: ListingEndpoint,
    ) {
        let query = CatalogQuery {
            search: search.map(str::to_owned),
            category: category.map(str::to_owned),
            ..CatalogQuery::default()
        };
        assert_eq!(query.endpoint(), expected);
    }

    #[rstest]
    #[case(Some(10), Some(5), Err(CatalogQueryError::InvertedPriceRange))]
    #[case(Some(-1), None, Err(CatalogQueryError::NegativeMinPrice))]
    #[case(None, Some(-3), Err(CatalogQueryError::NegativeMaxPrice))]
    #[case(Some(5), Some(5), Ok(()))]
    #[case(Some(0), None, Ok(()))]
    fn validate_checks_price_bounds(
        #[case] min: Option<i64>,
        #[case] max: Option<i64>,
        #[case] expected: Result<(), CatalogQueryError>,
    ) {
        let query = CatalogQuery::default()
            .with_price_range(min.map(Decimal::from), max.map(Decimal::from));
        assert_eq!(query.validate(), expected);
    }

    #[test]
    fn inverted_range_message_matches_form_copy() {
        assert_eq!(
            CatalogQueryError::InvertedPriceRange.to_string(),
            "Minimum price cannot be greater than maximum price"
        );
    }

    #[test]
    fn local_filters_apply_price_bounds_and_stock() {
        let query = CatalogQuery::default()
            .with_price_range(Some(Decimal::from(10)), Some(Decimal::from(20)))
            .only_in_stock();
        let cheap = Product::new(ProductId::new(1), "Cheap", Decimal::from(5), 3);
        let fits = Product::new(ProductId::new(2), "Fits", Decimal::from(15), 3);
        let sold_out = Product::new(ProductId::new(3), "Sold out", Decimal::from(15), 0);

        assert!(query.has_local_filters());
        assert!(!query.matches_local_filters(&cheap));
        assert!(query.matches_local_filters(&fits));
        assert!(!query.matches_local_filters(&sold_out));
    }

    #[rstest]
    #[case("createdAt", SortField::CreatedAt)]
    #[case("rating", SortField::Rating)]
    fn sort_field_parses_wire_names(#[case] input: &str, #[case] expected: SortField) {
        assert_eq!(input.parse::<SortField>(), Ok(expected));
    }

    #[test]
    fn unknown_sort_order_is_rejected() {
        assert!(matches!(
            "sideways".parse::<SortOrder>(),
            Err(CatalogQueryError::UnknownSortOrder { .. })
        ));
    }
}
