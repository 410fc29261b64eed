//! Port for the read-only product catalogue.
//!
//! Adapters translate [`CatalogQuery`] values into upstream requests and
//! decode the responses into domain products. Each error variant carries a
//! shopper-facing `message`; callers surface it as-is and never interpret the
//! upstream payload themselves.

use std::cmp::Ordering;

use async_trait::async_trait;
use pagination::Page;

use super::define_port_error;
use crate::domain::{CatalogQuery, ListingEndpoint, Product, ProductId, SortField, SortOrder};

/// One page of catalogue products.
pub type ProductsPage = Page<Product>;

define_port_error! {
    /// Errors raised by catalogue adapters.
    pub enum CatalogServiceError {
        /// The requested resource does not exist upstream.
        NotFound { message: String } => "catalog resource not found: {message}",
        /// The request did not complete in time.
        Timeout { message: String } => "catalog request timed out: {message}",
        /// No response was received.
        Transport { message: String } => "catalog transport failed: {message}",
        /// The upstream answered with a non-success status.
        Status { status: u16, message: String } =>
            "catalog responded with status {status}: {message}",
        /// The response body could not be decoded.
        Decode { message: String } => "catalog payload could not be decoded: {message}",
        /// The request could not be built from the query.
        InvalidRequest { message: String } => "catalog request is invalid: {message}",
    }
}

impl CatalogServiceError {
    /// Shopper-facing message carried by the error.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message }
            | Self::Timeout { message }
            | Self::Transport { message }
            | Self::Status { message, .. }
            | Self::Decode { message }
            | Self::InvalidRequest { message } => message,
        }
    }
}

/// Read-only access to products and categories.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Fetch one page of products for the query.
    async fn fetch_products(&self, query: &CatalogQuery)
    -> Result<ProductsPage, CatalogServiceError>;

    /// Fetch one product, or `None` when the catalogue does not know the id.
    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, CatalogServiceError>;

    /// Fetch the category slugs.
    async fn fetch_categories(&self) -> Result<Vec<String>, CatalogServiceError>;
}

/// In-memory catalogue serving a fixed product list.
///
/// Applies search, category, sorting, and paging the way the upstream API
/// does, which keeps offline runs and tests representative.
#[derive(Debug, Default, Clone)]
pub struct FixtureCatalogService {
    products: Vec<Product>,
}

impl FixtureCatalogService {
    /// Serve the given products.
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    fn matches_endpoint(endpoint: &ListingEndpoint, product: &Product) -> bool {
        match endpoint {
            ListingEndpoint::All => true,
            ListingEndpoint::Search { text } => {
                let needle = text.to_lowercase();
                product.title.to_lowercase().contains(&needle)
                    || product.description.to_lowercase().contains(&needle)
            }
            ListingEndpoint::Category { slug } => product.category == *slug,
        }
    }

    fn compare(sort_by: SortField, left: &Product, right: &Product) -> Ordering {
        match sort_by {
            SortField::Title => left.title.cmp(&right.title),
            SortField::Price => left.price.cmp(&right.price),
            SortField::Rating => left.rating.total_cmp(&right.rating),
            SortField::CreatedAt => {
                let created = |product: &Product| {
                    product
                        .meta
                        .as_ref()
                        .map(|meta| meta.created_at.clone())
                        .unwrap_or_default()
                };
                created(left).cmp(&created(right))
            }
        }
    }
}

#[async_trait]
impl CatalogService for FixtureCatalogService {
    async fn fetch_products(
        &self,
        query: &CatalogQuery,
    ) -> Result<ProductsPage, CatalogServiceError> {
        let endpoint = query.endpoint();
        let mut matches: Vec<Product> = self
            .products
            .iter()
            .filter(|product| Self::matches_endpoint(&endpoint, product))
            .cloned()
            .collect();
        matches.sort_by(|left, right| {
            let ordering = Self::compare(query.sort_by, left, right);
            match query.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = u64::try_from(matches.len()).unwrap_or(u64::MAX);
        let skip = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.page.limit()).unwrap_or(usize::MAX);
        let items = matches.into_iter().skip(skip).take(limit).collect();
        Ok(Page::new(
            items,
            total,
            query.page.offset(),
            query.page.limit(),
        ))
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, CatalogServiceError> {
        Ok(self
            .products
            .iter()
            .find(|product| product.id == id)
            .cloned())
    }

    async fn fetch_categories(&self) -> Result<Vec<String>, CatalogServiceError> {
        let mut categories: Vec<String> = self
            .products
            .iter()
            .map(|product| product.category.clone())
            .filter(|category| !category.is_empty())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagination::PageRequest;
    use rstest::{fixture, rstest};
    use rust_decimal::Decimal;

    #[fixture]
    fn catalog() -> FixtureCatalogService {
        FixtureCatalogService::new(vec![
            Product::new(ProductId::new(1), "Mascara", Decimal::new(999, 2), 5)
                .with_category("beauty"),
            Product::new(ProductId::new(2), "Eyeshadow Palette", Decimal::new(1999, 2), 44)
                .with_category("beauty"),
            Product::new(ProductId::new(3), "Laptop", Decimal::new(99_900, 2), 2)
                .with_category("laptops"),
        ])
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_filters_by_category_and_sorts(catalog: FixtureCatalogService) {
        let query = CatalogQuery::default()
            .with_category("beauty")
            .sorted_by(SortField::Price, SortOrder::Desc);

        let page = catalog.fetch_products(&query).await.expect("listing");
        let ids: Vec<u64> = page.items.iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(page.total, 2);
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_pages_results(catalog: FixtureCatalogService) {
        let query =
            CatalogQuery::default().with_page(PageRequest::new(2, 2).expect("valid page"));

        let page = catalog.fetch_products(&query).await.expect("listing");
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.skip, 2);
        assert_eq!(page.total, 3);
        assert_eq!(page.next_page(2), None);
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_search_is_case_insensitive(catalog: FixtureCatalogService) {
        let query = CatalogQuery::default().with_search("LAPTOP");
        let page = catalog.fetch_products(&query).await.expect("listing");
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, ProductId::new(3));
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_lists_unique_categories(catalog: FixtureCatalogService) {
        let categories = catalog.fetch_categories().await.expect("categories");
        assert_eq!(categories, vec!["beauty".to_owned(), "laptops".to_owned()]);
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_returns_none_for_unknown_product(catalog: FixtureCatalogService) {
        let product = catalog
            .fetch_product(ProductId::new(404))
            .await
            .expect("lookup");
        assert!(product.is_none());
    }

    #[test]
    fn message_exposes_shopper_text() {
        let error = CatalogServiceError::status(503_u16, "Service unavailable");
        assert_eq!(error.message(), "Service unavailable");
    }
}
