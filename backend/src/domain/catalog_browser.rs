//! Catalogue browsing service.
//!
//! Wraps a [`CatalogService`] port with query validation, client-side price
//! and stock filtering, product-detail retries, and infinite-listing state.
//! Port failures become domain [`Error`] values whose message is the
//! shopper-facing text produced by the adapter.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

use crate::domain::ports::{CatalogService, CatalogServiceError, ProductsPage};
use crate::domain::{CatalogQuery, Error, Product, ProductId};

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retry settings for product-detail fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Retry without waiting between attempts.
    pub const fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Duration::ZERO,
        }
    }

    fn delay_before(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry.saturating_sub(1));
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

/// Products accumulated across successive listing pages.
#[derive(Debug, Clone)]
pub struct ProductFeed {
    query: CatalogQuery,
    products: Vec<Product>,
    pages_loaded: u32,
    total: Option<u64>,
}

impl ProductFeed {
    /// Start an empty feed for the query. Its page number is ignored; the
    /// feed always starts at page one.
    pub fn new(query: CatalogQuery) -> Self {
        Self {
            query,
            products: Vec::new(),
            pages_loaded: 0,
            total: None,
        }
    }

    /// Products loaded so far.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of pages loaded so far.
    pub fn pages_loaded(&self) -> u32 {
        self.pages_loaded
    }

    /// Upstream total reported by the most recent page.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Page to request next, or `None` once every page has been loaded.
    pub fn next_page(&self) -> Option<u32> {
        match self.total {
            None => Some(1),
            Some(total) => {
                pagination::next_page_after(total, self.query.page.limit(), self.pages_loaded)
            }
        }
    }

    /// Whether more pages remain.
    pub fn has_more(&self) -> bool {
        self.next_page().is_some()
    }
}

/// Domain service for reading the catalogue.
#[derive(Clone)]
pub struct CatalogBrowser<C> {
    catalog: Arc<C>,
    retry: RetryPolicy,
}

impl<C> CatalogBrowser<C> {
    /// Create a browser with the default retry policy.
    pub fn new(catalog: Arc<C>) -> Self {
        Self {
            catalog,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl<C> CatalogBrowser<C>
where
    C: CatalogService,
{
    /// Fetch one page of products, applying the client-side filters.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error for bad price bounds and the mapped
    /// port error when the catalogue fails.
    pub async fn list_products(&self, query: &CatalogQuery) -> Result<ProductsPage, Error> {
        query.validate().map_err(|err| {
            Error::invalid_request(err.to_string()).with_details(json!({
                "minPrice": query.min_price,
                "maxPrice": query.max_price,
            }))
        })?;

        let mut page = self
            .catalog
            .fetch_products(query)
            .await
            .map_err(map_catalog_error)?;
        if query.has_local_filters() {
            page.items.retain(|product| query.matches_local_filters(product));
        }
        Ok(page)
    }

    /// Load the next page into the feed.
    ///
    /// Returns `false` without calling the catalogue when every page is
    /// already loaded.
    ///
    /// # Errors
    ///
    /// Returns the listing error; the feed is left unchanged.
    pub async fn load_next(&self, feed: &mut ProductFeed) -> Result<bool, Error> {
        let Some(next) = feed.next_page() else {
            return Ok(false);
        };
        let request = pagination::PageRequest::new(next, feed.query.page.limit())
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let query = feed.query.clone().with_page(request);
        let page = self.list_products(&query).await?;

        feed.total = Some(page.total);
        feed.pages_loaded = next;
        feed.products.extend(page.items);
        Ok(true)
    }

    /// Fetch one product, retrying failures other than not-found.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for unknown ids and the last mapped port
    /// error once retries are exhausted.
    pub async fn product(&self, id: ProductId) -> Result<Product, Error> {
        let mut retry = 0;
        loop {
            match self.catalog.fetch_product(id).await {
                Ok(Some(product)) => return Ok(product),
                Ok(None) => return Err(Error::not_found("Resource not found")),
                Err(err @ CatalogServiceError::NotFound { .. }) => {
                    return Err(map_catalog_error(err));
                }
                Err(err) if retry < self.retry.max_retries => {
                    retry += 1;
                    let delay = self.retry.delay_before(retry);
                    warn!(product_id = %id, retry, ?delay, error = %err, "retrying product fetch");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(map_catalog_error(err)),
            }
        }
    }

    /// Fetch the category slugs.
    ///
    /// # Errors
    ///
    /// Returns the mapped port error.
    pub async fn categories(&self) -> Result<Vec<String>, Error> {
        let categories = self
            .catalog
            .fetch_categories()
            .await
            .map_err(map_catalog_error)?;
        debug!(count = categories.len(), "categories fetched");
        Ok(categories)
    }
}

fn map_catalog_error(error: CatalogServiceError) -> Error {
    match error {
        CatalogServiceError::NotFound { message } => Error::not_found(message),
        CatalogServiceError::Timeout { message } | CatalogServiceError::Transport { message } => {
            Error::service_unavailable(message)
        }
        CatalogServiceError::Status { status, message } if status == 503 => {
            Error::service_unavailable(message).with_details(json!({ "status": status }))
        }
        CatalogServiceError::Status { status, message } => {
            Error::internal(message).with_details(json!({ "status": status }))
        }
        CatalogServiceError::Decode { message } => Error::internal(message),
        CatalogServiceError::InvalidRequest { message } => Error::invalid_request(message),
    }
}

#[cfg(test)]
#[path = "catalog_browser_tests.rs"]
mod tests;
