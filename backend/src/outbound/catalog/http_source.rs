//! Reqwest-backed catalogue adapter.
//!
//! This adapter owns transport details only: URL construction, timeout and
//! HTTP error mapping, and JSON decoding into domain products. Client-side
//! filters (price bounds, stock) are left to the domain.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::dto::{CategoryDto, ErrorBodyDto, ProductsResponseDto};
use crate::domain::ports::{CatalogService, CatalogServiceError, ProductsPage};
use crate::domain::{CatalogQuery, ListingEndpoint, Product, ProductId};

const NETWORK_ERROR_MESSAGE: &str = "Network error - please check your connection";
const FALLBACK_ERROR_MESSAGE: &str = "An error occurred";

/// Catalogue adapter issuing HTTP GET requests below one base URL.
pub struct HttpCatalogService {
    client: Client,
    base_url: Url,
}

impl HttpCatalogService {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    async fn get(&self, url: Url) -> Result<(StatusCode, Vec<u8>), CatalogServiceError> {
        debug!(%url, "catalog request");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        debug!(status = status.as_u16(), bytes = body.len(), "catalog response");
        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl CatalogService for HttpCatalogService {
    async fn fetch_products(
        &self,
        query: &CatalogQuery,
    ) -> Result<ProductsPage, CatalogServiceError> {
        let url = listing_url(&self.base_url, query)?;
        let (status, body) = self.get(url).await?;
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }
        decode::<ProductsResponseDto>(&body).map(ProductsResponseDto::into_domain_page)
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, CatalogServiceError> {
        let id = id.to_string();
        let url = endpoint_url(&self.base_url, &["products", id.as_str()])?;
        let (status, body) = self.get(url).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }
        decode::<Product>(&body).map(Some)
    }

    async fn fetch_categories(&self) -> Result<Vec<String>, CatalogServiceError> {
        let url = endpoint_url(&self.base_url, &["products", "categories"])?;
        let (status, body) = self.get(url).await?;
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }
        let categories = decode::<Vec<CategoryDto>>(&body)?;
        Ok(categories.into_iter().map(CategoryDto::into_slug).collect())
    }
}

fn endpoint_url(base_url: &Url, segments: &[&str]) -> Result<Url, CatalogServiceError> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|()| {
            CatalogServiceError::invalid_request(format!("{base_url} cannot be a base URL"))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn listing_url(base_url: &Url, query: &CatalogQuery) -> Result<Url, CatalogServiceError> {
    let endpoint = query.endpoint();
    let mut url = match &endpoint {
        ListingEndpoint::All => endpoint_url(base_url, &["products"])?,
        ListingEndpoint::Search { .. } => endpoint_url(base_url, &["products", "search"])?,
        ListingEndpoint::Category { slug } => {
            endpoint_url(base_url, &["products", "category", slug.as_str()])?
        }
    };
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in query.paging_params() {
            pairs.append_pair(key, &value);
        }
        if let ListingEndpoint::Search { text } = &endpoint {
            pairs.append_pair("q", text);
        }
    }
    Ok(url)
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, CatalogServiceError> {
    serde_json::from_slice(body).map_err(|error| {
        CatalogServiceError::decode(format!("invalid catalog JSON payload: {error}"))
    })
}

fn map_transport_error(error: reqwest::Error) -> CatalogServiceError {
    debug!(%error, "catalog transport failure");
    if error.is_timeout() {
        CatalogServiceError::timeout(NETWORK_ERROR_MESSAGE)
    } else {
        CatalogServiceError::transport(NETWORK_ERROR_MESSAGE)
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> CatalogServiceError {
    match status {
        StatusCode::NOT_FOUND => CatalogServiceError::not_found("Resource not found"),
        StatusCode::INTERNAL_SERVER_ERROR => {
            CatalogServiceError::status(status.as_u16(), "Internal server error")
        }
        StatusCode::SERVICE_UNAVAILABLE => {
            CatalogServiceError::status(status.as_u16(), "Service unavailable")
        }
        _ => CatalogServiceError::status(status.as_u16(), body_message(body)),
    }
}

fn body_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBodyDto>(body)
        .ok()
        .and_then(|dto| dto.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_owned())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network catalogue mapping helpers.

    use super::*;
    use crate::domain::{SortField, SortOrder};
    use pagination::PageRequest;
    use rstest::{fixture, rstest};

    #[fixture]
    fn base_url() -> Url {
        Url::parse("https://dummyjson.com").expect("valid base URL")
    }

    #[rstest]
    fn listing_url_carries_paging_and_sorting(base_url: Url) {
        let query = CatalogQuery::default()
            .with_page(PageRequest::new(3, 20).expect("valid page"))
            .sorted_by(SortField::Price, SortOrder::Desc);

        let url = listing_url(&base_url, &query).expect("url");
        assert_eq!(
            url.as_str(),
            "https://dummyjson.com/products?limit=20&skip=40&sortBy=price&order=desc"
        );
    }

    #[rstest]
    fn search_takes_precedence_over_category(base_url: Url) {
        let query = CatalogQuery::default()
            .with_search("phone case")
            .with_category("smartphones");

        let url = listing_url(&base_url, &query).expect("url");
        assert_eq!(url.path(), "/products/search");
        assert_eq!(
            url.query(),
            Some("limit=20&skip=0&sortBy=title&order=asc&q=phone+case")
        );
    }

    #[rstest]
    fn category_listing_encodes_the_slug(base_url: Url) {
        let query = CatalogQuery::default().with_category("home decoration");
        let url = listing_url(&base_url, &query).expect("url");
        assert_eq!(url.path(), "/products/category/home%20decoration");
    }

    #[test]
    fn endpoint_url_respects_base_path() {
        let base = Url::parse("http://localhost:8080/api/").expect("base");
        let url = endpoint_url(&base, &["products", "7"]).expect("url");
        assert_eq!(url.as_str(), "http://localhost:8080/api/products/7");
    }

    #[test]
    fn endpoint_url_rejects_opaque_base() {
        let base = Url::parse("mailto:shop@example.com").expect("base");
        let error = endpoint_url(&base, &["products"]).expect_err("opaque base");
        assert!(matches!(error, CatalogServiceError::InvalidRequest { .. }));
    }

    #[rstest]
    #[case::not_found(StatusCode::NOT_FOUND, b"".as_slice(), "Resource not found")]
    #[case::server_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        b"".as_slice(),
        "Internal server error"
    )]
    #[case::unavailable(StatusCode::SERVICE_UNAVAILABLE, b"".as_slice(), "Service unavailable")]
    #[case::body_message(
        StatusCode::BAD_REQUEST,
        br#"{"message":"Invalid sort field"}"#.as_slice(),
        "Invalid sort field"
    )]
    #[case::fallback(StatusCode::BAD_GATEWAY, b"<html>".as_slice(), "An error occurred")]
    fn maps_statuses_to_shopper_messages(
        #[case] status: StatusCode,
        #[case] body: &[u8],
        #[case] expected: &str,
    ) {
        let error = map_status_error(status, body);
        assert_eq!(error.message(), expected);
    }

    #[test]
    fn not_found_maps_to_not_found_variant() {
        let error = map_status_error(StatusCode::NOT_FOUND, b"{}");
        assert!(matches!(error, CatalogServiceError::NotFound { .. }));
    }

    #[test]
    fn decodes_products_envelope() {
        let body = br#"{
            "products": [
                {
                    "id": 1,
                    "title": "Essence Mascara Lash Princess",
                    "description": "Popular mascara",
                    "category": "beauty",
                    "price": 9.99,
                    "discountPercentage": 7.17,
                    "rating": 4.94,
                    "stock": 5,
                    "tags": ["beauty", "mascara"],
                    "brand": "Essence",
                    "images": ["https://cdn.example/1.png"],
                    "thumbnail": "https://cdn.example/thumb.png"
                }
            ],
            "total": 194,
            "skip": 0,
            "limit": 1
        }"#;

        let page = decode::<ProductsResponseDto>(body)
            .map(ProductsResponseDto::into_domain_page)
            .expect("payload decodes");
        assert_eq!(page.total, 194);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].stock, 5);
        assert_eq!(page.items[0].brand.as_deref(), Some("Essence"));
    }

    #[rstest]
    #[case::slugs(br#"["beauty","fragrances"]"#.as_slice())]
    #[case::objects(
        br#"[{"slug":"beauty","name":"Beauty","url":"https://dummyjson.com/c/beauty"},
             {"slug":"fragrances","name":"Fragrances","url":"https://dummyjson.com/c/fragrances"}]"#
            .as_slice()
    )]
    fn decodes_both_category_shapes(#[case] body: &[u8]) {
        let categories: Vec<String> = decode::<Vec<CategoryDto>>(body)
            .expect("categories decode")
            .into_iter()
            .map(CategoryDto::into_slug)
            .collect();
        assert_eq!(categories, vec!["beauty".to_owned(), "fragrances".to_owned()]);
    }

    #[test]
    fn rejects_payload_without_required_product_fields() {
        let error = decode::<Product>(br#"{"title":"No id"}"#).expect_err("decode fails");
        assert!(matches!(error, CatalogServiceError::Decode { .. }));
    }
}
