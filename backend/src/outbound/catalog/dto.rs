//! DTOs for decoding catalogue API responses.
//!
//! Product payloads already match the domain shape; the wrappers here carry
//! the paging envelope and the two category formats the API has served.

use pagination::Page;
use serde::Deserialize;

use crate::domain::Product;

#[derive(Debug, Deserialize)]
pub(super) struct ProductsResponseDto {
    #[serde(default)]
    pub(super) products: Vec<Product>,
    pub(super) total: u64,
    pub(super) skip: u64,
    pub(super) limit: u32,
}

impl ProductsResponseDto {
    pub(super) fn into_domain_page(self) -> Page<Product> {
        Page::new(self.products, self.total, self.skip, self.limit)
    }
}

/// Older API versions list bare slugs; newer ones list objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum CategoryDto {
    Slug(String),
    Detailed { slug: String },
}

impl CategoryDto {
    pub(super) fn into_slug(self) -> String {
        match self {
            Self::Slug(slug) | Self::Detailed { slug } => slug,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBodyDto {
    pub(super) message: Option<String>,
}
