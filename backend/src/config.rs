//! Storefront configuration loaded via OrthoConfig.
//!
//! Every value is optional in the environment (`STOREFRONT_*`) and in
//! configuration files; accessors fall back to the defaults below.

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

const DEFAULT_CATALOG_BASE_URL: &str = "https://dummyjson.com";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STORAGE_DIR: &str = ".storefront";

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// The catalogue base URL does not parse.
    #[error("invalid catalog base URL {value:?}: {message}")]
    InvalidCatalogUrl {
        /// Configured value.
        value: String,
        /// Parser message.
        message: String,
    },
    /// A numeric setting must be positive.
    #[error("{name} must be greater than zero")]
    NotPositive {
        /// Setting name.
        name: &'static str,
    },
}

/// Configuration for the storefront CLI.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STOREFRONT")]
pub struct StorefrontSettings {
    /// Base URL of the products API.
    pub catalog_base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Directory holding the persisted cart.
    pub storage_dir: Option<Utf8PathBuf>,
    /// Products per listing page.
    pub page_size: Option<u32>,
}

impl StorefrontSettings {
    /// Parsed catalogue base URL, falling back to the public DummyJSON API.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidCatalogUrl`] when the value does not
    /// parse.
    pub fn catalog_base_url(&self) -> Result<Url, SettingsError> {
        let raw = self
            .catalog_base_url
            .as_deref()
            .unwrap_or(DEFAULT_CATALOG_BASE_URL);
        Url::parse(raw).map_err(|err| SettingsError::InvalidCatalogUrl {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    /// Request timeout, defaulting to ten seconds.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NotPositive`] for a zero timeout.
    pub fn request_timeout(&self) -> Result<Duration, SettingsError> {
        match self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS) {
            0 => Err(SettingsError::NotPositive {
                name: "request_timeout_secs",
            }),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    /// Cart storage directory.
    pub fn storage_dir(&self) -> Utf8PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_STORAGE_DIR))
    }

    /// Listing page size.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NotPositive`] for a zero page size.
    pub fn page_size(&self) -> Result<u32, SettingsError> {
        match self.page_size.unwrap_or(pagination::DEFAULT_PAGE_SIZE) {
            0 => Err(SettingsError::NotPositive { name: "page_size" }),
            size => Ok(size),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for storefront configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 4] = [
        "STOREFRONT_CATALOG_BASE_URL",
        "STOREFRONT_REQUEST_TIMEOUT_SECS",
        "STOREFRONT_STORAGE_DIR",
        "STOREFRONT_PAGE_SIZE",
    ];

    fn load() -> StorefrontSettings {
        StorefrontSettings::load_from_iter([OsString::from("storefront")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load();
        assert_eq!(
            settings.catalog_base_url().expect("default URL").as_str(),
            "https://dummyjson.com/"
        );
        assert_eq!(settings.request_timeout(), Ok(Duration::from_secs(10)));
        assert_eq!(settings.storage_dir(), Utf8PathBuf::from(".storefront"));
        assert_eq!(settings.page_size(), Ok(20));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            (
                "STOREFRONT_CATALOG_BASE_URL",
                Some("http://localhost:4000/api".to_owned()),
            ),
            ("STOREFRONT_REQUEST_TIMEOUT_SECS", Some("3".to_owned())),
            ("STOREFRONT_STORAGE_DIR", Some("/tmp/storefront-cart".to_owned())),
            ("STOREFRONT_PAGE_SIZE", Some("12".to_owned())),
        ]);

        let settings = load();
        assert_eq!(
            settings.catalog_base_url().expect("override URL").as_str(),
            "http://localhost:4000/api"
        );
        assert_eq!(settings.request_timeout(), Ok(Duration::from_secs(3)));
        assert_eq!(
            settings.storage_dir(),
            Utf8PathBuf::from("/tmp/storefront-cart")
        );
        assert_eq!(settings.page_size(), Ok(12));
    }

    #[rstest]
    fn invalid_values_are_reported_by_accessors() {
        let _guard = lock_env([
            ("STOREFRONT_CATALOG_BASE_URL", Some("not a url".to_owned())),
            ("STOREFRONT_REQUEST_TIMEOUT_SECS", Some("0".to_owned())),
            ("STOREFRONT_STORAGE_DIR", None),
            ("STOREFRONT_PAGE_SIZE", Some("0".to_owned())),
        ]);

        let settings = load();
        assert!(matches!(
            settings.catalog_base_url(),
            Err(SettingsError::InvalidCatalogUrl { .. })
        ));
        assert_eq!(
            settings.request_timeout(),
            Err(SettingsError::NotPositive {
                name: "request_timeout_secs"
            })
        );
        assert_eq!(
            settings.page_size(),
            Err(SettingsError::NotPositive { name: "page_size" })
        );
    }
}
