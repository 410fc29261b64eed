//! Test utilities for the storefront crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Only compiled with the `test-support` feature.

use rust_decimal::Decimal;

use crate::domain::ports::{CartStorage, CartStorageError};
use crate::domain::{Product, ProductId};

/// Build a product priced in whole currency units.
///
/// # Examples
///
/// ```rust
/// use rust_decimal::Decimal;
/// use storefront::test_support::product;
///
/// let lamp = product(1, "Lamp", 100, 5);
/// assert_eq!(lamp.price, Decimal::new(100, 0));
/// ```
pub fn product(id: u64, title: &str, price: i64, stock: u32) -> Product {
    Product::new(ProductId::new(id), title, Decimal::new(price, 0), stock)
}

/// Small catalogue spanning two categories, a discount, and a sold-out item.
pub fn sample_catalog() -> Vec<Product> {
    vec![
        product(1, "Desk Lamp", 100, 5).with_category("home-decoration"),
        product(2, "Wool Rug", 50, 3)
            .with_category("home-decoration")
            .with_discount(Decimal::new(10, 0)),
        product(3, "Mascara", 10, 40).with_category("beauty"),
        product(4, "Perfume", 80, 0).with_category("fragrances"),
    ]
}

/// Storage whose every operation fails with an I/O error.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingCartStorage;

impl CartStorage for FailingCartStorage {
    fn load(&self) -> Result<Option<String>, CartStorageError> {
        Err(CartStorageError::io("simulated read failure"))
    }

    fn save(&self, _snapshot: &str) -> Result<(), CartStorageError> {
        Err(CartStorageError::io("simulated write failure"))
    }

    fn clear(&self) -> Result<(), CartStorageError> {
        Err(CartStorageError::io("simulated remove failure"))
    }
}

pub mod cap_fs {
    //! Capability-scoped temporary directories for storage tests.

    use std::io;

    use cap_std::{ambient_authority, fs::Dir};
    use tempfile::TempDir;

    use crate::outbound::storage::FileCartStorage;

    /// Create a temporary directory and a file storage rooted in it.
    ///
    /// Keep the returned [`TempDir`] alive for as long as the storage is used.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the directory cannot be created or opened.
    pub fn temp_file_storage() -> io::Result<(TempDir, FileCartStorage)> {
        let temp_dir = tempfile::tempdir()?;
        let dir = Dir::open_ambient_dir(temp_dir.path(), ambient_authority())?;
        Ok((temp_dir, FileCartStorage::in_dir(dir)))
    }
}
