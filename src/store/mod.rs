//! Product store module
//!
//! Owns persistence of catalog products. Handlers only see the
//! [`ProductStore`] trait; the server wires in [`PgProductStore`] at boot.

#[cfg(test)]
pub mod memory;
mod model;
mod postgres;
mod seed;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use model::{NewProduct, Product};
pub use postgres::PgProductStore;
pub use seed::load_seed_file;

#[cfg(test)]
pub use model::PLACEHOLDER_IMAGE_URL;

/// Errors raised by the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] sqlx::Error),
    #[error("statement timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Parameterized CRUD over the `products` table
///
/// Listings are ordered by `created_at` descending (newest first).
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Create the table if it does not exist yet
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    async fn list_all(&self) -> Result<Vec<Product>, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Product>, StoreError>;

    /// Insert a product and return its generated id
    async fn insert(&self, product: &NewProduct) -> Result<i64, StoreError>;

    /// Replace every attribute of an existing product. Returns false if absent.
    async fn update(&self, id: i64, product: &NewProduct) -> Result<bool, StoreError>;

    /// Returns false if the product did not exist
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Case-insensitive substring match over name, description and origin
    async fn search(&self, text: &str) -> Result<Vec<Product>, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    /// Insert `products` only when the table is empty.
    ///
    /// Check-then-insert: not safe against concurrent seeders, run it at boot only.
    async fn seed(&self, products: &[NewProduct]) -> Result<usize, StoreError> {
        if self.count().await? > 0 {
            return Ok(0);
        }
        for product in products {
            self.insert(product).await?;
        }
        Ok(products.len())
    }
}
