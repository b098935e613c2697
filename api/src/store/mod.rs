//! Product persistence.

pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::product::{NewProduct, Product, ProductPatch};

pub use sqlite::SqliteProductStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Connectivity(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-indexed product records. Implementations provide their own
/// atomicity; callers issue one logical operation at a time.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert and return the assigned id.
    async fn create(&self, product: &NewProduct) -> StoreResult<i64>;
    async fn get(&self, id: i64) -> StoreResult<Option<Product>>;
    async fn list(&self) -> StoreResult<Vec<Product>>;
    /// Case-insensitive substring match on `name`.
    async fn search_by_name(&self, term: &str) -> StoreResult<Vec<Product>>;
    /// Fails with [`StoreError::NotFound`] if `id` is absent.
    async fn update(&self, id: i64, patch: &ProductPatch) -> StoreResult<()>;
    /// Fails with [`StoreError::NotFound`] if `id` is absent.
    async fn delete(&self, id: i64) -> StoreResult<()>;
}
