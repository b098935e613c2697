use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, QueryBuilder, Sqlite};

use super::{ProductStore, StoreError, StoreResult};
use crate::models::product::{NewProduct, Product, ProductPatch};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(45) NOT NULL,
    description VARCHAR(100),
    price REAL NOT NULL CHECK (price > 0),
    stocks INTEGER NOT NULL DEFAULT 0 CHECK (stocks >= 0)
)";

const SELECT_COLUMNS: &str = "SELECT id, name, description, price, stocks FROM products";

#[derive(Debug, Clone)]
pub struct SqliteProductStore {
    pool: SqlitePool,
}

impl SqliteProductStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the `products` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

/// Unicode-aware, unanchored, case-insensitive match. SQLite's `LOWER`
/// only folds ASCII, so names are compared here instead of in SQL.
fn name_matches(name: &str, needle: &str) -> bool {
    name.to_lowercase().contains(needle)
}

#[async_trait]
impl ProductStore for SqliteProductStore {
    async fn create(&self, product: &NewProduct) -> StoreResult<i64> {
        let result = sqlx::query(
            "INSERT INTO products (name, description, price, stocks) VALUES (?, ?, ?, ?)",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stocks)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn list(&self) -> StoreResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!("{SELECT_COLUMNS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn search_by_name(&self, term: &str) -> StoreResult<Vec<Product>> {
        let needle = term.to_lowercase();
        let products = self.list().await?;
        Ok(products
            .into_iter()
            .filter(|p| name_matches(&p.name, &needle))
            .collect())
    }

    async fn update(&self, id: i64, patch: &ProductPatch) -> StoreResult<()> {
        if patch.is_empty() {
            // nothing to write, but absence must still be reported
            return match self.get(id).await? {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound),
            };
        }

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE products SET ");
        let mut set = qb.separated(", ");
        if let Some(name) = &patch.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(description) = &patch.description {
            set.push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(price) = patch.price {
            set.push("price = ").push_bind_unseparated(price);
        }
        if let Some(stocks) = patch.stocks {
            set.push("stocks = ").push_bind_unseparated(stocks);
        }
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
