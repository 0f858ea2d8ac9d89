//! Postgres-backed product store

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::time::Duration;

use super::{NewProduct, Product, ProductStore, StoreError};
use crate::config::DatabaseConfig;

const CREATE_TABLE_SQL: &str = r"
CREATE TABLE IF NOT EXISTS products (
    id BIGSERIAL PRIMARY KEY,
    product_name VARCHAR(255) NOT NULL,
    image_url VARCHAR(500),
    origin VARCHAR(255) NOT NULL,
    specifications TEXT,
    quantity VARCHAR(255) NOT NULL,
    price NUMERIC(10, 2) NOT NULL DEFAULT 0 CHECK (price >= 0),
    energy_savings VARCHAR(50) NOT NULL DEFAULT '',
    description TEXT NOT NULL,
    eco BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

const CREATE_INDEX_SQL: &str =
    "CREATE INDEX IF NOT EXISTS products_created_at_idx ON products (created_at DESC, id DESC)";

const LIST_SQL: &str = "SELECT id, product_name, image_url, origin, specifications, quantity, \
     price, energy_savings, description, eco, created_at \
     FROM products ORDER BY created_at DESC, id DESC";

const GET_SQL: &str = "SELECT id, product_name, image_url, origin, specifications, quantity, \
     price, energy_savings, description, eco, created_at \
     FROM products WHERE id = $1";

const SEARCH_SQL: &str = "SELECT id, product_name, image_url, origin, specifications, quantity, \
     price, energy_savings, description, eco, created_at \
     FROM products \
     WHERE product_name ILIKE $1 OR description ILIKE $1 OR origin ILIKE $1 \
     ORDER BY created_at DESC, id DESC";

const INSERT_SQL: &str = "INSERT INTO products \
     (product_name, image_url, origin, specifications, quantity, price, energy_savings, description, eco) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id";

const UPDATE_SQL: &str = "UPDATE products SET product_name = $1, image_url = $2, origin = $3, \
     specifications = $4, quantity = $5, price = $6, energy_savings = $7, description = $8, eco = $9 \
     WHERE id = $10";

/// Product store over a shared `sqlx` connection pool
///
/// The pool is established once at boot by [`PgProductStore::connect`] and
/// reused for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PgProductStore {
    /// Connect to the database, failing fast if it is unreachable
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.connection_url())
            .await?;

        Ok(Self::new(
            pool,
            Duration::from_secs(config.statement_timeout_secs),
        ))
    }

    pub const fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run a query under the configured statement timeout
    async fn timed<T, F>(&self, query: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        match tokio::time::timeout(self.statement_timeout, query).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.statement_timeout)),
        }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.timed(sqlx::query(CREATE_TABLE_SQL).execute(&self.pool))
            .await?;
        self.timed(sqlx::query(CREATE_INDEX_SQL).execute(&self.pool))
            .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        self.timed(sqlx::query_as::<_, Product>(LIST_SQL).fetch_all(&self.pool))
            .await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Product>, StoreError> {
        self.timed(
            sqlx::query_as::<_, Product>(GET_SQL)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn insert(&self, product: &NewProduct) -> Result<i64, StoreError> {
        self.timed(
            sqlx::query_scalar::<_, i64>(INSERT_SQL)
                .bind(&product.product_name)
                .bind(product.image_url_or_placeholder())
                .bind(&product.origin)
                .bind(product.specifications.as_deref())
                .bind(&product.quantity)
                .bind(&product.price)
                .bind(&product.energy_savings)
                .bind(&product.description)
                .bind(product.eco)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn update(&self, id: i64, product: &NewProduct) -> Result<bool, StoreError> {
        let result = self
            .timed(
                sqlx::query(UPDATE_SQL)
                    .bind(&product.product_name)
                    .bind(product.image_url_or_placeholder())
                    .bind(&product.origin)
                    .bind(product.specifications.as_deref())
                    .bind(&product.quantity)
                    .bind(&product.price)
                    .bind(&product.energy_savings)
                    .bind(&product.description)
                    .bind(product.eco)
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = self
            .timed(
                sqlx::query("DELETE FROM products WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, text: &str) -> Result<Vec<Product>, StoreError> {
        let pattern = format!("%{}%", escape_like(text));
        self.timed(
            sqlx::query_as::<_, Product>(SEARCH_SQL)
                .bind(pattern)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn count(&self) -> Result<i64, StoreError> {
        self.timed(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products").fetch_one(&self.pool))
            .await
    }
}

/// Escape LIKE wildcards so user text only ever matches literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
