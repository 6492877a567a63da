use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};

use crate::models::store::Product;

const PRODUCT_COLUMNS: &str = "id, title, description, price_provider, currency_provider, price_points, image_url, is_active, created_at";

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        title: &str,
        description: &str,
        price_provider: i64,
        currency_provider: &str,
        price_points: i64,
        image_url: &str,
    ) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO products (title, description, price_provider, currency_provider, price_points, image_url, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(price_provider)
        .bind(currency_provider)
        .bind(price_points)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create product")?;

        Ok(id)
    }

    /// Newest first. `active_only` is the buyer catalog; the admin overview passes `false`.
    pub async fn list(&self, active_only: bool) -> Result<Vec<Product>> {
        let sql = if active_only {
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = TRUE ORDER BY id DESC")
        } else {
            format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id DESC")
        };
        sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list products")
    }

    /// Buyer-facing lookup: inactive products are invisible.
    pub async fn get_active(&self, id: i64) -> Result<Option<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch active product")
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch product by ID")
    }

    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE products SET is_active = $1 WHERE id = $2")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update product visibility")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_prices(&self, id: i64, price_provider: i64, price_points: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE products SET price_provider = $1, price_points = $2 WHERE id = $3",
        )
        .bind(price_provider)
        .bind(price_points)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update product prices")?;
        Ok(result.rows_affected() > 0)
    }

    /// Serializes code claims for one product until the caller's transaction ends.
    /// Returns `false` when the product row no longer exists.
    pub async fn lock_for_claim(conn: &mut PgConnection, id: i64) -> Result<bool, sqlx::Error> {
        let locked = sqlx::query_scalar::<_, i64>("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(locked.is_some())
    }
}
