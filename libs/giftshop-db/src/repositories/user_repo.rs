use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::store::User;

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// First contact inserts; later contacts refresh the display fields.
    pub async fn upsert(
        &self,
        tg_id: i64,
        first_name: Option<&str>,
        username: Option<&str>,
    ) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (tg_id, first_name, username)
            VALUES ($1, $2, $3)
            ON CONFLICT(tg_id) DO UPDATE SET
                first_name = excluded.first_name,
                username = excluded.username,
                updated_at = CURRENT_TIMESTAMP
            RETURNING id, tg_id, first_name, username, created_at, updated_at
            "#,
        )
        .bind(tg_id)
        .bind(first_name)
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .context("Failed to upsert user")
    }
}
