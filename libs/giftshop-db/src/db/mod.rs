use anyhow::{Context, Result};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 20,
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must start with postgres:// or postgresql://"
            ));
        }
        Ok(())
    }
}

pub async fn init_db(config: &DbConfig) -> Result<PgPool> {
    config.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    migrate(&pool).await?;
    info!("Database ready (max_connections={})", config.max_connections);

    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_postgres_urls() {
        assert!(DbConfig::new("sqlite://shop.db").validate().is_err());
        assert!(DbConfig::new("postgres://localhost/shop").validate().is_ok());
        assert!(DbConfig::new("postgresql://localhost/shop").validate().is_ok());
    }
}
