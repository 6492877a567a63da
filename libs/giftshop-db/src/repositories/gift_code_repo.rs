use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};

use crate::models::store::GiftCode;

/// Splits an upload into codes: one per non-blank line, trimmed.
/// Duplicates are kept as-is; the store does not deduplicate uploads.
pub fn parse_code_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct GiftCodeRepository {
    pool: PgPool,
}

impl GiftCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn add_codes(&self, product_id: i64, codes: &[String]) -> Result<u64> {
        let codes: Vec<&str> = codes
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        if codes.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;
        for code in codes {
            let result = sqlx::query(
                "INSERT INTO gift_codes (product_id, code, is_used) VALUES ($1, $2, FALSE)",
            )
            .bind(product_id)
            .bind(code)
            .execute(&mut *tx)
            .await
            .context("Failed to insert gift code")?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }

    pub async fn count_unused(&self, product_id: i64) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM gift_codes WHERE product_id = $1 AND is_used = FALSE",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count unused gift codes")
    }

    /// Lowest-id unused code for the product, row-locked until the caller's
    /// transaction ends.
    pub async fn claim_one_unused(
        conn: &mut PgConnection,
        product_id: i64,
    ) -> Result<Option<GiftCode>, sqlx::Error> {
        sqlx::query_as::<_, GiftCode>(
            r#"
            SELECT id, product_id, code, is_used, used_by_order_id, created_at
            FROM gift_codes
            WHERE product_id = $1 AND is_used = FALSE
            ORDER BY id ASC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(product_id)
        .fetch_optional(conn)
        .await
    }

    /// Returns `false` when the code was consumed by someone else first.
    pub async fn mark_used(
        conn: &mut PgConnection,
        code_id: i64,
        order_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE gift_codes SET is_used = TRUE, used_by_order_id = $1 WHERE id = $2 AND is_used = FALSE",
        )
        .bind(order_id)
        .bind(code_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_lines_and_trims() {
        let codes = parse_code_lines("  A1 \n\n\tA2\r\n   \nA3");
        assert_eq!(codes, vec!["A1", "A2", "A3"]);
    }

    #[test]
    fn keeps_duplicate_codes() {
        let codes = parse_code_lines("DUP\nDUP\n");
        assert_eq!(codes, vec!["DUP", "DUP"]);
    }

    #[test]
    fn empty_upload_yields_nothing() {
        assert!(parse_code_lines("\n \n").is_empty());
    }
}
