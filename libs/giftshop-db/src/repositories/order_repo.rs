use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::store::{Order, OrderStatus, OrderWithProduct, PayMethod, PaymentReceipt};

const ORDER_COLUMNS: &str = "id, user_tg_id, user_id, product_id, pay_method, currency, amount, status, invoice_token, gift_delivered, delivered_code, provider_charge_id, paid_at, fulfilled_at, created_at";

const ORDER_COLUMNS_PREFIXED: &str = "o.id, o.user_tg_id, o.user_id, o.product_id, o.pay_method, o.currency, o.amount, o.status, o.invoice_token, o.gift_delivered, o.delivered_code, o.provider_charge_id, o.paid_at, o.fulfilled_at, o.created_at";

pub fn new_invoice_token() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_tg_id: i64,
        user_id: i64,
        product_id: i64,
        pay_method: PayMethod,
        currency: &str,
        amount: i64,
    ) -> Result<Order> {
        let token = new_invoice_token();
        sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (user_tg_id, user_id, product_id, pay_method, currency, amount, status, invoice_token)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(user_tg_id)
        .bind(user_id)
        .bind(product_id)
        .bind(pay_method.as_str())
        .bind(currency)
        .bind(amount)
        .bind(OrderStatus::InvoiceSent.as_str())
        .bind(&token)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create order")
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<Order>> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE invoice_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch order by token")
    }

    pub async fn list_for_user(&self, user_tg_id: i64, limit: i64) -> Result<Vec<OrderWithProduct>> {
        sqlx::query_as::<_, OrderWithProduct>(&format!(
            r#"
            SELECT {ORDER_COLUMNS_PREFIXED}, p.title AS product_title
            FROM orders o
            JOIN products p ON o.product_id = p.id
            WHERE o.user_tg_id = $1
            ORDER BY o.id DESC
            LIMIT $2
            "#
        ))
        .bind(user_tg_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch user orders")
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<OrderWithProduct>> {
        sqlx::query_as::<_, OrderWithProduct>(&format!(
            r#"
            SELECT {ORDER_COLUMNS_PREFIXED}, p.title AS product_title
            FROM orders o
            JOIN products p ON o.product_id = p.id
            ORDER BY o.id DESC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch recent orders")
    }

    /// `invoice_sent -> paid`. Returns `false` (and changes nothing) when the
    /// order is already past `invoice_sent`, so redelivered confirmations are harmless.
    pub async fn mark_paid(&self, token: &str, receipt: &PaymentReceipt) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, paid_at = CURRENT_TIMESTAMP, provider_charge_id = $2
            WHERE invoice_token = $3 AND status = $4
            "#,
        )
        .bind(OrderStatus::Paid.as_str())
        .bind(receipt.provider_charge_id.as_deref())
        .bind(token)
        .bind(OrderStatus::InvoiceSent.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to mark order paid")?;
        Ok(result.rows_affected() > 0)
    }

    /// Row-locked read used inside the fulfillment transaction.
    pub async fn lock_by_token(
        conn: &mut PgConnection,
        token: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE invoice_token = $1 FOR UPDATE"
        ))
        .bind(token)
        .fetch_optional(conn)
        .await
    }

    pub async fn mark_fulfilled(
        conn: &mut PgConnection,
        order_id: i64,
        code: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, gift_delivered = TRUE, delivered_code = $2, fulfilled_at = CURRENT_TIMESTAMP
            WHERE id = $3
            "#,
        )
        .bind(OrderStatus::Fulfilled.as_str())
        .bind(code)
        .bind(order_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn mark_failed(conn: &mut PgConnection, order_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
            .bind(OrderStatus::Failed.as_str())
            .bind(order_id)
            .bind(OrderStatus::Paid.as_str())
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn count_for_product(&self, product_id: i64) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count orders for product")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_tokens_are_opaque_and_unique() {
        let a = new_invoice_token();
        let b = new_invoice_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
