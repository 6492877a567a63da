use std::time::Duration;

use giftshop_db::models::store::OrderStatus;
use giftshop_db::repositories::gift_code_repo::GiftCodeRepository;
use giftshop_db::repositories::order_repo::OrderRepository;
use giftshop_db::repositories::product_repo::ProductRepository;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::{ShopError, ShopResult};

const RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// Result of a fulfillment call. `newly_allocated` is false when the order had
/// already been fulfilled and the stored code is handed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub order_id: i64,
    pub product_id: i64,
    pub code: String,
    pub newly_allocated: bool,
}

enum AttemptError {
    /// Lock contention or a lost claim; the whole attempt is rerun.
    Conflict(String),
    Fatal(ShopError),
}

impl From<sqlx::Error> for AttemptError {
    fn from(err: sqlx::Error) -> Self {
        if is_transient(&err) {
            AttemptError::Conflict(err.to_string())
        } else {
            AttemptError::Fatal(ShopError::Database(err))
        }
    }
}

impl From<ShopError> for AttemptError {
    fn from(err: ShopError) -> Self {
        AttemptError::Fatal(err)
    }
}

/// Serialization failures and deadlocks.
pub fn is_transient(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "40001" || code == "40P01")
}

#[derive(Debug, Clone)]
pub struct FulfillmentService {
    pool: PgPool,
    max_attempts: u32,
}

impl FulfillmentService {
    pub fn new(pool: PgPool, max_attempts: u32) -> Self {
        Self {
            pool,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Binds one unused code to the paid order behind `token`, exactly once.
    ///
    /// On `OutOfStock` nothing is written and the order stays `paid`.
    pub async fn fulfill(&self, token: &str) -> ShopResult<Delivery> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_fulfill(token).await {
                Ok(delivery) => return Ok(delivery),
                Err(AttemptError::Fatal(err)) => return Err(err),
                Err(AttemptError::Conflict(reason)) if attempt < self.max_attempts => {
                    warn!(
                        "Fulfillment conflict for order {} (attempt {}/{}): {}",
                        token, attempt, self.max_attempts, reason
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(AttemptError::Conflict(reason)) => {
                    return Err(ShopError::Store(anyhow::anyhow!(
                        "Fulfillment of order {} kept conflicting after {} attempts: {}",
                        token,
                        attempt,
                        reason
                    )));
                }
            }
        }
    }

    async fn try_fulfill(&self, token: &str) -> Result<Delivery, AttemptError> {
        let mut tx = self.pool.begin().await?;

        let order = OrderRepository::lock_by_token(&mut *tx, token)
            .await?
            .ok_or_else(|| ShopError::OrderNotFound(token.to_string()))?;

        match order.status {
            OrderStatus::Fulfilled => {
                let code = order.delivered_code.clone().ok_or_else(|| {
                    ShopError::Store(anyhow::anyhow!(
                        "Order {} is fulfilled but has no delivered code",
                        order.id
                    ))
                })?;
                info!("Order {} already fulfilled, returning stored code", order.id);
                return Ok(Delivery {
                    order_id: order.id,
                    product_id: order.product_id,
                    code,
                    newly_allocated: false,
                });
            }
            OrderStatus::Failed => return Err(ShopError::OrderFailed(token.to_string()).into()),
            OrderStatus::InvoiceSent => return Err(ShopError::NotPaid(token.to_string()).into()),
            OrderStatus::Paid => {}
        }

        if !ProductRepository::lock_for_claim(&mut *tx, order.product_id).await? {
            OrderRepository::mark_failed(&mut *tx, order.id).await?;
            tx.commit().await?;
            warn!(
                "Order {} failed: product {} no longer exists",
                order.id, order.product_id
            );
            return Err(ShopError::ProductGone {
                token: token.to_string(),
                product_id: order.product_id,
            }
            .into());
        }

        let Some(gift) = GiftCodeRepository::claim_one_unused(&mut *tx, order.product_id).await?
        else {
            tx.rollback().await?;
            warn!(
                "Order {} paid but product {} is out of stock",
                order.id, order.product_id
            );
            return Err(ShopError::OutOfStock(order.product_id).into());
        };

        if !GiftCodeRepository::mark_used(&mut *tx, gift.id, order.id).await? {
            return Err(AttemptError::Conflict(format!(
                "code {} was consumed concurrently",
                gift.id
            )));
        }
        OrderRepository::mark_fulfilled(&mut *tx, order.id, &gift.code).await?;
        tx.commit().await?;

        info!(
            "Order {} fulfilled with code #{} (product {})",
            order.id, gift.id, order.product_id
        );
        Ok(Delivery {
            order_id: order.id,
            product_id: order.product_id,
            code: gift.code,
            newly_allocated: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_transient() {
        assert!(!is_transient(&sqlx::Error::RowNotFound));
        assert!(!is_transient(&sqlx::Error::PoolTimedOut));
    }

    #[test]
    fn conflict_conversion_keeps_fatal_errors() {
        let converted: AttemptError = sqlx::Error::RowNotFound.into();
        assert!(matches!(
            converted,
            AttemptError::Fatal(ShopError::Database(sqlx::Error::RowNotFound))
        ));
    }
}
