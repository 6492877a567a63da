use giftshop_db::models::store::{Order, OrderStatus, OrderWithProduct, PayMethod, PaymentReceipt};
use giftshop_db::repositories::order_repo::OrderRepository;
use sqlx::PgPool;
use tracing::info;

use crate::config::ShopConfig;
use crate::error::{ShopError, ShopResult};
use crate::models::payment::{Invoice, UserDisplay};
use crate::services::fulfillment_service::{Delivery, FulfillmentService};
use crate::services::store_service::StoreService;

/// Sequences purchase initiation, payment confirmation and fulfillment.
#[derive(Debug, Clone)]
pub struct OrderService {
    store: StoreService,
    order_repo: OrderRepository,
    fulfillment: FulfillmentService,
    provider_enabled: bool,
}

impl OrderService {
    pub fn new(pool: PgPool, store: StoreService, config: &ShopConfig) -> Self {
        Self {
            store,
            order_repo: OrderRepository::new(pool.clone()),
            fulfillment: FulfillmentService::new(pool, config.fulfillment_max_retries),
            provider_enabled: config.provider_token.is_some(),
        }
    }

    /// Creates an `invoice_sent` order with the product's current rail price
    /// frozen into it. No order row is written when the rail is unavailable.
    pub async fn initiate_purchase(
        &self,
        user_tg_id: i64,
        display: &UserDisplay,
        product_id: i64,
        method: PayMethod,
    ) -> ShopResult<Invoice> {
        let product = self.store.get_product(product_id).await?;

        let rail_configured = match method {
            PayMethod::Provider => self.provider_enabled,
            PayMethod::Points => true,
        };
        let (amount, currency) = product
            .price_for(method)
            .filter(|_| rail_configured)
            .ok_or(ShopError::RailUnavailable { product_id, method })?;
        let currency = currency.to_string();

        let user = self.store.upsert_user(user_tg_id, display).await?;
        let order = self
            .order_repo
            .create(user_tg_id, user.id, product.id, method, &currency, amount)
            .await?;

        info!(
            "Order {} created for user {} (product {}, {} {} via {})",
            order.id, user_tg_id, product.id, amount, currency, method
        );

        Ok(Invoice {
            order_id: order.id,
            token: order.invoice_token,
            product_id: product.id,
            title: product.title,
            description: product.description,
            image_url: product.image_url,
            method,
            currency,
            amount,
        })
    }

    /// Pre-checkout answer: the token must belong to an order that can still be paid.
    pub async fn validate_pre_checkout(&self, token: &str) -> ShopResult<bool> {
        let order = self.order_repo.find_by_token(token).await?;
        Ok(order.is_some_and(|o| o.status != OrderStatus::Failed))
    }

    /// Handles a payment confirmation. Redelivered confirmations for a
    /// fulfilled order return the code that was already delivered.
    pub async fn on_payment_confirmed(
        &self,
        token: &str,
        receipt: &PaymentReceipt,
    ) -> ShopResult<Delivery> {
        let order = self.find_order(token).await?;

        if self.order_repo.mark_paid(token, receipt).await? {
            info!("Order {} marked paid", order.id);
        } else {
            info!(
                "Duplicate payment confirmation for order {} (status {})",
                order.id, order.status
            );
        }

        self.fulfillment.fulfill(token).await
    }

    /// Operator-triggered retry, e.g. after restocking.
    pub async fn retry_fulfillment(&self, token: &str) -> ShopResult<Delivery> {
        self.find_order(token).await?;
        self.fulfillment.fulfill(token).await
    }

    pub async fn find_order(&self, token: &str) -> ShopResult<Order> {
        self.order_repo
            .find_by_token(token)
            .await?
            .ok_or_else(|| ShopError::OrderNotFound(token.to_string()))
    }

    pub async fn order_history(
        &self,
        user_tg_id: i64,
        limit: i64,
    ) -> ShopResult<Vec<OrderWithProduct>> {
        Ok(self.order_repo.list_for_user(user_tg_id, limit).await?)
    }

    pub async fn recent_orders(&self, limit: i64) -> ShopResult<Vec<OrderWithProduct>> {
        Ok(self.order_repo.list_recent(limit).await?)
    }
}
