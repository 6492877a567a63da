use giftshop_db::models::store::PayMethod;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("Product {0} not found")]
    ProductNotFound(i64),

    #[error("Order not found for token {0}")]
    OrderNotFound(String),

    #[error("Product {product_id} cannot be bought via {method}")]
    RailUnavailable { product_id: i64, method: PayMethod },

    #[error("Product {0} is out of stock")]
    OutOfStock(i64),

    #[error("Order {0} has not been paid")]
    NotPaid(String),

    #[error("Order {0} has failed permanently")]
    OrderFailed(String),

    #[error("Product {product_id} for order {token} no longer exists")]
    ProductGone { token: String, product_id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type ShopResult<T> = Result<T, ShopError>;

impl ShopError {
    /// Out of stock is the one business outcome a later retry can fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ShopError::OutOfStock(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ShopError::ProductNotFound(_) | ShopError::OrderNotFound(_)
        )
    }

    /// Text shown to the buyer or operator.
    pub fn user_message(&self) -> String {
        match self {
            ShopError::ProductNotFound(_) => "❌ Product not found.".to_string(),
            ShopError::OrderNotFound(_) => "❌ Order not found.".to_string(),
            ShopError::RailUnavailable { method, .. } => match method {
                PayMethod::Provider => {
                    "⚠️ This product cannot be paid by card. Try paying with Stars.".to_string()
                }
                PayMethod::Points => {
                    "⚠️ This product cannot be paid with Stars. Try paying by card.".to_string()
                }
            },
            ShopError::OutOfStock(_) => {
                "✅ Payment received, but the product is out of stock right now. Your code will be delivered as soon as stock is replenished.".to_string()
            }
            ShopError::NotPaid(_) => "⏳ This order has not been paid yet.".to_string(),
            ShopError::OrderFailed(_) | ShopError::ProductGone { .. } => {
                "❌ This order cannot be fulfilled. Please contact support.".to_string()
            }
            ShopError::InvalidInput(msg) => format!("⚠️ {}", msg),
            ShopError::Database(_) | ShopError::Store(_) => {
                "❌ Something went wrong. Please try again later.".to_string()
            }
        }
    }
}
