use giftshop_db::models::store::PayMethod;
use serde::{Deserialize, Serialize};

/// Everything the messaging adapter needs to issue an invoice for a new order.
/// The invoice payload is always the order's token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub order_id: i64,
    pub token: String,
    pub product_id: i64,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub method: PayMethod,
    pub currency: String,
    pub amount: i64,
}

/// Display fields refreshed on every interaction.
#[derive(Debug, Clone, Default)]
pub struct UserDisplay {
    pub first_name: Option<String>,
    pub username: Option<String>,
}

/// Inline-button payload for "buy product X via rail Y".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuyAction {
    pub product_id: i64,
    pub method: PayMethod,
}

impl BuyAction {
    pub fn to_callback_data(&self) -> String {
        format!("buy:{}:{}", self.product_id, self.method.as_str())
    }

    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.strip_prefix("buy:")?.splitn(2, ':');
        let product_id = parts.next()?.parse().ok()?;
        let method = parts.next()?.parse().ok()?;
        Some(Self { product_id, method })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_action_callback_data() {
        let action = BuyAction {
            product_id: 42,
            method: PayMethod::Points,
        };
        assert_eq!(action.to_callback_data(), "buy:42:points");
        assert_eq!(BuyAction::parse("buy:42:points"), Some(action));
    }

    #[test]
    fn rejects_malformed_callback_data() {
        assert_eq!(BuyAction::parse("buy:abc:points"), None);
        assert_eq!(BuyAction::parse("buy:1:stars"), None);
        assert_eq!(BuyAction::parse("buy:1"), None);
        assert_eq!(BuyAction::parse("product:1:points"), None);
    }
}
