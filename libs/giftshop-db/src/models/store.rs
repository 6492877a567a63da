use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currency code used for orders paid in the in-platform points currency.
pub const POINTS_CURRENCY: &str = "XTR";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayMethod {
    Provider,
    Points,
}

impl PayMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayMethod::Provider => "provider",
            PayMethod::Points => "points",
        }
    }
}

impl fmt::Display for PayMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provider" => Ok(PayMethod::Provider),
            "points" => Ok(PayMethod::Points),
            other => Err(UnknownVariant {
                kind: "pay_method",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for PayMethod {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Order lifecycle: `invoice_sent -> paid -> fulfilled`, with `paid -> failed`
/// only when fulfillment can never succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    InvoiceSent,
    Paid,
    Fulfilled,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::InvoiceSent => "invoice_sent",
            OrderStatus::Paid => "paid",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invoice_sent" => Ok(OrderStatus::InvoiceSent),
            "paid" => Ok(OrderStatus::Paid),
            "fulfilled" => Ok(OrderStatus::Fulfilled),
            "failed" => Ok(OrderStatus::Failed),
            other => Err(UnknownVariant {
                kind: "order_status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub tg_id: i64,
    pub first_name: Option<String>,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Minor currency units; zero disables the provider rail.
    pub price_provider: i64,
    pub currency_provider: String,
    /// Zero disables the points rail.
    pub price_points: i64,
    pub image_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Price and currency for a rail, or `None` when the rail is not purchasable.
    pub fn price_for(&self, method: PayMethod) -> Option<(i64, &str)> {
        let (amount, currency) = match method {
            PayMethod::Provider => (self.price_provider, self.currency_provider.as_str()),
            PayMethod::Points => (self.price_points, POINTS_CURRENCY),
        };
        (amount > 0).then_some((amount, currency))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GiftCode {
    pub id: i64,
    pub product_id: i64,
    pub code: String,
    pub is_used: bool,
    pub used_by_order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub user_tg_id: i64,
    pub user_id: i64,
    pub product_id: i64,
    #[sqlx(try_from = "String")]
    pub pay_method: PayMethod,
    pub currency: String,
    pub amount: i64,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub invoice_token: String,
    pub gift_delivered: bool,
    pub delivered_code: Option<String>,
    pub provider_charge_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Order joined with its product title, for history views.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderWithProduct {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub product_title: String,
}

/// Payment metadata handed over with a confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub provider_charge_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price_provider: i64, price_points: i64) -> Product {
        Product {
            id: 1,
            title: "Steam Gift Card".to_string(),
            description: "Digital code delivery after payment".to_string(),
            price_provider,
            currency_provider: "RUB".to_string(),
            price_points,
            image_url: String::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            OrderStatus::InvoiceSent,
            OrderStatus::Paid,
            OrderStatus::Fulfilled,
            OrderStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn pay_method_parses_lowercase_only() {
        assert_eq!("points".parse::<PayMethod>(), Ok(PayMethod::Points));
        assert_eq!(PayMethod::Provider.to_string(), "provider");
        assert!("Stars".parse::<PayMethod>().is_err());
    }

    #[test]
    fn zero_price_disables_rail() {
        let p = product(1000, 0);
        assert_eq!(p.price_for(PayMethod::Provider), Some((1000, "RUB")));
        assert_eq!(p.price_for(PayMethod::Points), None);

        let p = product(0, 100);
        assert_eq!(p.price_for(PayMethod::Provider), None);
        assert_eq!(p.price_for(PayMethod::Points), Some((100, POINTS_CURRENCY)));
    }
}
