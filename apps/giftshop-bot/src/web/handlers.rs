use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use giftshop_db::models::store::{OrderStatus, OrderWithProduct, PayMethod, Product};
use serde::Serialize;
use serde_json::json;

use crate::AppState;
use crate::error::ShopError;

/// Header carrying the Telegram id verified by the upstream mini-app auth layer.
pub const VERIFIED_USER_HEADER: &str = "x-telegram-user-id";

#[derive(Debug, Clone, Copy)]
pub struct VerifiedUser(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for VerifiedUser {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(VERIFIED_USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(VerifiedUser)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let status = match &self {
            ShopError::ProductNotFound(_) | ShopError::OrderNotFound(_) => StatusCode::NOT_FOUND,
            ShopError::RailUnavailable { .. } | ShopError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            ShopError::OutOfStock(_) => StatusCode::CONFLICT,
            ShopError::NotPaid(_) | ShopError::OrderFailed(_) | ShopError::ProductGone { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ShopError::Database(_) | ShopError::Store(_) => {
                tracing::error!("Web request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price_provider: i64,
    pub currency_provider: String,
    pub price_points: i64,
    pub image_url: String,
}

impl From<Product> for CatalogItem {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            price_provider: p.price_provider,
            currency_provider: p.currency_provider,
            price_points: p.price_points,
            image_url: p.image_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: i64,
    pub product_id: i64,
    pub product_title: String,
    pub pay_method: PayMethod,
    pub currency: String,
    pub amount: i64,
    pub status: OrderStatus,
    pub gift_delivered: bool,
    pub delivered_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<OrderWithProduct> for OrderView {
    fn from(o: OrderWithProduct) -> Self {
        let order = o.order;
        Self {
            id: order.id,
            product_id: order.product_id,
            product_title: o.product_title,
            pay_method: order.pay_method,
            currency: order.currency,
            amount: order.amount,
            status: order.status,
            gift_delivered: order.gift_delivered,
            delivered_code: order.delivered_code,
            created_at: order.created_at,
        }
    }
}

pub async fn root() -> impl IntoResponse {
    Json(json!({ "ok": true, "service": "giftshop" }))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<CatalogItem>>, ShopError> {
    let products = state.store_service.list_products(true).await?;
    Ok(Json(products.into_iter().map(CatalogItem::from).collect()))
}

pub async fn list_my_orders(
    State(state): State<AppState>,
    VerifiedUser(tg_id): VerifiedUser,
) -> Result<Json<Vec<OrderView>>, ShopError> {
    let orders = state
        .order_service
        .order_history(tg_id, state.config.order_history_limit)
        .await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shop_errors_map_to_http_statuses() {
        let resp = ShopError::OrderNotFound("t".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = ShopError::OutOfStock(1).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let resp = ShopError::RailUnavailable {
            product_id: 1,
            method: PayMethod::Points,
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
