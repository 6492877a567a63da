use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{info, warn};

use crate::AppState;
use crate::bot::utils::{escape_html, format_amount};
use crate::error::{ShopError, ShopResult};
use crate::services::admin_service::parse_id;

const ADMIN_COMMANDS: &[&str] = &[
    "/addproduct",
    "/addcodes",
    "/products",
    "/recent",
    "/refulfill",
    "/activate",
    "/deactivate",
    "/reprice",
];

pub fn is_admin_command(cmd: &str) -> bool {
    ADMIN_COMMANDS.contains(&cmd)
}

/// Runs an admin command. Non-admins get no hint the command exists.
pub async fn handle(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    cmd: &str,
    args: &str,
) -> Result<(), teloxide::RequestError> {
    let tg_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(msg.chat.id.0);
    if !state.admin_service.is_admin(tg_id) {
        warn!("Rejected admin command {} from {}", cmd, tg_id);
        return Ok(());
    }

    let reply = match run(state, cmd, args).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Admin command {} failed: {}", cmd, e);
            escape_html(&e.user_message())
        }
    };
    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

async fn run(state: &AppState, cmd: &str, args: &str) -> ShopResult<String> {
    match cmd {
        "/addproduct" => {
            let p = state.admin_service.parse_new_product(args)?;
            let id = state
                .store_service
                .create_product(
                    &p.title,
                    &p.description,
                    p.price_provider,
                    &p.currency_provider,
                    p.price_points,
                    &p.image_url,
                )
                .await?;
            let mut text = format!("✅ Product <b>{}</b> created with id {}", escape_html(&p.title), id);
            if p.price_provider == 0 && p.price_points == 0 {
                text.push_str("\n⚠️ Both prices are zero, nobody can buy it yet.");
            }
            Ok(text)
        }
        "/addcodes" => {
            let (product_id, codes) = state.admin_service.parse_add_codes(args)?;
            let inserted = state.store_service.add_codes(product_id, &codes).await?;
            let stock = state.store_service.stock_count(product_id).await?;
            info!("Admin uploaded {} codes for product {}", inserted, product_id);
            Ok(format!(
                "✅ Added {} codes to product {}. Unused stock: {}",
                inserted, product_id, stock
            ))
        }
        "/products" => {
            let overview = state.store_service.products_with_stock().await?;
            if overview.is_empty() {
                return Ok("No products yet.".to_string());
            }
            let mut text = "📦 <b>Products</b>\n".to_string();
            for item in overview {
                let p = &item.product;
                text.push_str(&format!(
                    "\n#{} {}{} · {} / {} · stock {}",
                    p.id,
                    escape_html(&p.title),
                    if p.is_active { "" } else { " (inactive)" },
                    format_amount(p.price_provider, &p.currency_provider),
                    format_amount(p.price_points, giftshop_db::models::store::POINTS_CURRENCY),
                    item.unused_codes
                ));
            }
            Ok(text)
        }
        "/recent" => {
            let orders = state.order_service.recent_orders(20).await?;
            if orders.is_empty() {
                return Ok("No orders yet.".to_string());
            }
            let mut text = "🧾 <b>Recent orders</b>\n".to_string();
            for o in orders {
                text.push_str(&format!(
                    "\n#{} · user {} · {} · {} · {} · <code>{}</code>",
                    o.order.id,
                    o.order.user_tg_id,
                    escape_html(&o.product_title),
                    format_amount(o.order.amount, &o.order.currency),
                    o.order.status,
                    o.order.invoice_token
                ));
            }
            Ok(text)
        }
        "/refulfill" => {
            let token = args.trim();
            if token.is_empty() {
                return Err(ShopError::InvalidInput("Usage: /refulfill <token>".to_string()));
            }
            let delivery = state.order_service.retry_fulfillment(token).await?;
            Ok(format!(
                "✅ Order #{} delivered code <code>{}</code>{}",
                delivery.order_id,
                escape_html(&delivery.code),
                if delivery.newly_allocated { "" } else { " (already delivered)" }
            ))
        }
        "/activate" | "/deactivate" => {
            let id = parse_id(args)?;
            let active = cmd == "/activate";
            state.store_service.set_product_active(id, active).await?;
            Ok(format!(
                "✅ Product {} is now {}",
                id,
                if active { "active" } else { "inactive" }
            ))
        }
        "/reprice" => {
            let parts: Vec<&str> = args.split_whitespace().collect();
            let [id, provider, points] = parts.as_slice() else {
                return Err(ShopError::InvalidInput(
                    "Usage: /reprice <product_id> <price_provider> <price_points>".to_string(),
                ));
            };
            let id = parse_id(id)?;
            let provider = parse_id(provider)?;
            let points = parse_id(points)?;
            if provider < 0 || points < 0 {
                return Err(ShopError::InvalidInput("Prices must be non-negative".to_string()));
            }
            state
                .store_service
                .update_product_prices(id, provider, points)
                .await?;
            Ok(format!("✅ Product {} repriced", id))
        }
        _ => Err(ShopError::InvalidInput(format!("Unknown command {}", cmd))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_admin_commands() {
        assert!(is_admin_command("/addcodes"));
        assert!(is_admin_command("/refulfill"));
        assert!(!is_admin_command("/start"));
    }
}
