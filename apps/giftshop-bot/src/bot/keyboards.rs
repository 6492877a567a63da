use giftshop_db::models::store::{PayMethod, Product};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::bot::utils::format_amount;
use crate::models::payment::BuyAction;

/// One row per purchasable rail of each product. Products with no usable rail are left out.
pub fn catalog_keyboard(products: &[Product], provider_enabled: bool) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    for product in products {
        let mut row = Vec::new();
        if provider_enabled {
            if let Some((amount, currency)) = product.price_for(PayMethod::Provider) {
                row.push(buy_button(product, PayMethod::Provider, amount, currency));
            }
        }
        if let Some((amount, currency)) = product.price_for(PayMethod::Points) {
            row.push(buy_button(product, PayMethod::Points, amount, currency));
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }
    InlineKeyboardMarkup::new(rows)
}

fn buy_button(product: &Product, method: PayMethod, amount: i64, currency: &str) -> InlineKeyboardButton {
    let icon = match method {
        PayMethod::Provider => "💳",
        PayMethod::Points => "⭐",
    };
    let action = BuyAction {
        product_id: product.id,
        method,
    };
    InlineKeyboardButton::callback(
        format!("{} {} · {}", icon, product.title, format_amount(amount, currency)),
        action.to_callback_data(),
    )
}
