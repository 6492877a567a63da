use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{error, info};

use crate::AppState;
use crate::bot::handlers::{admin, payment};
use crate::bot::keyboards::catalog_keyboard;
use crate::bot::utils::{escape_html, format_amount, split_command};
use crate::models::payment::UserDisplay;

const HELP_TEXT: &str = "🛍 <b>Gift Shop</b>\n\n\
    /catalog - browse products\n\
    /orders - your purchases";

pub fn display_of(user: Option<&teloxide::types::User>) -> UserDisplay {
    UserDisplay {
        first_name: user.map(|u| u.first_name.clone()),
        username: user.and_then(|u| u.username.clone()),
    }
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    if let Some(paid) = msg.successful_payment() {
        return payment::successful_payment_handler(&bot, &msg, paid, &state).await;
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };
    let tg_id = msg.chat.id.0;
    let (cmd, args) = split_command(text);
    info!("Command {} from {}", cmd, tg_id);

    match cmd {
        "/start" => {
            let display = display_of(msg.from.as_ref());
            if let Err(e) = state.store_service.upsert_user(tg_id, &display).await {
                error!("Failed to upsert user {} on /start: {}", tg_id, e);
            }
            bot.send_message(msg.chat.id, HELP_TEXT)
                .parse_mode(ParseMode::Html)
                .await?;
            send_catalog(&bot, &msg, &state).await?;
        }
        "/catalog" => send_catalog(&bot, &msg, &state).await?,
        "/orders" => send_order_history(&bot, &msg, &state).await?,
        "/help" => {
            bot.send_message(msg.chat.id, HELP_TEXT)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        other if admin::is_admin_command(other) => {
            admin::handle(&bot, &msg, &state, other, args).await?;
        }
        _ => {}
    }

    Ok(())
}

async fn send_catalog(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
) -> Result<(), teloxide::RequestError> {
    let products = match state.store_service.list_products(true).await {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to list products: {}", e);
            bot.send_message(msg.chat.id, e.user_message()).await?;
            return Ok(());
        }
    };

    if products.is_empty() {
        bot.send_message(msg.chat.id, "📦 The catalog is empty for now.")
            .await?;
        return Ok(());
    }

    let mut text = "🛍 <b>Catalog</b>\n".to_string();
    for p in &products {
        text.push_str(&format!(
            "\n<b>{}</b>\n{}\n",
            escape_html(&p.title),
            escape_html(&p.description)
        ));
    }

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(catalog_keyboard(
            &products,
            state.config.provider_token.is_some(),
        ))
        .await?;
    Ok(())
}

async fn send_order_history(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
) -> Result<(), teloxide::RequestError> {
    let orders = match state
        .order_service
        .order_history(msg.chat.id.0, state.config.order_history_limit)
        .await
    {
        Ok(o) => o,
        Err(e) => {
            error!("Failed to load orders for {}: {}", msg.chat.id.0, e);
            bot.send_message(msg.chat.id, e.user_message()).await?;
            return Ok(());
        }
    };

    if orders.is_empty() {
        bot.send_message(msg.chat.id, "You have no orders yet.").await?;
        return Ok(());
    }

    let mut text = "🧾 <b>Your orders</b>\n".to_string();
    for o in &orders {
        text.push_str(&format!(
            "\n#{} · {} · {} · <i>{}</i>",
            o.order.id,
            escape_html(&o.product_title),
            format_amount(o.order.amount, &o.order.currency),
            o.order.status
        ));
        if let Some(code) = &o.order.delivered_code {
            text.push_str(&format!("\n🎁 <code>{}</code>", escape_html(code)));
        }
    }

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
