use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, LabeledPrice};
use tracing::{error, info, warn};

use crate::AppState;
use crate::bot::handlers::command::display_of;
use crate::models::payment::{BuyAction, Invoice};
use giftshop_db::models::store::PayMethod;

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    let callback_id = q.id.clone();
    let tg_id = q.from.id.0 as i64;

    let Some(action) = q.data.as_deref().and_then(BuyAction::parse) else {
        info!("Ignoring callback {:?} from {}", q.data, tg_id);
        bot.answer_callback_query(callback_id).await?;
        return Ok(());
    };

    let display = display_of(Some(&q.from));
    let invoice = match state
        .order_service
        .initiate_purchase(tg_id, &display, action.product_id, action.method)
        .await
    {
        Ok(invoice) => invoice,
        Err(e) => {
            warn!(
                "Purchase of product {} via {} by {} rejected: {}",
                action.product_id, action.method, tg_id, e
            );
            bot.answer_callback_query(callback_id)
                .text(e.user_message())
                .show_alert(true)
                .await?;
            return Ok(());
        }
    };

    bot.answer_callback_query(callback_id).await?;
    if let Err(e) = send_invoice(&bot, ChatId(tg_id), &invoice, &state).await {
        error!("Failed to send invoice for order {}: {}", invoice.order_id, e);
        bot.send_message(ChatId(tg_id), "❌ Could not create the invoice. Please try again later.")
            .await?;
    }
    Ok(())
}

async fn send_invoice(
    bot: &Bot,
    chat_id: ChatId,
    invoice: &Invoice,
    state: &AppState,
) -> Result<(), teloxide::RequestError> {
    let Ok(amount) = u32::try_from(invoice.amount) else {
        error!("Order {} amount {} does not fit an invoice", invoice.order_id, invoice.amount);
        bot.send_message(chat_id, "❌ This price cannot be invoiced.").await?;
        return Ok(());
    };
    let prices = vec![LabeledPrice {
        label: invoice.title.clone(),
        amount,
    }];

    let request = bot.send_invoice(
        chat_id,
        invoice.title.clone(),
        invoice.description.clone(),
        invoice.token.clone(),
        invoice.currency.clone(),
        prices,
    );
    match (invoice.method, state.config.provider_token.as_deref()) {
        (PayMethod::Provider, Some(token)) => request.provider_token(token).await?,
        _ => request.await?,
    };
    info!("Invoice sent for order {}", invoice.order_id);
    Ok(())
}
