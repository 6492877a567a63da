use giftshop_db::models::store::PaymentReceipt;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, PreCheckoutQuery, SuccessfulPayment};
use tracing::{error, info, warn};

use crate::AppState;
use crate::bot::utils::escape_html;

pub async fn pre_checkout_handler(
    bot: Bot,
    q: PreCheckoutQuery,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    let ok = match state
        .order_service
        .validate_pre_checkout(&q.invoice_payload)
        .await
    {
        Ok(ok) => ok,
        Err(e) => {
            error!("Pre-checkout lookup failed: {}", e);
            false
        }
    };

    if ok {
        bot.answer_pre_checkout_query(q.id, true).await?;
    } else {
        warn!("Pre-checkout rejected for unknown order");
        bot.answer_pre_checkout_query(q.id, false)
            .error_message("Order not found. Please start the purchase again.")
            .await?;
    }
    Ok(())
}

pub async fn successful_payment_handler(
    bot: &Bot,
    msg: &Message,
    payment: &SuccessfulPayment,
    state: &AppState,
) -> Result<(), teloxide::RequestError> {
    let token = payment.invoice_payload.as_str();
    info!(
        "Payment received: {} {} for order {}",
        payment.total_amount, payment.currency, token
    );

    let charge_id = payment.provider_payment_charge_id.trim();
    let receipt = PaymentReceipt {
        provider_charge_id: (!charge_id.is_empty()).then(|| charge_id.to_string()),
    };

    let text = match state.order_service.on_payment_confirmed(token, &receipt).await {
        Ok(delivery) => format!(
            "✅ Payment successful!\n\n🎁 Your code: <code>{}</code>",
            escape_html(&delivery.code)
        ),
        Err(e) if e.is_retryable() => {
            warn!("Order {} paid but not delivered: {}", token, e);
            escape_html(&e.user_message())
        }
        Err(e) => {
            error!("Payment confirmation for {} failed: {}", token, e);
            escape_html(&e.user_message())
        }
    };

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
