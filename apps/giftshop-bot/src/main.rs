use anyhow::Context;
use clap::Parser;
use teloxide::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use giftshop_bot::config::Args;
use giftshop_bot::{AppState, bot, web};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "giftshop_bot=info,giftshop_db=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!("Starting gift shop bot...");

    let pool = giftshop_db::db::init_db(&args.db_config()).await?;
    let config = args.shop_config();
    if config.admin_ids.is_empty() {
        warn!("ADMIN_IDS is empty, admin commands are disabled");
    }
    if config.provider_token.is_none() {
        warn!("PROVIDER_TOKEN is not set, only the points rail is available");
    }

    let state = AppState::new(pool, config);
    let bot = Bot::new(&args.bot_token);

    let listener = tokio::net::TcpListener::bind(args.web_bind)
        .await
        .with_context(|| format!("Failed to bind web server to {}", args.web_bind))?;
    info!("Mini app API listening on {}", args.web_bind);

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let web_handle = tokio::spawn(web::serve(listener, state.clone(), shutdown_tx.subscribe()));
    let bot_handle = tokio::spawn(bot::run_bot(bot, shutdown_tx.subscribe(), state));

    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    };
    if let Err(e) = bot::supervise(bot_handle, ctrl_c, &shutdown_tx).await {
        error!("Bot task failed: {}", e);
    }
    web_handle.await??;
    Ok(())
}
