use teloxide::{dptree, prelude::*, types::Update};
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

pub mod handlers;
pub mod keyboards;
pub mod utils;

pub async fn run_bot(
    bot: Bot,
    mut shutdown_signal: tokio::sync::broadcast::Receiver<()>,
    state: crate::AppState,
) {
    info!("Starting bot dispatcher...");

    match bot.get_me().await {
        Ok(me) => {
            let username = me.username.clone().unwrap_or("unknown".into());
            info!("Bot connected as: @{}", username);
        }
        Err(e) => {
            error!("Bot failed to connect to Telegram: {}", e);
            return;
        }
    }

    let handler = Update::filter_message().endpoint(handlers::command::message_handler);
    let callback_handler =
        Update::filter_callback_query().endpoint(handlers::callback::callback_handler);
    let pre_checkout_handler =
        Update::filter_pre_checkout_query().endpoint(handlers::payment::pre_checkout_handler);

    let mut dispatcher = Dispatcher::builder(
        bot,
        dptree::entry()
            .branch(handler)
            .branch(callback_handler)
            .branch(pre_checkout_handler),
    )
    .dependencies(dptree::deps![state])
    .default_handler(|upd: std::sync::Arc<Update>| async move {
        info!("Unhandled update: {:?}", upd.id);
    })
    .build();

    tokio::select! {
        _ = dispatcher.dispatch() => {
            info!("Bot dispatcher exited");
        }
        _ = shutdown_signal.recv() => {
            info!("Bot received shutdown signal, stopping...");
        }
    }
}

/// Waits for `shutdown` or for the bot task to end on its own, then broadcasts
/// shutdown to the other components. Returns the bot task's join result.
pub async fn supervise<F>(
    mut bot_handle: JoinHandle<()>,
    shutdown: F,
    shutdown_tx: &broadcast::Sender<()>,
) -> Result<(), JoinError>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        _ = shutdown => {
            let _ = shutdown_tx.send(());
            bot_handle.await
        }
        finished = &mut bot_handle => {
            warn!("Bot task ended on its own, shutting down");
            let _ = shutdown_tx.send(());
            finished
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bot_exit_shuts_everything_down() {
        let (tx, mut rx) = broadcast::channel(1);
        let handle = tokio::spawn(async {});

        let result = supervise(handle, std::future::pending::<()>(), &tx).await;

        assert!(result.is_ok());
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn bot_panic_is_reported() {
        let (tx, mut rx) = broadcast::channel(1);
        let handle = tokio::spawn(async {
            panic!("dispatcher crashed");
        });

        let result = supervise(handle, std::future::pending::<()>(), &tx).await;

        assert!(result.unwrap_err().is_panic());
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn shutdown_signal_stops_the_bot() {
        let (tx, _) = broadcast::channel(1);
        let mut bot_rx = tx.subscribe();
        let handle = tokio::spawn(async move {
            let _ = bot_rx.recv().await;
        });

        let result = supervise(handle, async {}, &tx).await;

        assert!(result.is_ok());
    }
}
