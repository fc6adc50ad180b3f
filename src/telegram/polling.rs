//! Inbound update handling and the long-polling loop

use super::types::{normalize, Update};
use super::{TelegramClient, TransportError};
use crate::runtime::ProductionManager;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Server-side wait for `getUpdates`
const POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause after a failed `getUpdates` before trying again
const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Acknowledge, normalize and dispatch one update
pub async fn handle_update(client: &TelegramClient, manager: &ProductionManager, update: Update) {
    if let Some(query) = &update.callback_query {
        if let Err(e) = client.answer_callback_query(&query.id).await {
            tracing::debug!(update_id = update.update_id, error = %e, "Failed to answer callback query");
        }
    }

    let Some(incoming) = normalize(&update) else {
        tracing::debug!(update_id = update.update_id, "Dropping unsupported update");
        return;
    };

    let chat_id = incoming.chat_id;
    if let Err(e) = manager.dispatch(incoming).await {
        tracing::error!(chat_id = %chat_id, error = %e, "Failed to dispatch update");
    }
}

/// Poll for updates until `cancel` fires
pub async fn run_polling(
    client: &TelegramClient,
    manager: &ProductionManager,
    cancel: CancellationToken,
) -> Result<(), TransportError> {
    // Updates sent while the bot was down are stale
    client.delete_webhook(true).await?;
    tracing::info!("Polling for updates");

    let mut offset = 0;
    loop {
        let result = tokio::select! {
            () = cancel.cancelled() => break,
            result = client.get_updates(offset, POLL_TIMEOUT) => result,
        };

        match result {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    handle_update(client, manager, update).await;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch updates");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(RETRY_DELAY) => {}
                }
            }
        }
    }

    tracing::info!("Polling stopped");
    Ok(())
}
