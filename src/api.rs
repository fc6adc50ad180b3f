//! Webhook server for receiving Bot API updates

mod handlers;

pub use handlers::create_router;

use crate::runtime::ProductionManager;
use crate::telegram::TelegramClient;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<TelegramClient>,
    pub manager: Arc<ProductionManager>,
    /// Expected `X-Telegram-Bot-Api-Secret-Token`, if one was registered
    pub secret: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        client: Arc<TelegramClient>,
        manager: Arc<ProductionManager>,
        secret: Option<&str>,
    ) -> Self {
        Self {
            client,
            manager,
            secret: secret.map(Arc::from),
        }
    }
}
