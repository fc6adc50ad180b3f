//! Telegram Bot API binding
//!
//! Inbound updates are normalized into dialog events; outbound effects go
//! through `TelegramClient`, which implements the runtime's `Transport`.

mod client;
mod polling;
mod types;

pub use client::TelegramClient;
pub use polling::{handle_update, run_polling};
pub use types::Update;

use thiserror::Error;

/// Errors talking to the Bot API
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Bot API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bot API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Unexpected Bot API response: {0}")]
    Decode(String),
}

impl TransportError {
    /// The target chat does not exist or the bot cannot post there
    pub fn is_chat_not_found(&self) -> bool {
        match self {
            TransportError::Api { description, .. } => {
                let description = description.to_lowercase();
                description.contains("chat not found") || description.contains("not a member")
            }
            _ => false,
        }
    }
}
