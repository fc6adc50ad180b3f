//! Bot configuration from environment variables

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_WEATHER_LANG: &str = "en";
const DEFAULT_ADAPTER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_IDLE_SECS: u64 = 600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TG_BOT_TOKEN is not set")]
    MissingToken,
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("BOT_WEBHOOK_URL requires BOT_WEBHOOK_ADDR")]
    WebhookUrlWithoutAddr,
}

/// Webhook mode settings; polling is used when absent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub addr: SocketAddr,
    /// Public URL registered with `setWebhook`; left alone when unset
    pub url: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub bot_token: String,
    pub weather_api_key: String,
    pub exchange_rates_api_key: String,
    pub weather_lang: String,
    pub adapter_timeout: Duration,
    /// Idle time after which a chat's runtime is retired
    pub session_idle_timeout: Duration,
    pub webhook: Option<WebhookConfig>,
    webhook_url_without_addr: bool,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let seconds = |name: &'static str, default: u64| match var(name) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
                _ => Err(ConfigError::Invalid { name, value: raw }),
            },
            None => Ok(Duration::from_secs(default)),
        };
        let adapter_timeout = seconds("ADAPTER_TIMEOUT_SECS", DEFAULT_ADAPTER_TIMEOUT_SECS)?;
        let session_idle_timeout = seconds("SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE_SECS)?;

        let webhook_url = var("BOT_WEBHOOK_URL");
        let webhook = match var("BOT_WEBHOOK_ADDR") {
            Some(raw) => Some(WebhookConfig {
                addr: raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    name: "BOT_WEBHOOK_ADDR",
                    value: raw.clone(),
                })?,
                url: webhook_url.clone(),
                secret: var("BOT_WEBHOOK_SECRET"),
            }),
            None => None,
        };

        Ok(Self {
            bot_token: var("TG_BOT_TOKEN").unwrap_or_default(),
            weather_api_key: var("OPENWEATHERMAP_API_KEY").unwrap_or_default(),
            exchange_rates_api_key: var("EXCHANGERATES_API_KEY")
                .or_else(|| var("EXCANGERATES_API_KEY"))
                .unwrap_or_default(),
            weather_lang: var("WEATHER_LANG").unwrap_or_else(|| DEFAULT_WEATHER_LANG.to_string()),
            adapter_timeout,
            session_idle_timeout,
            webhook_url_without_addr: webhook.is_none() && webhook_url.is_some(),
            webhook,
        })
    }

    /// Check the settings are usable before starting anything
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.webhook_url_without_addr {
            return Err(ConfigError::WebhookUrlWithoutAddr);
        }
        if let Some(url) = self.webhook.as_ref().and_then(|w| w.url.as_deref()) {
            if !url.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    name: "BOT_WEBHOOK_URL",
                    value: url.to_string(),
                });
            }
        }
        Ok(())
    }
}
