//! Pocket Assistant - a multi-purpose Telegram bot
//!
//! Weather by location, currency conversion, random pet pictures and poll
//! creation, each driven by a per-user dialog state machine.

mod api;
mod config;
mod currency;
mod render;
mod runtime;
mod services;
mod state_machine;
mod telegram;

use api::{create_router, AppState};
use config::{BotConfig, WebhookConfig};
use runtime::{DialogManager, InMemorySessionStore, ProductionManager};
use services::{ExchangeRatesService, OpenWeatherService, PetImageService, ServiceSet};
use std::sync::Arc;
use std::time::Duration;
use telegram::TelegramClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Outer bound on any HTTP request made by the bot
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pocket_assistant=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = BotConfig::from_env()?;
    config.validate()?;

    if config.weather_api_key.is_empty() {
        tracing::warn!("OPENWEATHERMAP_API_KEY not set; weather lookups will fail");
    }
    if config.exchange_rates_api_key.is_empty() {
        tracing::warn!("EXCHANGERATES_API_KEY not set; currency conversion will fail");
    }

    // One connection pool for every outbound call
    let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
    let telegram = Arc::new(TelegramClient::new(http.clone(), &config.bot_token));

    let services = ServiceSet::new(
        Arc::new(OpenWeatherService::new(
            http.clone(),
            &config.weather_api_key,
            &config.weather_lang,
        )),
        Arc::new(ExchangeRatesService::new(
            http.clone(),
            &config.exchange_rates_api_key,
        )),
        Arc::new(PetImageService::new(http)),
        telegram.clone(),
    );

    let manager: Arc<ProductionManager> = Arc::new(DialogManager::new(
        Arc::new(InMemorySessionStore::new()),
        telegram.clone(),
        services,
        config.adapter_timeout,
    )
    .with_idle_timeout(config.session_idle_timeout));

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
        }
        shutdown.cancel();
    });

    match &config.webhook {
        Some(webhook) => serve_webhook(webhook, telegram, manager, cancel).await?,
        None => telegram::run_polling(&telegram, &manager, cancel).await?,
    }

    tracing::info!("Pocket Assistant stopped");
    Ok(())
}

async fn serve_webhook(
    webhook: &WebhookConfig,
    telegram: Arc<TelegramClient>,
    manager: Arc<ProductionManager>,
    cancel: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(url) = &webhook.url {
        telegram.set_webhook(url, webhook.secret.as_deref()).await?;
        tracing::info!(url = %url, "Webhook registered");
    }

    let state = AppState::new(telegram, manager, webhook.secret.as_deref());
    let app = create_router(state);

    tracing::info!("Pocket Assistant webhook listening on {}", webhook.addr);

    let listener = tokio::net::TcpListener::bind(webhook.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    Ok(())
}
