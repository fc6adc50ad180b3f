//! External service adapters
//!
//! Weather lookup, currency conversion, random pet images and poll
//! publication. The dialog runtime only sees the traits below.

mod currency;
mod error;
mod pet;
mod types;
mod weather;

pub use currency::ExchangeRatesService;
pub use error::{ServiceError, ServiceErrorKind};
pub use pet::PetImageService;
pub use types::*;
pub use weather::OpenWeatherService;

use crate::state_machine::state::PollDraft;
use async_trait::async_trait;
use std::sync::Arc;

/// Current weather by coordinates
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch_weather(&self, latitude: f64, longitude: f64)
        -> Result<WeatherReport, ServiceError>;
}

/// Currency conversion at the current rate
#[async_trait]
pub trait CurrencyConverter: Send + Sync {
    async fn convert(
        &self,
        base: &str,
        target: &str,
        amount: f64,
    ) -> Result<ConversionResult, ServiceError>;
}

/// Source of random pet pictures
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn random_image_url(&self) -> Result<String, ServiceError>;
}

/// Publishes a poll into another chat
#[async_trait]
pub trait PollPublisher: Send + Sync {
    async fn publish_poll(&self, poll: &PollDraft) -> Result<(), ServiceError>;
}

/// The adapters a dialog runtime calls into
#[derive(Clone)]
pub struct ServiceSet {
    pub weather: Arc<dyn WeatherProvider>,
    pub currency: Arc<dyn CurrencyConverter>,
    pub images: Arc<dyn ImageProvider>,
    pub polls: Arc<dyn PollPublisher>,
}

impl ServiceSet {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        currency: Arc<dyn CurrencyConverter>,
        images: Arc<dyn ImageProvider>,
        polls: Arc<dyn PollPublisher>,
    ) -> Self {
        Self {
            weather,
            currency,
            images,
            polls,
        }
    }
}
