//! `OpenWeatherMap` current-weather adapter

use super::{CompassPoint, ServiceError, WeatherProvider, WeatherReport};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Weather lookups against the `OpenWeatherMap` API (metric units)
pub struct OpenWeatherService {
    client: Client,
    api_key: String,
    language: String,
    base_url: String,
}

impl OpenWeatherService {
    pub fn new(client: Client, api_key: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            language: language.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherService {
    async fn fetch_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherReport, ServiceError> {
        if self.api_key.is_empty() {
            return Err(ServiceError::unavailable("Weather API key not configured"));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
                ("lang", self.language.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::unavailable(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(ServiceError::unavailable(format!("HTTP {status}: {body}")));
        }

        parse_weather(&body)
    }
}

/// Parse an `OpenWeatherMap` current-weather body
pub(crate) fn parse_weather(body: &str) -> Result<WeatherReport, ServiceError> {
    let parsed: OpenWeatherResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::unavailable(format!("Failed to parse response: {e}")))?;

    let description = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .unwrap_or_default();

    Ok(WeatherReport {
        description,
        temperature: parsed.main.temp,
        wind_direction: CompassPoint::from_degrees(parsed.wind.deg),
        wind_speed: parsed.wind.speed,
    })
}

// OpenWeatherMap API types

#[derive(Debug, Deserialize)]
struct OpenWeatherResponse {
    #[serde(default)]
    weather: Vec<OpenWeatherCondition>,
    main: OpenWeatherMain,
    wind: OpenWeatherWind,
}

#[derive(Debug, Deserialize)]
struct OpenWeatherCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OpenWeatherMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OpenWeatherWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}
