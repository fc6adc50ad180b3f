//! Exchange-rates conversion adapter (apilayer)

use super::{ConversionResult, CurrencyConverter, ServiceError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.apilayer.com/exchangerates_data/convert";

/// Currency conversion via the apilayer exchange-rates API
pub struct ExchangeRatesService {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ExchangeRatesService {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
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
impl CurrencyConverter for ExchangeRatesService {
    async fn convert(
        &self,
        base: &str,
        target: &str,
        amount: f64,
    ) -> Result<ConversionResult, ServiceError> {
        if self.api_key.is_empty() {
            return Err(ServiceError::unavailable("Exchange rates API key not configured"));
        }

        let response = self
            .client
            .get(&self.base_url)
            .header("apikey", &self.api_key)
            .query(&[
                ("from", base.to_string()),
                ("to", target.to_string()),
                ("amount", amount.to_string()),
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

        parse_conversion(&body, base, target, amount)
    }
}

/// Parse a convert response; `success: false` means no rate for the pair
pub(crate) fn parse_conversion(
    body: &str,
    base: &str,
    target: &str,
    amount: f64,
) -> Result<ConversionResult, ServiceError> {
    let parsed: ConvertResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::unavailable(format!("Failed to parse response: {e}")))?;

    match (parsed.success, parsed.result) {
        (true, Some(result)) => Ok(ConversionResult {
            base: base.to_string(),
            target: target.to_string(),
            amount,
            result,
        }),
        _ => Err(ServiceError::rate_not_found(format!(
            "No exchange rate for {base} -> {target}"
        ))),
    }
}

// apilayer API types

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    #[serde(default)]
    success: bool,
    result: Option<f64>,
}
