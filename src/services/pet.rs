//! Random pet picture adapter
//!
//! The upstream page has no API; the image URL is scraped from the HTML body.

use super::{ImageProvider, ServiceError};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;

const DEFAULT_PAGE_URL: &str = "https://mimimi.ru/random";

/// Where the page links its pictures
static IMAGE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://3zvzd\.blob\.core\.windows\.net/mimimi/\d+\.jpg")
        .expect("image URL pattern is valid")
});

/// Scrapes a random pet picture URL from mimimi.ru
pub struct PetImageService {
    client: Client,
    page_url: String,
}

impl PetImageService {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            page_url: DEFAULT_PAGE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = page_url.into();
        self
    }
}

/// First image URL on the page, if any
fn extract_image_url(body: &str) -> Result<String, ServiceError> {
    IMAGE_URL_RE
        .find(body)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ServiceError::image_not_found("No image URL on the page"))
}

#[async_trait]
impl ImageProvider for PetImageService {
    async fn random_image_url(&self) -> Result<String, ServiceError> {
        let response = self.client.get(&self.page_url).send().await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::unavailable(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(ServiceError::unavailable(format!("HTTP {status}")));
        }

        extract_image_url(&body)
    }
}
