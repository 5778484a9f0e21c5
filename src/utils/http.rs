// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;
use crate::utils::encoding::{Decoded, decode_html};

/// Create an asynchronous HTTP client carrying the browser-like header set.
///
/// Timeouts are applied per request, since probes and page fetches use
/// different budgets.
pub fn create_async_client(config: &CrawlerConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, header_value("accept", &config.accept)?);
    headers.insert(
        ACCEPT_LANGUAGE,
        header_value("accept_language", &config.accept_language)?,
    );
    if !config.referer.is_empty() {
        headers.insert(REFERER, header_value("referer", &config.referer)?);
    }

    let client = Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .build()?;
    Ok(client)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::config(format!("invalid crawler.{name} header: {e}")))
}

/// GET a URL and return the raw body.
///
/// Network errors, timeouts and non-2xx statuses all become `AppError::Fetch`.
pub async fn fetch_bytes(client: &Client, url: &str, timeout: Duration) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| AppError::fetch(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::fetch(url, format!("HTTP {}", status.as_u16())));
    }

    let body = response.bytes().await.map_err(|e| AppError::fetch(url, e))?;
    Ok(body.to_vec())
}

/// GET a URL and decode the body as HTML text.
pub async fn fetch_html(client: &Client, url: &str, timeout: Duration) -> Result<Decoded> {
    let bytes = fetch_bytes(client, url, timeout).await?;
    Ok(decode_html(&bytes))
}
