// src/services/prober.rs

//! Ratio page availability probing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Config, ExtractionConfig};
use crate::utils::encoding::decode_html;
use crate::utils::http::create_async_client;

/// A single availability check against one URL.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Whether the URL currently serves competition-rate content.
    ///
    /// Never fails: unreachable pages are simply unavailable.
    async fn check(&self, url: &str) -> bool;
}

/// Probes ratio pages over HTTP and looks for ratio table markers.
pub struct AvailabilityProber {
    client: Client,
    timeout: Duration,
    markers: MarkerSet,
}

impl AvailabilityProber {
    pub fn new(config: &Config) -> Result<Self> {
        let client = create_async_client(&config.crawler)?;
        Self::with_client(config, client)
    }

    pub fn with_client(config: &Config, client: Client) -> Result<Self> {
        Ok(Self {
            client,
            timeout: config.crawler.probe_timeout(),
            markers: MarkerSet::new(&config.extraction)?,
        })
    }

    /// Probe a URL, reporting why it is unavailable.
    ///
    /// `Ok(false)` means the page answered 200 without ratio content; errors
    /// cover network failures, timeouts and any other status.
    pub async fn try_check(&self, url: &str) -> Result<bool> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::fetch(url, format!("HTTP {}", status.as_u16())));
        }

        let bytes = response.bytes().await.map_err(|e| AppError::fetch(url, e))?;
        let decoded = decode_html(&bytes);
        Ok(self.markers.matches(&decoded.text))
    }

    pub fn into_shared(self) -> Arc<dyn Probe> {
        Arc::new(self)
    }
}

#[async_trait]
impl Probe for AvailabilityProber {
    async fn check(&self, url: &str) -> bool {
        match self.try_check(url).await {
            Ok(available) => {
                log::debug!("Probe {}: {}", url, if available { "open" } else { "no markers" });
                available
            }
            Err(e) => {
                log::debug!("Probe {}: {}", url, e);
                false
            }
        }
    }
}

/// Structural markers of a ratio page.
struct MarkerSet {
    tables: Vec<Selector>,
    keywords: Vec<String>,
}

impl MarkerSet {
    fn new(config: &ExtractionConfig) -> Result<Self> {
        let tables = [&config.summary_table_class, &config.detail_table_class]
            .iter()
            .map(|class| {
                let s = format!("table.{class}");
                Selector::parse(&s).map_err(|e| AppError::selector(&s, format!("{e:?}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            tables,
            keywords: config.content_keywords.iter().map(|k| k.to_lowercase()).collect(),
        })
    }

    fn matches(&self, html: &str) -> bool {
        let document = Html::parse_document(html);
        if self.tables.iter().any(|s| document.select(s).next().is_some()) {
            return true;
        }

        let text = document
            .root_element()
            .text()
            .collect::<String>()
            .to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}
