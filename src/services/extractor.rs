// src/services/extractor.rs

//! Ratio page extraction service.
//!
//! Turns one ratio page into a [`PageExtractionResult`]: institution identity
//! from the title or headings, admissions from the summary table, and
//! departments from the detail tables paired with summary rows by position.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{AdmissionRecord, AdmissionType, Config, Extraction, PageExtractionResult};
use crate::services::table::{TableStructureParser, element_text};
use crate::utils::http::{create_async_client, fetch_html};

static TITLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)(?:\s*경쟁률|\s*-|\s*\|)").expect("valid title pattern")
});

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Ratio(\d+)\.html").expect("valid code pattern"));

static UPDATED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}[-.]\d{2}[-.]\d{2}[^현\n]{0,40}현황").expect("valid update pattern")
});

const NAME_SELECTORS: &[&str] = &["h1", "h2", ".univ-name", "#univName"];

/// One way of finding the institution name, tried in order.
#[derive(Debug, Clone)]
pub enum NameStrategy {
    /// `<title>` text with the trailing "경쟁률" / separator suffix removed
    DocumentTitle,
    /// Text of the first element matching a selector
    Element(Selector),
}

impl NameStrategy {
    /// Title first, then the heading and class fallbacks.
    pub fn defaults() -> Result<Vec<Self>> {
        let mut strategies = vec![NameStrategy::DocumentTitle];
        for s in NAME_SELECTORS {
            strategies.push(NameStrategy::Element(parse_selector(s)?));
        }
        Ok(strategies)
    }

    /// Returns `None` when the strategy finds nothing usable.
    pub fn apply(&self, document: &Html) -> Option<String> {
        let found = match self {
            NameStrategy::DocumentTitle => {
                let title = Selector::parse("title").ok()?;
                let text = document.select(&title).next().map(element_text)?;
                match TITLE_PATTERN.captures(&text) {
                    Some(caps) => caps[1].trim().to_string(),
                    None => text.trim().to_string(),
                }
            }
            NameStrategy::Element(selector) => {
                document.select(selector).next().map(element_text)?
            }
        };
        Some(found).filter(|name| !name.is_empty())
    }
}

/// Extract the numeric page code from a ratio page URL, or an empty string.
pub fn institution_code_from_url(url: &str) -> String {
    CODE_PATTERN
        .captures(url)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Service extracting competition-rate records from ratio pages.
pub struct PageExtractor {
    config: Arc<Config>,
    client: Client,
    summary_selector: Selector,
    detail_selector: Selector,
    name_strategies: Vec<NameStrategy>,
}

impl PageExtractor {
    /// Create an extractor with its own HTTP client.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let client = create_async_client(&config.crawler)?;
        Self::with_client(config, client)
    }

    /// Create an extractor sharing an existing HTTP client.
    pub fn with_client(config: Arc<Config>, client: Client) -> Result<Self> {
        let summary_selector =
            parse_selector(&format!("table.{}", config.extraction.summary_table_class))?;
        let detail_selector =
            parse_selector(&format!("table.{}", config.extraction.detail_table_class))?;

        Ok(Self {
            config,
            client,
            summary_selector,
            detail_selector,
            name_strategies: NameStrategy::defaults()?,
        })
    }

    /// Politeness delay between sequential page fetches.
    pub fn request_delay(&self) -> Duration {
        self.config.crawler.request_delay()
    }

    /// Fetch a ratio page and extract it.
    ///
    /// Unreachable pages are returned as `AppError::Fetch`, never as
    /// `Extraction::NoData`.
    pub async fn extract_url(
        &self,
        url: &str,
        admission_type: AdmissionType,
        year: i32,
    ) -> Result<Extraction> {
        let decoded = fetch_html(&self.client, url, self.config.crawler.page_timeout()).await?;
        log::debug!(
            "Fetched {} ({} bytes, {})",
            url,
            decoded.text.len(),
            decoded.encoding
        );

        let extraction = self.extract_html(&decoded.text, url, admission_type, year, Utc::now());
        if extraction.is_no_data() {
            log::info!("No competition-rate data found: {}", url);
        }
        Ok(extraction)
    }

    /// Extract several pages sequentially, pausing between requests.
    ///
    /// Pages that fail or hold no data are logged and left out.
    pub async fn crawl_multiple(
        &self,
        urls: &[String],
        admission_type: AdmissionType,
        year: i32,
    ) -> Vec<PageExtractionResult> {
        let delay = self.request_delay();
        let mut results = Vec::new();

        for (i, url) in urls.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match self.extract_url(url, admission_type, year).await {
                Ok(Extraction::Found(result)) => results.push(result),
                Ok(Extraction::NoData) => {}
                Err(e) => log::warn!("Extraction failed for {}: {}", url, e),
            }
        }

        results
    }

    /// Extract an already fetched document.
    ///
    /// Pure: the same input always yields the same result.
    pub fn extract_html(
        &self,
        html: &str,
        url: &str,
        admission_type: AdmissionType,
        year: i32,
        extracted_at: DateTime<Utc>,
    ) -> Extraction {
        let document = Html::parse_document(html);

        let admissions = self.parse_admissions(&document);
        if admissions.is_empty() {
            return Extraction::NoData;
        }

        Extraction::Found(PageExtractionResult {
            institution_name: self.institution_name(&document),
            institution_code: institution_code_from_url(url),
            admission_type,
            year,
            admissions,
            source_updated: source_updated(&document),
            extracted_at,
        })
    }

    fn institution_name(&self, document: &Html) -> String {
        self.name_strategies
            .iter()
            .find_map(|strategy| strategy.apply(document))
            .unwrap_or_else(|| self.config.extraction.unknown_name.clone())
    }

    fn parse_admissions(&self, document: &Html) -> Vec<AdmissionRecord> {
        let parser = TableStructureParser::new(&self.config.extraction);

        let summary = document
            .select(&self.summary_selector)
            .next()
            .map(|table| parser.parse_summary_table(table))
            .unwrap_or_default();
        let detail_tables: Vec<_> = document.select(&self.detail_selector).collect();

        if !summary.is_empty() {
            if summary.len() != detail_tables.len() {
                log::debug!(
                    "{} summary rows but {} detail tables; pairing by position",
                    summary.len(),
                    detail_tables.len()
                );
            }
            return summary
                .into_iter()
                .enumerate()
                .map(|(i, row)| AdmissionRecord {
                    admission_name: row.name,
                    total_recruit: row.recruit,
                    total_apply: row.apply,
                    total_rate: row.rate,
                    departments: detail_tables
                        .get(i)
                        .map(|table| parser.parse_detail_table(*table))
                        .unwrap_or_default(),
                })
                .collect();
        }

        detail_tables
            .iter()
            .enumerate()
            .filter_map(|(i, table)| {
                let departments = parser.parse_detail_table(*table);
                (!departments.is_empty()).then(|| AdmissionRecord {
                    admission_name: self.config.extraction.placeholder_name(i),
                    total_recruit: 0,
                    total_apply: 0,
                    total_rate: 0.0,
                    departments,
                })
            })
            .collect()
    }
}

/// "2025-12-30 18:00 기준 지원현황" style label, whitespace collapsed.
fn source_updated(document: &Html) -> Option<String> {
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    UPDATED_PATTERN
        .find(&text)
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
}
