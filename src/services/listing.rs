// src/services/listing.rs

//! Candidate universities from the portal listing page.
//!
//! The listing is usually rendered client-side, so a static fetch often has
//! no rows at all. [`ListingSource`] then falls back to the seed list.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{CandidateUniversity, Config, Seed, UniversityStatus, parse_period};
use crate::services::codes::{RatioCode, UrlCandidateGenerator};
use crate::services::table::element_text;
use crate::utils::http::{create_async_client, fetch_html};

const ADMISSION_KEYWORDS: &[&str] = &["정시", "수시", "편입"];

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("valid date pattern"));

/// Anything that can produce a fresh candidate list.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn candidates(&self) -> Result<Vec<CandidateUniversity>>;
}

/// Parses listing documents into candidates.
pub struct ListingParser {
    generator: UrlCandidateGenerator,
    admission_label: String,
    row_selector: Selector,
    cell_selector: Selector,
    link_selector: Selector,
    ratio_link_selector: Selector,
}

impl ListingParser {
    pub fn new(
        generator: UrlCandidateGenerator,
        admission_label: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            generator,
            admission_label: admission_label.into(),
            row_selector: parse_selector("tr")?,
            cell_selector: parse_selector("td, th")?,
            link_selector: parse_selector("a")?,
            ratio_link_selector: parse_selector(r#"a[href*="Ratio"], a[onclick*="goRatio"]"#)?,
        })
    }

    /// Candidates from table rows, or from bare ratio links when the page
    /// has no usable rows. `base` resolves relative links.
    pub fn parse(&self, html: &str, base: Option<&Url>) -> Vec<CandidateUniversity> {
        let document = Html::parse_document(html);

        let from_rows: Vec<_> = document
            .select(&self.row_selector)
            .filter_map(|row| self.parse_row(row, base))
            .collect();
        if !from_rows.is_empty() {
            return from_rows;
        }

        document
            .select(&self.ratio_link_selector)
            .filter_map(|link| self.parse_link(link, base))
            .collect()
    }

    /// `[region, name link, admission type, period, status]`, with columns
    /// recognised by content rather than position.
    fn parse_row(&self, row: ElementRef<'_>, base: Option<&Url>) -> Option<CandidateUniversity> {
        let cells: Vec<_> = row.select(&self.cell_selector).collect();
        if cells.len() < 3 {
            return None;
        }

        let mut candidate = self.blank();
        for (i, cell) in cells.iter().enumerate() {
            if let Some(link) = cell.select(&self.link_selector).next() {
                candidate.name = element_text(link);
                self.apply_link(&mut candidate, link, base);
                continue;
            }

            let text = element_text(*cell);
            if let Some(status) = UniversityStatus::find_in(&text) {
                candidate.status = status;
            } else if text.contains('~') || looks_like_date(&text) {
                (candidate.period_start, candidate.period_end) = parse_period(&text);
            } else if ADMISSION_KEYWORDS.iter().any(|k| text.contains(k)) {
                candidate.admission_type = text;
            } else if i == 0 && !text.is_empty() && text.chars().count() <= 4 {
                candidate.region = text;
            }
        }

        (!candidate.name.is_empty()).then_some(candidate)
    }

    fn parse_link(&self, link: ElementRef<'_>, base: Option<&Url>) -> Option<CandidateUniversity> {
        let name = element_text(link);
        if name.chars().count() < 2 {
            return None;
        }

        let mut candidate = self.blank();
        candidate.name = name;
        self.apply_link(&mut candidate, link, base);
        Some(candidate)
    }

    /// Take codes and URL from a link's click handler or href.
    fn apply_link(
        &self,
        candidate: &mut CandidateUniversity,
        link: ElementRef<'_>,
        base: Option<&Url>,
    ) {
        let onclick = link
            .value()
            .attr("onclick")
            .filter(|s| !s.is_empty() && *s != "javascript:void(0)");
        let href = link.value().attr("href").filter(|s| s.contains("Ratio"));

        let code = onclick
            .and_then(RatioCode::parse)
            .or_else(|| href.and_then(RatioCode::parse));

        if let Some(href) = href.filter(|h| RatioCode::parse(h).is_some()) {
            candidate.resolved_url = Some(resolve(href, base));
        }

        if let Some(code) = code {
            if candidate.resolved_url.is_none() {
                candidate.resolved_url = Some(self.generator.best_guess(&code));
            }
            candidate.institution_code = Some(code.institution);
            candidate.type_code = Some(code.type_code);
        }
    }

    fn blank(&self) -> CandidateUniversity {
        CandidateUniversity {
            admission_type: self.admission_label.clone(),
            ..CandidateUniversity::default()
        }
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn looks_like_date(text: &str) -> bool {
    DATE_PATTERN.is_match(text)
}

fn resolve(href: &str, base: Option<&Url>) -> String {
    base.and_then(|b| b.join(href).ok())
        .map(String::from)
        .unwrap_or_else(|| href.to_string())
}

/// The static seed list.
pub struct SeedSource {
    seed: Seed,
}

impl SeedSource {
    pub fn new(seed: Seed) -> Self {
        Self { seed }
    }
}

#[async_trait]
impl CandidateSource for SeedSource {
    async fn candidates(&self) -> Result<Vec<CandidateUniversity>> {
        Ok(self.seed.candidates())
    }
}

/// The live listing page, falling back to a seed list when it yields nothing.
pub struct ListingSource {
    config: Arc<Config>,
    client: Client,
    parser: ListingParser,
    fallback: Option<Seed>,
}

impl ListingSource {
    pub fn new(config: Arc<Config>, fallback: Option<Seed>) -> Result<Self> {
        if let Some(seed) = &fallback {
            seed.validate()?;
        }
        let client = create_async_client(&config.crawler)?;
        let label = fallback
            .as_ref()
            .map(|s| s.admission_type.clone())
            .unwrap_or_default();
        let parser = ListingParser::new(UrlCandidateGenerator::from_config(&config), label)?;

        Ok(Self {
            config,
            client,
            parser,
            fallback,
        })
    }

    async fn fetch_listing(&self) -> Result<Vec<CandidateUniversity>> {
        let url = &self.config.portal.smart_ratio_url;
        let decoded = fetch_html(&self.client, url, self.config.crawler.page_timeout()).await?;
        let base = Url::parse(url)?;
        Ok(self.parser.parse(&decoded.text, Some(&base)))
    }
}

#[async_trait]
impl CandidateSource for ListingSource {
    async fn candidates(&self) -> Result<Vec<CandidateUniversity>> {
        let listed = match self.fetch_listing().await {
            Ok(listed) => listed,
            Err(e) => match &self.fallback {
                Some(seed) => {
                    log::warn!("Listing fetch failed: {}. Using seed list.", e);
                    return Ok(seed.candidates());
                }
                None => return Err(e),
            },
        };

        if !listed.is_empty() {
            log::info!("Listing page yielded {} candidates", listed.len());
            return Ok(listed);
        }

        match &self.fallback {
            Some(seed) => {
                log::info!("Listing page has no static rows. Using seed list.");
                Ok(seed.candidates())
            }
            None => Ok(listed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://addon.jinhakapply.com/RatioV1/RatioH/";

    fn parser() -> ListingParser {
        let generator = UrlCandidateGenerator::from_config(&Config::default());
        ListingParser::new(generator, "정시모집").unwrap()
    }

    #[test]
    fn test_parse_rows() {
        let html = r#"<table>
            <tr><th>지역</th><th>대학명</th><th>입시구분</th><th>기간</th><th>상태</th></tr>
            <tr>
                <td>경기</td>
                <td><a href="javascript:void(0)" onclick="goRatio('1003','032')">가톨릭대학교</a></td>
                <td>정시모집</td>
                <td>2025-12-29 ~ 2025-12-31</td>
                <td>접수중</td>
            </tr>
            <tr>
                <td>서울</td>
                <td><a href="/RatioV1/RatioH/Ratio10010321.html">서울대학교</a></td>
                <td>정시모집</td>
                <td>2025-12-30</td>
                <td>준비중</td>
            </tr>
        </table>"#;

        let base = Url::parse("https://addon.jinhakapply.com/SmartRatio").unwrap();
        let candidates = parser().parse(html, Some(&base));
        assert_eq!(candidates.len(), 2);

        let catholic = &candidates[0];
        assert_eq!(catholic.name, "가톨릭대학교");
        assert_eq!(catholic.region, "경기");
        assert_eq!(catholic.status, UniversityStatus::Open);
        assert_eq!(catholic.period_start.as_deref(), Some("2025-12-29"));
        assert_eq!(catholic.period_end.as_deref(), Some("2025-12-31"));
        assert_eq!(catholic.institution_code.as_deref(), Some("1003"));
        assert_eq!(catholic.type_code.as_deref(), Some("032"));
        assert_eq!(
            catholic.resolved_url.as_deref(),
            Some(format!("{BASE}Ratio10030321.html").as_str())
        );

        let snu = &candidates[1];
        assert_eq!(snu.status, UniversityStatus::Preparing);
        assert_eq!(snu.period_start.as_deref(), Some("2025-12-30"));
        assert_eq!(
            snu.resolved_url.as_deref(),
            Some(format!("{BASE}Ratio10010321.html").as_str())
        );
        assert_eq!(snu.institution_code.as_deref(), Some("1001"));
    }

    #[test]
    fn test_parse_bare_links() {
        let html = r#"<div>
            <a href="https://addon.jinhakapply.com/RatioV1/RatioH/Ratio10050321.html">서강대학교</a>
            <a onclick="goRatio('10060322')">성균관대학교</a>
            <a href="/about">소개</a>
            <a href="Ratio1.html">X</a>
        </div>"#;

        let candidates = parser().parse(html, None);
        let names: Vec<_> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["서강대학교", "성균관대학교"]);
        assert_eq!(candidates[0].admission_type, "정시모집");
        assert_eq!(
            candidates[1].resolved_url.as_deref(),
            Some(format!("{BASE}Ratio10060322.html").as_str())
        );
    }

    #[test]
    fn test_client_rendered_page_yields_nothing() {
        let html = r#"<html><body><div id="app"></div><script src="app.js"></script></body></html>"#;
        assert!(parser().parse(html, None).is_empty());
    }

    #[test]
    fn test_looks_like_date() {
        assert!(looks_like_date("2025-12-29 09:00"));
        assert!(!looks_like_date("2025/12/29"));
        assert!(!looks_like_date("서울"));
        assert!(!looks_like_date("접수 2025-12-29"));
    }

    #[test]
    fn test_listing_source_rejects_empty_fallback() {
        let seed = Seed {
            universities: Vec::new(),
            ..Seed::default()
        };
        assert!(ListingSource::new(Arc::new(Config::default()), Some(seed)).is_err());
    }

    #[tokio::test]
    async fn test_seed_source() {
        let source = SeedSource::new(Seed::default());
        let candidates = source.candidates().await.unwrap();
        assert_eq!(candidates.len(), Seed::default().universities.len());
    }
}
