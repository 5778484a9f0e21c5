//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Academic year attached to extracted records
    #[serde(default = "defaults::year")]
    pub year: i32,

    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Portal endpoints
    #[serde(default)]
    pub portal: PortalConfig,

    /// URL candidate discovery settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Polling watcher settings
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Structural markers and labels used by the page extractor
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.probe_timeout_secs == 0 || self.crawler.probe_timeout_secs > 10 {
            return Err(AppError::validation(
                "crawler.probe_timeout_secs must be between 1 and 10",
            ));
        }
        if self.crawler.page_timeout_secs == 0 {
            return Err(AppError::validation("crawler.page_timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.discovery.suffixes.is_empty() {
            return Err(AppError::validation("discovery.suffixes is empty"));
        }
        if self
            .discovery
            .suffixes
            .iter()
            .any(|s| s.len() > 1 || !s.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(AppError::validation(
                "discovery.suffixes must be empty or a single digit",
            ));
        }
        if self.watcher.max_attempts == 0 {
            return Err(AppError::validation("watcher.max_attempts must be > 0"));
        }
        if !self.portal.ratio_base_url.ends_with('/') {
            return Err(AppError::validation(
                "portal.ratio_base_url must end with '/'",
            ));
        }
        url::Url::parse(&self.portal.ratio_base_url)?;
        if self.extraction.reserved_labels.is_empty() {
            return Err(AppError::validation("extraction.reserved_labels is empty"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            year: defaults::year(),
            crawler: CrawlerConfig::default(),
            portal: PortalConfig::default(),
            discovery: DiscoveryConfig::default(),
            watcher: WatcherConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

/// HTTP client and crawling behavior settings.
///
/// The origin rejects clients that do not look like a browser, so the
/// header set mirrors a desktop Chrome request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Accept header
    #[serde(default = "defaults::accept")]
    pub accept: String,

    /// Accept-Language header
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Referer header, omitted when empty
    #[serde(default = "defaults::referer")]
    pub referer: String,

    /// Timeout for availability probes in seconds
    #[serde(default = "defaults::probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Timeout for ratio page fetches in seconds
    #[serde(default = "defaults::page_timeout")]
    pub page_timeout_secs: u64,

    /// Delay between sequential page fetches in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent probes in a discovery run
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl CrawlerConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept: defaults::accept(),
            accept_language: defaults::accept_language(),
            referer: defaults::referer(),
            probe_timeout_secs: defaults::probe_timeout(),
            page_timeout_secs: defaults::page_timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Portal endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Listing page that announces which universities are open
    #[serde(default = "defaults::smart_ratio_url")]
    pub smart_ratio_url: String,

    /// Base path that ratio pages live under (`<base>Ratio<code>.html`)
    #[serde(default = "defaults::ratio_base_url")]
    pub ratio_base_url: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            smart_ratio_url: defaults::smart_ratio_url(),
            ratio_base_url: defaults::ratio_base_url(),
        }
    }
}

/// URL candidate discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Version suffixes tried in order after `<institution><type>`
    #[serde(default = "defaults::suffixes")]
    pub suffixes: Vec<String>,

    /// Delay between sequential probes of one candidate in milliseconds
    #[serde(default = "defaults::probe_delay")]
    pub probe_delay_ms: u64,

    /// Number of candidates probed before committing to a full run
    #[serde(default = "defaults::sample_size")]
    pub sample_size: usize,

    /// Number of candidates sampled by the "is any page open" check
    #[serde(default = "defaults::open_check_sample")]
    pub open_check_sample: usize,
}

impl DiscoveryConfig {
    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            suffixes: defaults::suffixes(),
            probe_delay_ms: defaults::probe_delay(),
            sample_size: defaults::sample_size(),
            open_check_sample: defaults::open_check_sample(),
        }
    }
}

/// Polling watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Seconds to wait between attempts
    #[serde(default = "defaults::check_interval")]
    pub check_interval_secs: u64,

    /// Attempts before giving up
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: usize,
}

impl WatcherConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: defaults::check_interval(),
            max_attempts: defaults::max_attempts(),
        }
    }
}

/// Structural markers and labels used when reading ratio pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Class of the per-admission summary table
    #[serde(default = "defaults::summary_table_class")]
    pub summary_table_class: String,

    /// Class of the per-department detail tables
    #[serde(default = "defaults::detail_table_class")]
    pub detail_table_class: String,

    /// First-cell labels of total/subtotal rows
    #[serde(default = "defaults::reserved_labels")]
    pub reserved_labels: Vec<String>,

    /// Header labels that mark a merged grouping column
    #[serde(default = "defaults::group_header_labels")]
    pub group_header_labels: Vec<String>,

    /// Loose text markers that indicate ratio content
    #[serde(default = "defaults::content_keywords")]
    pub content_keywords: Vec<String>,

    /// Institution name used when no strategy finds one
    #[serde(default = "defaults::unknown_name")]
    pub unknown_name: String,

    /// Name template for admissions synthesized from detail tables; `{n}` is 1-based
    #[serde(default = "defaults::placeholder_admission")]
    pub placeholder_admission: String,
}

impl ExtractionConfig {
    /// Whether the text contains any reserved total/subtotal label.
    pub fn is_reserved(&self, text: &str) -> bool {
        self.reserved_labels
            .iter()
            .any(|label| text.contains(label.as_str()))
    }

    /// Placeholder name for the `index`-th (0-based) synthesized admission.
    pub fn placeholder_name(&self, index: usize) -> String {
        self.placeholder_admission
            .replace("{n}", &(index + 1).to_string())
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            summary_table_class: defaults::summary_table_class(),
            detail_table_class: defaults::detail_table_class(),
            reserved_labels: defaults::reserved_labels(),
            group_header_labels: defaults::group_header_labels(),
            content_keywords: defaults::content_keywords(),
            unknown_name: defaults::unknown_name(),
            placeholder_admission: defaults::placeholder_admission(),
        }
    }
}

mod defaults {
    pub fn year() -> i32 {
        2026
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn accept() -> String {
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".into()
    }
    pub fn accept_language() -> String {
        "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7".into()
    }
    pub fn referer() -> String {
        "https://apply.jinhakapply.com/".into()
    }
    pub fn probe_timeout() -> u64 {
        10
    }
    pub fn page_timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        500
    }
    pub fn max_concurrent() -> usize {
        5
    }

    // Portal defaults
    pub fn smart_ratio_url() -> String {
        "https://apply.jinhakapply.com/SmartRatio".into()
    }
    pub fn ratio_base_url() -> String {
        "https://addon.jinhakapply.com/RatioV1/RatioH/".into()
    }

    // Discovery defaults
    pub fn suffixes() -> Vec<String> {
        vec!["1".into(), "2".into(), String::new()]
    }
    pub fn probe_delay() -> u64 {
        100
    }
    pub fn sample_size() -> usize {
        5
    }
    pub fn open_check_sample() -> usize {
        3
    }

    // Watcher defaults
    pub fn check_interval() -> u64 {
        60
    }
    pub fn max_attempts() -> usize {
        60
    }

    // Extraction defaults
    pub fn summary_table_class() -> String {
        "tableRatio2".into()
    }
    pub fn detail_table_class() -> String {
        "tableRatio3".into()
    }
    pub fn reserved_labels() -> Vec<String> {
        vec!["합계".into(), "총계".into(), "소계".into()]
    }
    pub fn group_header_labels() -> Vec<String> {
        vec!["캠퍼스".into(), "campus".into()]
    }
    pub fn content_keywords() -> Vec<String> {
        vec![
            "경쟁률".into(),
            "지원인원".into(),
            "모집인원".into(),
            "competition rate".into(),
            "recruit count".into(),
        ]
    }
    pub fn unknown_name() -> String {
        "Unknown".into()
    }
    pub fn placeholder_admission() -> String {
        "Admission {n}".into()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_long_probe_timeout() {
        let mut config = Config::default();
        config.crawler.probe_timeout_secs = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_multi_digit_suffix() {
        let mut config = Config::default();
        config.discovery.suffixes = vec!["12".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "year = 2027\n[crawler]\nmax_concurrent = 8\n[watcher]\ncheck_interval_secs = 5"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.year, 2027);
        assert_eq!(config.crawler.max_concurrent, 8);
        assert_eq!(config.crawler.probe_timeout_secs, 10);
        assert_eq!(config.watcher.check_interval(), Duration::from_secs(5));
        assert_eq!(config.discovery.suffixes, vec!["1", "2", ""]);
    }

    #[test]
    fn load_or_default_falls_back() {
        let config = Config::load_or_default("/nonexistent/config.toml");
        assert_eq!(config.crawler.max_concurrent, 5);
    }

    #[test]
    fn reserved_label_is_containment_match() {
        let extraction = ExtractionConfig::default();
        assert!(extraction.is_reserved("정원내 소계"));
        assert!(extraction.is_reserved("합계"));
        assert!(!extraction.is_reserved("컴퓨터공학과"));
    }

    #[test]
    fn placeholder_name_is_one_based() {
        let extraction = ExtractionConfig::default();
        assert_eq!(extraction.placeholder_name(0), "Admission 1");
        assert_eq!(extraction.placeholder_name(2), "Admission 3");
    }
}
