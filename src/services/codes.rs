// src/services/codes.rs

//! Ratio page codes and candidate URL generation.
//!
//! A ratio page lives at `<base>Ratio<code>.html`, where `<code>` is the
//! four-digit institution code, the three-digit admission-type code and an
//! optional one-digit version suffix (`1003` + `032` + `1`).

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Config;

static PAIR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"goRatio\s*\(\s*'(\d+)'\s*,\s*'(\d+)'\s*\)").expect("valid goRatio pair pattern")
});

static SINGLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"goRatio\s*\(\s*'(\d+)'\s*\)").expect("valid goRatio pattern")
});

static PAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Ratio(\d+)\.html").expect("valid page pattern"));

/// Codes identifying one ratio page, as found in links and click handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatioCode {
    /// Four-digit institution code
    pub institution: String,
    /// Three-digit admission-type code
    pub type_code: String,
    /// Complete page code, when it was observed rather than assembled
    pub full: Option<String>,
}

impl RatioCode {
    /// Parse `goRatio('1003','032')`, `goRatio('10030321')` or a
    /// `Ratio10030321.html` reference, in that order.
    pub fn parse(text: &str) -> Option<Self> {
        if let Some(caps) = PAIR_PATTERN.captures(text) {
            return Some(Self {
                institution: caps[1].to_string(),
                type_code: caps[2].to_string(),
                full: None,
            });
        }

        SINGLE_PATTERN
            .captures(text)
            .or_else(|| PAGE_PATTERN.captures(text))
            .and_then(|caps| Self::from_full(&caps[1]))
    }

    /// Split a complete page code; at least seven digits are required.
    pub fn from_full(code: &str) -> Option<Self> {
        if code.len() < 7 || !code.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            institution: code[..4].to_string(),
            type_code: code[4..7].to_string(),
            full: Some(code.to_string()),
        })
    }
}

/// Builds ratio page URLs from codes and a version suffix set.
#[derive(Debug, Clone)]
pub struct UrlCandidateGenerator {
    base_url: String,
    suffixes: Vec<String>,
}

impl UrlCandidateGenerator {
    /// Suffixes are tried in the given order.
    pub fn new(base_url: impl Into<String>, suffixes: Vec<String>) -> Self {
        Self {
            base_url: base_url.into(),
            suffixes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.portal.ratio_base_url.clone(),
            config.discovery.suffixes.clone(),
        )
    }

    /// URL of the page with the given complete code.
    pub fn page_url(&self, code: &str) -> String {
        format!("{}Ratio{}.html", self.base_url, code)
    }

    /// Single most likely URL: the observed full code, else the first suffix.
    pub fn best_guess(&self, code: &RatioCode) -> String {
        match &code.full {
            Some(full) => self.page_url(full),
            None => {
                let suffix = self.suffixes.first().map(String::as_str).unwrap_or("");
                self.page_url(&format!("{}{}{}", code.institution, code.type_code, suffix))
            }
        }
    }

    /// One URL per suffix for a single type code.
    pub fn candidates(&self, institution: &str, type_code: &str) -> Vec<String> {
        self.suffixes
            .iter()
            .map(|suffix| self.page_url(&format!("{institution}{type_code}{suffix}")))
            .collect()
    }

    /// Every type code crossed with every suffix, type codes outermost.
    pub fn probe_matrix(&self, institution: &str, type_codes: &[String]) -> Vec<String> {
        type_codes
            .iter()
            .flat_map(|type_code| self.candidates(institution, type_code))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdmissionType;

    const BASE: &str = "https://addon.jinhakapply.com/RatioV1/RatioH/";

    fn generator() -> UrlCandidateGenerator {
        UrlCandidateGenerator::from_config(&Config::default())
    }

    #[test]
    fn test_parse_pair_handler() {
        let code = RatioCode::parse("javascript:goRatio('1003', '032');").unwrap();
        assert_eq!(code.institution, "1003");
        assert_eq!(code.type_code, "032");
        assert_eq!(code.full, None);
    }

    #[test]
    fn test_parse_single_handler() {
        let code = RatioCode::parse("goRatio('10030321')").unwrap();
        assert_eq!(code.institution, "1003");
        assert_eq!(code.type_code, "032");
        assert_eq!(code.full.as_deref(), Some("10030321"));
    }

    #[test]
    fn test_parse_page_url() {
        let code = RatioCode::parse(&format!("{BASE}Ratio1005032.html")).unwrap();
        assert_eq!(code.full.as_deref(), Some("1005032"));
    }

    #[test]
    fn test_parse_rejects_short_codes() {
        assert_eq!(RatioCode::parse("goRatio('100')"), None);
        assert_eq!(RatioCode::parse("javascript:void(0)"), None);
        assert_eq!(RatioCode::from_full("1003a321"), None);
    }

    #[test]
    fn test_best_guess() {
        let generator = generator();
        let observed = RatioCode::from_full("10030322").unwrap();
        assert_eq!(
            generator.best_guess(&observed),
            format!("{BASE}Ratio10030322.html")
        );

        let assembled = RatioCode::parse("goRatio('1003','032')").unwrap();
        assert_eq!(
            generator.best_guess(&assembled),
            format!("{BASE}Ratio10030321.html")
        );
    }

    #[test]
    fn test_candidates_follow_suffix_order() {
        assert_eq!(
            generator().candidates("1001", "032"),
            vec![
                format!("{BASE}Ratio10010321.html"),
                format!("{BASE}Ratio10010322.html"),
                format!("{BASE}Ratio1001032.html"),
            ]
        );
    }

    #[test]
    fn test_probe_matrix() {
        let urls = generator().probe_matrix("1001", &AdmissionType::Regular.probe_type_codes());
        assert_eq!(urls.len(), 9);
        assert_eq!(urls[0], format!("{BASE}Ratio10010321.html"));
        assert_eq!(urls[3], format!("{BASE}Ratio100103211.html"));
        assert_eq!(urls[8], format!("{BASE}Ratio10010322.html"));
    }
}
