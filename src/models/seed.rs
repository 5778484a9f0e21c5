//! Seed university list used when the portal listing cannot be read.
//!
//! The listing page is rendered client-side, so a static fetch usually
//! yields nothing. This list keeps discovery going until the real page
//! can be parsed.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{CandidateUniversity, UniversityStatus};

/// Root seed data structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seed {
    /// Portal admission label given to every seeded candidate
    #[serde(default = "default_admission_label")]
    pub admission_type: String,

    #[serde(default)]
    pub period_start: Option<String>,

    #[serde(default)]
    pub period_end: Option<String>,

    pub universities: Vec<SeedUniversity>,
}

/// One seeded institution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUniversity {
    pub name: String,

    #[serde(default)]
    pub region: String,

    /// Four-digit institution code, when known
    #[serde(default)]
    pub code: Option<String>,

    /// Previously observed ratio page URL
    #[serde(default)]
    pub url: Option<String>,
}

fn default_admission_label() -> String {
    "정시모집".to_string()
}

impl Seed {
    /// Load seed data from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate that seed data contains usable entries.
    pub fn validate(&self) -> Result<()> {
        if self.universities.is_empty() {
            return Err(AppError::validation("No universities defined in seed data"));
        }
        if let Some(bad) = self
            .universities
            .iter()
            .filter_map(|u| u.code.as_deref())
            .find(|code| code.len() != 4 || !code.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(AppError::validation(format!(
                "Institution code '{bad}' must be four digits"
            )));
        }
        Ok(())
    }

    /// Build fresh candidates in seed order.
    pub fn candidates(&self) -> Vec<CandidateUniversity> {
        self.universities
            .iter()
            .map(|u| CandidateUniversity {
                name: u.name.clone(),
                region: u.region.clone(),
                admission_type: self.admission_type.clone(),
                period_start: self.period_start.clone(),
                period_end: self.period_end.clone(),
                status: UniversityStatus::Preparing,
                resolved_url: u.url.clone(),
                institution_code: u.code.clone(),
                type_code: None,
            })
            .collect()
    }
}

/// Regular-admission universities announced on the portal, with the
/// institution codes observed so far.
const DEFAULT_UNIVERSITIES: &[(&str, &str, Option<&str>)] = &[
    ("가야대학교", "경남", None),
    ("가천대학교", "경기", None),
    ("강서대학교", "서울", None),
    ("건국대학교 서울캠퍼스", "서울", None),
    ("건국대학교(글로컬)", "충북", None),
    ("건양대학교", "충남", None),
    ("경남대학교", "경남", None),
    ("경동대학교", "강원", None),
    ("경상국립대학교", "경남", None),
    ("경운대학교", "경북", None),
    ("경인교육대학교", "인천", None),
    ("경일대학교", "경북", None),
    ("국립공주대학교", "충남", None),
    ("국립군산대학교", "전북", None),
    ("국립목포대학교", "전남", None),
    ("국립목포해양대학교", "전남", None),
    ("국립부경대학교", "부산", None),
    ("국립순천대학교", "전남", None),
    ("국립인천대학교", "인천", None),
    ("국립창원대학교", "경남", None),
    ("국립한국교통대학교", "충북", None),
    ("국립한밭대학교", "대전", None),
    ("김천대학교", "경북", None),
    ("단국대학교", "경기", None),
    ("대구가톨릭대학교", "경북", None),
    ("대구대학교", "경북", None),
    ("대구한의대학교", "경북", None),
    ("대신대학교", "경북", None),
    ("대전대학교", "대전", None),
    ("덕성여자대학교", "서울", None),
    ("동국대학교(서울)", "서울", None),
    ("동국대학교(WISE)", "경북", None),
    ("동명대학교", "부산", None),
    ("동서대학교", "부산", None),
    ("동아대학교", "부산", None),
    ("동양대학교", "경북", None),
    ("명지대학교", "서울", None),
    ("목원대학교", "대전", None),
    ("부산가톨릭대학교", "부산", None),
    ("부산교육대학교", "부산", None),
    ("부산대학교", "부산", None),
    ("부산외국어대학교", "부산", None),
    ("삼육대학교", "서울", None),
    ("서강대학교", "서울", Some("1005")),
    ("서경대학교", "서울", None),
    ("서울기독대학교", "서울", None),
    ("서울대학교", "서울", Some("1001")),
    ("서울여자대학교", "서울", None),
    ("서울한영대학교", "서울", None),
    ("서원대학교", "충북", None),
    ("성결대학교", "경기", None),
    ("성공회대학교", "서울", None),
    ("성균관대학교", "서울", Some("1006")),
    ("성신여자대학교", "서울", None),
    ("세명대학교", "충북", None),
    ("세종대학교", "서울", None),
    ("세한대학교", "전남", None),
    ("수원대학교", "경기", None),
    ("숙명여자대학교", "서울", None),
    ("숭실대학교", "서울", None),
    ("신라대학교", "부산", None),
    ("신한대학교", "경기", None),
    ("아주대학교", "경기", None),
    ("연세대학교(서울)", "서울", Some("1002")),
    ("영산대학교", "경남", None),
    ("예원예술대학교", "전북", None),
    ("우석대학교", "전북", None),
    ("위덕대학교", "경북", None),
    ("유원대학교(U1대학교)", "충북", None),
    ("을지대학교", "대전", None),
    ("이화여자대학교", "서울", None),
    ("조선대학교", "광주", None),
    ("중부대학교", "충남", None),
    ("중원대학교", "충북", None),
    ("창신대학교", "경남", None),
    ("청주교육대학교", "충북", None),
    ("춘천교육대학교", "강원", None),
    ("충남대학교", "대전", None),
    ("충북대학교", "충북", None),
    ("한경국립대학교", "경기", None),
    ("한국공학대학교", "경기", None),
    ("한국교원대학교", "충북", None),
    ("한국성서대학교", "서울", None),
    ("한국체육대학교", "서울", None),
    ("한국항공대학교", "경기", None),
    ("한남대학교", "대전", None),
    ("한동대학교", "경북", None),
    ("한서대학교", "충남", None),
    ("한신대학교", "경기", None),
    ("한양대학교(서울)", "서울", Some("1007")),
    ("한양대학교(ERICA)", "경기", None),
    ("호남대학교", "광주", None),
    ("호원대학교", "전북", None),
    ("홍익대학교(서울)", "서울", None),
    ("홍익대학교(세종)", "세종", None),
    ("화성의과학대학교", "경기", None),
];

impl Default for Seed {
    fn default() -> Self {
        Self {
            admission_type: default_admission_label(),
            period_start: Some("2025-12-29".to_string()),
            period_end: Some("2025-12-31".to_string()),
            universities: DEFAULT_UNIVERSITIES
                .iter()
                .map(|(name, region, code)| SeedUniversity {
                    name: (*name).to_string(),
                    region: (*region).to_string(),
                    code: code.map(str::to_string),
                    url: None,
                })
                .collect(),
        }
    }
}
