// src/models/ratio.rs

//! Competition-rate records produced by the page extractor.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{self, AppError};

/// Admission round a ratio page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionType {
    /// 수시
    Early,
    /// 정시
    Regular,
    /// 편입학
    Transfer,
}

impl AdmissionType {
    /// Three-digit code embedded in ratio page URLs.
    pub fn type_code(&self) -> &'static str {
        match self {
            AdmissionType::Early => "031",
            AdmissionType::Regular => "032",
            AdmissionType::Transfer => "033",
        }
    }

    /// Type codes tried during discovery: the bare code, then the code with
    /// each version digit folded in (`032`, `0321`, `0322`).
    pub fn probe_type_codes(&self) -> Vec<String> {
        let code = self.type_code();
        vec![code.to_string(), format!("{code}1"), format!("{code}2")]
    }

    /// Label used by the portal.
    pub fn label(&self) -> &'static str {
        match self {
            AdmissionType::Early => "수시",
            AdmissionType::Regular => "정시",
            AdmissionType::Transfer => "편입학",
        }
    }

    /// Guess the admission type from portal text such as "정시모집".
    pub fn from_label(text: &str) -> Option<Self> {
        if text.contains("수시") {
            Some(AdmissionType::Early)
        } else if text.contains("정시") {
            Some(AdmissionType::Regular)
        } else if text.contains("편입") {
            Some(AdmissionType::Transfer)
        } else {
            None
        }
    }
}

impl fmt::Display for AdmissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdmissionType::Early => "early",
            AdmissionType::Regular => "regular",
            AdmissionType::Transfer => "transfer",
        };
        f.write_str(s)
    }
}

impl FromStr for AdmissionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "early" | "031" => Ok(AdmissionType::Early),
            "regular" | "032" => Ok(AdmissionType::Regular),
            "transfer" | "033" => Ok(AdmissionType::Transfer),
            other => AdmissionType::from_label(other)
                .ok_or_else(|| AppError::validation(format!("unknown admission type '{s}'"))),
        }
    }
}

/// One academic program within an admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentRecord {
    /// Campus (merged grouping column), if the table has one
    pub campus: Option<String>,

    /// Program name, never empty and never a total/subtotal label
    pub name: String,

    /// Extra detail such as a major
    pub detail: Option<String>,

    pub recruit_count: u64,
    pub apply_count: u64,
    pub competition_rate: f64,
}

/// One named admission track with its departments in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionRecord {
    pub admission_name: String,

    /// Summary-table totals, zero when the page has no summary table
    pub total_recruit: u64,
    pub total_apply: u64,
    pub total_rate: f64,

    pub departments: Vec<DepartmentRecord>,
}

/// Everything extracted from one ratio page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageExtractionResult {
    pub institution_name: String,

    /// Full numeric code from the page URL, empty when the URL has none
    pub institution_code: String,

    /// Caller supplied, never inferred from the page
    pub admission_type: AdmissionType,

    pub year: i32,

    pub admissions: Vec<AdmissionRecord>,

    /// "... 현황" timestamp text printed on the page, if any
    pub source_updated: Option<String>,

    pub extracted_at: DateTime<Utc>,
}

/// Fields that identify page content, excluding the extraction timestamp.
#[derive(Serialize)]
struct FingerprintView<'a> {
    institution_name: &'a str,
    institution_code: &'a str,
    admission_type: AdmissionType,
    year: i32,
    admissions: &'a [AdmissionRecord],
    source_updated: Option<&'a str>,
}

impl PageExtractionResult {
    /// Four-digit institution identifier (prefix of the page code).
    pub fn institution_id(&self) -> &str {
        self.institution_code
            .get(..4)
            .unwrap_or(self.institution_code.as_str())
    }

    pub fn department_count(&self) -> usize {
        self.admissions.iter().map(|a| a.departments.len()).sum()
    }

    /// SHA-256 over the page content, ignoring `extracted_at`.
    ///
    /// Two extractions of an unchanged page share a fingerprint.
    pub fn fingerprint(&self) -> error::Result<String> {
        let view = FingerprintView {
            institution_name: &self.institution_name,
            institution_code: &self.institution_code,
            admission_type: self.admission_type,
            year: self.year,
            admissions: &self.admissions,
            source_updated: self.source_updated.as_deref(),
        };
        let bytes = serde_json::to_vec(&view)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

/// Outcome of a successful extraction pass over one document.
///
/// `NoData` is a valid result (the page holds no ratio tables) and is kept
/// apart from fetch failures, which are reported as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Found(PageExtractionResult),
    NoData,
}

impl Extraction {
    pub fn found(self) -> Option<PageExtractionResult> {
        match self {
            Extraction::Found(result) => Some(result),
            Extraction::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Extraction::NoData)
    }
}
