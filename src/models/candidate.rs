//! Candidate universities whose ratio pages may or may not be live.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ratio page state as announced by the portal or confirmed by probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UniversityStatus {
    /// 준비중: page not published yet
    Preparing,
    /// 접수예정: opens soon
    Scheduled,
    /// 접수중: page live
    Open,
    /// 마감: applications closed
    Closed,
    #[default]
    Unknown,
}

impl UniversityStatus {
    /// Portal status labels, in the order they are matched.
    pub const LABELS: [(&'static str, UniversityStatus); 4] = [
        ("준비중", UniversityStatus::Preparing),
        ("접수예정", UniversityStatus::Scheduled),
        ("접수중", UniversityStatus::Open),
        ("마감", UniversityStatus::Closed),
    ];

    /// Map exact portal status text to a status.
    pub fn from_label(text: &str) -> Self {
        let text = text.trim();
        Self::LABELS
            .iter()
            .find(|(label, _)| *label == text)
            .map(|(_, status)| *status)
            .unwrap_or(UniversityStatus::Unknown)
    }

    /// Find a status label anywhere inside a cell's text.
    pub fn find_in(text: &str) -> Option<Self> {
        Self::LABELS
            .iter()
            .find(|(label, _)| text.contains(label))
            .map(|(_, status)| *status)
    }
}

impl fmt::Display for UniversityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UniversityStatus::Preparing => "preparing",
            UniversityStatus::Scheduled => "scheduled",
            UniversityStatus::Open => "open",
            UniversityStatus::Closed => "closed",
            UniversityStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// An institution whose live ratio URL is not yet confirmed.
///
/// Only the discovery task probing a candidate updates `status` and
/// `resolved_url`; everything else treats it as read-only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CandidateUniversity {
    pub name: String,

    #[serde(default)]
    pub region: String,

    /// Portal admission label, e.g. "정시모집"
    #[serde(default)]
    pub admission_type: String,

    #[serde(default)]
    pub period_start: Option<String>,

    #[serde(default)]
    pub period_end: Option<String>,

    #[serde(default)]
    pub status: UniversityStatus,

    /// Ratio page URL; authoritative once `status` is `Open`
    #[serde(default)]
    pub resolved_url: Option<String>,

    /// Four-digit institution code
    #[serde(default)]
    pub institution_code: Option<String>,

    /// Three-digit admission-type code
    #[serde(default)]
    pub type_code: Option<String>,
}

impl CandidateUniversity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, institution_code: impl Into<String>) -> Self {
        self.institution_code = Some(institution_code.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.resolved_url = Some(url.into());
        self
    }

    pub fn is_open(&self) -> bool {
        self.status == UniversityStatus::Open && self.resolved_url.is_some()
    }

    /// Record a confirmed live URL.
    pub(crate) fn mark_open(&mut self, url: String) {
        self.resolved_url = Some(url);
        self.status = UniversityStatus::Open;
    }
}

/// Split period text such as `2025-12-29 ~ 2025-12-31` into start and end.
pub fn parse_period(text: &str) -> (Option<String>, Option<String>) {
    let text = text.trim();
    if text.is_empty() {
        return (None, None);
    }

    // Dates themselves contain '-', so only split on '~' or a spaced dash.
    let parts: Vec<&str> = if text.contains('~') {
        text.split('~').collect()
    } else {
        text.split(" - ").collect()
    };

    let mut parts = parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    (parts.next(), parts.next())
}
