// src/services/discovery.rs

//! Ratio page discovery service.
//!
//! Probes a list of candidates with at most `max_concurrent` in flight.
//! A failing candidate never affects its siblings, and the confirmed
//! candidates come back in input order.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::models::{AdmissionType, CandidateUniversity, Config};
use crate::services::codes::UrlCandidateGenerator;
use crate::services::prober::Probe;

/// Result of one discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Number of candidates checked
    pub checked: usize,
    /// Confirmed-open candidates, in input order
    pub available: Vec<CandidateUniversity>,
}

impl DiscoveryReport {
    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }
}

/// Bounded concurrent discovery over candidate universities.
pub struct DiscoveryService {
    probe: Arc<dyn Probe>,
    generator: UrlCandidateGenerator,
    type_codes: Vec<String>,
    concurrency: usize,
    probe_delay: Duration,
    open_check_sample: usize,
}

impl DiscoveryService {
    /// Create a discovery service for one admission round.
    pub fn new(probe: Arc<dyn Probe>, config: &Config, admission_type: AdmissionType) -> Self {
        Self {
            probe,
            generator: UrlCandidateGenerator::from_config(config),
            type_codes: admission_type.probe_type_codes(),
            concurrency: config.crawler.max_concurrent.max(1),
            probe_delay: config.discovery.probe_delay(),
            open_check_sample: config.discovery.open_check_sample.max(1),
        }
    }

    /// Override the concurrency ceiling.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Probe every candidate and return the confirmed-open ones.
    ///
    /// The input is left untouched; returned candidates carry the confirmed
    /// URL and `Open` status.
    pub async fn discover(&self, candidates: &[CandidateUniversity]) -> DiscoveryReport {
        self.discover_until(candidates, &CancellationToken::new()).await
    }

    /// Like [`discover`](Self::discover), stopping early once `token` is
    /// cancelled. Candidates still unresolved at that point count as unavailable.
    pub async fn discover_until(
        &self,
        candidates: &[CandidateUniversity],
        token: &CancellationToken,
    ) -> DiscoveryReport {
        let mut resolved: Vec<(usize, CandidateUniversity)> =
            stream::iter(candidates.iter().cloned().enumerate())
                .map(|(index, candidate)| async move {
                    let result = tokio::select! {
                        biased;
                        _ = token.cancelled() => None,
                        result = self.resolve(candidate) => result,
                    };
                    result.map(|c| (index, c))
                })
                .buffer_unordered(self.concurrency)
                .filter_map(|result| async move { result })
                .collect()
                .await;

        resolved.sort_by_key(|(index, _)| *index);

        let report = DiscoveryReport {
            checked: candidates.len(),
            available: resolved.into_iter().map(|(_, c)| c).collect(),
        };
        log::info!(
            "Discovery checked {} candidates, {} open",
            report.checked,
            report.available.len()
        );
        report
    }

    /// Whether any of the first few candidates already serves a ratio page.
    pub async fn any_open(&self, candidates: &[CandidateUniversity]) -> bool {
        let sample = &candidates[..candidates.len().min(self.open_check_sample)];
        !self.discover(sample).await.is_empty()
    }

    /// Confirm one candidate: its known URL first, then the code matrix.
    async fn resolve(&self, mut candidate: CandidateUniversity) -> Option<CandidateUniversity> {
        if let Some(url) = candidate.resolved_url.clone() {
            if self.probe.check(&url).await {
                candidate.mark_open(url);
                return Some(candidate);
            }
            log::debug!("{}: known URL unavailable, trying code matrix", candidate.name);
        }

        let Some(institution) = candidate
            .institution_code
            .as_deref()
            .and_then(|code| code.get(..4))
        else {
            log::debug!("{}: no institution code, skipping", candidate.name);
            return None;
        };

        let type_codes = match candidate.type_code.as_deref() {
            Some(code) => vec![code.to_string(), format!("{code}1"), format!("{code}2")],
            None => self.type_codes.clone(),
        };

        for (i, url) in self
            .generator
            .probe_matrix(institution, &type_codes)
            .into_iter()
            .enumerate()
        {
            if i > 0 && !self.probe_delay.is_zero() {
                tokio::time::sleep(self.probe_delay).await;
            }
            if self.probe.check(&url).await {
                log::info!("{}: ratio page open at {}", candidate.name, url);
                candidate.mark_open(url);
                return Some(candidate);
            }
        }

        log::debug!("{}: no open ratio page", candidate.name);
        None
    }
}
