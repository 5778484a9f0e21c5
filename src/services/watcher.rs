// src/services/watcher.rs

//! Polling until ratio pages open.
//!
//! Each attempt refreshes the candidate list and probes a small sample. Only
//! when the sample shows an open page is the full list probed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::models::{CandidateUniversity, Config};
use crate::services::discovery::{DiscoveryReport, DiscoveryService};
use crate::services::listing::CandidateSource;

/// Progress notifications emitted while watching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    AttemptStarted {
        attempt: usize,
        max_attempts: usize,
        candidates: usize,
    },
    SourceFailed {
        attempt: usize,
        message: String,
    },
    StillClosed {
        attempt: usize,
        next_check: Duration,
    },
    Opened {
        attempt: usize,
        sample_open: usize,
    },
}

/// How a watch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The sample showed open pages; holds the full discovery run
    Opened(DiscoveryReport),
    /// The attempt budget ran out
    Exhausted { attempts: usize },
    Cancelled,
}

impl WatchOutcome {
    /// Confirmed-open candidates, empty unless the watch succeeded.
    pub fn available(&self) -> &[CandidateUniversity] {
        match self {
            WatchOutcome::Opened(report) => &report.available,
            _ => &[],
        }
    }
}

/// Repeats discovery on a fixed interval.
pub struct PollingWatcher {
    source: Arc<dyn CandidateSource>,
    discovery: DiscoveryService,
    interval: Duration,
    max_attempts: usize,
    sample_size: usize,
    token: CancellationToken,
    events: Option<UnboundedSender<WatchEvent>>,
}

impl PollingWatcher {
    pub fn new(
        source: Arc<dyn CandidateSource>,
        discovery: DiscoveryService,
        config: &Config,
    ) -> Self {
        Self {
            source,
            discovery,
            interval: config.watcher.check_interval(),
            max_attempts: config.watcher.max_attempts,
            sample_size: config.discovery.sample_size.max(1),
            token: CancellationToken::new(),
            events: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_events(mut self, events: UnboundedSender<WatchEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Token that stops [`run`](Self::run) from outside.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Watch until pages open, the attempts run out, or the token is cancelled.
    pub async fn run(&self) -> WatchOutcome {
        for attempt in 1..=self.max_attempts {
            if self.token.is_cancelled() {
                return WatchOutcome::Cancelled;
            }

            match self.source.candidates().await {
                Ok(candidates) => {
                    if let Some(outcome) = self.attempt(attempt, &candidates).await {
                        return outcome;
                    }
                }
                Err(e) => {
                    log::warn!("Attempt {}: candidate list unavailable: {}", attempt, e);
                    self.emit(WatchEvent::SourceFailed {
                        attempt,
                        message: e.to_string(),
                    });
                }
            }

            if attempt == self.max_attempts {
                break;
            }

            self.emit(WatchEvent::StillClosed {
                attempt,
                next_check: self.interval,
            });
            tokio::select! {
                _ = self.token.cancelled() => return WatchOutcome::Cancelled,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        log::info!("No ratio pages opened after {} attempts", self.max_attempts);
        WatchOutcome::Exhausted {
            attempts: self.max_attempts,
        }
    }

    /// One sample-then-full pass. `None` means still closed.
    async fn attempt(
        &self,
        attempt: usize,
        candidates: &[CandidateUniversity],
    ) -> Option<WatchOutcome> {
        log::info!(
            "Attempt {}/{}: checking {} candidates",
            attempt,
            self.max_attempts,
            candidates.len()
        );
        self.emit(WatchEvent::AttemptStarted {
            attempt,
            max_attempts: self.max_attempts,
            candidates: candidates.len(),
        });

        let sample = &candidates[..candidates.len().min(self.sample_size)];
        let sample_report = self.discovery.discover_until(sample, &self.token).await;
        if self.token.is_cancelled() {
            return Some(WatchOutcome::Cancelled);
        }
        if sample_report.is_empty() {
            return None;
        }

        self.emit(WatchEvent::Opened {
            attempt,
            sample_open: sample_report.available.len(),
        });

        let report = self.discovery.discover_until(candidates, &self.token).await;
        if self.token.is_cancelled() {
            return Some(WatchOutcome::Cancelled);
        }
        Some(WatchOutcome::Opened(report))
    }

    fn emit(&self, event: WatchEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is listening.
            let _ = events.send(event);
        }
    }
}
