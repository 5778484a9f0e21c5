// src/pipeline/job.rs

//! Crawl run state.
//!
//! A [`CrawlJob`] is owned by whoever drives a crawl. Observers follow it
//! through a `watch` channel of [`JobSnapshot`]s and read the recent log
//! lines from a bounded ring buffer.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::error::{AppError, Result};

const DEFAULT_LOG_CAPACITY: usize = 200;

/// Lifecycle of a crawl job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Created,
    Running,
    Finished,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Finished | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Created => "created",
            JobState::Running => "running",
            JobState::Finished => "finished",
            JobState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Per-page outcome of a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Success,
    NoData,
    Failed,
    /// No URL to fetch
    Skipped,
}

/// Outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlCounts {
    pub total: usize,
    pub success: usize,
    pub no_data: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl CrawlCounts {
    pub fn processed(&self) -> usize {
        self.success + self.no_data + self.failed + self.skipped
    }

    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Success => self.success += 1,
            ItemOutcome::NoData => self.no_data += 1,
            ItemOutcome::Failed => self.failed += 1,
            ItemOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Point-in-time view of a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub state: JobState,
    pub counts: CrawlCounts,
    /// Item currently being processed
    pub current: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// One run of the crawl pipeline.
pub struct CrawlJob {
    state: watch::Sender<JobSnapshot>,
    logs: Mutex<VecDeque<String>>,
    log_capacity: usize,
}

impl CrawlJob {
    pub fn new() -> Self {
        Self::with_log_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_log_capacity(log_capacity: usize) -> Self {
        let (state, _) = watch::channel(JobSnapshot::default());
        Self {
            state,
            logs: Mutex::new(VecDeque::with_capacity(log_capacity.min(DEFAULT_LOG_CAPACITY))),
            log_capacity: log_capacity.max(1),
        }
    }

    /// Receive a snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.state.borrow().clone()
    }

    pub fn state(&self) -> JobState {
        self.state.borrow().state
    }

    /// `Created → Running`.
    pub fn start(&self, total: usize) -> Result<()> {
        self.transition(&[JobState::Created], JobState::Running, |snap| {
            snap.counts.total = total;
            snap.started_at = Some(Utc::now());
        })
    }

    /// `Running → Finished`.
    pub fn finish(&self) -> Result<()> {
        self.transition(&[JobState::Running], JobState::Finished, |snap| {
            snap.current = None;
            snap.finished_at = Some(Utc::now());
        })
    }

    /// `Created | Running → Failed`.
    pub fn fail(&self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.log(format!("failed: {message}"));
        self.transition(
            &[JobState::Created, JobState::Running],
            JobState::Failed,
            |snap| {
                snap.current = None;
                snap.finished_at = Some(Utc::now());
                snap.error = Some(message);
            },
        )
    }

    /// Mark the item now being processed.
    pub fn begin_item(&self, name: &str) {
        self.state.send_modify(|snap| snap.current = Some(name.to_string()));
    }

    /// Count one processed item.
    pub fn record(&self, outcome: ItemOutcome) {
        self.state.send_modify(|snap| snap.counts.record(outcome));
    }

    /// Append a log line, dropping the oldest beyond capacity.
    pub fn log(&self, line: impl Into<String>) {
        let line = line.into();
        log::info!("{}", line);

        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        if logs.len() == self.log_capacity {
            logs.pop_front();
        }
        logs.push_back(line);
    }

    /// Retained log lines, oldest first.
    pub fn logs(&self) -> Vec<String> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    fn transition(
        &self,
        from: &[JobState],
        to: JobState,
        apply: impl FnOnce(&mut JobSnapshot),
    ) -> Result<()> {
        let mut rejected = None;
        self.state.send_if_modified(|snap| {
            if from.contains(&snap.state) {
                snap.state = to;
                apply(snap);
                true
            } else {
                rejected = Some(snap.state);
                false
            }
        });

        match rejected {
            Some(current) => Err(AppError::job(format!("cannot move from {current} to {to}"))),
            None => Ok(()),
        }
    }
}

impl Default for CrawlJob {
    fn default() -> Self {
        Self::new()
    }
}
