// src/pipeline/crawl.rs

//! Ratio page crawling pipeline.

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::models::{AdmissionType, CandidateUniversity, Extraction, PageExtractionResult};
use crate::pipeline::job::{CrawlCounts, CrawlJob, ItemOutcome};
use crate::services::{CandidateSource, DiscoveryService, PageExtractor};

/// Records produced by a crawl, ready for the persistence layer.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub results: Vec<PageExtractionResult>,
    pub counts: CrawlCounts,
}

/// Extract every candidate that has a resolved URL, one page at a time.
///
/// Candidates without a URL are skipped. A page that cannot be fetched is
/// counted as failed and the crawl moves on.
pub async fn run_crawl(
    extractor: &PageExtractor,
    candidates: &[CandidateUniversity],
    admission_type: AdmissionType,
    year: i32,
    job: &CrawlJob,
    token: &CancellationToken,
) -> Result<CrawlOutcome> {
    job.start(candidates.len())?;
    job.log(format!("Crawling {} universities", candidates.len()));

    let delay = extractor.request_delay();
    let mut results = Vec::new();
    let mut fetched_any = false;

    for candidate in candidates {
        if token.is_cancelled() {
            job.fail("cancelled")?;
            return Ok(outcome(results, job));
        }

        job.begin_item(&candidate.name);
        let Some(url) = candidate.resolved_url.as_deref() else {
            job.record(ItemOutcome::Skipped);
            continue;
        };

        if fetched_any && !delay.is_zero() {
            tokio::select! {
                _ = token.cancelled() => {
                    job.fail("cancelled")?;
                    return Ok(outcome(results, job));
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
        fetched_any = true;

        match extractor.extract_url(url, admission_type, year).await {
            Ok(Extraction::Found(result)) => {
                job.log(format!(
                    "✓ {}: {} admissions, {} departments",
                    candidate.name,
                    result.admissions.len(),
                    result.department_count()
                ));
                job.record(ItemOutcome::Success);
                results.push(result);
            }
            Ok(Extraction::NoData) => {
                job.log(format!("- {}: no ratio data", candidate.name));
                job.record(ItemOutcome::NoData);
            }
            Err(e) => {
                log::warn!("Crawl failed for {} ({}): {}", candidate.name, url, e);
                job.log(format!("✗ {}: {}", candidate.name, e));
                job.record(ItemOutcome::Failed);
            }
        }
    }

    job.finish()?;
    let outcome = outcome(results, job);
    job.log(format!(
        "Crawl complete: {} success, {} no data, {} failed, {} skipped",
        outcome.counts.success,
        outcome.counts.no_data,
        outcome.counts.failed,
        outcome.counts.skipped
    ));
    Ok(outcome)
}

/// Refresh candidates, discover open pages, then crawl them.
///
/// Ends `Finished` with no results when nothing is open yet. A failing
/// candidate source fails the job.
pub async fn discover_and_crawl(
    source: &dyn CandidateSource,
    discovery: &DiscoveryService,
    extractor: &PageExtractor,
    admission_type: AdmissionType,
    year: i32,
    job: &CrawlJob,
    token: &CancellationToken,
) -> Result<CrawlOutcome> {
    job.log("Collecting university list");
    let candidates = match source.candidates().await {
        Ok(candidates) => candidates,
        Err(e) => {
            job.fail(e.to_string())?;
            return Err(e);
        }
    };

    job.log(format!("Checking {} university URLs", candidates.len()));
    let report = discovery.discover_until(&candidates, token).await;
    if token.is_cancelled() {
        job.fail("cancelled")?;
        return Ok(CrawlOutcome::default());
    }

    if report.is_empty() {
        job.log("No open ratio pages");
        job.start(0)?;
        job.finish()?;
        return Ok(CrawlOutcome::default());
    }

    job.log(format!("{} ratio pages open", report.available.len()));
    run_crawl(extractor, &report.available, admission_type, year, job, token).await
}

fn outcome(results: Vec<PageExtractionResult>, job: &CrawlJob) -> CrawlOutcome {
    CrawlOutcome {
        results,
        counts: job.snapshot().counts,
    }
}
