//! Pipeline entry points for crawl runs.
//!
//! - `run_crawl`: Extract every candidate with a resolved URL
//! - `discover_and_crawl`: Refresh candidates, discover open pages, then crawl
//! - `CrawlJob`: Run state observed by callers while a crawl is in progress

pub mod crawl;
pub mod job;

pub use crawl::{CrawlOutcome, discover_and_crawl, run_crawl};
pub use job::{CrawlCounts, CrawlJob, ItemOutcome, JobSnapshot, JobState};
