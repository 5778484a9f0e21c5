//! Service layer for the ratio crawler.
//!
//! This module contains the business logic for:
//! - Ratio page extraction (`PageExtractor`)
//! - Ratio table decoding (`TableStructureParser`)
//! - Candidate URL generation (`UrlCandidateGenerator`)
//! - Availability probing (`AvailabilityProber`)
//! - Bounded concurrent discovery (`DiscoveryService`)
//! - Candidate listing and seed sources (`ListingSource`, `SeedSource`)
//! - Polling until pages open (`PollingWatcher`)

pub mod codes;
pub mod discovery;
pub mod extractor;
pub mod listing;
pub mod numeric;
pub mod prober;
pub mod table;
pub mod watcher;

pub use codes::{RatioCode, UrlCandidateGenerator};
pub use discovery::{DiscoveryReport, DiscoveryService};
pub use extractor::{NameStrategy, PageExtractor};
pub use listing::{CandidateSource, ListingParser, ListingSource, SeedSource};
pub use prober::{AvailabilityProber, Probe};
pub use table::{SummaryRow, TableStructureParser};
pub use watcher::{PollingWatcher, WatchEvent, WatchOutcome};
