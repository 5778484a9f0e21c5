// src/models/mod.rs

//! Domain models for the ratio crawler.
//!
//! This module contains all data structures used throughout the crate,
//! organized by their primary purpose.

mod candidate;
mod config;
mod ratio;
mod seed;

// Re-export all public types
pub use candidate::{CandidateUniversity, UniversityStatus, parse_period};
pub use config::{
    Config, CrawlerConfig, DiscoveryConfig, ExtractionConfig, PortalConfig, WatcherConfig,
};
pub use ratio::{AdmissionRecord, AdmissionType, DepartmentRecord, Extraction, PageExtractionResult};
pub use seed::{Seed, SeedUniversity};
