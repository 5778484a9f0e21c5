// src/lib.rs

//! Ratio Crawler Library
//!
//! Extracts admission competition-rate tables from portal ratio pages and
//! discovers which ratio pages are currently live.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
