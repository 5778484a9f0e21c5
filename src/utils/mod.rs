//! Utility functions and helpers.

pub mod encoding;
pub mod http;
