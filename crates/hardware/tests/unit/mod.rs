//! # Unit Components
//!
//! Tests grouped by the source module they exercise.

/// Configuration parsing and validation.
pub mod config;
