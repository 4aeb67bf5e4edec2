//! Jenkins status aggregation.
//!
//! Queries a Jenkins job/build inventory, normalises its status encodings into
//! [`models::CanonicalStatus`], and assembles cross-job build history. When no
//! server is configured, or a listing call fails, deterministic fallback data
//! with the same shape is served instead.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod providers;

pub use error::{PulseError, Result};
pub use providers::jenkins::{AggregationEngine, EngineMode, EngineSettings};
