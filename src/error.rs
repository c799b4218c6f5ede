//! Error taxonomy for the estimator core.
//!
//! Degenerate constraint pairs and too-few-samples states never reach the
//! caller as errors: they are handled inline by skipping the pair or leaving
//! the estimate at its neutral default. `NonMonotoneDrift` is the one failure
//! a caller is expected to match on, so it gets a real type instead of a bare
//! `anyhow::Result`.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SyncError {
    /// A recompute produced `drift.value <= 0`. The estimate from before the
    /// failing sample is left in place; the caller typically drops the sample.
    #[error("non-monotone drift estimate ({offending_value}); prior estimate {prior_drift} retained")]
    NonMonotoneDrift { prior_drift: f64, offending_value: f64 },
}
