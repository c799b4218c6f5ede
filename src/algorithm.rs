//! Adapter surface (C7): one estimator type regardless of pruning strategy.
//!
//! Grounded on `original_source/src/libminisyncpp/minisync_api.h`
//! (`API::Algorithm`, `API::Factory`), which dispatches through a virtual
//! base class. A tagged enum stands in for that here: the set of algorithms
//! is closed and small, so a `match` at the one call site that needs it reads
//! better than a trait object and avoids an allocation per estimator.

use std::time::SystemTime;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::core::Estimator;
use crate::error::SyncError;
use crate::estimate::{Estimate, LifecycleState};
use crate::minisync::MiniSync;
use crate::tinysync::TinySync;

/// Which pruning strategy to run. Selected at construction time and fixed
/// for the estimator's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[clap(rename_all = "kebab-case")]
pub enum Algorithm {
    /// O(1) memory, wider uncertainty bound over time.
    TinySync,
    /// O(n) worst-case memory (bounded in practice by hull size), tighter bound.
    MiniSync,
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::MiniSync
    }
}

/// The public estimator type. Construct with [`SyncEstimator::new`]; every
/// operation dispatches to the chosen algorithm's [`Estimator`].
pub enum SyncEstimator {
    Tiny(Estimator<TinySync>),
    Mini(Estimator<MiniSync>),
}

impl SyncEstimator {
    pub fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::TinySync => SyncEstimator::Tiny(Estimator::new()),
            Algorithm::MiniSync => SyncEstimator::Mini(Estimator::new()),
        }
    }

    pub fn with_epoch(algorithm: Algorithm, epoch: SystemTime) -> Self {
        match algorithm {
            Algorithm::TinySync => SyncEstimator::Tiny(Estimator::with_epoch(epoch)),
            Algorithm::MiniSync => SyncEstimator::Mini(Estimator::with_epoch(epoch)),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            SyncEstimator::Tiny(_) => Algorithm::TinySync,
            SyncEstimator::Mini(_) => Algorithm::MiniSync,
        }
    }

    pub fn add_sample(&mut self, t_o: f64, t_b: f64, t_r: f64) -> Result<(), SyncError> {
        match self {
            SyncEstimator::Tiny(e) => e.add_sample(t_o, t_b, t_r),
            SyncEstimator::Mini(e) => e.add_sample(t_o, t_b, t_r),
        }
    }

    pub fn drift(&self) -> Estimate {
        match self {
            SyncEstimator::Tiny(e) => e.drift(),
            SyncEstimator::Mini(e) => e.drift(),
        }
    }

    pub fn offset(&self) -> Estimate {
        match self {
            SyncEstimator::Tiny(e) => e.offset(),
            SyncEstimator::Mini(e) => e.offset(),
        }
    }

    pub fn adjusted_now(&self) -> f64 {
        match self {
            SyncEstimator::Tiny(e) => e.adjusted_now(),
            SyncEstimator::Mini(e) => e.adjusted_now(),
        }
    }

    pub fn adjusted_time(&self, local_us: f64) -> f64 {
        match self {
            SyncEstimator::Tiny(e) => e.adjusted_time(local_us),
            SyncEstimator::Mini(e) => e.adjusted_time(local_us),
        }
    }

    pub fn state(&self) -> LifecycleState {
        match self {
            SyncEstimator::Tiny(e) => e.state(),
            SyncEstimator::Mini(e) => e.state(),
        }
    }

    pub fn processed(&self) -> u32 {
        match self {
            SyncEstimator::Tiny(e) => e.processed(),
            SyncEstimator::Mini(e) => e.processed(),
        }
    }
}
