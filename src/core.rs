//! Estimator base (C4): data-point ingestion, tight-pair search, estimate
//! recomputation, adjusted-time query.
//!
//! Grounded on `original_source/src/libminisyncpp/minisync.cpp`
//! (`Base::addDataPoint`, `Base::__recalculateEstimates`). The pruning step is
//! the one place TinySync and MiniSync differ; it is modeled here as a generic
//! `Pruner` type parameter instead of a virtual method, so each variant's
//! algorithm-specific state (none for TinySync, slope tables for MiniSync)
//! lives in its own concrete type.

use std::time::SystemTime;

use log::{debug, trace};

use crate::error::SyncError;
use crate::estimate::{Estimate, LifecycleState};
use crate::ids::{HighId, LowId};
use crate::point::Point;
use crate::store::ConstraintStore;

/// The winning (lower, upper) constraint pair's endpoints, cached so a pruner
/// can be told "never evict these".
#[derive(Debug, Clone, Copy)]
pub struct WinningPair {
    pub low: LowId,
    pub high_of_low_constraint: HighId,
    pub low_of_high_constraint: LowId,
    pub high: HighId,
}

/// Algorithm-specific bookkeeping invoked at the single pruning site.
/// `on_low_inserted`/`on_high_inserted` fire once per genuinely new point
/// (not on a duplicate-triple no-op), before the tight-pair search; `prune`
/// fires after the search, and must never evict a winning-pair endpoint.
pub trait Pruner: Default {
    fn on_low_inserted(&mut self, store: &ConstraintStore, id: LowId);
    fn on_high_inserted(&mut self, store: &ConstraintStore, id: HighId);
    fn prune(&mut self, store: &mut ConstraintStore, winner: WinningPair);
}

pub struct Estimator<P: Pruner> {
    store: ConstraintStore,
    processed: u32,
    winner: Option<WinningPair>,
    current_diff: f64,
    drift: Estimate,
    offset: Estimate,
    epoch: SystemTime,
    pruner: P,
}

impl<P: Pruner> Estimator<P> {
    pub fn new() -> Self {
        Estimator {
            store: ConstraintStore::new(),
            processed: 0,
            winner: None,
            current_diff: f64::INFINITY,
            drift: Estimate::neutral_drift(),
            offset: Estimate::neutral_offset(),
            epoch: SystemTime::UNIX_EPOCH,
            pruner: P::default(),
        }
    }

    pub fn with_epoch(epoch: SystemTime) -> Self {
        Estimator { epoch, ..Self::new() }
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::for_processed_count(self.processed)
    }

    pub fn processed(&self) -> u32 {
        self.processed
    }

    pub fn drift(&self) -> Estimate {
        self.drift
    }

    pub fn offset(&self) -> Estimate {
        self.offset
    }

    pub fn adjusted_now(&self) -> f64 {
        self.adjusted_time(now_micros())
    }

    /// Applies the current drift/offset estimate to an arbitrary local
    /// timestamp, expressed in microseconds since the estimator's epoch.
    pub fn adjusted_time(&self, local_us: f64) -> f64 {
        self.drift.value * local_us + self.offset.value
    }

    /// Ingests a `(T_o, T_b, T_r)` timing triple, files constraints against
    /// every opposite-polarity point on record, searches for the tightest
    /// constraint pair, prunes, and recomputes the drift/offset estimate.
    pub fn add_sample(&mut self, t_o: f64, t_b: f64, t_r: f64) -> Result<(), SyncError> {
        let low = Point::lower(t_b, t_o);
        let high = Point::upper(t_b, t_r);

        let (low_id, low_is_new) = self.store.add_lower(low);
        let (high_id, high_is_new) = self.store.add_upper(high);
        if low_is_new {
            self.pruner.on_low_inserted(&self.store, low_id);
        }
        if high_is_new {
            self.pruner.on_high_inserted(&self.store, high_id);
        }

        self.processed += 1;
        if self.processed < 2 {
            return Ok(());
        }

        let mut best_diff = f64::INFINITY;
        let mut best: Option<WinningPair> = None;
        for (lc, uc) in self.store.iter_constraints() {
            let diff = (lc.a - uc.a) * (uc.b - lc.b);
            if diff < best_diff {
                best_diff = diff;
                best = Some(WinningPair {
                    low: lc.low_id,
                    high_of_low_constraint: lc.high_id,
                    low_of_high_constraint: uc.low_id,
                    high: uc.high_id,
                });
            }
        }

        let Some(winner) = best else {
            // Fewer than one constraint of each polarity: leave estimate unchanged.
            return Ok(());
        };

        self.current_diff = best_diff;
        self.winner = Some(winner);
        trace!(
            "tight pair found: low=({:?},{:?}) high=({:?},{:?}) diff={}",
            winner.low, winner.high_of_low_constraint, winner.low_of_high_constraint, winner.high, best_diff
        );

        self.pruner.prune(&mut self.store, winner);

        let lc = self
            .store
            .lower_constraints
            .get(&(winner.low, winner.high_of_low_constraint))
            .copied()
            .expect("pruner must not evict the winning pair's endpoints");
        let uc = self
            .store
            .upper_constraints
            .get(&(winner.low_of_high_constraint, winner.high))
            .copied()
            .expect("pruner must not evict the winning pair's endpoints");

        let new_drift = Estimate {
            value: (lc.a + uc.a) / 2.0,
            error: (lc.a - uc.a) / 2.0,
        };
        let new_offset = Estimate {
            value: (lc.b + uc.b) / 2.0,
            error: (uc.b - lc.b) / 2.0,
        };

        if new_drift.value <= 0.0 {
            debug!("rejecting non-monotone drift estimate {}", new_drift.value);
            return Err(SyncError::NonMonotoneDrift {
                prior_drift: self.drift.value,
                offending_value: new_drift.value,
            });
        }

        self.drift = new_drift;
        self.offset = new_offset;
        debug!(
            "estimate updated: drift={:.9} (+/-{:.9}) offset={:.3}us (+/-{:.3}us) low_pts={} high_pts={}",
            self.drift.value,
            self.drift.error,
            self.offset.value,
            self.offset.error,
            self.store.low_len(),
            self.store.high_len()
        );

        Ok(())
    }

    #[cfg(test)]
    pub fn store(&self) -> &ConstraintStore {
        &self.store
    }
}

impl<P: Pruner> Default for Estimator<P> {
    fn default() -> Self {
        Self::new()
    }
}

fn now_micros() -> f64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1_000_000.0)
        .unwrap_or(0.0)
}
