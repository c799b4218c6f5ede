//! TinySync pruning (C5): O(1) memory by keeping only the current winning
//! pair's two low and two high points.
//!
//! Grounded on `original_source/src/algorithms/minisync.cpp`
//! (`TinySyncAlgorithm::cleanup`, called `TinySync::cleanup` in
//! `libminisyncpp/minisync.cpp`): after every recompute, every point outside
//! the new tight pair is dropped, so the store never grows past four points
//! and two constraints of each polarity.

use crate::core::{Pruner, WinningPair};
use crate::ids::{HighId, LowId};
use crate::store::ConstraintStore;

#[derive(Default)]
pub struct TinySync;

impl Pruner for TinySync {
    fn on_low_inserted(&mut self, _store: &ConstraintStore, _id: LowId) {
        // No auxiliary state to maintain; pruning happens entirely in `prune`.
    }

    fn on_high_inserted(&mut self, _store: &ConstraintStore, _id: HighId) {}

    fn prune(&mut self, store: &mut ConstraintStore, winner: WinningPair) {
        store.retain(
            |id| id == winner.low || id == winner.low_of_high_constraint,
            |id| id == winner.high || id == winner.high_of_low_constraint,
        );
    }
}
