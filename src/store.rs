//! Constraint store (C3): slabs of points keyed by stable ids, plus the
//! lower/upper constraint maps built from them.
//!
//! Grounded on `original_source/src/libminisyncpp/minisync.h`/`.cpp`
//! (`SyncAlgorithm`'s `low_points`/`high_points`/`low_constraints`/
//! `high_constraints` and `addLowPoint`/`addHighPoint`/`addConstraint`), recast
//! as an arena of small integer ids instead of `shared_ptr` cycles: eviction
//! becomes "free this id", trimming every map keyed on it in a single pass
//! (see [`ConstraintStore::retain`]).

use std::collections::HashMap;

use crate::constraint::{ConstraintKind, ConstraintLine};
use crate::ids::{HighId, LowId};
use crate::point::Point;

/// Total order key for `f64` coordinates, used to keep the lower and upper
/// point collections ordered by `x` without requiring `Ord` on `f64` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct FloatKey(u64);

impl FloatKey {
    fn new(v: f64) -> Self {
        // Standard total-order bit trick for IEEE-754 doubles: negative numbers
        // sort by their bit-inverted pattern, non-negative numbers by their
        // pattern with the sign bit set, producing a `u64` whose natural order
        // matches float order (NaNs aside, which this domain never produces).
        let bits = v.to_bits();
        let key = if bits >> 63 == 1 { !bits } else { bits | (1u64 << 63) };
        FloatKey(key)
    }
}

#[derive(Default)]
struct Slab<T> {
    slots: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> Slab<T> {
    fn insert(&mut self, value: T) -> u32 {
        if let Some(id) = self.free.pop() {
            self.slots[id as usize] = Some(value);
            id
        } else {
            self.slots.push(Some(value));
            (self.slots.len() - 1) as u32
        }
    }

    fn get(&self, id: u32) -> Option<&T> {
        self.slots.get(id as usize).and_then(|s| s.as_ref())
    }

    fn remove(&mut self, id: u32) -> Option<T> {
        let slot = self.slots.get_mut(id as usize)?;
        let value = slot.take();
        if value.is_some() {
            self.free.push(id);
        }
        value
    }
}

#[derive(Default)]
pub struct ConstraintStore {
    low_slab: Slab<Point>,
    high_slab: Slab<Point>,
    // Ordered by x (then y) so MiniSync can walk points in increasing `x` order.
    low_order: std::collections::BTreeMap<(FloatKey, FloatKey), LowId>,
    high_order: std::collections::BTreeMap<(FloatKey, FloatKey), HighId>,
    // Reverse lookup so an exact-coordinate duplicate triple is a no-op.
    low_by_coord: HashMap<(u64, u64), LowId>,
    high_by_coord: HashMap<(u64, u64), HighId>,

    pub lower_constraints: HashMap<(LowId, HighId), ConstraintLine>,
    pub upper_constraints: HashMap<(LowId, HighId), ConstraintLine>,
}

impl ConstraintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn low_point(&self, id: LowId) -> Option<Point> {
        self.low_slab.get(id.0).copied()
    }

    pub fn high_point(&self, id: HighId) -> Option<Point> {
        self.high_slab.get(id.0).copied()
    }

    pub fn low_len(&self) -> usize {
        self.low_order.len()
    }

    pub fn high_len(&self) -> usize {
        self.high_order.len()
    }

    /// Lower points in increasing `x` order.
    pub fn low_ids_ordered(&self) -> Vec<LowId> {
        self.low_order.values().copied().collect()
    }

    /// Upper points in increasing `x` order.
    pub fn high_ids_ordered(&self) -> Vec<HighId> {
        self.high_order.values().copied().collect()
    }

    /// Inserts a lower point (or returns the existing id for an identical
    /// coordinate) and files a constraint against every currently-stored upper
    /// point with a distinct `x`. Returns `(id, is_new)`.
    pub fn add_lower(&mut self, point: Point) -> (LowId, bool) {
        let coord = (point.x.to_bits(), point.y.to_bits());
        if let Some(&id) = self.low_by_coord.get(&coord) {
            return (id, false);
        }

        let id = LowId(self.low_slab.insert(point));
        self.low_by_coord.insert(coord, id);
        self.low_order
            .insert((FloatKey::new(point.x), FloatKey::new(point.y)), id);

        let high_ids = self.high_ids_ordered();
        for high_id in high_ids {
            let Some(high) = self.high_point(high_id) else { continue };
            self.file_constraint(id, point, high_id, high);
        }

        (id, true)
    }

    /// Symmetric to [`ConstraintStore::add_lower`].
    pub fn add_upper(&mut self, point: Point) -> (HighId, bool) {
        let coord = (point.x.to_bits(), point.y.to_bits());
        if let Some(&id) = self.high_by_coord.get(&coord) {
            return (id, false);
        }

        let id = HighId(self.high_slab.insert(point));
        self.high_by_coord.insert(coord, id);
        self.high_order
            .insert((FloatKey::new(point.x), FloatKey::new(point.y)), id);

        let low_ids = self.low_ids_ordered();
        for low_id in low_ids {
            let Some(low) = self.low_point(low_id) else { continue };
            self.file_constraint(low_id, low, id, point);
        }

        (id, true)
    }

    fn file_constraint(&mut self, low_id: LowId, low: Point, high_id: HighId, high: Point) {
        let Some(line) = ConstraintLine::new(low_id, low, high_id, high) else {
            // Degenerate pair (L.x == U.x): silently skipped, no constraint filed.
            return;
        };
        match line.kind {
            ConstraintKind::Lower => {
                self.lower_constraints.insert((low_id, high_id), line);
            }
            ConstraintKind::Upper => {
                self.upper_constraints.insert((low_id, high_id), line);
            }
        }
    }

    /// Cartesian product of the lower-constraint and upper-constraint maps.
    pub fn iter_constraints(&self) -> impl Iterator<Item = (&ConstraintLine, &ConstraintLine)> {
        self.lower_constraints
            .values()
            .flat_map(move |lc| self.upper_constraints.values().map(move |uc| (lc, uc)))
    }

    /// Drops every lower point for which `keep_low` returns `false` and every
    /// upper point for which `keep_high` returns `false`, together with every
    /// constraint referencing a dropped point.
    pub fn retain(&mut self, keep_low: impl Fn(LowId) -> bool, keep_high: impl Fn(HighId) -> bool) {
        let low_ids = self.low_ids_ordered();
        for id in low_ids {
            if !keep_low(id) {
                self.evict_low(id);
            }
        }

        let high_ids = self.high_ids_ordered();
        for id in high_ids {
            if !keep_high(id) {
                self.evict_high(id);
            }
        }
    }

    pub fn evict_low(&mut self, id: LowId) {
        if let Some(point) = self.low_slab.remove(id.0) {
            let coord = (point.x.to_bits(), point.y.to_bits());
            self.low_by_coord.remove(&coord);
            self.low_order
                .remove(&(FloatKey::new(point.x), FloatKey::new(point.y)));
        }
        self.lower_constraints.retain(|(l, _), _| *l != id);
        self.upper_constraints.retain(|(l, _), _| *l != id);
    }

    pub fn evict_high(&mut self, id: HighId) {
        if let Some(point) = self.high_slab.remove(id.0) {
            let coord = (point.x.to_bits(), point.y.to_bits());
            self.high_by_coord.remove(&coord);
            self.high_order
                .remove(&(FloatKey::new(point.x), FloatKey::new(point.y)));
        }
        self.lower_constraints.retain(|(_, h), _| *h != id);
        self.upper_constraints.retain(|(_, h), _| *h != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_triple_is_a_no_op() {
        let mut store = ConstraintStore::new();
        let (id1, is_new1) = store.add_lower(Point::lower(0.0, -1.0));
        assert!(is_new1);
        let (id2, is_new2) = store.add_lower(Point::lower(0.0, -1.0));
        assert!(!is_new2);
        assert_eq!(id1, id2);
        assert_eq!(store.low_len(), 1);
    }

    #[test]
    fn degenerate_pair_adds_no_constraint() {
        let mut store = ConstraintStore::new();
        store.add_lower(Point::lower(5.0, -1.0));
        store.add_upper(Point::upper(5.0, 2.0));
        assert!(store.lower_constraints.is_empty());
        assert!(store.upper_constraints.is_empty());
    }

    #[test]
    fn add_lower_then_upper_files_one_constraint_each_way() {
        let mut store = ConstraintStore::new();
        store.add_lower(Point::lower(0.0, -1.0));
        store.add_upper(Point::upper(1.0, 2.0));
        assert_eq!(store.lower_constraints.len(), 1);
        assert!(store.upper_constraints.is_empty());
    }

    #[test]
    fn retain_drops_points_and_their_constraints() {
        let mut store = ConstraintStore::new();
        let (l0, _) = store.add_lower(Point::lower(0.0, -1.0));
        let (l1, _) = store.add_lower(Point::lower(1.0, -1.0));
        let (h0, _) = store.add_upper(Point::upper(0.0, 2.0));
        let (h1, _) = store.add_upper(Point::upper(1.0, 2.0));

        assert_eq!(store.low_len(), 2);
        assert_eq!(store.high_len(), 2);

        store.retain(|id| id == l1, |id| id == h1);

        assert_eq!(store.low_len(), 1);
        assert_eq!(store.high_len(), 1);
        assert!(store.low_point(l0).is_none());
        assert!(store.high_point(h0).is_none());
        for (&(l, h), _) in store.lower_constraints.iter() {
            assert_eq!(l, l1);
            assert_eq!(h, h1);
        }
    }

    #[test]
    fn ordered_ids_follow_x() {
        let mut store = ConstraintStore::new();
        store.add_lower(Point::lower(5.0, 0.0));
        store.add_lower(Point::lower(1.0, 0.0));
        store.add_lower(Point::lower(3.0, 0.0));
        let ordered = store.low_ids_ordered();
        let xs: Vec<f64> = ordered
            .iter()
            .map(|&id| store.low_point(id).unwrap().x)
            .collect();
        assert_eq!(xs, vec![1.0, 3.0, 5.0]);
    }
}
