//! Constraint line `C(L, U)` through one lower and one upper point.
//!
//! Grounded on `original_source/src/algorithms/constraints.cpp`
//! (`ConstraintLine::ConstraintLine`): `A = (U.y - L.y) / (U.x - L.x)`,
//! `B = L.y - A * L.x`. The C++ source throws on `L.x == U.x`; here construction
//! simply returns `None` and the caller (the store) skips the pair: no
//! constraint is added, and no error is surfaced to the user.

use crate::ids::{HighId, LowId};
use crate::point::Point;

/// Which side of the feasible region a constraint line bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// `L.x < U.x`. Slope upper-bounds drift; intercept lower-bounds offset.
    Lower,
    /// `L.x > U.x`. Slope lower-bounds drift; intercept upper-bounds offset.
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintLine {
    pub a: f64,
    pub b: f64,
    pub kind: ConstraintKind,
    pub low_id: LowId,
    pub high_id: HighId,
}

impl ConstraintLine {
    /// Builds the line through `low` and `high`. Returns `None` when the two
    /// points share an `x` coordinate, which would otherwise divide by zero.
    pub fn new(low_id: LowId, low: Point, high_id: HighId, high: Point) -> Option<Self> {
        if low.x == high.x {
            return None;
        }

        let kind = if low.x < high.x {
            ConstraintKind::Lower
        } else {
            ConstraintKind::Upper
        };

        let a = (high.y - low.y) / (high.x - low.x);
        let b = low.y - a * low.x;

        Some(ConstraintLine { a, b, kind, low_id, high_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point;

    #[test]
    fn degenerate_pair_is_rejected() {
        let low = Point::lower(5.0, 1.0);
        let high = Point::upper(5.0, 2.0);
        assert!(ConstraintLine::new(LowId(0), low, HighId(0), high).is_none());
    }

    #[test]
    fn lower_constraint_classification_and_formula() {
        // lower points (0,-1),(1,-1); upper points (0,2),(1,2)
        // constraint (0,-1) -> (1,2): A=3, B=-1
        let low = Point::lower(0.0, -1.0);
        let high = Point::upper(1.0, 2.0);
        let c = ConstraintLine::new(LowId(0), low, HighId(1), high).unwrap();
        assert_eq!(c.kind, ConstraintKind::Lower);
        assert!((c.a - 3.0).abs() < 1e-9);
        assert!((c.b - (-1.0)).abs() < 1e-9);
    }

    #[test]
    fn upper_constraint_classification_and_formula() {
        // constraint (1,-1) -> (0,2), L.x > U.x: A = (2-(-1))/(0-1) = -3
        let low = Point::lower(1.0, -1.0);
        let high = Point::upper(0.0, 2.0);
        let c = ConstraintLine::new(LowId(1), low, HighId(0), high).unwrap();
        assert_eq!(c.kind, ConstraintKind::Upper);
        assert!((c.a - (-3.0)).abs() < 1e-9);
    }
}
