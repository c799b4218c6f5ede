//! Immutable 2-D samples tagged by polarity.
//!
//! A [`Point`] is `(x, y)` where `x` is always the remote timestamp `T_b`. For a
//! `Lower` point `y` is the local send time `T_o`; for an `Upper` point `y` is the
//! local receive time `T_r`. Points are compared and ordered by `x` first (the
//! store keeps `L_points`/`U_points` ordered by `x`), falling back to `y` only to
//! make the derived `Ord` total.

/// Which side of the feasible region a point constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub polarity: Polarity,
}

impl Point {
    pub fn lower(x: f64, y: f64) -> Self {
        Point { x, y, polarity: Polarity::Lower }
    }

    pub fn upper(x: f64, y: f64) -> Self {
        Point { x, y, polarity: Polarity::Upper }
    }
}

impl Eq for Point {}

impl std::hash::Hash for Point {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
        self.polarity.hash(state);
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.x
            .partial_cmp(&other.x)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                self.y
                    .partial_cmp(&other.y)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_and_upper_construct_with_expected_polarity() {
        let l = Point::lower(0.0, -1.0);
        let u = Point::upper(0.0, 2.0);
        assert_eq!(l.polarity, Polarity::Lower);
        assert_eq!(u.polarity, Polarity::Upper);
        assert_eq!(l.x, 0.0);
        assert_eq!(u.y, 2.0);
    }

    #[test]
    fn equality_and_hash_derive_from_both_coordinates() {
        use std::collections::HashSet;
        let a = Point::lower(1.0, 2.0);
        let b = Point::lower(1.0, 2.0);
        let c = Point::lower(1.0, 3.0);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn ordering_is_primarily_by_x() {
        let a = Point::lower(0.0, 100.0);
        let b = Point::lower(1.0, -100.0);
        assert!(a < b);
    }
}
