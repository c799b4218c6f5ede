//! The `(value, error)` pairs the estimator reports, and the three-state
//! lifecycle an estimator moves through as samples arrive.

/// A dimensionless or microsecond-valued estimate with a one-sided error bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub value: f64,
    pub error: f64,
}

impl Estimate {
    pub const fn neutral_drift() -> Self {
        Estimate { value: 1.0, error: 0.0 }
    }

    pub const fn neutral_offset() -> Self {
        Estimate { value: 0.0, error: 0.0 }
    }
}

/// `Empty -> Seeded (processed=1) -> Active (processed>=2)`. Only `Active`
/// yields a meaningful estimate; there is no terminal state short of dropping
/// the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Empty,
    Seeded,
    Active,
}

impl LifecycleState {
    pub fn for_processed_count(processed: u32) -> Self {
        match processed {
            0 => LifecycleState::Empty,
            1 => LifecycleState::Seeded,
            _ => LifecycleState::Active,
        }
    }
}
