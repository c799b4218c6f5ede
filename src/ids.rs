//! Stable small-integer identifiers for points held in a [`crate::store::ConstraintStore`].
//!
//! Points live in a slab indexed by these ids, and every map keyed on point
//! identity keys on the id pair instead of a shared pointer, so eviction is a
//! single "free this id" operation.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LowId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HighId(pub u32);
