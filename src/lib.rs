pub mod algorithm;
pub mod config;
pub mod constraint;
pub mod core;
pub mod error;
pub mod estimate;
pub mod ids;
pub mod minisync;
pub mod point;
pub mod stats;
pub mod tinysync;
pub mod transport;
pub mod wire;

pub use algorithm::{Algorithm, SyncEstimator};
pub use error::SyncError;
pub use estimate::{Estimate, LifecycleState};
