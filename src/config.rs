//! Runtime configuration, split `SystemConfig`/`ServoConfig`/`FilterConfig`-
//! style: one struct per concern, all serde-derived so it can be loaded from
//! an on-disk JSON file the way other PTP-adjacent tools in this space do.

use serde::{Deserialize, Serialize};

use crate::algorithm::Algorithm;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub estimator: EstimatorConfig,
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    pub algorithm: Algorithm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub peer_addr: String,
    pub local_addr: String,
    pub beacon_interval_ms: u64,
    pub read_timeout_ms: u64,
    /// Measured minimum one-way network-stack delay on the outgoing beacon
    /// path, from loopback calibration. Added to `T_o` before a triple
    /// reaches `add_sample`.
    pub min_beacon_delay_us: u64,
    /// Measured minimum one-way delay on the reply path. Subtracted from
    /// `T_r` before a triple reaches `add_sample`.
    pub min_reply_delay_us: u64,
    /// Loopback round trips to run during calibration before either
    /// `min_beacon_delay_us` or `min_reply_delay_us` is trusted.
    pub calibration_rounds: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            estimator: EstimatorConfig { algorithm: Algorithm::MiniSync },
            transport: TransportConfig {
                peer_addr: "127.0.0.1:9877".to_string(),
                local_addr: "0.0.0.0:9876".to_string(),
                beacon_interval_ms: 1000,
                read_timeout_ms: 2000,
                min_beacon_delay_us: 100,
                min_reply_delay_us: 100,
                calibration_rounds: 20,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_json() {
        let cfg = SyncConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SyncConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.transport.peer_addr, cfg.transport.peer_addr);
        assert_eq!(back.estimator.algorithm, cfg.estimator.algorithm);
    }
}
