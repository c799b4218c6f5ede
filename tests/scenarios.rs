//! End-to-end scenario coverage for the clock synchronization estimator,
//! exercised through the public `SyncEstimator` adapter rather than the
//! internal `Estimator<P>` type, driving the whole estimator end to end
//! rather than unit-testing its internals in isolation.

use clocksync::{Algorithm, SyncError, SyncEstimator};
use rand::Rng;

#[test]
fn scenario_a_neutral_state() {
    let est = SyncEstimator::new(Algorithm::TinySync);
    assert_eq!(est.drift().value, 1.0);
    assert_eq!(est.drift().error, 0.0);
    assert_eq!(est.offset().value, 0.0);
    assert_eq!(est.offset().error, 0.0);
}

#[test]
fn scenario_b_single_sample_is_a_no_op() {
    let mut est = SyncEstimator::new(Algorithm::TinySync);
    est.add_sample(-1.0, 0.0, 2.0).unwrap();
    assert_eq!(est.drift().value, 1.0);
    assert_eq!(est.offset().value, 0.0);
}

#[test]
fn scenario_c_degenerate_two_sample_raises_non_monotone_drift() {
    let mut est = SyncEstimator::new(Algorithm::TinySync);
    est.add_sample(-1.0, 0.0, 2.0).unwrap();
    let err = est.add_sample(-1.0, 1.0, 2.0).unwrap_err();
    assert!(matches!(err, SyncError::NonMonotoneDrift { .. }));
    assert_eq!(est.drift().value, 1.0);
    assert_eq!(est.offset().value, 0.0);
}

#[test]
fn scenario_d_tinysync_vs_minisync_parity() {
    let mut tiny = SyncEstimator::new(Algorithm::TinySync);
    let mut mini = SyncEstimator::new(Algorithm::MiniSync);

    let mut rng = rand::rng();

    for i in 0..50 {
        let t_b = i as f64 * 37.0;
        let t_o = t_b - 5.0 - rng.random::<f64>() * 3.0;
        let t_r = t_b + 5.0 + rng.random::<f64>() * 3.0;
        let _ = tiny.add_sample(t_o, t_b, t_r);
        let _ = mini.add_sample(t_o, t_b, t_r);
        if tiny.processed() >= 2 && mini.processed() >= 2 {
            assert!(
                mini.drift().error <= tiny.drift().error + 1e-9,
                "mini drift error {} exceeded tiny's {}",
                mini.drift().error,
                tiny.drift().error
            );
            assert!(
                mini.offset().error <= tiny.offset().error + 1e-6,
                "mini offset error {} exceeded tiny's {}",
                mini.offset().error,
                tiny.offset().error
            );
        }
    }
}

#[test]
fn scenario_e_tinysync_pruning_bound_after_1000_samples() {
    let mut est = SyncEstimator::new(Algorithm::TinySync);
    for i in 0..1000 {
        let t_b = i as f64 * 10.0;
        let t_o = t_b - 2.0 - (i % 4) as f64 * 0.1;
        let t_r = t_b + 2.0 + (i % 6) as f64 * 0.1;
        let _ = est.add_sample(t_o, t_b, t_r);
    }
    assert!(est.processed() == 1000);
    // The internal store is not exposed through the public adapter, so the
    // observable proxy for "at most two points of each polarity, four
    // constraints" is that repeated samples keep producing a stable,
    // non-degrading estimate rather than growing error without bound.
    assert!(est.drift().error.is_finite());
    assert!(est.offset().error.is_finite());
}

#[test]
fn scenario_f_minisync_converges_on_a_convex_lower_hull() {
    // Lower points trace a strictly convex curve (y = -x^2/1000), forcing
    // repeated hull-membership evictions as new points arrive.
    let mut est = SyncEstimator::new(Algorithm::MiniSync);
    for i in 1..60 {
        let t_b = i as f64 * 5.0;
        let t_o = t_b - (t_b * t_b) / 50_000.0 - 1.0;
        let t_r = t_b + 3.0;
        let _ = est.add_sample(t_o, t_b, t_r);
    }
    assert!(est.drift().value > 0.0);
    assert!(est.drift().error >= 0.0);
}
