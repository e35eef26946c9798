//! Estimates the capacity of the unit ball and of an ellipsoid.
//!
//! Run with `RUST_LOG=info cargo run --example unit_ball` to see the
//! per-iteration log.

use hzcap::prelude::*;
use std::f64::consts::PI;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let m = 50;
    let ball = QuadraticHamiltonian::unit_ball(1);
    let estimator = HZCapacityEstimator::with_legendre_gradient(
        EstimatorConfig::new(1, m)?,
        ball.clone(),
        |y: &Vector| y / 2.0,
    )?;
    let result = estimator.estimate(&EstimateOptions::default())?;
    log::info!(
        "unit ball: capacity {:.6} after {} iterations ({:?}), pi = {PI:.6}",
        result.capacity,
        result.iterations,
        result.termination_reason
    );

    // Same body, dG obtained by root finding
    let numerical = HZCapacityEstimator::new(EstimatorConfig::new(1, 20)?, ball)?;
    let mut logger = LoggingCallback::new(10);
    let result = numerical.estimate_with_callback(
        &EstimateOptions::new().with_verbose(false),
        &mut logger,
    )?;
    log::info!(
        "unit ball (numerical dG, m = 20): capacity {:.6}, {} Legendre solves",
        result.capacity,
        result.legendre_evaluations
    );

    // The capacity of an ellipsoid is pi times its smallest radius squared
    let ellipsoid = QuadraticHamiltonian::ellipsoid(&[1.0, 2.0])?;
    let oracle = Box::new(ellipsoid.clone());
    let estimator = HZCapacityEstimator::with_oracle(EstimatorConfig::new(2, m)?, ellipsoid, oracle)?;
    let result = estimator.estimate(&EstimateOptions::new().with_iterations(200).with_verbose(false))?;
    log::info!("ellipsoid (1, 2): capacity {:.6}", result.capacity);

    println!("{:.6}", result.capacity);
    Ok(())
}
