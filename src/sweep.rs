//! Parameter sweeps: the exact solutions of every objective as the distance threshold or the
//! site budget varies, the other parameter held at its configured value.

use serde::Serialize;

use crate::{
    config::RunConfig,
    error::Result,
    exact::{solve_all, ExactOutcome},
    model::{ModelCache, ModelParams},
};

/// Exact results for one point of a sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub distance_threshold: f64,
    pub num_locations: usize,
    pub results: Vec<ExactOutcome>,
}

/// Both sweeps of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    pub by_distance: Vec<SweepPoint>,
    pub by_locations: Vec<SweepPoint>,
}

fn solve_point(cache: &mut ModelCache<'_>, config: &RunConfig) -> Result<SweepPoint> {
    config.validate()?;
    let model = cache.get(&ModelParams::from(config))?;
    Ok(SweepPoint {
        distance_threshold: config.distance_threshold,
        num_locations: config.num_locations,
        results: solve_all(&model, config.max_nodes),
    })
}

/// Solves every objective for each threshold in `distances` at the configured budget
pub fn distance_sweep(cache: &mut ModelCache<'_>, config: &RunConfig, distances: &[f64]) -> Result<Vec<SweepPoint>> {
    distances
        .iter()
        .map(|&d| {
            log::info!("sweep: distance threshold {d} km");
            solve_point(cache, &config.with_threshold(d))
        })
        .collect()
}

/// Solves every objective for each budget in `locations` at the configured threshold
pub fn location_sweep(cache: &mut ModelCache<'_>, config: &RunConfig, locations: &[usize]) -> Result<Vec<SweepPoint>> {
    locations
        .iter()
        .map(|&k| {
            log::info!("sweep: {k} locations");
            solve_point(cache, &config.with_locations(k))
        })
        .collect()
}

/// Runs both sweeps listed in the configuration
pub fn run(cache: &mut ModelCache<'_>, config: &RunConfig) -> Result<SweepReport> {
    Ok(SweepReport {
        by_distance: distance_sweep(cache, config, &config.sweep.distances)?,
        by_locations: location_sweep(cache, config, &config.sweep.locations)?,
    })
}
