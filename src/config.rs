//! Run configuration. A `RunConfig` is read once and never changed in place: varying a
//! parameter means building a new value with `with_threshold`/`with_locations`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the evolutionary evaluator decides that a zone counts towards the transit objectives
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitGating {
    /// One OR-reduction over the distance coverage gates all four objectives
    #[default]
    Shared,
    /// Bus and metro objectives are gated by their own coverage matrices
    PerMode,
}

/// Values for the parameter sweeps
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SweepConfig {
    /// Distance thresholds (km) to try at the configured site budget
    pub distances: Vec<f64>,
    /// Site budgets to try at the configured distance threshold
    pub locations: Vec<usize>,
}

/// Parameters of one optimisation run
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Radius within which a site covers a zone, in kilometres
    pub distance_threshold: f64,
    /// Exact number of sites to open
    pub num_locations: usize,
    /// Size of the evolutionary population, also the number of offspring per generation
    pub population_size: usize,
    /// Number of generations to evolve
    pub generations: usize,
    /// Probability that an offspring is produced by crossover
    pub crossover_prob: f64,
    /// Expected number of mutated genes per offspring
    pub mutation_prob: f64,
    /// Seed for the random number generator, or `None` for entropy
    pub seed: Option<u64>,
    /// Radius (km) a transit station must fall within for a zone to count for that mode
    pub transit_threshold: Option<f64>,
    pub transit_gating: TransitGating,
    /// Branch-and-bound node budget per objective for the exact solver
    pub max_nodes: usize,
    pub sweep: SweepConfig,
}
impl Default for RunConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 1.0,
            num_locations: 5,
            population_size: 100,
            generations: 50,
            crossover_prob: 0.7,
            mutation_prob: 0.2,
            seed: None,
            transit_threshold: None,
            transit_gating: TransitGating::Shared,
            max_nodes: 5_000_000,
            sweep: SweepConfig::default(),
        }
    }
}
impl RunConfig {
    /// Checks every parameter is in range
    pub fn validate(&self) -> Result<()> {
        if !self.distance_threshold.is_finite() || self.distance_threshold <= 0.0 {
            return Err(Error::configuration(format!(
                "distance_threshold must be a positive number of km, got {}",
                self.distance_threshold
            )));
        }
        if self.num_locations == 0 {
            return Err(Error::configuration("num_locations must be at least 1"));
        }
        if self.population_size == 0 {
            return Err(Error::configuration("population_size must be at least 1"));
        }
        for (name, p) in [("crossover_prob", self.crossover_prob), ("mutation_prob", self.mutation_prob)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::configuration(format!("{name} must lie in [0, 1], got {p}")));
            }
        }
        if let Some(t) = self.transit_threshold {
            if !t.is_finite() || t <= 0.0 {
                return Err(Error::configuration(format!(
                    "transit_threshold must be a positive number of km, got {t}"
                )));
            }
        }
        if self.max_nodes == 0 {
            return Err(Error::configuration("max_nodes must be at least 1"));
        }
        if let Some(d) = self.sweep.distances.iter().find(|d| !d.is_finite() || **d <= 0.0) {
            return Err(Error::configuration(format!("sweep distance {d} is not a positive number")));
        }
        if self.sweep.locations.contains(&0) {
            return Err(Error::configuration("sweep locations must be at least 1"));
        }
        Ok(())
    }

    /// A copy of this configuration with another distance threshold
    pub fn with_threshold(&self, distance_threshold: f64) -> Self {
        Self { distance_threshold, ..self.clone() }
    }

    /// A copy of this configuration with another site budget
    pub fn with_locations(&self, num_locations: usize) -> Self {
        Self { num_locations, ..self.clone() }
    }
}
