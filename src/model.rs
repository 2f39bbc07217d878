//! A `Model` is everything the solvers need for one configuration: the coverage relations,
//! the per-zone weight of every objective and the site budget. Models are built once, never
//! updated, and memoised by their parameters in a `ModelCache`.

use std::{collections::HashMap, sync::Arc};

use ndarray::{Array2, ArrayView1};
use ordered_float::OrderedFloat;

use crate::{
    config::RunConfig,
    coverage::{accessibility_scores, CoverageMatrix, CoverageSet},
    error::{Error, Result},
    evaluate::ObjectiveKind,
    problem::{Problem, TransitMode},
};

/// The parameters a model depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    pub distance_threshold: f64,
    pub num_locations: usize,
    pub transit_threshold: Option<f64>,
}
impl From<&RunConfig> for ModelParams {
    fn from(config: &RunConfig) -> Self {
        Self {
            distance_threshold: config.distance_threshold,
            num_locations: config.num_locations,
            transit_threshold: config.transit_threshold,
        }
    }
}

/// A preprocessed siting problem for one configuration
#[derive(Debug, Clone)]
pub struct Model {
    pub coverage: Arc<CoverageSet>,
    /// One row per objective (see `ObjectiveKind::index`), one column per zone
    weights: Array2<f64>,
    /// The site budget
    pub num_locations: usize,
}
impl Model {
    /// Preprocesses `problem` for the given parameters
    pub fn build(problem: &Problem, params: &ModelParams) -> Result<Self> {
        let coverage = CoverageSet::build(
            &problem.zones,
            &problem.sites,
            params.distance_threshold,
            params.transit_threshold,
        )?;
        Self::with_coverage(problem, Arc::new(coverage), params.num_locations)
    }

    /// Builds a model around an already computed coverage set
    pub fn with_coverage(problem: &Problem, coverage: Arc<CoverageSet>, num_locations: usize) -> Result<Self> {
        log::info!(
            "preprocessing {} zones and {} sites for a budget of {}",
            problem.n_zones(),
            problem.n_sites(),
            num_locations
        );
        let bus = accessibility_scores(&problem.zones, TransitMode::Bus);
        let metro = accessibility_scores(&problem.zones, TransitMode::Metro);
        let weights = Array2::from_shape_fn((ObjectiveKind::ALL.len(), problem.n_zones()), |(k, i)| {
            match ObjectiveKind::ALL[k] {
                ObjectiveKind::PopulationCoverage => problem.zones[i].population,
                ObjectiveKind::BusAccessibility => bus[i],
                ObjectiveKind::MetroAccessibility => metro[i],
                ObjectiveKind::PoiCoverage => problem.zones[i].poi_count,
            }
        });
        Self::from_weights(coverage, weights, num_locations)
    }

    /// Builds a model from a coverage set and a 4 × zones weight table
    pub fn from_weights(coverage: Arc<CoverageSet>, weights: Array2<f64>, num_locations: usize) -> Result<Self> {
        let n_zones = coverage.distance.n_zones();
        if weights.dim() != (ObjectiveKind::ALL.len(), n_zones) {
            return Err(Error::data(format!(
                "weight table is {:?}, expected ({}, {n_zones})",
                weights.dim(),
                ObjectiveKind::ALL.len()
            )));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(Error::data(format!("zone weight {w} is not a non-negative number")));
        }
        Ok(Self { coverage, weights, num_locations })
    }

    pub fn n_sites(&self) -> usize {
        self.coverage.distance.n_sites()
    }

    /// Per-zone weights of an objective
    pub fn weights(&self, kind: ObjectiveKind) -> ArrayView1<'_, f64> {
        self.weights.row(kind.index())
    }

    /// The coverage relation that gates an objective
    pub fn coverage_for(&self, kind: ObjectiveKind) -> &CoverageMatrix {
        match kind.transit_mode() {
            Some(mode) => self.coverage.transit(mode),
            None => &self.coverage.distance,
        }
    }
}

type CoverageKey = (OrderedFloat<f64>, Option<OrderedFloat<f64>>);
type ModelKey = (OrderedFloat<f64>, usize, Option<OrderedFloat<f64>>);

/// Memoises models of one problem by their parameters
#[derive(Debug)]
pub struct ModelCache<'a> {
    problem: &'a Problem,
    coverages: HashMap<CoverageKey, Arc<CoverageSet>>,
    models: HashMap<ModelKey, Arc<Model>>,
}
impl<'a> ModelCache<'a> {
    pub fn new(problem: &'a Problem) -> Self {
        Self { problem, coverages: HashMap::new(), models: HashMap::new() }
    }

    /// Returns the model for `params`, building it on first use. Models with the same
    /// thresholds share one coverage set.
    pub fn get(&mut self, params: &ModelParams) -> Result<Arc<Model>> {
        let transit = params.transit_threshold.map(OrderedFloat);
        let model_key = (OrderedFloat(params.distance_threshold), params.num_locations, transit);
        if let Some(model) = self.models.get(&model_key) {
            log::debug!("model cache hit for {model_key:?}");
            return Ok(Arc::clone(model));
        }
        log::debug!("model cache miss for {model_key:?}");

        let coverage_key = (OrderedFloat(params.distance_threshold), transit);
        let coverage = match self.coverages.get(&coverage_key) {
            Some(coverage) => Arc::clone(coverage),
            None => {
                let coverage = Arc::new(CoverageSet::build(
                    &self.problem.zones,
                    &self.problem.sites,
                    params.distance_threshold,
                    params.transit_threshold,
                )?);
                self.coverages.insert(coverage_key, Arc::clone(&coverage));
                coverage
            }
        };
        let model = Arc::new(Model::with_coverage(self.problem, coverage, params.num_locations)?);
        self.models.insert(model_key, Arc::clone(&model));
        Ok(model)
    }

    /// Number of distinct coverage sets computed so far
    pub fn coverage_count(&self) -> usize {
        self.coverages.len()
    }
}
