//! Evaluates a set of opened sites against the four siting objectives

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::{config::TransitGating, model::Model, problem::TransitMode};

/// The objectives being maximised. Each one is a weighted sum over covered zones and only
/// differs from the others by its weight table and the coverage relation gating it.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    PopulationCoverage,
    BusAccessibility,
    MetroAccessibility,
    PoiCoverage,
}
impl ObjectiveKind {
    pub const ALL: [ObjectiveKind; 4] = [
        ObjectiveKind::PopulationCoverage,
        ObjectiveKind::BusAccessibility,
        ObjectiveKind::MetroAccessibility,
        ObjectiveKind::PoiCoverage,
    ];

    /// Row of this objective in weight tables and position in fitness vectors
    pub fn index(self) -> usize {
        self as usize
    }

    /// The transit mode an accessibility objective scores, if any
    pub fn transit_mode(self) -> Option<TransitMode> {
        match self {
            ObjectiveKind::BusAccessibility => Some(TransitMode::Bus),
            ObjectiveKind::MetroAccessibility => Some(TransitMode::Metro),
            ObjectiveKind::PopulationCoverage | ObjectiveKind::PoiCoverage => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ObjectiveKind::PopulationCoverage => "population_coverage",
            ObjectiveKind::BusAccessibility => "bus_accessibility",
            ObjectiveKind::MetroAccessibility => "metro_accessibility",
            ObjectiveKind::PoiCoverage => "poi_coverage",
        }
    }
}

/// The objective vector of a solution. Every component is maximised.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Fitness {
    pub population_coverage: f64,
    pub bus_accessibility: f64,
    pub metro_accessibility: f64,
    pub poi_coverage: f64,
}
impl Fitness {
    /// Score given to solutions that break the site budget
    pub const ZERO: Fitness = Fitness {
        population_coverage: 0.0,
        bus_accessibility: 0.0,
        metro_accessibility: 0.0,
        poi_coverage: 0.0,
    };

    pub fn from_array(values: [f64; 4]) -> Self {
        let [population_coverage, bus_accessibility, metro_accessibility, poi_coverage] = values;
        Self { population_coverage, bus_accessibility, metro_accessibility, poi_coverage }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.population_coverage, self.bus_accessibility, self.metro_accessibility, self.poi_coverage]
    }

    pub fn get(&self, kind: ObjectiveKind) -> f64 {
        self.to_array()[kind.index()]
    }

    /// Pareto dominance for maximisation: at least as good everywhere and strictly better
    /// somewhere
    pub fn dominates(&self, other: &Fitness) -> bool {
        let mut strictly_better = false;
        for (a, b) in self.to_array().into_iter().zip(other.to_array()) {
            if a < b {
                return false;
            }
            if a > b {
                strictly_better = true;
            }
        }
        strictly_better
    }
}

/// Sums `weights` over the zones flagged as covered
pub fn covered_weight(covered: &[bool], weights: ArrayView1<'_, f64>) -> f64 {
    covered.iter().zip(weights).filter(|(c, _)| **c).map(|(_, w)| w).sum()
}

/// Scores site selections against a preprocessed model
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    pub model: &'a Model,
    pub gating: TransitGating,
}
impl<'a> Evaluator<'a> {
    pub fn new(model: &'a Model, gating: TransitGating) -> Self {
        Self { model, gating }
    }

    /// Evaluates all four objectives for the opened `sites`.
    ///
    /// A zone is covered when any opened site covers it, and then counts once however many
    /// sites reach it. A selection larger than the site budget, or naming a site that does not
    /// exist, is degenerate and scores `Fitness::ZERO` so the search can carry on.
    pub fn evaluate(&self, sites: &[usize]) -> Fitness {
        if sites.len() > self.model.num_locations {
            log::debug!(
                "degenerate solution: {} sites for a budget of {}",
                sites.len(),
                self.model.num_locations
            );
            return Fitness::ZERO;
        }
        if let Some(bad) = sites.iter().find(|&&j| j >= self.model.n_sites()) {
            log::debug!("degenerate solution: site {bad} is out of range");
            return Fitness::ZERO;
        }

        let distance_covered = self.model.coverage.distance.covered_zones(sites);
        let mut values = [0.0; 4];
        for kind in ObjectiveKind::ALL {
            let weights = self.model.weights(kind);
            values[kind.index()] = match (kind.transit_mode(), self.gating) {
                (Some(mode), TransitGating::PerMode) if !self.model.coverage.is_shared() => {
                    let covered = self.model.coverage.transit(mode).covered_zones(sites);
                    covered_weight(&covered, weights)
                }
                _ => covered_weight(&distance_covered, weights),
            };
        }
        Fitness::from_array(values)
    }
}
