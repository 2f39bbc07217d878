//! Exact single-objective solving of the siting problem.
//!
//! For one objective at a time the problem is the 0/1 program
//!
//! ```text
//! maximise   Σ_i w_i · y_i
//! subject to Σ_j a_ij · x_j > 0  ⇒  y_i = 1      for every zone i
//!            Σ_j a_ij · x_j = 0  ⇒  y_i = 0      for every zone i
//!            Σ_j x_j = num_locations
//!            x_j, y_i ∈ {0, 1}
//! ```
//!
//! where `a` is the coverage relation gating that objective. The two implications fix every
//! `y` once `x` is known, so the search branches on sites only.

use std::time::Instant;

use itertools::Itertools;
use ndarray::ArrayView1;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    baseline::greedy,
    coverage::CoverageMatrix,
    evaluate::{covered_weight, ObjectiveKind},
    model::Model,
};

/// Improvements smaller than this are treated as ties
const EPSILON: f64 = 1e-9;

/// A linear constraint of the program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// If any site covering `zone` is open, the zone is covered
    CoveredIfAny { zone: usize },
    /// If no site covering `zone` is open, the zone is not covered
    UncoveredIfNone { zone: usize },
    /// Exactly `count` sites are open
    Cardinality { count: usize },
}

/// The program for one objective
#[derive(Debug, Clone)]
pub struct Formulation<'a> {
    pub kind: ObjectiveKind,
    coverage: &'a CoverageMatrix,
    weights: ArrayView1<'a, f64>,
    pub num_locations: usize,
}

/// Result of solving one objective
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExactOutcome {
    pub objective: ObjectiveKind,
    /// `None` when no feasible selection exists
    pub objective_value: Option<f64>,
    pub selected_locations: Vec<usize>,
    pub covered_zones: Vec<usize>,
    /// False when the node budget ran out before the search finished
    pub proven_optimal: bool,
    /// Branch-and-bound nodes explored
    pub nodes: usize,
    /// Wall time spent, in seconds
    pub cpu_time: f64,
}

impl<'a> Formulation<'a> {
    pub fn new(model: &'a Model, kind: ObjectiveKind) -> Self {
        Self {
            kind,
            coverage: model.coverage_for(kind),
            weights: model.weights(kind),
            num_locations: model.num_locations,
        }
    }

    pub fn n_sites(&self) -> usize {
        self.coverage.n_sites()
    }

    pub fn n_zones(&self) -> usize {
        self.coverage.n_zones()
    }

    /// Every constraint of the program: two implications per zone, then the cardinality row
    pub fn constraints(&self) -> Vec<Constraint> {
        (0..self.n_zones())
            .flat_map(|zone| [Constraint::CoveredIfAny { zone }, Constraint::UncoveredIfNone { zone }])
            .chain([Constraint::Cardinality { count: self.num_locations }])
            .collect()
    }

    /// Number of open sites covering `zone`
    fn coverage_sum(&self, x: &[bool], zone: usize) -> usize {
        (0..self.n_sites()).filter(|&j| x[j] && self.coverage.covers(zone, j)).count()
    }

    pub fn is_satisfied(&self, constraint: Constraint, x: &[bool], y: &[bool]) -> bool {
        match constraint {
            Constraint::CoveredIfAny { zone } => self.coverage_sum(x, zone) == 0 || y[zone],
            Constraint::UncoveredIfNone { zone } => self.coverage_sum(x, zone) > 0 || !y[zone],
            Constraint::Cardinality { count } => x.iter().filter(|o| **o).count() == count,
        }
    }

    /// Whether `(x, y)` is a feasible assignment
    pub fn check(&self, x: &[bool], y: &[bool]) -> bool {
        x.len() == self.n_sites()
            && y.len() == self.n_zones()
            && self.constraints().into_iter().all(|c| self.is_satisfied(c, x, y))
    }

    /// The zone assignment the implications force for open sites `x`
    pub fn implied_zones(&self, x: &[bool]) -> Vec<bool> {
        let open = (0..self.n_sites()).filter(|&j| x[j]).collect_vec();
        self.coverage.covered_zones(&open)
    }

    /// Objective value of a zone assignment
    pub fn objective(&self, y: &[bool]) -> f64 {
        covered_weight(y, self.weights)
    }

    /// Solves the program by depth-first branch-and-bound, exploring at most `max_nodes` nodes
    pub fn solve(&self, max_nodes: usize) -> ExactOutcome {
        let start = Instant::now();
        let Some(incumbent) = greedy(self.coverage, self.weights, self.num_locations) else {
            log::warn!(
                "{}: infeasible, {} sites requested out of {}",
                self.kind.name(),
                self.num_locations,
                self.n_sites()
            );
            return ExactOutcome {
                objective: self.kind,
                objective_value: None,
                selected_locations: vec![],
                covered_zones: vec![],
                proven_optimal: true,
                nodes: 0,
                cpu_time: start.elapsed().as_secs_f64(),
            };
        };

        let mut search = Search::new(self, incumbent, max_nodes);
        search.branch(0, 0.0);
        if search.exhausted {
            log::warn!("{}: node budget of {max_nodes} exhausted, result may not be optimal", self.kind.name());
        }

        let mut x = vec![false; self.n_sites()];
        for &j in &search.best {
            x[j] = true;
        }
        let y = self.implied_zones(&x);
        debug_assert!(self.check(&x, &y));
        let outcome = ExactOutcome {
            objective: self.kind,
            objective_value: Some(self.objective(&y)),
            selected_locations: (0..x.len()).filter(|&j| x[j]).collect(),
            covered_zones: (0..y.len()).filter(|&i| y[i]).collect(),
            proven_optimal: !search.exhausted,
            nodes: search.nodes,
            cpu_time: start.elapsed().as_secs_f64(),
        };
        log::info!(
            "{}: objective {:.3} with sites {:?} ({} nodes, {:.3}s)",
            self.kind.name(),
            search.best_value,
            outcome.selected_locations,
            outcome.nodes,
            outcome.cpu_time
        );
        outcome
    }
}

/// State of the branch-and-bound search
struct Search {
    /// Sites in branching order, most valuable on their own first
    order: Vec<usize>,
    /// Zones reached by each site, indexed like `order`
    reach: Vec<Vec<usize>>,
    weights: Vec<f64>,
    k: usize,
    /// How many open sites cover each zone
    cover_count: Vec<u32>,
    chosen: Vec<usize>,
    best: Vec<usize>,
    best_value: f64,
    nodes: usize,
    max_nodes: usize,
    exhausted: bool,
}
impl Search {
    fn new(formulation: &Formulation<'_>, incumbent: Vec<usize>, max_nodes: usize) -> Self {
        let weights = formulation.weights.to_vec();
        let reach_of = |j: usize| {
            formulation.coverage.site_column(j).iter().positions(|&c| c).collect_vec()
        };
        let order = (0..formulation.n_sites())
            .sorted_by_key(|&j| {
                let standalone: f64 = reach_of(j).iter().map(|&i| weights[i]).sum();
                OrderedFloat(-standalone)
            })
            .collect_vec();
        let reach = order.iter().map(|&j| reach_of(j)).collect_vec();
        let best_value = formulation.objective(&formulation.coverage.covered_zones(&incumbent));

        Self {
            order,
            reach,
            cover_count: vec![0; weights.len()],
            weights,
            k: formulation.num_locations,
            chosen: vec![],
            best: incumbent,
            best_value,
            nodes: 0,
            max_nodes,
            exhausted: false,
        }
    }

    /// Weight opening the site at `pos` would add
    fn gain(&self, pos: usize) -> f64 {
        self.reach[pos].iter().filter(|&&i| self.cover_count[i] == 0).map(|&i| self.weights[i]).sum()
    }

    /// Coverage is submodular, so the sum of the best individual gains bounds what the
    /// remaining picks can add
    fn bound(&self, pos: usize, picks: usize) -> f64 {
        let mut gains = (pos..self.order.len()).map(|p| self.gain(p)).collect_vec();
        gains.sort_unstable_by(|a, b| b.total_cmp(a));
        gains.into_iter().take(picks).sum()
    }

    fn branch(&mut self, pos: usize, value: f64) {
        if self.nodes >= self.max_nodes {
            self.exhausted = true;
            return;
        }
        self.nodes += 1;

        let picks = self.k - self.chosen.len();
        if picks == 0 {
            if value > self.best_value + EPSILON {
                self.best_value = value;
                self.best = self.chosen.iter().map(|&p| self.order[p]).collect();
            }
            return;
        }
        if self.order.len() - pos < picks {
            return;
        }
        if value + self.bound(pos, picks) <= self.best_value + EPSILON {
            return;
        }

        // open the site at `pos`
        let gain = self.gain(pos);
        for &i in &self.reach[pos] {
            self.cover_count[i] += 1;
        }
        self.chosen.push(pos);
        self.branch(pos + 1, value + gain);
        self.chosen.pop();
        for &i in &self.reach[pos] {
            self.cover_count[i] -= 1;
        }

        // leave it closed
        self.branch(pos + 1, value);
    }
}

/// Solves every objective independently, in parallel
pub fn solve_all(model: &Model, max_nodes: usize) -> Vec<ExactOutcome> {
    ObjectiveKind::ALL
        .par_iter()
        .map(|&kind| Formulation::new(model, kind).solve(max_nodes))
        .collect()
}
