//! Implements an NSGA-II style (μ + λ) evolutionary search for site selections that trade off
//! the four objectives, returning the Pareto front of the final population.

use std::cmp::Reverse;

use fastrand::Rng;
use itertools::Itertools;
use ndarray::{Array1, Array2, Axis};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    config::{RunConfig, TransitGating},
    error::{Error, Result},
    evaluate::{Evaluator, Fitness},
    model::Model,
};

pub mod operators;
pub mod pareto;

use operators::{sample_sites, shuffle_mutation, two_point_crossover};
use pareto::{crowding_distances, non_dominated_fronts, pareto_front};

/// Parameters of the evolutionary search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvolutionParams {
    /// μ, and also λ: the number of offspring bred each generation
    pub population_size: usize,
    pub generations: usize,
    /// Probability that an offspring pair comes from crossover rather than copying
    pub crossover_prob: f64,
    /// Expected number of mutated genes per offspring
    pub mutation_prob: f64,
    pub seed: Option<u64>,
    pub gating: TransitGating,
}
impl From<&RunConfig> for EvolutionParams {
    fn from(config: &RunConfig) -> Self {
        Self {
            population_size: config.population_size,
            generations: config.generations,
            crossover_prob: config.crossover_prob,
            mutation_prob: config.mutation_prob,
            seed: config.seed,
            gating: config.transit_gating,
        }
    }
}

/// A member of the population
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Individual {
    /// Distinct site indices, exactly as many as the site budget
    pub sites: Vec<usize>,
    pub fitness: Fitness,
}

/// Population statistics for one generation, per objective
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationStats {
    pub generation: usize,
    /// Number of fitness evaluations performed in this generation
    pub evaluations: usize,
    pub avg: Fitness,
    pub std: Fitness,
    pub min: Fitness,
    pub max: Fitness,
}
impl GenerationStats {
    fn compute(generation: usize, evaluations: usize, population: &[Individual]) -> Self {
        let table = Array2::from_shape_fn((population.len(), 4), |(i, k)| {
            population[i].fitness.to_array()[k]
        });
        let to_fitness = |v: Array1<f64>| Fitness::from_array([v[0], v[1], v[2], v[3]]);
        Self {
            generation,
            evaluations,
            avg: table.mean_axis(Axis(0)).map(to_fitness).unwrap_or_default(),
            std: to_fitness(table.std_axis(Axis(0), 0.0)),
            min: to_fitness(table.fold_axis(Axis(0), f64::INFINITY, |a, &b| a.min(b))),
            max: to_fitness(table.fold_axis(Axis(0), f64::NEG_INFINITY, |a, &b| a.max(b))),
        }
    }
}

/// The outcome of a search
#[derive(Debug, Clone, Serialize)]
pub struct EvolutionResult {
    /// Non-dominated members of the final population, one per distinct site set,
    /// sites sorted ascending
    pub front: Vec<Individual>,
    pub logbook: Vec<GenerationStats>,
}

/// Runs the evolutionary search on a preprocessed model
#[derive(Debug, Clone)]
pub struct Engine<'a> {
    pub model: &'a Model,
    pub params: EvolutionParams,
}
impl<'a> Engine<'a> {
    pub fn new(model: &'a Model, params: EvolutionParams) -> Self {
        Self { model, params }
    }

    /// Evolve for the configured number of generations and extract the Pareto front
    pub fn run(&self) -> Result<EvolutionResult> {
        self.run_with(|_, _| {})
    }

    /// Like `run`, calling `on_generation` with each surviving population, the initial one
    /// included as generation 0
    pub fn run_with<F>(&self, mut on_generation: F) -> Result<EvolutionResult>
    where
        F: FnMut(usize, &[Individual]),
    {
        let mut rng = match self.params.seed {
            Some(seed) => Rng::with_seed(seed),
            None => Rng::new(),
        };
        let evaluator = Evaluator::new(self.model, self.params.gating);

        let mut population = self.initial_population(&mut rng, &evaluator)?;
        let mut logbook = vec![GenerationStats::compute(0, population.len(), &population)];
        log_generation(&logbook[0]);
        on_generation(0, &population);

        for generation in 1..=self.params.generations {
            let offspring = self.vary(&mut rng, &population);
            let evaluations = offspring.len();
            population.extend(evaluate_all(&evaluator, offspring));
            population = select(&mut rng, population, self.params.population_size);

            let stats = GenerationStats::compute(generation, evaluations, &population);
            log_generation(&stats);
            logbook.push(stats);
            on_generation(generation, &population);
        }

        let front = extract_front(population);
        log::info!("search finished with {} non-dominated solutions", front.len());
        Ok(EvolutionResult { front, logbook })
    }

    /// Draws the first generation. Fails if the budget cannot be met by the site universe.
    fn initial_population(&self, rng: &mut Rng, evaluator: &Evaluator<'_>) -> Result<Vec<Individual>> {
        let k = self.model.num_locations;
        let n_sites = self.model.n_sites();
        if k > n_sites {
            return Err(Error::configuration(format!(
                "cannot open {k} sites out of {n_sites} candidates"
            )));
        }
        if self.params.population_size == 0 {
            return Err(Error::configuration("population_size must be at least 1"));
        }
        let genomes = (0..self.params.population_size)
            .map(|_| sample_sites(rng, n_sites, k))
            .collect_vec();
        Ok(evaluate_all(evaluator, genomes))
    }

    /// Breeds λ offspring from randomly paired parents
    fn vary(&self, rng: &mut Rng, parents: &[Individual]) -> Vec<Vec<usize>> {
        let lambda = self.params.population_size;
        let n_sites = self.model.n_sites();
        let mut offspring = Vec::with_capacity(lambda + 1);
        while offspring.len() < lambda {
            let p1 = &parents[rng.usize(0..parents.len())].sites;
            let p2 = &parents[rng.usize(0..parents.len())].sites;
            if rng.f64() < self.params.crossover_prob {
                let (c1, c2) = two_point_crossover(rng, p1, p2, n_sites);
                offspring.push(c1);
                offspring.push(c2);
            } else {
                offspring.push(p1.clone());
            }
        }
        offspring.truncate(lambda);

        for child in &mut offspring {
            if child.is_empty() {
                continue;
            }
            let gene_prob = self.params.mutation_prob / child.len() as f64;
            shuffle_mutation(rng, child, n_sites, gene_prob);
        }
        offspring
    }
}

/// Scores genomes in parallel, preserving order
fn evaluate_all(evaluator: &Evaluator<'_>, genomes: Vec<Vec<usize>>) -> Vec<Individual> {
    genomes
        .into_par_iter()
        .map(|sites| {
            let fitness = evaluator.evaluate(&sites);
            Individual { sites, fitness }
        })
        .collect()
}

/// NSGA-II survival: whole fronts are kept while they fit, and the front that overflows is
/// cut by descending crowding distance. Ties in crowding are broken at random.
fn select(rng: &mut Rng, population: Vec<Individual>, mu: usize) -> Vec<Individual> {
    let fitness = population.iter().map(|ind| ind.fitness).collect_vec();
    let mut chosen = Vec::with_capacity(mu);
    for mut front in non_dominated_fronts(&fitness) {
        let room = mu - chosen.len();
        if front.len() <= room {
            chosen.extend(front);
        } else {
            rng.shuffle(&mut front);
            let crowding = crowding_distances(&fitness, &front);
            let survivors = (0..front.len())
                .sorted_by_key(|&pos| Reverse(OrderedFloat(crowding[pos])))
                .take(room)
                .map(|pos| front[pos]);
            chosen.extend(survivors);
        }
        if chosen.len() == mu {
            break;
        }
    }

    let mut keep = vec![false; population.len()];
    for i in chosen {
        keep[i] = true;
    }
    population.into_iter().zip(keep).filter(|(_, k)| *k).map(|(ind, _)| ind).collect()
}

/// Non-dominated members of the population, one per distinct site set
fn extract_front(population: Vec<Individual>) -> Vec<Individual> {
    let fitness = population.iter().map(|ind| ind.fitness).collect_vec();
    let mut front = pareto_front(&fitness)
        .into_iter()
        .map(|i| {
            let mut ind = population[i].clone();
            ind.sites.sort_unstable();
            ind
        })
        .collect_vec();
    front.sort_by(|a, b| a.sites.cmp(&b.sites));
    front.dedup_by(|a, b| a.sites == b.sites);
    front
}

fn log_generation(stats: &GenerationStats) {
    log::info!(
        "gen {:>4} evals {:>5} | max pop {:.1} bus {:.3} metro {:.3} poi {:.1}",
        stats.generation,
        stats.evaluations,
        stats.max.population_coverage,
        stats.max.bus_accessibility,
        stats.max.metro_accessibility,
        stats.max.poi_coverage
    );
}
