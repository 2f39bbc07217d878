use std::{fs, sync::Arc};

use fastrand::Rng;
use itertools::Itertools;
use ndarray::{array, Array2};

use crate::{
    baseline::greedy,
    config::{RunConfig, TransitGating},
    coverage::{accessibility_score, CoverageMatrix, CoverageSet},
    error::Error,
    evaluate::{Evaluator, Fitness, ObjectiveKind},
    evolve::{
        operators::{repair, sample_sites, shuffle_mutation, two_point_crossover},
        pareto::{crowding_distances, non_dominated_fronts, pareto_front},
        Engine, EvolutionParams,
    },
    exact::{solve_all, Constraint, Formulation},
    geo::haversine_km,
    model::{Model, ModelCache, ModelParams},
    parse::{parse_config, parse_problem},
    problem::{Problem, Station, TransitMode, ZoneRecord},
    sweep::{distance_sweep, location_sweep},
};

/// Zones scattered over a few kilometres, with random weights and stations
fn random_records(rng: &mut Rng, n: usize) -> Vec<ZoneRecord> {
    let stations = |rng: &mut Rng| {
        (0..rng.usize(0..4))
            .map(|_| Station { distance_to_center: Some(rng.f64() * 2.0) })
            .collect_vec()
    };
    (0..n)
        .map(|i| ZoneRecord {
            neighbourhood: Some(format!("zone-{i}")),
            population: rng.u32(0..5000) as f64,
            poi_number: rng.u64(0..20),
            latitude: Some(40.97 + rng.f64() * 0.05),
            longitude: Some(29.02 + rng.f64() * 0.05),
            bus_stations: stations(rng),
            metro_stations: stations(rng),
            pois: vec![],
        })
        .collect()
}

fn random_problem(seed: u64, n: usize) -> Problem {
    Problem::new(random_records(&mut Rng::with_seed(seed), n)).unwrap()
}

fn params(distance_threshold: f64, num_locations: usize) -> ModelParams {
    ModelParams { distance_threshold, num_locations, transit_threshold: None }
}

/// The three-zone, four-site instance with a 2 km radius and two sites to open
fn scenario_a() -> Model {
    let distances = array![
        [2.5, 1.3, 3.4, 0.4],
        [1.8, 2.2, 0.5, 1.6],
        [3.2, 1.9, 2.1, 0.3]
    ];
    let coverage = CoverageMatrix::from_distances(&distances, 2.0).unwrap();
    let weights = array![
        [1000.0, 1500.0, 1200.0],
        [0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0]
    ];
    Model::from_weights(Arc::new(CoverageSet::shared(coverage)), weights, 2).unwrap()
}

/// Best value of an objective over every selection of exactly `k` sites
fn brute_force(model: &Model, kind: ObjectiveKind) -> f64 {
    let formulation = Formulation::new(model, kind);
    (0..model.n_sites())
        .combinations(model.num_locations)
        .map(|sites| {
            let mut x = vec![false; model.n_sites()];
            sites.iter().for_each(|&j| x[j] = true);
            formulation.objective(&formulation.implied_zones(&x))
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Ensures the haversine distance matches known values
#[test]
fn test_haversine() {
    assert_eq!(haversine_km(40.99, 29.03, 40.99, 29.03), 0.0, "Ensure a point is 0 km from itself");
    let equator_degree = haversine_km(0.0, 0.0, 0.0, 1.0);
    assert!((equator_degree - 111.195).abs() < 1e-2, "Ensure one degree of longitude on the equator is ~111.2 km, got {equator_degree}");
    let (a, b) = (haversine_km(40.98, 29.02, 41.01, 29.06), haversine_km(41.01, 29.06, 40.98, 29.02));
    assert!((a - b).abs() < 1e-12, "Ensure distance is symmetric");
    let antipodal = haversine_km(0.0, 0.0, 0.0, 180.0);
    assert!((antipodal - std::f64::consts::PI * 6371.0).abs() < 1e-6, "Ensure antipodes are half a circumference apart");
}

/// Ensures widening the radius never removes a covered pair
#[test]
fn test_coverage_monotone_in_threshold() {
    let problem = random_problem(1, 15);
    let thresholds = [0.0, 0.3, 0.8, 1.5, 3.0, 10.0];
    let matrices = thresholds
        .iter()
        .map(|&t| CoverageMatrix::build(&problem.zones, &problem.sites, t).unwrap())
        .collect_vec();
    for (narrow, wide) in matrices.iter().tuple_windows() {
        for i in 0..problem.n_zones() {
            for j in 0..problem.n_sites() {
                assert!(!narrow.covers(i, j) || wide.covers(i, j), "Ensure ({i}, {j}) stays covered");
            }
        }
    }
    // every centroid covers its own zone
    for i in 0..problem.n_zones() {
        assert!(matrices[0].covers(i, i));
    }
}

/// Ensures building coverage twice gives identical matrices
#[test]
fn test_coverage_idempotent() {
    let problem = random_problem(2, 12);
    let a = CoverageMatrix::build(&problem.zones, &problem.sites, 1.0).unwrap();
    let b = CoverageMatrix::build(&problem.zones, &problem.sites, 1.0).unwrap();
    assert_eq!(a, b, "Ensure coverage is a pure function of its inputs");
}

/// Ensures malformed records and thresholds are rejected with the right error kind
#[test]
fn test_invalid_inputs() {
    let mut records = random_records(&mut Rng::with_seed(3), 4);
    records[2].latitude = None;
    assert!(matches!(Problem::new(records.clone()), Err(Error::Data(_))), "Ensure missing coordinates are a data error");
    records[2].latitude = Some(95.0);
    assert!(matches!(Problem::new(records.clone()), Err(Error::Data(_))), "Ensure out-of-range latitude is a data error");
    records[2].latitude = Some(41.0);
    records[1].population = -3.0;
    assert!(matches!(Problem::new(records), Err(Error::Data(_))), "Ensure negative population is a data error");

    let problem = random_problem(3, 4);
    assert!(matches!(
        CoverageMatrix::build(&problem.zones, &problem.sites, -1.0),
        Err(Error::Configuration(_))
    ));
    assert!(matches!(
        CoverageMatrix::from_distances(&array![[0.5, f64::NAN]], 1.0),
        Err(Error::Data(_))
    ));
}

/// Ensures accessibility skips unusable stations and scores empty zones as 0
#[test]
fn test_accessibility() {
    let mut records = random_records(&mut Rng::with_seed(4), 1);
    records[0].bus_stations = vec![];
    records[0].metro_stations = vec![
        Station { distance_to_center: Some(1.0) },
        Station { distance_to_center: Some(2.0) },
        Station { distance_to_center: Some(0.0) },
        Station { distance_to_center: Some(-1.0) },
        Station { distance_to_center: None },
    ];
    let problem = Problem::new(records).unwrap();
    let zone = &problem.zones[0];
    assert_eq!(accessibility_score(zone, TransitMode::Bus), 0.0, "Ensure a zone without stations scores 0");
    let expected = (-1.0f64).exp() + (-2.0f64).exp();
    assert!((accessibility_score(zone, TransitMode::Metro) - expected).abs() < 1e-12);
}

/// Ensures the exact solver finds the 3700 optimum of the three-zone instance
#[test]
fn test_exact_scenario_a() {
    let model = scenario_a();
    let formulation = Formulation::new(&model, ObjectiveKind::PopulationCoverage);
    let outcome = formulation.solve(1_000_000);
    assert_eq!(outcome.objective_value, Some(3700.0), "Ensure every zone is covered at the optimum");
    assert_eq!(outcome.selected_locations.len(), 2, "Ensure exactly two sites are opened");
    assert_eq!(outcome.covered_zones, vec![0, 1, 2]);
    assert!(outcome.proven_optimal);

    let mut x = vec![false; 4];
    outcome.selected_locations.iter().for_each(|&j| x[j] = true);
    assert!(formulation.check(&x, &formulation.implied_zones(&x)));

    // a pair leaving zones uncovered scores less
    let evaluator = Evaluator::new(&model, TransitGating::Shared);
    assert_eq!(evaluator.evaluate(&[0, 2]).population_coverage, 1500.0);
    assert_eq!(evaluator.evaluate(&[1, 3]).population_coverage, 3700.0);
}

/// Ensures the formulation's constraints catch inconsistent assignments
#[test]
fn test_formulation_constraints() {
    let model = scenario_a();
    let formulation = Formulation::new(&model, ObjectiveKind::PopulationCoverage);
    assert_eq!(formulation.constraints().len(), 2 * 3 + 1);
    assert!(formulation.constraints().contains(&Constraint::Cardinality { count: 2 }));

    let x = vec![false, false, false, true];
    assert!(!formulation.check(&x, &[true, true, true]), "Ensure a single open site breaks cardinality");
    let x = vec![false, false, true, true];
    assert!(formulation.check(&x, &[true, true, true]));
    assert!(!formulation.check(&x, &[true, false, true]), "Ensure a reachable zone must be covered");
    let x = vec![true, false, true, false];
    assert!(!formulation.check(&x, &[true, true, false]), "Ensure an unreachable zone cannot be covered");
}

/// Ensures an impossible budget is reported as a null result, not a failure
#[test]
fn test_exact_infeasible() {
    let distances = array![[0.5, 1.0], [2.0, 0.2]];
    let coverage = CoverageMatrix::from_distances(&distances, 1.0).unwrap();
    let model = Model::from_weights(Arc::new(CoverageSet::shared(coverage)), Array2::ones((4, 2)), 3).unwrap();
    let outcomes = solve_all(&model, 1000);
    assert_eq!(outcomes.len(), 4, "Ensure every objective still reports");
    for outcome in outcomes {
        assert_eq!(outcome.objective_value, None);
        assert!(outcome.selected_locations.is_empty() && outcome.covered_zones.is_empty());
    }
}

/// Ensures branch-and-bound agrees with exhaustive enumeration and beats greedy
#[test]
fn test_exact_matches_brute_force() {
    for seed in 0..6 {
        let problem = random_problem(10 + seed, 9);
        let model = Model::build(
            &problem,
            &ModelParams { distance_threshold: 1.2, num_locations: 3, transit_threshold: Some(1.0) },
        )
        .unwrap();
        for outcome in solve_all(&model, 10_000_000) {
            let best = brute_force(&model, outcome.objective);
            let value = outcome.objective_value.unwrap();
            assert!((value - best).abs() < 1e-9, "Ensure {:?} is optimal: {value} vs {best}", outcome.objective);
            assert_eq!(outcome.selected_locations.len(), 3);

            let formulation = Formulation::new(&model, outcome.objective);
            let greedy_sites = greedy(model.coverage_for(outcome.objective), model.weights(outcome.objective), 3).unwrap();
            let mut x = vec![false; model.n_sites()];
            greedy_sites.iter().for_each(|&j| x[j] = true);
            assert!(formulation.objective(&formulation.implied_zones(&x)) <= value + 1e-9);
        }
    }
}

/// Ensures a node budget that is too small still yields a feasible answer
#[test]
fn test_exact_node_budget() {
    let problem = random_problem(20, 14);
    let model = Model::build(&problem, &params(1.0, 4)).unwrap();
    let formulation = Formulation::new(&model, ObjectiveKind::PoiCoverage);
    let capped = formulation.solve(3);
    assert!(capped.nodes <= 3, "Ensure the node budget is respected");
    assert_eq!(capped.selected_locations.len(), 4, "Ensure at least the greedy incumbent is returned");
    let full = formulation.solve(10_000_000);
    assert!(full.proven_optimal);
    assert!(full.objective_value.unwrap() + 1e-9 >= capped.objective_value.unwrap());
}

/// Ensures evaluation handles over-budget selections and counts each zone once
#[test]
fn test_evaluator() {
    let model = scenario_a();
    let evaluator = Evaluator::new(&model, TransitGating::Shared);
    assert_eq!(evaluator.evaluate(&[0, 1, 3]), Fitness::ZERO, "Ensure over-budget selections score zero");
    assert_eq!(evaluator.evaluate(&[0, 9]), Fitness::ZERO, "Ensure unknown sites score zero");
    assert_eq!(evaluator.evaluate(&[3]).population_coverage, 3700.0, "Ensure one site can cover everything");
    assert_eq!(evaluator.evaluate(&[]), Fitness::ZERO);

    // every objective is bounded by the total weight over all zones
    let problem = random_problem(5, 20);
    let model = Model::build(&problem, &params(1.5, 6)).unwrap();
    let evaluator = Evaluator::new(&model, TransitGating::Shared);
    let totals = ObjectiveKind::ALL.map(|k| model.weights(k).sum());
    let mut rng = Rng::with_seed(5);
    for _ in 0..200 {
        let fitness = evaluator.evaluate(&sample_sites(&mut rng, model.n_sites(), 6));
        for kind in ObjectiveKind::ALL {
            assert!(fitness.get(kind) <= totals[kind.index()] + 1e-9);
        }
    }
}

/// Ensures opening every site reaches the total weight when sites are the zone centroids
#[test]
fn test_full_budget_covers_everything() {
    let problem = random_problem(6, 10);
    let model = Model::build(&problem, &params(0.5, 10)).unwrap();
    let all_sites = (0..10).collect_vec();
    let fitness = Evaluator::new(&model, TransitGating::Shared).evaluate(&all_sites);
    assert!(model.coverage.distance.unreachable_zones().is_empty());
    for kind in ObjectiveKind::ALL {
        assert!((fitness.get(kind) - model.weights(kind).sum()).abs() < 1e-9);
    }
}

/// Ensures per-mode gating only ever lowers the transit objectives
#[test]
fn test_transit_gating() {
    let problem = random_problem(7, 16);
    let model = Model::build(
        &problem,
        &ModelParams { distance_threshold: 1.5, num_locations: 4, transit_threshold: Some(0.4) },
    )
    .unwrap();
    assert!(!model.coverage.is_shared());
    let shared = Evaluator::new(&model, TransitGating::Shared);
    let per_mode = Evaluator::new(&model, TransitGating::PerMode);
    let mut rng = Rng::with_seed(7);
    for _ in 0..100 {
        let sites = sample_sites(&mut rng, model.n_sites(), 4);
        let (a, b) = (shared.evaluate(&sites), per_mode.evaluate(&sites));
        assert_eq!(a.population_coverage, b.population_coverage);
        assert_eq!(a.poi_coverage, b.poi_coverage);
        assert!(b.bus_accessibility <= a.bus_accessibility);
        assert!(b.metro_accessibility <= a.metro_accessibility);
    }
}

fn random_fitness(rng: &mut Rng) -> Fitness {
    // few distinct values so that ties and dominance both occur
    Fitness::from_array([0; 4].map(|_: i32| rng.u8(0..4) as f64))
}

/// Ensures dominance is a strict partial order and the front is mutually non-dominated
#[test]
fn test_dominance() {
    let mut rng = Rng::with_seed(8);
    let fitness = (0..60).map(|_| random_fitness(&mut rng)).collect_vec();
    for a in &fitness {
        assert!(!a.dominates(a), "Ensure dominance is irreflexive");
        for b in &fitness {
            assert!(!(a.dominates(b) && b.dominates(a)), "Ensure dominance is asymmetric");
            for c in &fitness {
                if a.dominates(b) && b.dominates(c) {
                    assert!(a.dominates(c), "Ensure dominance is transitive");
                }
            }
        }
    }

    let front = pareto_front(&fitness);
    assert!(!front.is_empty());
    for (&i, &j) in front.iter().tuple_combinations() {
        assert!(!fitness[i].dominates(&fitness[j]) && !fitness[j].dominates(&fitness[i]));
    }

    let fronts = non_dominated_fronts(&fitness);
    assert_eq!(fronts[0], front, "Ensure the first rank is the Pareto front");
    assert_eq!(fronts.iter().map(Vec::len).sum::<usize>(), fitness.len(), "Ensure every individual is ranked");
    for (better, worse) in fronts.iter().tuple_windows() {
        for &w in worse {
            assert!(better.iter().any(|&b| fitness[b].dominates(&fitness[w])));
        }
    }
}

/// Ensures crowding favours the extremes of a front
#[test]
fn test_crowding_distance() {
    let fitness = vec![
        Fitness::from_array([1.0, 5.0, 1.0, 5.0]),
        Fitness::from_array([3.0, 3.0, 3.0, 3.0]),
        Fitness::from_array([5.0, 1.0, 5.0, 1.0]),
        Fitness::from_array([4.0, 2.0, 4.0, 2.0]),
    ];
    let front = vec![0, 1, 2, 3];
    let d = crowding_distances(&fitness, &front);
    assert!(d[0].is_infinite() && d[2].is_infinite());
    assert!(d[1].is_finite() && d[3].is_finite());
    assert!(d[1] > d[3], "Ensure the more isolated interior point has the larger distance");
    assert_eq!(crowding_distances(&fitness, &[0, 1]), vec![f64::INFINITY; 2]);
}

fn is_distinct(sites: &[usize]) -> bool {
    sites.iter().all_unique()
}

/// Ensures variation operators keep individuals at full size with distinct sites
#[test]
fn test_operators_keep_cardinality() {
    let mut rng = Rng::with_seed(9);
    let n_sites = 12;
    for k in 1..=n_sites {
        for _ in 0..50 {
            let a = sample_sites(&mut rng, n_sites, k);
            let b = sample_sites(&mut rng, n_sites, k);
            assert!(a.len() == k && is_distinct(&a));
            let (mut c1, mut c2) = two_point_crossover(&mut rng, &a, &b, n_sites);
            assert!(c1.len() == k && is_distinct(&c1), "Ensure crossover repairs duplicates: {c1:?}");
            assert!(c2.len() == k && is_distinct(&c2), "Ensure crossover repairs duplicates: {c2:?}");
            shuffle_mutation(&mut rng, &mut c1, n_sites, 0.5);
            shuffle_mutation(&mut rng, &mut c2, n_sites, 1.0);
            assert!(c1.len() == k && is_distinct(&c1));
            assert!(c2.len() == k && is_distinct(&c2));
            assert!(c1.iter().chain(&c2).all(|&s| s < n_sites));
        }
    }

    let mut genes = vec![3, 5, 3, 5, 1];
    repair(&mut rng, &mut genes, &[7, 8], 10);
    assert_eq!(genes, vec![3, 5, 7, 8, 1], "Ensure donors fill duplicate slots first");
}

/// Ensures two-point crossover can exchange any position, the first and last included
#[test]
fn test_crossover_reaches_every_position() {
    let mut rng = Rng::with_seed(17);
    for k in [2, 3, 5] {
        // disjoint parents, so repair never touches the children
        let parent1 = (0..k).collect_vec();
        let parent2 = (k..2 * k).collect_vec();
        let mut exchanged = vec![0usize; k];
        let mut slices = std::collections::HashSet::new();
        for _ in 0..2000 {
            let (child1, child2) = two_point_crossover(&mut rng, &parent1, &parent2, 2 * k);
            let moved = (0..k).filter(|&pos| child1[pos] != parent1[pos]).collect_vec();
            assert!(!moved.is_empty(), "Ensure at least one gene is exchanged");
            for &pos in &moved {
                exchanged[pos] += 1;
                assert_eq!(child2[pos], parent1[pos]);
            }
            slices.insert(moved);
        }
        assert!(exchanged.iter().all(|&n| n > 0), "Ensure every position is exchanged for k={k}: {exchanged:?}");
        assert_eq!(slices.len(), k * (k + 1) / 2, "Ensure every contiguous slice can be drawn for k={k}");
    }
}

fn engine_params(seed: u64) -> EvolutionParams {
    EvolutionParams {
        population_size: 24,
        generations: 12,
        crossover_prob: 0.7,
        mutation_prob: 0.2,
        seed: Some(seed),
        gating: TransitGating::Shared,
    }
}

/// Ensures the search returns a valid, non-dominated, reproducible front
#[test]
fn test_evolution() {
    let problem = random_problem(11, 18);
    let model = Model::build(&problem, &params(1.0, 4)).unwrap();
    let evaluator = Evaluator::new(&model, TransitGating::Shared);
    let mut generations_seen = vec![];
    let result = Engine::new(&model, engine_params(42))
        .run_with(|generation, population| {
            generations_seen.push(generation);
            assert_eq!(population.len(), 24, "Ensure survival keeps the population size");
            for ind in population {
                assert!(
                    ind.sites.len() == 4 && is_distinct(&ind.sites),
                    "Ensure generation {generation} holds only valid selections: {:?}",
                    ind.sites
                );
                assert_eq!(ind.fitness, evaluator.evaluate(&ind.sites));
            }
        })
        .unwrap();
    assert_eq!(generations_seen, (0..=12).collect_vec(), "Ensure every generation is reported");

    assert_eq!(result.logbook.len(), 13, "Ensure one logbook entry per generation plus the initial one");
    assert!(!result.front.is_empty());
    for member in &result.front {
        assert!(member.sites.len() == 4 && is_distinct(&member.sites));
        assert_eq!(member.fitness, evaluator.evaluate(&member.sites));
    }
    for (a, b) in result.front.iter().tuple_combinations() {
        assert!(!a.fitness.dominates(&b.fitness) && !b.fitness.dominates(&a.fitness));
        assert_ne!(a.sites, b.sites);
    }
    // NSGA-II survival is elitist, so the best of each objective never gets worse
    for (prev, next) in result.logbook.iter().tuple_windows() {
        for kind in ObjectiveKind::ALL {
            assert!(next.max.get(kind) >= prev.max.get(kind));
        }
        assert!(next.min.population_coverage <= next.avg.population_coverage);
        assert!(next.avg.population_coverage <= next.max.population_coverage);
    }

    let again = Engine::new(&model, engine_params(42)).run().unwrap();
    assert_eq!(result.front, again.front, "Ensure a seeded run is reproducible");
}

/// Ensures asking for more sites than exist fails before any population is drawn
#[test]
fn test_evolution_budget_too_large() {
    let problem = random_problem(12, 5);
    let model = Model::build(&problem, &params(1.0, 6)).unwrap();
    assert!(matches!(Engine::new(&model, engine_params(1)).run(), Err(Error::Configuration(_))));

    let mut no_population = engine_params(1);
    no_population.population_size = 0;
    let model = Model::build(&problem, &params(1.0, 2)).unwrap();
    assert!(matches!(Engine::new(&model, no_population).run(), Err(Error::Configuration(_))));
}

/// Ensures the model cache reuses models and shares coverage across budgets
#[test]
fn test_model_cache() {
    let problem = random_problem(13, 8);
    let mut cache = ModelCache::new(&problem);
    let a = cache.get(&params(1.0, 3)).unwrap();
    let b = cache.get(&params(1.0, 3)).unwrap();
    assert!(Arc::ptr_eq(&a, &b), "Ensure identical parameters hit the cache");
    let c = cache.get(&params(1.0, 5)).unwrap();
    assert!(Arc::ptr_eq(&a.coverage, &c.coverage), "Ensure a budget change reuses coverage");
    assert_eq!(cache.coverage_count(), 1);
    let d = cache.get(&params(2.0, 3)).unwrap();
    assert!(!Arc::ptr_eq(&a.coverage, &d.coverage));
    assert_eq!(cache.coverage_count(), 2);
}

/// Ensures exact optima never drop as the radius or the budget grows
#[test]
fn test_sweeps_are_monotone() {
    let problem = random_problem(14, 10);
    let mut cache = ModelCache::new(&problem);
    let config = RunConfig { num_locations: 3, ..RunConfig::default() };

    let by_distance = distance_sweep(&mut cache, &config, &[0.3, 0.8, 1.5]).unwrap();
    let by_locations = location_sweep(&mut cache, &config, &[1, 2, 4]).unwrap();
    for points in [&by_distance, &by_locations] {
        assert_eq!(points.len(), 3);
        for (prev, next) in points.iter().tuple_windows() {
            for (a, b) in prev.results.iter().zip(&next.results) {
                assert_eq!(a.objective, b.objective);
                assert!(b.objective_value.unwrap() + 1e-9 >= a.objective_value.unwrap());
            }
        }
    }
    assert!(matches!(
        distance_sweep(&mut cache, &config, &[-1.0]),
        Err(Error::Configuration(_))
    ));
}

/// Ensures configuration files parse with defaults and are validated
#[test]
fn test_config() {
    let config: RunConfig = toml::from_str(
        "distance_threshold = 0.8\nnum_locations = 3\ntransit_gating = \"per_mode\"\n\n[sweep]\nlocations = [1, 2]\n",
    )
    .unwrap();
    assert_eq!(config.num_locations, 3);
    assert_eq!(config.population_size, 100, "Ensure omitted fields take defaults");
    assert_eq!(config.transit_gating, TransitGating::PerMode);
    assert_eq!(config.sweep.locations, vec![1, 2]);
    assert!(config.validate().is_ok());

    let bad = RunConfig { crossover_prob: 1.5, ..RunConfig::default() };
    assert!(matches!(bad.validate(), Err(Error::Configuration(_))));
    let bad = RunConfig { num_locations: 0, ..RunConfig::default() };
    assert!(matches!(bad.validate(), Err(Error::Configuration(_))));
    assert!(toml::from_str::<RunConfig>("distance_treshold = 1.0").is_err(), "Ensure typos are rejected");

    let derived = config.with_threshold(2.0);
    assert_eq!(derived.distance_threshold, 2.0);
    assert_eq!(config.distance_threshold, 0.8, "Ensure the source configuration is untouched");
}

/// Tests reading zones and configuration from files
#[test]
fn test_parse_files() {
    let dir = std::env::temp_dir().join(format!("scooter-siting-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let zones = dir.join("zones.json");
    let config = dir.join("config.toml");
    fs::write(
        &zones,
        r#"[
            {"neighbourhood": "Moda", "population": 1200, "poi_number": 4, "latitude": 40.98, "longitude": 29.02,
             "bus_stations": [{"distance_to_center": 0.3}], "metro_stations": [], "pois": [{"name": "pier"}]},
            {"population": 800, "latitude": 40.99, "longitude": 29.03, "extra": true}
        ]"#,
    )
    .unwrap();
    fs::write(&config, "num_locations = 1\ngenerations = 3\n").unwrap();

    let problem = parse_problem(&zones, None).unwrap();
    assert_eq!(problem.n_zones(), 2);
    assert_eq!(problem.n_sites(), 2, "Ensure sites default to zone centroids");
    assert_eq!(problem.zones[0].poi_count, 4.0);
    assert_eq!(problem.zones[1].poi_count, 0.0, "Ensure a missing POI count defaults to 0");
    let config = parse_config(&config).unwrap();
    assert_eq!(config.generations, 3);

    // range checks wait for command line overrides
    let overridable = dir.join("overridable.toml");
    fs::write(&overridable, "num_locations = 0\n").unwrap();
    let config = parse_config(&overridable).unwrap();
    assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    assert!(config.with_locations(3).validate().is_ok(), "Ensure an override can repair a file value");

    fs::remove_dir_all(&dir).unwrap();
}
