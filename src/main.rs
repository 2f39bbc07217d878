#![warn(rust_2018_idioms)]

use std::path::PathBuf;

use clap::{arg, value_parser, ArgMatches, Command};

use crate::{
    config::RunConfig,
    error::Result,
    evolve::{Engine, EvolutionParams},
    model::{Model, ModelCache, ModelParams},
    parse::{parse_config, parse_problem, write_json},
    problem::Problem,
};

mod baseline;
mod config;
mod coverage;
mod error;
mod evaluate;
mod evolve;
mod exact;
mod geo;
mod logging;
mod model;
mod parse;
mod problem;
mod sweep;
#[cfg(test)]
mod test;

/// Arguments shared by every subcommand
fn with_problem_args(command: Command) -> Command {
    command
        .arg(arg!(<ZONES> "Path to a JSON array of zone records").value_parser(value_parser!(PathBuf)))
        .arg(arg!(--config [CONFIG] "Path to a TOML run configuration").value_parser(value_parser!(PathBuf)))
        .arg(
            arg!(--sites [SITES] "Path to a JSON array of candidate sites (default: zone centroids)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(arg!(--threshold [KM] "Overrides the coverage distance threshold").value_parser(value_parser!(f64)))
        .arg(arg!(--locations [N] "Overrides the number of sites to open").value_parser(value_parser!(usize)))
        .arg(
            arg!(--output [OUTPUT_FILE] "If set, results are written to this file instead of stdout")
                .value_parser(value_parser!(PathBuf)),
        )
}

fn cli() -> Command {
    Command::new("scooter-siting")
        .about("Chooses docking sites for shared e-scooters")
        .arg_required_else_help(true)
        .arg(
            arg!(--"log-level" [LEVEL] "One of off, error, warn, info, debug, trace")
                .global(true)
                .default_value("info")
                .value_parser(value_parser!(String)),
        )
        .subcommand(with_problem_args(
            Command::new("evolve").about("Searches for Pareto-optimal site sets with an evolutionary algorithm"),
        ))
        .subcommand(with_problem_args(
            Command::new("exact").about("Solves each objective on its own to optimality"),
        ))
        .subcommand(with_problem_args(
            Command::new("sweep").about("Solves each objective across the configured thresholds and budgets"),
        ))
        .subcommand(with_problem_args(
            Command::new("coverage").about("Prints the zone by site coverage matrix"),
        ))
}

/// Loads the problem and the configuration, applying command line overrides
fn load(matches: &ArgMatches) -> Result<(Problem, RunConfig)> {
    // UNWRAP: ZONES is a required argument
    let zones = matches.get_one::<PathBuf>("ZONES").unwrap();
    let problem = parse_problem(zones, matches.get_one::<PathBuf>("sites").map(PathBuf::as_path))?;

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => parse_config(path)?,
        None => RunConfig::default(),
    };
    if let Some(&threshold) = matches.get_one::<f64>("threshold") {
        config = config.with_threshold(threshold);
    }
    if let Some(&locations) = matches.get_one::<usize>("locations") {
        config = config.with_locations(locations);
    }
    config.validate()?;
    Ok((problem, config))
}

fn output(matches: &ArgMatches) -> Option<&std::path::Path> {
    matches.get_one::<PathBuf>("output").map(PathBuf::as_path)
}

fn run() -> Result<()> {
    let matches = cli().get_matches();
    let level = matches.get_one::<String>("log-level").map(String::as_str).unwrap_or("info");
    logging::init_logger(logging::parse_level(level)?)?;

    match matches.subcommand() {
        Some(("evolve", sub)) => {
            let (problem, config) = load(sub)?;
            let model = Model::build(&problem, &ModelParams::from(&config))?;
            let result = Engine::new(&model, EvolutionParams::from(&config)).run()?;
            write_json(&result, output(sub))
        }
        Some(("exact", sub)) => {
            let (problem, config) = load(sub)?;
            let model = Model::build(&problem, &ModelParams::from(&config))?;
            write_json(&exact::solve_all(&model, config.max_nodes), output(sub))
        }
        Some(("sweep", sub)) => {
            let (problem, config) = load(sub)?;
            if config.sweep.distances.is_empty() && config.sweep.locations.is_empty() {
                log::warn!("no sweep values configured, add a [sweep] section to the configuration");
            }
            let mut cache = ModelCache::new(&problem);
            let report = sweep::run(&mut cache, &config)?;
            log::info!("sweep computed {} distinct coverage matrices", cache.coverage_count());
            write_json(&report, output(sub))
        }
        Some(("coverage", sub)) => {
            let (problem, config) = load(sub)?;
            let matrix = coverage::CoverageMatrix::build(&problem.zones, &problem.sites, config.distance_threshold)?;
            let unreachable = matrix.unreachable_zones();
            if !unreachable.is_empty() {
                log::warn!("zones {unreachable:?} are out of reach of every site");
            }
            write_json(&matrix, output(sub))
        }
        _ => Ok(()),
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
