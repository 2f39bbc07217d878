//! Reads problems and configurations from files, and writes results

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::Path,
};

use serde::Serialize;

use crate::{
    config::RunConfig,
    error::Result,
    problem::{Problem, Site, ZoneRecord},
};

/// Reads zone records from a JSON array
pub fn parse_zones(path: &Path) -> Result<Vec<ZoneRecord>> {
    let file_contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&file_contents)?)
}

/// Reads candidate sites from a JSON array of `{latitude, longitude}` objects
pub fn parse_sites(path: &Path) -> Result<Vec<Site>> {
    let file_contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&file_contents)?)
}

/// Reads a problem; sites are the zone centroids unless a site file is given
pub fn parse_problem(zones: &Path, sites: Option<&Path>) -> Result<Problem> {
    let records = parse_zones(zones)?;
    match sites {
        Some(sites) => Problem::with_sites(records, parse_sites(sites)?),
        None => Problem::new(records),
    }
}

/// Reads a run configuration in TOML format. Range checks are left to
/// `RunConfig::validate`, once command line overrides are applied.
pub fn parse_config(path: &Path) -> Result<RunConfig> {
    let file_contents = fs::read_to_string(path)?;
    Ok(toml::from_str(&file_contents)?)
}

/// Writes `value` as pretty JSON to `path`, or to stdout when no path is given
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
