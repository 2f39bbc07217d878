//! This module contains the inputs of the optimiser: `ZoneRecord` is a zone as handed over by
//! data preparation, and `Problem` is the validated set of zones and candidate sites that every
//! solver reads from. Nothing in here is mutated once a `Problem` has been built.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    geo::LatLon,
};

/// A transit station (or POI) near a zone, with its precomputed distance to the zone centre
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Station {
    /// Distance to the zone centre in kilometres, if known
    #[serde(default)]
    pub distance_to_center: Option<f64>,
}

/// The transit modes a zone can be scored against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitMode {
    Bus,
    Metro,
}

/// A zone exactly as it arrives from ingestion
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ZoneRecord {
    #[serde(default)]
    pub neighbourhood: Option<String>,
    /// Number of residents
    #[serde(default)]
    pub population: f64,
    /// Number of points of interest in the zone
    #[serde(default)]
    pub poi_number: u64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub bus_stations: Vec<Station>,
    #[serde(default)]
    pub metro_stations: Vec<Station>,
    /// Opaque POI payloads, scoring uses `poi_number`
    #[serde(default)]
    pub pois: Vec<serde_json::Value>,
}

/// A validated zone
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub name: Option<String>,
    pub population: f64,
    pub poi_count: f64,
    pub centre: LatLon,
    pub bus_stations: Vec<Station>,
    pub metro_stations: Vec<Station>,
}
impl Zone {
    /// Checks a raw record, failing on missing or impossible values
    pub fn from_record(index: usize, record: ZoneRecord) -> Result<Self> {
        let label = match &record.neighbourhood {
            Some(name) => format!("zone {index} ({name})"),
            None => format!("zone {index}"),
        };
        let (Some(latitude), Some(longitude)) = (record.latitude, record.longitude) else {
            return Err(Error::data(format!("{label} is missing coordinates")));
        };
        let centre = LatLon::new(latitude, longitude);
        if !centre.is_valid() {
            return Err(Error::data(format!(
                "{label} has invalid coordinates ({latitude}, {longitude})"
            )));
        }
        if !record.population.is_finite() || record.population < 0.0 {
            return Err(Error::data(format!(
                "{label} has invalid population {}",
                record.population
            )));
        }
        Ok(Self {
            name: record.neighbourhood,
            population: record.population,
            poi_count: record.poi_number as f64,
            centre,
            bus_stations: record.bus_stations,
            metro_stations: record.metro_stations,
        })
    }

    /// The stations this zone has for a transit mode
    pub fn stations(&self, mode: TransitMode) -> &[Station] {
        match mode {
            TransitMode::Bus => &self.bus_stations,
            TransitMode::Metro => &self.metro_stations,
        }
    }
}

/// A candidate location for a docking point
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Site {
    pub latitude: f64,
    pub longitude: f64,
}
impl Site {
    pub fn position(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }
}

/// A siting problem: the zones to serve and the sites that may serve them
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub zones: Vec<Zone>,
    pub sites: Vec<Site>,
}
impl Problem {
    /// Builds a problem whose candidate sites are the zone centroids
    pub fn new(records: Vec<ZoneRecord>) -> Result<Self> {
        let zones = validate_zones(records)?;
        let sites = zones
            .iter()
            .map(|z| Site { latitude: z.centre.latitude, longitude: z.centre.longitude })
            .collect();
        Ok(Self { zones, sites })
    }

    /// Builds a problem with an explicit list of candidate sites
    pub fn with_sites(records: Vec<ZoneRecord>, sites: Vec<Site>) -> Result<Self> {
        let zones = validate_zones(records)?;
        for (j, site) in sites.iter().enumerate() {
            if !site.position().is_valid() {
                return Err(Error::data(format!(
                    "site {j} has invalid coordinates ({}, {})",
                    site.latitude, site.longitude
                )));
            }
        }
        Ok(Self { zones, sites })
    }

    pub fn n_zones(&self) -> usize {
        self.zones.len()
    }

    pub fn n_sites(&self) -> usize {
        self.sites.len()
    }
}

fn validate_zones(records: Vec<ZoneRecord>) -> Result<Vec<Zone>> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, r)| Zone::from_record(i, r))
        .collect()
}
