//! Preprocessing shared by every solver: which sites cover which zones, and how well each zone
//! is served by transit.

use itertools::Itertools;
use ndarray::{Array2, ArrayView1, Axis};
use serde::Serialize;

use crate::{
    error::{Error, Result},
    problem::{Site, Station, TransitMode, Zone},
};

/// A zones × sites relation: `covers(i, j)` iff site `j` is within reach of zone `i`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageMatrix {
    matrix: Array2<bool>,
}
impl CoverageMatrix {
    /// Builds the matrix from zone centres and site positions using haversine distances.
    /// A zone is covered by a site when their distance is at most `threshold` kilometres.
    pub fn build(zones: &[Zone], sites: &[Site], threshold: f64) -> Result<Self> {
        check_threshold(threshold)?;
        Self::from_distances(&distance_table(zones, sites)?, threshold)
    }

    /// Builds the matrix from an already known zones × sites distance table
    pub fn from_distances(distances: &Array2<f64>, threshold: f64) -> Result<Self> {
        check_threshold(threshold)?;
        if let Some(((i, j), d)) = distances.indexed_iter().find(|(_, d)| d.is_nan() || **d < 0.0) {
            return Err(Error::data(format!("distance from zone {i} to site {j} is invalid: {d}")));
        }
        Ok(Self { matrix: distances.map(|&d| d <= threshold) })
    }

    pub fn n_zones(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_sites(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn covers(&self, zone: usize, site: usize) -> bool {
        self.matrix[[zone, site]]
    }

    /// The zones a single site reaches
    pub fn site_column(&self, site: usize) -> ArrayView1<'_, bool> {
        self.matrix.column(site)
    }

    /// For every zone, whether any of `selected` covers it. Indices past the site
    /// universe are ignored.
    pub fn covered_zones(&self, selected: &[usize]) -> Vec<bool> {
        let mut covered = vec![false; self.n_zones()];
        for &j in selected.iter().filter(|&&j| j < self.n_sites()) {
            for (c, &hit) in covered.iter_mut().zip(self.matrix.column(j)) {
                *c |= hit;
            }
        }
        covered
    }

    /// Zones that no site at all can reach
    pub fn unreachable_zones(&self) -> Vec<usize> {
        self.matrix
            .axis_iter(Axis(0))
            .positions(|row| !row.iter().any(|&c| c))
            .collect_vec()
    }

    /// Restricts coverage to the zones flagged in `allowed`
    fn masked(&self, allowed: &[bool]) -> Self {
        let mut matrix = self.matrix.clone();
        for (mut row, &ok) in matrix.axis_iter_mut(Axis(0)).zip(allowed) {
            if !ok {
                row.fill(false);
            }
        }
        Self { matrix }
    }
}

/// Haversine distance in km from every zone centre (rows) to every site (columns)
pub fn distance_table(zones: &[Zone], sites: &[Site]) -> Result<Array2<f64>> {
    if let Some(i) = zones.iter().position(|z| !z.centre.is_valid()) {
        return Err(Error::data(format!("zone {i} has invalid coordinates")));
    }
    if let Some(j) = sites.iter().position(|s| !s.position().is_valid()) {
        return Err(Error::data(format!("site {j} has invalid coordinates")));
    }
    Ok(Array2::from_shape_fn((zones.len(), sites.len()), |(i, j)| {
        zones[i].centre.distance_km(&sites[j].position())
    }))
}

fn check_threshold(threshold: f64) -> Result<()> {
    if threshold.is_nan() || threshold < 0.0 {
        return Err(Error::configuration(format!(
            "coverage threshold must be a non-negative number of km, got {threshold}"
        )));
    }
    Ok(())
}

/// Whether a station has a usable (strictly positive) distance
fn usable_distance(station: &Station) -> Option<f64> {
    station.distance_to_center.filter(|d| *d > 0.0)
}

/// Sums `exp(-distance)` over a zone's stations for one mode. Stations with a missing or
/// non-positive distance contribute nothing, so a zone without stations scores 0.
pub fn accessibility_score(zone: &Zone, mode: TransitMode) -> f64 {
    zone.stations(mode)
        .iter()
        .filter_map(usable_distance)
        .map(|d| (-d).exp())
        .sum()
}

/// Accessibility of every zone for one transit mode, indexed by zone
pub fn accessibility_scores(zones: &[Zone], mode: TransitMode) -> Vec<f64> {
    zones.iter().map(|z| accessibility_score(z, mode)).collect()
}

/// The coverage relations each objective is gated by
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageSet {
    /// Distance coverage, used by population and POI objectives
    pub distance: CoverageMatrix,
    /// Bus coverage, absent when it equals `distance`
    bus: Option<CoverageMatrix>,
    /// Metro coverage, absent when it equals `distance`
    metro: Option<CoverageMatrix>,
}
impl CoverageSet {
    /// A set where every objective uses the distance coverage
    pub fn shared(distance: CoverageMatrix) -> Self {
        Self { distance, bus: None, metro: None }
    }

    /// Builds the distance coverage and, when `transit_threshold` is given, the per-mode
    /// coverages: a zone counts for a mode only if it also has a station of that mode within
    /// `transit_threshold` km.
    pub fn build(
        zones: &[Zone],
        sites: &[Site],
        threshold: f64,
        transit_threshold: Option<f64>,
    ) -> Result<Self> {
        let distance = CoverageMatrix::build(zones, sites, threshold)?;
        log::info!(
            "coverage at {threshold} km: {} of {} zones reachable",
            zones.len() - distance.unreachable_zones().len(),
            zones.len()
        );
        let Some(limit) = transit_threshold else {
            return Ok(Self::shared(distance));
        };
        check_threshold(limit)?;
        let mode_coverage = |mode: TransitMode| {
            let served = zones
                .iter()
                .map(|z| z.stations(mode).iter().filter_map(usable_distance).any(|d| d <= limit))
                .collect_vec();
            distance.masked(&served)
        };
        Ok(Self {
            bus: Some(mode_coverage(TransitMode::Bus)),
            metro: Some(mode_coverage(TransitMode::Metro)),
            distance,
        })
    }

    /// The coverage relation for a transit mode
    pub fn transit(&self, mode: TransitMode) -> &CoverageMatrix {
        let own = match mode {
            TransitMode::Bus => &self.bus,
            TransitMode::Metro => &self.metro,
        };
        own.as_ref().unwrap_or(&self.distance)
    }

    /// Whether all objectives share the distance coverage
    pub fn is_shared(&self) -> bool {
        self.bus.is_none() && self.metro.is_none()
    }
}
