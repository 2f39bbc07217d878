//! Implements a simple constructive solver to use as a baseline
//! for comparison to other solvers, and as a starting point for the exact one.

use ndarray::ArrayView1;

use crate::coverage::CoverageMatrix;

/// Weight that opening `site` would add on top of the zones already `covered`
pub fn marginal_gain(coverage: &CoverageMatrix, weights: ArrayView1<'_, f64>, covered: &[bool], site: usize) -> f64 {
    coverage
        .site_column(site)
        .iter()
        .zip(covered)
        .zip(weights)
        .filter(|((hit, done), _)| **hit && !**done)
        .map(|(_, w)| w)
        .sum()
}

/// Greedy maximum coverage: repeatedly opens the site with the largest marginal gain,
/// lowest index first on ties, until `k` sites are open.
///
/// Returns `None` when `k` exceeds the number of sites.
pub fn greedy(coverage: &CoverageMatrix, weights: ArrayView1<'_, f64>, k: usize) -> Option<Vec<usize>> {
    let n_sites = coverage.n_sites();
    if k > n_sites {
        return None;
    }
    let mut covered = vec![false; coverage.n_zones()];
    let mut open = vec![false; n_sites];
    let mut selected = Vec::with_capacity(k);

    for _ in 0..k {
        let mut best: Option<(usize, f64)> = None;
        for site in (0..n_sites).filter(|&j| !open[j]) {
            let gain = marginal_gain(coverage, weights, &covered, site);
            if best.map_or(true, |(_, g)| gain > g) {
                best = Some((site, gain));
            }
        }
        // UNWRAP: k <= n_sites, so a closed site is always left
        let (site, _) = best.unwrap();
        open[site] = true;
        selected.push(site);
        for (c, &hit) in covered.iter_mut().zip(coverage.site_column(site)) {
            *c |= hit;
        }
    }
    Some(selected)
}
