//! Variation operators on individuals, i.e. lists of distinct site indices.
//!
//! Every operator hands back lists of the same length as its input with no repeated site.

use fastrand::Rng;

/// Draws `k` distinct sites uniformly from `0..n_sites`
pub fn sample_sites(rng: &mut Rng, n_sites: usize, k: usize) -> Vec<usize> {
    debug_assert!(k <= n_sites);
    let mut pool: Vec<usize> = (0..n_sites).collect();
    // partial Fisher-Yates
    for i in 0..k {
        let j = rng.usize(i..n_sites);
        pool.swap(i, j);
    }
    pool.truncate(k);
    pool
}

/// Two-point crossover: the genes in a random slice `a..b` are swapped between the parents,
/// then both children are repaired.
pub fn two_point_crossover(
    rng: &mut Rng,
    parent1: &[usize],
    parent2: &[usize],
    n_sites: usize,
) -> (Vec<usize>, Vec<usize>) {
    let len = parent1.len().min(parent2.len());
    let mut child1 = parent1.to_vec();
    let mut child2 = parent2.to_vec();
    if len < 2 {
        return (child1, child2);
    }
    // two distinct cut points in 0..=len, so any non-empty slice can be drawn
    let mut a = rng.usize(0..=len);
    let mut b = rng.usize(0..len);
    if b >= a {
        b += 1;
    } else {
        std::mem::swap(&mut a, &mut b);
    }
    child1[a..b].swap_with_slice(&mut child2[a..b]);

    // Genes a child lost are the first candidates to fill its duplicate slots
    let donor1 = parent1[a..b].to_vec();
    let donor2 = parent2[a..b].to_vec();
    repair(rng, &mut child1, &donor1, n_sites);
    repair(rng, &mut child2, &donor2, n_sites);
    (child1, child2)
}

/// Replaces repeated sites in `genes`, taking unused sites from `donors` first and then random
/// unused sites from the universe. The first occurrence of a site keeps its position.
pub fn repair(rng: &mut Rng, genes: &mut [usize], donors: &[usize], n_sites: usize) {
    let mut used = vec![false; n_sites];
    let mut duplicates = vec![];
    for (pos, &site) in genes.iter().enumerate() {
        if used[site] {
            duplicates.push(pos);
        } else {
            used[site] = true;
        }
    }
    if duplicates.is_empty() {
        return;
    }

    let mut donors = donors.iter().copied();
    for pos in duplicates {
        let replacement = match donors.by_ref().find(|&s| !used[s]) {
            Some(s) => s,
            None => random_unused(rng, &used),
        };
        used[replacement] = true;
        genes[pos] = replacement;
    }
}

/// A uniformly random site not flagged in `used`. Callers guarantee one exists.
fn random_unused(rng: &mut Rng, used: &[bool]) -> usize {
    let free = used.iter().filter(|u| !**u).count();
    let nth = rng.usize(0..free);
    // UNWRAP: `nth` is below the number of free sites
    used.iter().enumerate().filter(|(_, u)| !**u).nth(nth).map(|(s, _)| s).unwrap()
}

/// Index-shuffle mutation over the whole site universe.
///
/// Each gene mutates with probability `gene_prob`: a target site is drawn uniformly; if the
/// individual already holds it, the two positions are swapped, otherwise the gene is replaced
/// by the target.
pub fn shuffle_mutation(rng: &mut Rng, genes: &mut [usize], n_sites: usize, gene_prob: f64) {
    for pos in 0..genes.len() {
        if rng.f64() >= gene_prob {
            continue;
        }
        let target = rng.usize(0..n_sites);
        match genes.iter().position(|&s| s == target) {
            Some(other) => genes.swap(pos, other),
            None => genes[pos] = target,
        }
    }
}
