//! Dominance passes over an arena of fitness vectors. Individuals are referred to by their
//! position in the slice.

use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::evaluate::{Fitness, ObjectiveKind};

/// Splits the population into non-dominated fronts, best first.
///
/// `fronts[0]` is the Pareto front; every member of `fronts[k + 1]` is dominated by some member
/// of `fronts[k]`.
pub fn non_dominated_fronts(fitness: &[Fitness]) -> Vec<Vec<usize>> {
    let n = fitness.len();
    let mut domination_count = vec![0usize; n];
    let mut dominates: Vec<Vec<usize>> = vec![vec![]; n];

    for (a, b) in (0..n).tuple_combinations() {
        if fitness[a].dominates(&fitness[b]) {
            dominates[a].push(b);
            domination_count[b] += 1;
        } else if fitness[b].dominates(&fitness[a]) {
            dominates[b].push(a);
            domination_count[a] += 1;
        }
    }

    let mut fronts = vec![];
    let mut current = (0..n).filter(|&i| domination_count[i] == 0).collect_vec();
    while !current.is_empty() {
        let mut next = vec![];
        for &i in &current {
            for &j in &dominates[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        fronts.push(current);
        current = next;
    }
    fronts
}

/// Crowding distance of each member of `front`, in the same order.
///
/// Boundary members of every objective get infinity; interior members add up the normalised gap
/// between their neighbours along each objective.
pub fn crowding_distances(fitness: &[Fitness], front: &[usize]) -> Vec<f64> {
    let n = front.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }
    let mut distances = vec![0.0; n];
    for kind in ObjectiveKind::ALL {
        let value = |pos: usize| fitness[front[pos]].get(kind);
        let order = (0..n).sorted_by_key(|&pos| OrderedFloat(value(pos))).collect_vec();
        let (lo, hi) = (value(order[0]), value(order[n - 1]));
        distances[order[0]] = f64::INFINITY;
        distances[order[n - 1]] = f64::INFINITY;
        let range = hi - lo;
        if range <= 0.0 {
            continue;
        }
        for w in order.windows(3) {
            distances[w[1]] += (value(w[2]) - value(w[0])) / range;
        }
    }
    distances
}

/// Indices of the individuals no other individual dominates, found by a full pairwise sweep
pub fn pareto_front(fitness: &[Fitness]) -> Vec<usize> {
    (0..fitness.len())
        .filter(|&i| !fitness.iter().any(|other| other.dominates(&fitness[i])))
        .collect()
}
