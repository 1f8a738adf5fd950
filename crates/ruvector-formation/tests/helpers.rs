//! Shared test helpers for the ruvector-formation integration test suite.
//!
//! Provides deterministic random formations and cost matrices, plus a
//! brute-force assignment oracle for small problems.

#![allow(dead_code)]

use ruvector_formation::{CostMatrix, PointCloud};

// ---------------------------------------------------------------------------
// Random number generator (simple LCG for deterministic reproducibility)
// ---------------------------------------------------------------------------

/// A minimal linear congruential generator for deterministic test data.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform f64 in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform f64 in [lo, hi).
    pub fn next_f64_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Uniform integer in [0, n).
    pub fn next_below(&mut self, n: u64) -> u64 {
        (self.next_u64() >> 33) % n
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// `n` points uniformly inside a cube of side `extent` meters.
pub fn random_cloud(n: usize, extent: f64, seed: u64) -> PointCloud {
    let mut rng = Lcg::new(seed);
    let triples: Vec<[f64; 3]> = (0..n)
        .map(|_| {
            [
                rng.next_f64_range(0.0, extent),
                rng.next_f64_range(0.0, extent),
                rng.next_f64_range(0.0, extent),
            ]
        })
        .collect();
    PointCloud::from_triples(&triples).unwrap()
}

/// Random `n x n` cost matrix with small integer entries, so exact ties are
/// common.
pub fn random_integer_costs(n: usize, max: u64, seed: u64) -> CostMatrix {
    let mut rng = Lcg::new(seed);
    let data = (0..n * n).map(|_| rng.next_below(max + 1) as f64).collect();
    CostMatrix::new(n, n, data).unwrap()
}

/// Like [`random_integer_costs`], plus a perturbation of 0, 1 or 2 units of
/// 2^-33 (about 1.2e-10) per entry. Sums stay exact in f64, so near ties
/// and exact ties can be told apart without tolerance.
pub fn random_near_tie_costs(n: usize, max: u64, seed: u64) -> CostMatrix {
    let unit = (-33.0f64).exp2();
    let mut rng = Lcg::new(seed);
    let data = (0..n * n)
        .map(|_| rng.next_below(max + 1) as f64 + rng.next_below(3) as f64 * unit)
        .collect();
    CostMatrix::new(n, n, data).unwrap()
}

// ---------------------------------------------------------------------------
// Oracle
// ---------------------------------------------------------------------------

/// Total cost of a target-indexed permutation (`mapping[j]` = source of `j`).
pub fn permutation_cost(costs: &CostMatrix, mapping: &[usize]) -> f64 {
    mapping
        .iter()
        .enumerate()
        .map(|(j, &i)| costs.get(i, j))
        .sum()
}

/// Every permutation of `0..n`, in lexicographic order.
pub fn permutations(n: usize) -> Vec<Vec<usize>> {
    fn extend(prefix: &mut Vec<usize>, used: &mut [bool], out: &mut Vec<Vec<usize>>) {
        if prefix.len() == used.len() {
            out.push(prefix.clone());
            return;
        }
        for k in 0..used.len() {
            if !used[k] {
                used[k] = true;
                prefix.push(k);
                extend(prefix, used, out);
                prefix.pop();
                used[k] = false;
            }
        }
    }

    let mut out = Vec::new();
    extend(&mut Vec::with_capacity(n), &mut vec![false; n], &mut out);
    out
}

/// Minimum total cost over all permutations of a square matrix.
pub fn brute_force_min_cost(costs: &CostMatrix) -> f64 {
    assert!(costs.is_square(), "oracle requires a square matrix");
    permutations(costs.rows())
        .iter()
        .map(|p| permutation_cost(costs, p))
        .fold(f64::INFINITY, f64::min)
}

/// The optimal permutation the tie-break rules select: fewest displaced
/// indices first, then lexicographically smallest. `tol` absorbs rounding
/// in the cost sums.
pub fn brute_force_preferred(costs: &CostMatrix, tol: f64) -> Vec<usize> {
    let best = brute_force_min_cost(costs);
    permutations(costs.rows())
        .into_iter()
        .filter(|p| permutation_cost(costs, p) <= best + tol)
        .min_by_key(|p| {
            let displaced = p.iter().enumerate().filter(|&(j, &i)| j != i).count();
            (displaced, p.clone())
        })
        .unwrap()
}

/// Whether `mapping` contains every index in `0..n` exactly once.
pub fn is_permutation(mapping: &[usize], n: usize) -> bool {
    if mapping.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &i in mapping {
        if i >= n || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    true
}
