//! CNF encoding of a puzzle instance.
//!
//! Every candidate edge gets two propositional variables `(x1, x2)`:
//! `x2` true means a double bridge, `x1` true (and `x2` false) a single
//! bridge, neither means no bridge. The combination `x2 ∧ ¬x1` is ruled out
//! by an implication clause, which makes the per-island cardinality
//! constraints over the doubled literal bags exactly equivalent to "the sum
//! of incident multiplicities equals the demand".

use itertools::Itertools;
use rustsat::{
    instances::{BasicVarManager, Cnf, ManageVars, SatInstance},
    types::{Clause, Lit, Var},
};
use thiserror::Error;

use crate::{
    geometry::{self, Edge},
    puzzle::Island,
};

#[derive(Error, Debug)]
pub enum PreflightError {
    #[error(
        "island at ({row},{col}) needs {demand} bridges but at most {capacity} are possible"
    )]
    DemandExceedsCapacity { row: usize, col: usize, demand: u8, capacity: usize },
}

/// Rejects instances where an island demands more bridges than twice its
/// incident candidate edges can carry. Catching this up front avoids
/// emitting trivially contradictory cardinality clauses.
pub fn preflight(islands: &[Island], edges: &[Edge]) -> Result<(), PreflightError> {
    let mut incident = vec![0usize; islands.len()];
    for edge in edges {
        incident[edge.u] += 1;
        incident[edge.v] += 1;
    }

    for (island, &count) in islands.iter().zip(&incident) {
        let capacity = 2 * count;
        if usize::from(island.demand) > capacity {
            return Err(PreflightError::DemandExceedsCapacity {
                row: island.row,
                col: island.col,
                demand: island.demand,
                capacity,
            });
        }
    }
    Ok(())
}

/// The encoded instance: the clause set plus the edge-to-variable map.
/// The clause set is only ever extended afterwards, by blocking clauses
/// inside the refinement loop.
#[derive(Debug, Clone)]
pub struct Encoding {
    cnf: Cnf,
    edge_vars: Vec<(Var, Var)>,
    n_vars: u32,
}

impl Encoding {
    pub fn cnf(&self) -> &Cnf {
        &self.cnf
    }

    /// Variable pair `(single, double)` per candidate edge, in edge order.
    pub fn edge_vars(&self) -> &[(Var, Var)] {
        &self.edge_vars
    }

    pub fn n_vars(&self) -> u32 {
        self.n_vars
    }
}

/// Builds the three clause families: double-implies-single per edge,
/// exact-demand cardinality per island, and mutual exclusion per crossing
/// edge pair.
pub fn encode(islands: &[Island], edges: &[Edge]) -> Encoding {
    let mut instance: SatInstance<BasicVarManager> = SatInstance::new();

    let edge_vars: Vec<(Var, Var)> =
        edges.iter().map(|_| (instance.new_var(), instance.new_var())).collect();

    for &(single, double) in &edge_vars {
        instance.add_lit_impl_lit(double.pos_lit(), single.pos_lit());
    }

    for (v, island) in islands.iter().enumerate() {
        // Both variables of every incident edge, so a double bridge counts
        // twice toward the demand.
        let lits: Vec<Lit> = edges
            .iter()
            .zip(&edge_vars)
            .filter(|(edge, _)| edge.u == v || edge.v == v)
            .flat_map(|(_, &(single, double))| [single.pos_lit(), double.pos_lit()])
            .collect();

        let demand = usize::from(island.demand);
        for clause in at_least_k(&lits, demand) {
            instance.add_clause(clause);
        }
        for clause in at_most_k(&lits, demand) {
            instance.add_clause(clause);
        }
    }

    for (i, j) in (0..edges.len()).tuple_combinations() {
        if geometry::crosses(islands, &edges[i], &edges[j]) {
            let (a1, a2) = edge_vars[i];
            let (b1, b2) = edge_vars[j];
            for (x, y) in [(a1, b1), (a1, b2), (a2, b1), (a2, b2)] {
                instance.add_clause(Clause::from_iter([x.neg_lit(), y.neg_lit()]));
            }
        }
    }

    let (cnf, var_manager) = instance.into_cnf();
    Encoding { cnf, edge_vars, n_vars: var_manager.n_used() }
}

/// Binomial at-least-k: one clause per subset of size `n - k + 1`.
pub fn at_least_k(lits: &[Lit], k: usize) -> Vec<Clause> {
    let n = lits.len();
    if k == 0 {
        return Vec::new();
    }
    if k > n {
        // Impossible; a single empty clause makes the formula unsat.
        return vec![Clause::default()];
    }
    lits.iter().copied().combinations(n - k + 1).map(Clause::from_iter).collect()
}

/// Binomial at-most-k: one all-negated clause per subset of size `k + 1`.
pub fn at_most_k(lits: &[Lit], k: usize) -> Vec<Clause> {
    if k >= lits.len() {
        return Vec::new();
    }
    lits.iter()
        .copied()
        .combinations(k + 1)
        .map(|subset| Clause::from_iter(subset.into_iter().map(|lit| !lit)))
        .collect()
}
