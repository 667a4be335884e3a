//! Tri-valued assignments, clause classification and unit propagation,
//! shared by the backtracking and best-first searches.

use std::cmp::Reverse;

use rustsat::{
    instances::Cnf,
    types::{Clause, Lit, TernaryVal, Var},
};

/// One cell per variable; `DontCare` is unset.
pub type Assignment = Vec<TernaryVal>;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ClauseState {
    Satisfied,
    /// Every literal is falsified.
    Conflict,
    /// Exactly one literal is unassigned, the rest are falsified.
    Unit(Lit),
    Open,
}

/// Truth value of a literal under a partial assignment.
pub fn lit_value(assign: &[TernaryVal], lit: Lit) -> TernaryVal {
    match assign[lit.var().idx()] {
        TernaryVal::DontCare => TernaryVal::DontCare,
        TernaryVal::True if lit.is_pos() => TernaryVal::True,
        TernaryVal::False if lit.is_neg() => TernaryVal::True,
        _ => TernaryVal::False,
    }
}

pub fn clause_state(clause: &Clause, assign: &[TernaryVal]) -> ClauseState {
    let mut unassigned = None;
    let mut unassigned_count = 0usize;

    for &lit in clause.iter() {
        match lit_value(assign, lit) {
            TernaryVal::True => return ClauseState::Satisfied,
            TernaryVal::DontCare => {
                unassigned = Some(lit);
                unassigned_count += 1;
            }
            TernaryVal::False => {}
        }
    }

    match (unassigned_count, unassigned) {
        (0, _) => ClauseState::Conflict,
        (1, Some(lit)) => ClauseState::Unit(lit),
        _ => ClauseState::Open,
    }
}

pub fn clause_satisfied(clause: &Clause, assign: &[TernaryVal]) -> bool {
    clause.iter().any(|&lit| lit_value(assign, lit) == TernaryVal::True)
}

/// Number of clauses without a satisfying assigned literal, whether or not
/// they still have unassigned ones.
pub fn count_unsatisfied(cnf: &Cnf, assign: &[TernaryVal]) -> usize {
    cnf.iter().filter(|clause| !clause_satisfied(clause, assign)).count()
}

pub fn is_complete(assign: &[TernaryVal]) -> bool {
    assign.iter().all(|&cell| cell != TernaryVal::DontCare)
}

/// Propagates unit clauses to a fixed point. Returns `false` on conflict.
/// Sweeps are bounded by `|vars| + 16`; each productive sweep assigns at
/// least one variable, so the bound is never reached without convergence.
pub fn unit_propagate(cnf: &Cnf, assign: &mut [TernaryVal]) -> bool {
    let max_sweeps = assign.len() + 16;

    for _ in 0..max_sweeps {
        let mut changed = false;
        for clause in cnf.iter() {
            match clause_state(clause, assign) {
                ClauseState::Satisfied | ClauseState::Open => {}
                ClauseState::Conflict => return false,
                ClauseState::Unit(lit) => {
                    assign[lit.var().idx()] =
                        if lit.is_pos() { TernaryVal::True } else { TernaryVal::False };
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    true
}

/// The fixed expansion order for the best-first search: variables by
/// descending clause occurrence count, ties broken toward the smaller
/// variable index.
pub fn occurrence_order(cnf: &Cnf, n_vars: u32) -> Vec<Var> {
    let mut counts = vec![0usize; n_vars as usize];
    for clause in cnf.iter() {
        for &lit in clause.iter() {
            counts[lit.var().idx()] += 1;
        }
    }

    let mut vars: Vec<Var> = (0..n_vars).map(Var::new).collect();
    vars.sort_by_key(|var| (Reverse(counts[var.idx()]), var.idx()));
    vars
}
