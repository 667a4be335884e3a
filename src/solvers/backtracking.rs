//! DPLL-style backtracking search with unit propagation and dynamic
//! variable/value ordering.

use std::time::Instant;

use rustsat::{
    instances::Cnf,
    types::{TernaryVal, Var},
};

use super::{
    SolveOutcome,
    propagate::{Assignment, clause_satisfied, count_unsatisfied, is_complete, unit_propagate},
};

pub fn solve(cnf: &Cnf, n_vars: u32, deadline: Instant) -> SolveOutcome {
    let mut assign = vec![TernaryVal::DontCare; n_vars as usize];
    if !unit_propagate(cnf, &mut assign) {
        return SolveOutcome::Unsat;
    }

    match dfs(cnf, assign, deadline) {
        Dfs::Model(model) => SolveOutcome::Sat(model),
        Dfs::Exhausted => SolveOutcome::Unsat,
        Dfs::Timeout => SolveOutcome::Timeout,
    }
}

enum Dfs {
    Model(Assignment),
    Exhausted,
    /// Unwinds the whole stack once the deadline passes.
    Timeout,
}

fn dfs(cnf: &Cnf, assign: Assignment, deadline: Instant) -> Dfs {
    if Instant::now() >= deadline {
        return Dfs::Timeout;
    }

    if is_complete(&assign) {
        return if count_unsatisfied(cnf, &assign) == 0 {
            Dfs::Model(assign)
        } else {
            Dfs::Exhausted
        };
    }

    let Some(var) = decision_variable(cnf, &assign) else {
        return Dfs::Exhausted;
    };

    for value in value_order(cnf, &assign, var) {
        let mut child = assign.clone();
        child[var.idx()] = if value { TernaryVal::True } else { TernaryVal::False };

        if !unit_propagate(cnf, &mut child) {
            continue;
        }

        match dfs(cnf, child, deadline) {
            Dfs::Exhausted => {}
            outcome => return outcome,
        }
    }

    Dfs::Exhausted
}

/// MRV-by-activity: among unassigned variables, the one occurring in the
/// most not-yet-satisfied clauses; ties take the lower variable index.
fn decision_variable(cnf: &Cnf, assign: &[TernaryVal]) -> Option<Var> {
    let mut counts = vec![0usize; assign.len()];
    for clause in cnf.iter() {
        if clause_satisfied(clause, assign) {
            continue;
        }
        for &lit in clause.iter() {
            let idx = lit.var().idx();
            if assign[idx] == TernaryVal::DontCare {
                counts[idx] += 1;
            }
        }
    }

    let mut best: Option<(Var, usize)> = None;
    for (idx, &cell) in assign.iter().enumerate() {
        if cell != TernaryVal::DontCare {
            continue;
        }
        if best.is_none_or(|(_, best_count)| counts[idx] > best_count) {
            best = Some((Var::new(idx as u32), counts[idx]));
        }
    }
    best.map(|(var, _)| var)
}

/// `true` first iff the variable occurs positively in at least as many
/// not-yet-satisfied clauses as negatively.
fn value_order(cnf: &Cnf, assign: &[TernaryVal], var: Var) -> [bool; 2] {
    let (mut pos, mut neg) = (0usize, 0usize);
    for clause in cnf.iter() {
        if clause_satisfied(clause, assign) {
            continue;
        }
        for &lit in clause.iter() {
            if lit.var() == var {
                if lit.is_pos() {
                    pos += 1;
                } else {
                    neg += 1;
                }
                break;
            }
        }
    }
    if pos >= neg { [true, false] } else { [false, true] }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rustsat::types::{Clause, Lit};
    use test_case::test_case;

    use crate::{
        encoder, geometry::candidate_edges, puzzle::Puzzle, solution, solvers::brute_force,
    };

    use super::*;

    fn lit(dimacs: i32) -> Lit {
        let var = Var::new(dimacs.unsigned_abs() - 1);
        if dimacs > 0 { var.pos_lit() } else { var.neg_lit() }
    }

    fn cnf(clauses: &[&[i32]]) -> Cnf {
        let mut cnf = Cnf::default();
        for clause in clauses {
            cnf.add_clause(Clause::from_iter(clause.iter().map(|&l| lit(l))));
        }
        cnf
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    #[test]
    fn solves_a_horn_formula() {
        let cnf = cnf(&[&[-1, -2, 3], &[1], &[2]]);
        let SolveOutcome::Sat(model) = solve(&cnf, 3, far_deadline()) else {
            panic!("expected sat");
        };
        assert_eq!(model, vec![TernaryVal::True; 3]);
    }

    #[test]
    fn requires_backtracking_on_bad_first_branch() {
        let cnf = cnf(&[&[1, 2], &[1, -2], &[-1, 3], &[-3]]);
        assert!(matches!(solve(&cnf, 3, far_deadline()), SolveOutcome::Unsat));
    }

    #[test]
    fn contradictory_units_are_unsat_before_any_decision() {
        let cnf = cnf(&[&[1], &[-1]]);
        assert!(matches!(solve(&cnf, 1, far_deadline()), SolveOutcome::Unsat));
    }

    #[test]
    fn is_deterministic() {
        let cnf = cnf(&[&[1, 2], &[-1, 2], &[2, 3], &[-3, 1]]);
        let SolveOutcome::Sat(first) = solve(&cnf, 3, far_deadline()) else {
            panic!("expected sat");
        };
        let SolveOutcome::Sat(second) = solve(&cnf, 3, far_deadline()) else {
            panic!("expected sat");
        };
        assert_eq!(first, second);
    }

    #[test]
    fn expired_deadline_reports_timeout() {
        let cnf = cnf(&[&[1, 2], &[-1, 2]]);
        let outcome = solve(&cnf, 2, Instant::now());
        assert!(matches!(outcome, SolveOutcome::Timeout));
    }

    #[test_case("2,0,1\n0,0,0\n1,0,0\n"; "l triple")]
    #[test_case("4,0,0,0,4\n0,0,0,0,0\n0,0,0,0,0\n0,0,0,0,0\n4,0,0,0,4\n"; "square of fours")]
    fn decodes_to_the_same_bridges_as_brute_force(text: &str) {
        let puzzle = Puzzle::parse(text).unwrap();
        let islands = puzzle.islands().to_vec();
        let edges = candidate_edges(&islands);
        let encoding = encoder::encode(&islands, &edges);

        let SolveOutcome::Sat(model) = solve(encoding.cnf(), encoding.n_vars(), far_deadline())
        else {
            panic!("expected sat");
        };
        let decoded = solution::decode(&model, &edges, encoding.edge_vars());

        let brute = brute_force::solve(&islands, &edges, far_deadline())
            .expect("solvable instance");
        assert_eq!(decoded, brute);
    }
}
