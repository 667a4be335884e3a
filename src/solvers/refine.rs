//! Connectivity refinement: the clause families guarantee demand and
//! no-crossing but not global connectivity, so models are tested after
//! decoding and disconnected ones are blocked away until a connected model
//! appears or the space of models runs dry.

use std::time::Instant;

use log::info;
use rustsat::{
    instances::Cnf,
    types::{Clause, TernaryVal, Var},
};

use super::SolveOutcome;
use crate::{
    encoder::Encoding,
    geometry::Edge,
    puzzle::Island,
    solution::{self, Bridges},
};

#[derive(Debug, Clone)]
pub enum RefineOutcome {
    Connected { bridges: Bridges, attempts: usize },
    /// The clause set had no model at all.
    Unsat,
    /// Models existed, but every one was disconnected and has been blocked.
    NoConnectedSolution { attempts: usize },
    Timeout { attempts: usize },
}

/// Re-solves until a decoded model is globally connected. Each call hands
/// the solver the full clause list including all blocking clauses issued so
/// far; solvers stay swappable because no state crosses the boundary.
pub fn solve_connected<F>(
    encoding: &Encoding,
    islands: &[Island],
    edges: &[Edge],
    deadline: Instant,
    mut solve: F,
) -> RefineOutcome
where
    F: FnMut(&Cnf, Instant) -> SolveOutcome,
{
    let mut cnf = encoding.cnf().clone();
    let mut attempts = 0usize;

    loop {
        if Instant::now() >= deadline {
            return RefineOutcome::Timeout { attempts };
        }
        attempts += 1;

        match solve(&cnf, deadline) {
            SolveOutcome::Timeout => return RefineOutcome::Timeout { attempts },
            SolveOutcome::Unsat if attempts == 1 => return RefineOutcome::Unsat,
            SolveOutcome::Unsat => return RefineOutcome::NoConnectedSolution { attempts },
            SolveOutcome::Sat(model) => {
                let bridges = solution::decode(&model, edges, encoding.edge_vars());
                if solution::is_connected(islands.len(), &bridges) {
                    info!(target: "refine", "connected model on attempt {attempts}");
                    return RefineOutcome::Connected { bridges, attempts };
                }
                info!(target: "refine", "disconnected model on attempt {attempts}; blocking it");
                cnf.add_clause(blocking_clause(&model));
            }
        }
    }
}

/// The negation of a full model: one literal per variable, flipped.
fn blocking_clause(model: &[TernaryVal]) -> Clause {
    Clause::from_iter(model.iter().enumerate().map(|(idx, &value)| {
        let var = Var::new(idx as u32);
        match value {
            TernaryVal::True => var.neg_lit(),
            _ => var.pos_lit(),
        }
    }))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        encoder,
        geometry::candidate_edges,
        puzzle::Puzzle,
        solvers::{backtracking, propagate},
    };

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    fn refine_text(text: &str) -> (Vec<Island>, RefineOutcome) {
        let puzzle = Puzzle::parse(text).unwrap();
        let islands = puzzle.islands().to_vec();
        let edges = candidate_edges(&islands);
        let encoding = encoder::encode(&islands, &edges);
        let n_vars = encoding.n_vars();
        let outcome = solve_connected(&encoding, &islands, &edges, far_deadline(), |cnf, dl| {
            backtracking::solve(cnf, n_vars, dl)
        });
        (islands, outcome)
    }

    #[test]
    fn connected_model_on_first_attempt() {
        let (islands, outcome) = refine_text("1,0,1\n0,0,0\n0,0,0\n");
        let RefineOutcome::Connected { bridges, attempts } = outcome else {
            panic!("expected a connected solution");
        };
        assert_eq!(attempts, 1);
        assert_eq!(bridges, Bridges::from([((0, 1), 1)]));
        assert!(solution::validate(&islands, &bridges).is_ok());
    }

    #[test]
    fn blocks_disconnected_models_until_the_ring_appears() {
        // Four corner islands of demand 2: pairing them off with double
        // bridges satisfies demand and crossing but not connectivity, so the
        // loop has to block such models until the single-bridge ring shows
        // up.
        let (islands, outcome) = refine_text("2,0,2\n0,0,0\n2,0,2\n");
        let RefineOutcome::Connected { bridges, attempts } = outcome else {
            panic!("expected a connected solution");
        };
        assert!(attempts >= 1);
        assert_eq!(
            bridges,
            Bridges::from([((0, 1), 1), ((0, 2), 1), ((1, 3), 1), ((2, 3), 1)])
        );
        assert!(solution::validate(&islands, &bridges).is_ok());
    }

    #[test]
    fn unsat_on_first_attempt_is_reported_as_unsat() {
        // Two aligned islands with mismatched demands 1 and 2 pass
        // preflight but admit no model.
        let (_, outcome) = refine_text("1,0,2\n0,0,0\n0,0,0\n");
        assert!(matches!(outcome, RefineOutcome::Unsat));
    }

    #[test]
    fn exhausting_models_reports_no_connected_solution() {
        // Two demand-2 pairs on separate rows with no aligned columns: the
        // only models are the two disconnected doubles (or singles), so the
        // loop runs out of models.
        let (_, outcome) = refine_text("2,2,0,0\n0,0,0,0\n0,0,2,2\n");
        assert!(matches!(outcome, RefineOutcome::NoConnectedSolution { .. }));
    }

    #[test]
    fn blocking_clause_rules_out_exactly_that_model() {
        let model = vec![TernaryVal::True, TernaryVal::False];
        let clause = blocking_clause(&model);
        // Under the blocked model every literal of the clause is false.
        assert!(clause.iter().all(|&lit| {
            propagate::lit_value(&model, lit) == TernaryVal::False
        }));
        // A model differing in one variable satisfies the clause.
        let other = vec![TernaryVal::True, TernaryVal::True];
        assert!(clause.iter().any(|&lit| propagate::lit_value(&other, lit) == TernaryVal::True));
    }
}
