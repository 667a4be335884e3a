//! Reference CDCL solver: Glucose behind rustsat's `Solve` interface.
//!
//! The deadline is enforced with the solver's own interrupter: a timer
//! thread parks on a channel and fires it if the solve is still running
//! when the deadline passes. The active interrupter is also published to
//! the shared container so the ctrl-c handler can stop a long solve.

use std::{sync::mpsc, thread, time::Instant};

use anyhow::Context;
use rustsat::{
    instances::Cnf,
    solvers::{Interrupt, InterruptSolver, Solve, SolverResult},
    types::{TernaryVal, Var},
};
use rustsat_glucose::simp::Glucose;

use super::SolveOutcome;
use crate::InterrupterContainer;

pub fn solve(
    cnf: Cnf,
    n_vars: u32,
    deadline: Instant,
    interrupter_slot: &InterrupterContainer,
) -> anyhow::Result<SolveOutcome> {
    let mut solver = Glucose::default();
    solver.add_cnf(cnf).context("failed to add CNF")?;

    *interrupter_slot.lock().expect("mutex was poisoned") =
        Some(Box::new(solver.interrupter()));

    let timer_interrupter = solver.interrupter();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let timer = thread::spawn(move || {
        let budget = deadline.saturating_duration_since(Instant::now());
        if done_rx.recv_timeout(budget).is_err() {
            timer_interrupter.interrupt();
        }
    });

    let result = solver.solve().context("error while solving");
    // Release the timer, then drop the published interrupter while the
    // solver is still alive.
    let _ = done_tx.send(());
    let _ = timer.join();
    *interrupter_slot.lock().expect("mutex was poisoned") = None;

    match result? {
        SolverResult::Sat => {
            let assignment = solver.full_solution().context("failed to get full solution")?;
            let model: Vec<TernaryVal> =
                (0..n_vars).map(|idx| assignment.var_value(Var::new(idx))).collect();
            Ok(SolveOutcome::Sat(model))
        }
        SolverResult::Unsat => Ok(SolveOutcome::Unsat),
        SolverResult::Interrupted => Ok(SolveOutcome::Timeout),
    }
}
