use std::{
    fmt::{Display, Formatter},
    sync::{Arc, Mutex},
};

use enum_iterator::Sequence;
use rustsat::solvers::InterruptSolver;

pub mod config;
pub mod encoder;
pub mod geometry;
pub mod grid;
pub mod output;
pub mod puzzle;
pub mod report;
pub mod solution;
pub mod solvers;

/// Shared slot for the interrupter of whichever CDCL solve is currently
/// running. The ctrl-c handler fires it; the oracle installs and clears it
/// around each solve.
pub type InterrupterContainer = Arc<Mutex<Option<Box<dyn InterruptSolver + Send>>>>;

/// The four interchangeable decision procedures.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Sequence)]
pub enum SolverKind {
    /// External CDCL oracle (Glucose), used as the reference solver.
    Cdcl,
    AStar,
    Backtracking,
    BruteForce,
}

impl SolverKind {
    /// Key under `solvers` in the summary JSON. The names are fixed by the
    /// benchmark schema.
    pub const fn summary_key(self) -> &'static str {
        match self {
            SolverKind::Cdcl => "pysat",
            SolverKind::AStar => "astar",
            SolverKind::Backtracking => "backtracking",
            SolverKind::BruteForce => "bruteforce",
        }
    }

    /// Prefix for per-solver output files.
    pub const fn output_prefix(self) -> &'static str {
        match self {
            SolverKind::Cdcl => "pysat",
            SolverKind::AStar => "astar",
            SolverKind::Backtracking => "backtrack",
            SolverKind::BruteForce => "brute",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SolverKind::Cdcl => "CDCL (Glucose)",
            SolverKind::AStar => "A*",
            SolverKind::Backtracking => "Backtracking",
            SolverKind::BruteForce => "Brute force",
        }
    }
}

impl Display for SolverKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
