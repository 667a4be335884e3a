//! Best-first search over partial assignments, ordered by decision depth
//! plus the count of clauses left unsatisfied. The heuristic is not
//! admissible; the search promises a satisfying leaf or a timeout, not an
//! optimal path.

use std::{cmp::Ordering, collections::BinaryHeap, time::Instant};

use rustsat::{instances::Cnf, types::TernaryVal};

use super::{
    SolveOutcome,
    propagate::{Assignment, count_unsatisfied, is_complete, occurrence_order, unit_propagate},
};

struct Node {
    f: usize,
    g: usize,
    h: usize,
    /// Insertion counter; FIFO among otherwise equal nodes.
    seq: u64,
    assign: Assignment,
}

impl Node {
    fn key(&self) -> (usize, usize, u64) {
        (self.f, self.g, self.seq)
    }
}

impl Ord for Node {
    /// `BinaryHeap` pops the greatest node, so "greater" means preferred:
    /// smaller `f`, then larger `g` (deeper states first), then FIFO.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then(self.g.cmp(&other.g))
            .then(other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Node {}

pub fn solve(cnf: &Cnf, n_vars: u32, deadline: Instant) -> SolveOutcome {
    let order = occurrence_order(cnf, n_vars);

    let mut root = vec![TernaryVal::DontCare; n_vars as usize];
    if !unit_propagate(cnf, &mut root) {
        return SolveOutcome::Unsat;
    }

    let mut frontier = BinaryHeap::new();
    let mut seq = 0u64;
    let h = count_unsatisfied(cnf, &root);
    frontier.push(Node { f: h, g: 0, h, seq, assign: root });

    while let Some(node) = frontier.pop() {
        if Instant::now() >= deadline {
            return SolveOutcome::Timeout;
        }

        if node.h == 0 && is_complete(&node.assign) {
            return SolveOutcome::Sat(node.assign);
        }

        // Branch on the first unassigned variable in the fixed order.
        let Some(var) = order.iter().copied().find(|v| node.assign[v.idx()] == TernaryVal::DontCare)
        else {
            continue;
        };

        let next_g = node.g + 1;
        for value in [TernaryVal::True, TernaryVal::False] {
            let mut child = node.assign.clone();
            child[var.idx()] = value;
            if !unit_propagate(cnf, &mut child) {
                continue;
            }
            let h = count_unsatisfied(cnf, &child);
            seq += 1;
            frontier.push(Node { f: next_g + h, g: next_g, h, seq, assign: child });
        }
    }

    SolveOutcome::Unsat
}
