//! Enumerative baseline: every edge-multiplicity tuple in lexicographic
//! order, pruned on degree, crossing and connectivity. Only viable for
//! small instances; the orchestrator gates it on grid size.

use std::time::Instant;

use itertools::Itertools;
use log::{info, warn};

use crate::{
    geometry::{self, Edge},
    puzzle::Island,
    solution::{self, Bridges},
};

const SEARCH_SPACE_CEILING: u128 = 5_000_000;
const DEADLINE_STRIDE: u64 = 1000;

/// Returns the first multiplicity tuple satisfying all four puzzle rules,
/// or `None` once the space is exhausted or the deadline passes.
pub fn solve(islands: &[Island], edges: &[Edge], deadline: Instant) -> Option<Bridges> {
    match 3u128.checked_pow(edges.len() as u32) {
        Some(space) if space <= SEARCH_SPACE_CEILING => {
            info!(target: "solver", "brute force: 3^{} = {} configurations", edges.len(), space);
        }
        _ => {
            warn!(
                target: "solver",
                "brute force: search space 3^{} exceeds {}; this will likely time out",
                edges.len(),
                SEARCH_SPACE_CEILING
            );
        }
    }

    let mut config = vec![0u8; edges.len()];
    let mut checked = 0u64;

    loop {
        checked += 1;
        if checked % DEADLINE_STRIDE == 0 && Instant::now() >= deadline {
            return None;
        }

        if degrees_match(islands, edges, &config) && no_active_crossing(islands, edges, &config) {
            let bridges = to_bridges(edges, &config);
            if solution::is_connected(islands.len(), &bridges) {
                return Some(bridges);
            }
        }

        if !advance(&mut config) {
            return None;
        }
    }
}

/// Steps to the next multiplicity tuple in lexicographic order; the last
/// edge varies fastest. Returns `false` once the space is exhausted.
fn advance(config: &mut [u8]) -> bool {
    for digit in config.iter_mut().rev() {
        if *digit < 2 {
            *digit += 1;
            return true;
        }
        *digit = 0;
    }
    false
}

fn degrees_match(islands: &[Island], edges: &[Edge], config: &[u8]) -> bool {
    let mut degree = vec![0usize; islands.len()];
    for (edge, &mult) in edges.iter().zip(config) {
        degree[edge.u] += usize::from(mult);
        degree[edge.v] += usize::from(mult);
    }
    islands.iter().zip(&degree).all(|(island, &d)| d == usize::from(island.demand))
}

fn no_active_crossing(islands: &[Island], edges: &[Edge], config: &[u8]) -> bool {
    edges
        .iter()
        .zip(config)
        .filter(|(_, &mult)| mult > 0)
        .map(|(edge, _)| edge)
        .tuple_combinations()
        .all(|(a, b)| !geometry::crosses(islands, a, b))
}

fn to_bridges(edges: &[Edge], config: &[u8]) -> Bridges {
    edges
        .iter()
        .zip(config)
        .filter(|(_, &mult)| mult > 0)
        .map(|(edge, &mult)| ((edge.u, edge.v), mult))
        .collect()
}
