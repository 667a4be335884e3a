//! Model decoding, connectivity and full-solution validation.

use std::collections::BTreeMap;

use itertools::Itertools;
use petgraph::{graph::UnGraph, visit::Bfs};
use rustsat::types::{TernaryVal, Var};
use thiserror::Error;

use crate::{
    geometry::{self, Edge, Orientation},
    puzzle::Island,
};

/// Multiplicity map: `(u, v)` island index pairs to 1 or 2. Edges without a
/// bridge are omitted. A `BTreeMap` keeps iteration deterministic.
pub type Bridges = BTreeMap<(usize, usize), u8>;

/// Decodes a model into a multiplicity map: the double variable wins, then
/// the single one, otherwise the edge is omitted. Total and deterministic.
pub fn decode(model: &[TernaryVal], edges: &[Edge], edge_vars: &[(Var, Var)]) -> Bridges {
    let mut bridges = Bridges::new();
    for (edge, &(single, double)) in edges.iter().zip(edge_vars) {
        let mult = if model[double.idx()] == TernaryVal::True {
            2
        } else if model[single.idx()] == TernaryVal::True {
            1
        } else {
            continue;
        };
        bridges.insert((edge.u, edge.v), mult);
    }
    bridges
}

/// BFS from island 0 over edges with at least one bridge. Zero islands are
/// vacuously connected.
pub fn is_connected(island_count: usize, bridges: &Bridges) -> bool {
    if island_count == 0 {
        return true;
    }

    let mut graph = UnGraph::<(), ()>::new_undirected();
    let nodes: Vec<_> = (0..island_count).map(|_| graph.add_node(())).collect();
    for (&(u, v), &mult) in bridges {
        if mult > 0 {
            graph.add_edge(nodes[u], nodes[v], ());
        }
    }

    let mut bfs = Bfs::new(&graph, nodes[0]);
    let mut reached = 0usize;
    while bfs.next(&graph).is_some() {
        reached += 1;
    }
    reached == island_count
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("island at ({row},{col}) has {got} bridges, needs {required}")]
    DemandMismatch { row: usize, col: usize, got: usize, required: u8 },
    #[error("more than 2 bridges between islands {u} and {v}")]
    TooManyBridges { u: usize, v: usize },
    #[error("bridges {a_u}-{a_v} and {b_u}-{b_v} cross")]
    Crossing { a_u: usize, a_v: usize, b_u: usize, b_v: usize },
    #[error("islands are not all connected")]
    Disconnected,
}

/// Checks a finished solution: demand equality, the two-bridge cap, no
/// crossing among active bridges, then global connectivity. The first
/// failing check is reported.
pub fn validate(islands: &[Island], bridges: &Bridges) -> Result<(), ValidationError> {
    let mut counts = vec![0usize; islands.len()];
    for (&(u, v), &mult) in bridges {
        counts[u] += usize::from(mult);
        counts[v] += usize::from(mult);
    }
    for (island, &got) in islands.iter().zip(&counts) {
        if got != usize::from(island.demand) {
            return Err(ValidationError::DemandMismatch {
                row: island.row,
                col: island.col,
                got,
                required: island.demand,
            });
        }
    }

    for (&(u, v), &mult) in bridges {
        if mult > 2 {
            return Err(ValidationError::TooManyBridges { u, v });
        }
    }

    let active: Vec<Edge> = bridges
        .iter()
        .filter(|&(_, &mult)| mult > 0)
        .map(|(&(u, v), _)| Edge {
            u,
            v,
            orientation: if islands[u].row == islands[v].row {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            },
        })
        .collect();
    for (a, b) in active.iter().tuple_combinations() {
        if geometry::crosses(islands, a, b) {
            return Err(ValidationError::Crossing { a_u: a.u, a_v: a.v, b_u: b.u, b_v: b.v });
        }
    }

    if !is_connected(islands.len(), bridges) {
        return Err(ValidationError::Disconnected);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rustsat::types::TernaryVal::{DontCare, False, True};

    use super::*;

    fn island(row: usize, col: usize, demand: u8) -> Island {
        Island { row, col, demand }
    }

    #[test]
    fn decode_prefers_the_double_variable() {
        let edges = [
            Edge { u: 0, v: 1, orientation: Orientation::Horizontal },
            Edge { u: 1, v: 2, orientation: Orientation::Horizontal },
            Edge { u: 2, v: 3, orientation: Orientation::Horizontal },
        ];
        let edge_vars: Vec<(Var, Var)> =
            (0..3).map(|k| (Var::new(2 * k), Var::new(2 * k + 1))).collect();
        let model = vec![True, True, True, False, False, DontCare];
        let bridges = decode(&model, &edges, &edge_vars);
        assert_eq!(bridges, Bridges::from([((0, 1), 2), ((1, 2), 1)]));
    }

    #[test]
    fn decode_round_trips_through_an_encoded_model() {
        let edges = [
            Edge { u: 0, v: 1, orientation: Orientation::Horizontal },
            Edge { u: 0, v: 2, orientation: Orientation::Vertical },
        ];
        let edge_vars = [(Var::new(0), Var::new(1)), (Var::new(2), Var::new(3))];
        let bridges = Bridges::from([((0, 1), 2), ((0, 2), 1)]);

        // Re-encode the multiplicities the way the variables are defined.
        let mut model = vec![False; 4];
        for (k, &(single, double)) in edge_vars.iter().enumerate() {
            let key = (edges[k].u, edges[k].v);
            let mult = bridges.get(&key).copied().unwrap_or(0);
            if mult >= 1 {
                model[single.idx()] = True;
            }
            if mult == 2 {
                model[double.idx()] = True;
            }
        }

        assert_eq!(decode(&model, &edges, &edge_vars), bridges);
    }

    #[test]
    fn connectivity_over_active_edges() {
        assert!(is_connected(0, &Bridges::new()));
        assert!(is_connected(1, &Bridges::new()));
        assert!(!is_connected(2, &Bridges::new()));
        assert!(is_connected(3, &Bridges::from([((0, 1), 1), ((1, 2), 2)])));
        assert!(!is_connected(4, &Bridges::from([((0, 1), 2), ((2, 3), 2)])));
    }

    #[test]
    fn validate_accepts_the_l_triple() {
        let islands = [island(0, 0, 2), island(0, 2, 1), island(2, 0, 1)];
        let bridges = Bridges::from([((0, 1), 1), ((0, 2), 1)]);
        assert!(validate(&islands, &bridges).is_ok());
    }

    #[test]
    fn validate_reports_demand_mismatch_first() {
        let islands = [island(0, 0, 2), island(0, 2, 1)];
        let bridges = Bridges::from([((0, 1), 1)]);
        assert!(matches!(
            validate(&islands, &bridges),
            Err(ValidationError::DemandMismatch { row: 0, col: 0, got: 1, required: 2 })
        ));
    }

    #[test]
    fn validate_rejects_overfull_edges() {
        let islands = [island(0, 0, 3), island(0, 2, 3)];
        let bridges = Bridges::from([((0, 1), 3)]);
        assert!(matches!(
            validate(&islands, &bridges),
            Err(ValidationError::TooManyBridges { u: 0, v: 1 })
        ));
    }

    #[test]
    fn validate_rejects_crossing_bridges() {
        // A horizontal bridge over the middle row and a vertical one through
        // the middle column; degrees line up, the geometry does not.
        let islands =
            [island(0, 1, 1), island(1, 0, 1), island(1, 2, 1), island(2, 1, 1)];
        let bridges = Bridges::from([((0, 3), 1), ((1, 2), 1)]);
        assert!(matches!(
            validate(&islands, &bridges),
            Err(ValidationError::Crossing { .. })
        ));
    }

    #[test]
    fn validate_rejects_disconnected_solutions() {
        let islands =
            [island(0, 0, 2), island(0, 2, 2), island(2, 0, 2), island(2, 2, 2)];
        let bridges = Bridges::from([((0, 1), 2), ((2, 3), 2)]);
        assert!(matches!(validate(&islands, &bridges), Err(ValidationError::Disconnected)));
    }
}
