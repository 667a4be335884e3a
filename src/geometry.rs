//! Candidate edges and the bridge crossing relation.

use derive_more::with_trait::IsVariant;
use enum_iterator::Sequence;

use crate::puzzle::Island;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Sequence, IsVariant)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A pair of aligned islands with no island strictly between them.
/// `u < v`, both indices into the row-major island list.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Edge {
    pub u: usize,
    pub v: usize,
    pub orientation: Orientation,
}

/// Enumerates candidate edges: for each `i < j` (both ascending), the pair
/// qualifies if the islands share a row or a column and no third island lies
/// strictly between them. Horizontal alignment is checked first.
pub fn candidate_edges(islands: &[Island]) -> Vec<Edge> {
    let mut edges = Vec::new();

    for i in 0..islands.len() {
        for j in (i + 1)..islands.len() {
            let (a, b) = (islands[i], islands[j]);

            if a.row == b.row {
                let (lo, hi) = (a.col.min(b.col), a.col.max(b.col));
                let blocked = islands
                    .iter()
                    .enumerate()
                    .any(|(k, isl)| k != i && k != j && isl.row == a.row && lo < isl.col && isl.col < hi);
                if !blocked {
                    edges.push(Edge { u: i, v: j, orientation: Orientation::Horizontal });
                }
            } else if a.col == b.col {
                let (lo, hi) = (a.row.min(b.row), a.row.max(b.row));
                let blocked = islands
                    .iter()
                    .enumerate()
                    .any(|(k, isl)| k != i && k != j && isl.col == a.col && lo < isl.row && isl.row < hi);
                if !blocked {
                    edges.push(Edge { u: i, v: j, orientation: Orientation::Vertical });
                }
            }
        }
    }

    edges
}

/// Whether two candidate edges cross: one must be horizontal and one
/// vertical, with the vertical's column strictly between the horizontal's
/// endpoint columns and the horizontal's row strictly between the vertical's
/// endpoint rows. Collinear edges never cross.
pub fn crosses(islands: &[Island], a: &Edge, b: &Edge) -> bool {
    if a.orientation == b.orientation {
        return false;
    }
    let (h, v) = if a.orientation.is_horizontal() { (a, b) } else { (b, a) };

    let h_row = islands[h.u].row;
    let (c1, c2) = (islands[h.u].col, islands[h.v].col);
    let (h_lo, h_hi) = (c1.min(c2), c1.max(c2));

    let v_col = islands[v.u].col;
    let (r1, r2) = (islands[v.u].row, islands[v.v].row);
    let (v_lo, v_hi) = (r1.min(r2), r1.max(r2));

    h_lo < v_col && v_col < h_hi && v_lo < h_row && h_row < v_hi
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn island(row: usize, col: usize) -> Island {
        Island { row, col, demand: 1 }
    }

    #[test]
    fn l_triple_has_two_edges() {
        let islands = [island(0, 0), island(0, 2), island(2, 0)];
        let edges = candidate_edges(&islands);
        assert_eq!(
            edges,
            vec![
                Edge { u: 0, v: 1, orientation: Orientation::Horizontal },
                Edge { u: 0, v: 2, orientation: Orientation::Vertical },
            ]
        );
    }

    #[test]
    fn intermediate_island_blocks_the_long_edge() {
        // 0 -- 1 -- 2 on one row: (0, 2) is blocked by 1.
        let islands = [island(0, 0), island(0, 2), island(0, 4)];
        let edges = candidate_edges(&islands);
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| (e.u, e.v) != (0, 2)));
    }

    #[test]
    fn enumeration_order_is_i_then_j_ascending() {
        // Square of four islands; four edges, discovered in pair order.
        let islands = [island(0, 0), island(0, 2), island(2, 0), island(2, 2)];
        let pairs: Vec<_> = candidate_edges(&islands).iter().map(|e| (e.u, e.v)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 3), (2, 3)]);
    }

    // A horizontal span (1,1)-(1,3) against various vertical spans.
    #[test_case(island(0, 2), island(2, 2), true; "strictly inside both spans")]
    #[test_case(island(0, 1), island(2, 1), false; "through the left endpoint column")]
    #[test_case(island(0, 3), island(2, 3), false; "through the right endpoint column")]
    #[test_case(island(1, 2), island(3, 2), false; "starting on the horizontal row")]
    #[test_case(island(2, 2), island(4, 2), false; "entirely below")]
    fn crossing_predicate(v_top: Island, v_bottom: Island, expected: bool) {
        let islands = [island(1, 1), island(1, 3), v_top, v_bottom];
        let h = Edge { u: 0, v: 1, orientation: Orientation::Horizontal };
        let v = Edge { u: 2, v: 3, orientation: Orientation::Vertical };
        assert_eq!(crosses(&islands, &h, &v), expected);
        assert_eq!(crosses(&islands, &v, &h), expected);
    }

    #[test]
    fn collinear_edges_never_cross() {
        let islands = [island(0, 0), island(0, 2), island(0, 4), island(0, 6)];
        let a = Edge { u: 0, v: 1, orientation: Orientation::Horizontal };
        let b = Edge { u: 2, v: 3, orientation: Orientation::Horizontal };
        assert!(!crosses(&islands, &a, &b));
    }
}
