use std::{fs, path::Path};

use thiserror::Error;

use crate::grid::{Dimensions, Grid};

/// Largest bridge demand a single island can carry (two bridges in each of
/// the four directions).
pub const MAX_DEMAND: u8 = 8;

/// An island cell, numbered by its position in the row-major island list.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Island {
    pub row: usize,
    pub col: usize,
    pub demand: u8,
}

/// A parsed puzzle: the demand grid plus its islands in row-major order.
/// Both are immutable for the lifetime of the instance; every other
/// component refers to islands by their index here.
#[derive(Debug, Clone)]
pub struct Puzzle {
    grid: Grid<u8>,
    islands: Vec<Island>,
}

#[derive(Error, Debug)]
pub enum PuzzleError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: invalid cell {cell:?} (expected a non-negative integer)")]
    BadCell { line: usize, cell: String },
    #[error("line {line}: expected {expected} columns, found {found}")]
    RaggedRow { line: usize, expected: usize, found: usize },
    #[error("line {line}: demand {demand} exceeds the maximum of {MAX_DEMAND}")]
    DemandTooLarge { line: usize, demand: u64 },
    #[error("no grid rows found")]
    Empty,
}

impl Puzzle {
    pub fn from_file(path: &Path) -> Result<Self, PuzzleError> {
        let text = fs::read_to_string(path).map_err(|source| PuzzleError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parses comma-separated demand rows. Blank lines are skipped and
    /// whitespace around each integer is ignored.
    pub fn parse(text: &str) -> Result<Self, PuzzleError> {
        let mut rows: Vec<Vec<u8>> = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row = line
                .split(',')
                .map(|cell| parse_cell(cell, i + 1))
                .collect::<Result<Vec<u8>, _>>()?;
            if let Some(first) = rows.first()
                && first.len() != row.len()
            {
                return Err(PuzzleError::RaggedRow {
                    line: i + 1,
                    expected: first.len(),
                    found: row.len(),
                });
            }
            rows.push(row);
        }

        let Some(first) = rows.first() else {
            return Err(PuzzleError::Empty);
        };
        let dims = Dimensions::new(rows.len(), first.len());
        let flat: Vec<u8> = rows.into_iter().flatten().collect();
        let grid = Grid::try_from_vec(dims, flat).ok_or(PuzzleError::Empty)?;

        let islands = grid
            .enumerate()
            .filter(|(_, &demand)| demand != 0)
            .map(|((row, col), &demand)| Island { row, col, demand })
            .collect();

        Ok(Puzzle { grid, islands })
    }

    pub const fn dims(&self) -> Dimensions {
        self.grid.dims()
    }

    pub fn grid(&self) -> &Grid<u8> {
        &self.grid
    }

    pub fn islands(&self) -> &[Island] {
        &self.islands
    }
}

fn parse_cell(cell: &str, line: usize) -> Result<u8, PuzzleError> {
    let value: u64 = cell.trim().parse().map_err(|_| PuzzleError::BadCell {
        line,
        cell: cell.trim().to_string(),
    })?;
    if value > u64::from(MAX_DEMAND) {
        return Err(PuzzleError::DemandTooLarge { line, demand: value });
    }
    Ok(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_islands_in_row_major_order() {
        let puzzle = Puzzle::parse("1,0,1\n0,0,0\n1,0,0\n").unwrap();
        assert_eq!(puzzle.dims(), Dimensions::new(3, 3));
        assert_eq!(
            puzzle.islands(),
            &[
                Island { row: 0, col: 0, demand: 1 },
                Island { row: 0, col: 2, demand: 1 },
                Island { row: 2, col: 0, demand: 1 },
            ]
        );
    }

    #[test]
    fn skips_blank_lines_and_trims_cells() {
        let puzzle = Puzzle::parse("\n 2 , 0 \n\n 0, 2 \n\n").unwrap();
        assert_eq!(puzzle.dims(), Dimensions::new(2, 2));
        assert_eq!(puzzle.islands().len(), 2);
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = Puzzle::parse("1,0\n1,0,0\n").unwrap_err();
        assert!(matches!(err, PuzzleError::RaggedRow { line: 2, expected: 2, found: 3 }));
    }

    #[test]
    fn rejects_non_numeric_cells() {
        let err = Puzzle::parse("1,x\n").unwrap_err();
        assert!(matches!(err, PuzzleError::BadCell { line: 1, .. }));
    }

    #[test]
    fn rejects_demands_above_eight() {
        let err = Puzzle::parse("9,0\n").unwrap_err();
        assert!(matches!(err, PuzzleError::DemandTooLarge { demand: 9, .. }));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(Puzzle::parse("\n\n").unwrap_err(), PuzzleError::Empty));
    }
}
