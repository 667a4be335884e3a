//! Projecting solutions onto character grids, writing them out, and the
//! text rendition used by the visualize action.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use itertools::Itertools;

use crate::{
    grid::{Dimensions, Grid},
    puzzle::Island,
    solution::Bridges,
};

/// Projects a solution onto a char grid: demand digits on islands, `-`/`=`
/// strictly between horizontal endpoints, `|`/`$` strictly between vertical
/// ones, `0` everywhere else. Islands are stamped last.
pub fn build_output_grid(dims: Dimensions, islands: &[Island], bridges: &Bridges) -> Grid<char> {
    let mut out = Grid::new_fill(dims, '0');

    for (&(u, v), &mult) in bridges {
        if mult == 0 {
            continue;
        }
        let (a, b) = (islands[u], islands[v]);
        if a.row == b.row {
            let symbol = if mult == 2 { '=' } else { '-' };
            let (lo, hi) = (a.col.min(b.col), a.col.max(b.col));
            for col in (lo + 1)..hi {
                out.set(a.row, col, symbol);
            }
        } else {
            let symbol = if mult == 2 { '$' } else { '|' };
            let (lo, hi) = (a.row.min(b.row), a.row.max(b.row));
            for row in (lo + 1)..hi {
                out.set(row, a.col, symbol);
            }
        }
    }

    for island in islands {
        out.set(island.row, island.col, (b'0' + island.demand) as char);
    }

    out
}

/// One line per row, each cell quoted: `["1", "-", "1"]`. Every cell is
/// ASCII, so the ASCII-safe fallback is the same content.
pub fn render_rows(grid: &Grid<char>) -> Vec<String> {
    grid.iter_rows()
        .map(|row| format!("[{}]", row.iter().map(|cell| format!("\"{cell}\"")).join(", ")))
        .collect()
}

pub fn write_grid(path: &Path, grid: &Grid<char>) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for line in render_rows(grid) {
        writeln!(writer, "{line}")?;
    }
    writer.flush()
}

/// Glyphs for the text rendition of an output grid.
mod glyph {
    pub const H_SINGLE: char = '\u{2500}'; // ─
    pub const H_DOUBLE: char = '\u{2550}'; // ═
    pub const V_SINGLE: char = '\u{2502}'; // │
    pub const V_DOUBLE: char = '\u{2551}'; // ║
    pub const EMPTY: char = '\u{2591}'; // ░
}

/// Parses rows previously written by [`render_rows`]. Lines that do not
/// look like a bracketed row are skipped; returns `None` if nothing parses.
pub fn parse_rendered(text: &str) -> Option<Vec<Vec<String>>> {
    let rows: Vec<Vec<String>> = text
        .lines()
        .filter_map(|line| {
            let inner = line.trim().strip_prefix('[')?.strip_suffix(']')?;
            Some(
                inner
                    .split(',')
                    .map(|cell| cell.trim().trim_matches('"').to_string())
                    .collect(),
            )
        })
        .collect();
    (!rows.is_empty()).then_some(rows)
}

/// Maps an output grid to its box-drawing rendition, one glyph per cell.
pub fn visualize(rows: &[Vec<String>]) -> String {
    let mut text = String::new();
    for row in rows {
        let line = row
            .iter()
            .map(|cell| match cell.as_str() {
                "0" => glyph::EMPTY,
                "-" => glyph::H_SINGLE,
                "=" => glyph::H_DOUBLE,
                "|" => glyph::V_SINGLE,
                "$" => glyph::V_DOUBLE,
                other => other.chars().next().unwrap_or(glyph::EMPTY),
            })
            .join(" ");
        text.push_str(&line);
        text.push('\n');
    }
    text
}
