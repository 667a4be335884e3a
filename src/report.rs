//! Batch results: the summary JSON schema and the comparison table.

use std::{collections::BTreeMap, path::Path};

use anyhow::Context;
use owo_colors::OwoColorize;
use serde::Serialize;

/// One summary element per input file. The two shapes match the summary
/// schema: solver results for processed files, an error record for files
/// that never reached a solver.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum InstanceReport {
    Solved {
        input_file: String,
        grid_size: String,
        islands: usize,
        solvers: BTreeMap<&'static str, SolverReport>,
    },
    Invalid {
        input_file: String,
        error: String,
        valid: bool,
    },
}

impl InstanceReport {
    pub fn invalid(input_file: impl Into<String>, error: impl Into<String>) -> Self {
        InstanceReport::Invalid { input_file: input_file.into(), error: error.into(), valid: false }
    }

    pub fn input_file(&self) -> &str {
        match self {
            InstanceReport::Solved { input_file, .. }
            | InstanceReport::Invalid { input_file, .. } => input_file,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SolverReport {
    pub success: bool,
    pub time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub fn write_summary(path: &Path, reports: &[InstanceReport]) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, reports).context("failed to serialize summary")?;
    Ok(())
}

/// The performance comparison table printed after a batch run.
pub fn print_comparison(reports: &[InstanceReport]) {
    println!();
    println!("{:<25} {:<15} {:<10} Status", "File", "Solver", "Time (s)");
    println!("{}", "-".repeat(70));

    for report in reports {
        let file = basename(report.input_file());
        match report {
            InstanceReport::Invalid { error, .. } => {
                println!("{:<25} {:<15} {:<10} ({})", file, "INVALID".red(), "N/A", error);
            }
            InstanceReport::Solved { solvers, .. } => {
                for (name, result) in solvers {
                    let time = format!("{:.4}", result.time);
                    if result.note.is_some() {
                        println!("{:<25} {:<15} {:<10} {}", file, name, time, "Skip".yellow());
                    } else if result.success {
                        println!("{:<25} {:<15} {:<10} {}", file, name, time, "Success".green());
                    } else {
                        println!("{:<25} {:<15} {:<10} {}", file, name, time, "Fail/Timeout".red());
                    }
                }
            }
        }
    }
}

fn basename(path: &str) -> &str {
    Path::new(path).file_name().and_then(|name| name.to_str()).unwrap_or(path)
}
