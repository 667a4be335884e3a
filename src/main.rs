use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use anyhow::Context;
use bridge_cruncher::{
    InterrupterContainer, SolverKind,
    config::Config,
    encoder::{self, Encoding},
    geometry::{self, Edge},
    output,
    puzzle::Puzzle,
    report::{self, InstanceReport, SolverReport},
    solution::{self, Bridges},
    solvers::{
        SolveOutcome, astar, backtracking, brute_force, oracle,
        refine::{self, RefineOutcome},
    },
};
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info, warn};
use owo_colors::OwoColorize;
use rustsat::solvers::InterruptSolver;

/// Brute force is skipped for grids with a side longer than this, unless it
/// was selected explicitly.
const BRUTE_FORCE_MAX_SIDE: usize = 7;

#[derive(Parser)]
#[command(about = "Hashiwokakero solver: CNF encoding with interchangeable search back-ends")]
struct Cli {
    /// With no subcommand, an interactive menu is shown.
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Solve every input file with one solver, or with all of them.
    Run {
        #[arg(value_enum)]
        solver: SolverArg,
    },
    /// Solve a single input file.
    Solve {
        path: PathBuf,
        #[arg(value_enum)]
        solver: SolverArg,
    },
    /// Preflight-check every input file without solving.
    Validate,
    /// Render every output grid as a text drawing.
    Visualize,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum SolverArg {
    Pysat,
    Astar,
    Backtracking,
    Bruteforce,
    All,
}

impl SolverArg {
    fn selection(self) -> Selection {
        match self {
            SolverArg::Pysat => Selection::One(SolverKind::Cdcl),
            SolverArg::Astar => Selection::One(SolverKind::AStar),
            SolverArg::Backtracking => Selection::One(SolverKind::Backtracking),
            SolverArg::Bruteforce => Selection::One(SolverKind::BruteForce),
            SolverArg::All => Selection::All,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Selection {
    All,
    One(SolverKind),
}

impl Selection {
    fn includes(self, kind: SolverKind) -> bool {
        match self {
            Selection::All => true,
            Selection::One(selected) => selected == kind,
        }
    }

    /// Whether this exact solver was asked for by name.
    fn explicit(self, kind: SolverKind) -> bool {
        self == Selection::One(kind)
    }

    fn summary_name(self) -> &'static str {
        match self {
            Selection::All => "all",
            Selection::One(kind) => kind.summary_key(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::load()?;
    let interrupter: InterrupterContainer = Arc::new(Mutex::new(None));
    install_ctrlc_handler(&interrupter);

    match Cli::parse().cmd {
        Some(Command::Run { solver }) => {
            solve_all_files(&config, solver.selection(), &interrupter)?;
        }
        Some(Command::Solve { path, solver }) => {
            fs::create_dir_all(&config.output_dir).context("failed to create output dir")?;
            process_input_file(&path, &config, solver.selection(), &interrupter, true);
        }
        Some(Command::Validate) => validate_all(&config)?,
        Some(Command::Visualize) => visualize_all(&config)?,
        None => menu_loop(&config, &interrupter)?,
    }

    Ok(())
}

fn install_ctrlc_handler(interrupter: &InterrupterContainer) {
    if let Err(err) = ctrlc::set_handler({
        let interrupter = interrupter.clone();
        let mut is_repeat = false;
        move || {
            if is_repeat {
                warn!("Aborting immediately");
                std::process::exit(-1);
            }

            is_repeat = true;
            warn!("Stopping the active solve...");
            if let Some(int) = &*interrupter.lock().expect("mutex was poisoned") {
                int.interrupt();
            }
        }
    }) {
        warn!("Failed to set interrupt handler! {err}");
    }
}

fn menu_loop(config: &Config, interrupter: &InterrupterContainer) -> anyhow::Result<()> {
    loop {
        println!();
        println!("HASHIWOKAKERO SOLVER - MENU");
        println!("1. {}", SolverKind::Cdcl);
        println!("2. {}", SolverKind::AStar);
        println!("3. {}", SolverKind::Backtracking);
        println!("4. {}", SolverKind::BruteForce);
        println!("5. Compare all (run everything)");
        println!("6. Solve single file");
        println!("7. Validate inputs");
        println!("8. Visualize outputs");
        println!("0. Exit");

        let Some(choice) = prompt("\nSelect option: ")? else {
            break;
        };
        match choice.as_str() {
            "0" => break,
            "1" | "2" | "3" | "4" | "5" => {
                let selection = match choice.as_str() {
                    "1" => Selection::One(SolverKind::Cdcl),
                    "2" => Selection::One(SolverKind::AStar),
                    "3" => Selection::One(SolverKind::Backtracking),
                    "4" => Selection::One(SolverKind::BruteForce),
                    _ => Selection::All,
                };
                solve_all_files(config, selection, interrupter)?;
                pause()?;
            }
            "6" => {
                solve_single_interactive(config, interrupter)?;
                pause()?;
            }
            "7" => {
                validate_all(config)?;
                pause()?;
            }
            "8" => {
                visualize_all(config)?;
                pause()?;
            }
            _ => println!("Unknown option"),
        }
    }
    Ok(())
}

fn prompt(text: &str) -> anyhow::Result<Option<String>> {
    print!("{text}");
    io::stdout().flush().context("could not write to stdout")?;

    let mut buffer = String::new();
    if io::stdin().read_line(&mut buffer).context("could not read stdin")? == 0 {
        return Ok(None);
    }
    Ok(Some(buffer.trim().to_string()))
}

fn pause() -> anyhow::Result<()> {
    prompt("\nPress Enter to continue...")?;
    Ok(())
}

fn solve_single_interactive(
    config: &Config,
    interrupter: &InterrupterContainer,
) -> anyhow::Result<()> {
    let files = collect_input_files(&config.input_dir)?;
    if files.is_empty() {
        println!("No input files found in '{}'", config.input_dir.display());
        return Ok(());
    }

    println!("\nFiles:");
    for (i, file) in files.iter().enumerate() {
        println!("{}. {}", i + 1, file_name(file));
    }
    let Some(line) = prompt("Select file: ")? else {
        return Ok(());
    };
    let Some(path) = line.parse::<usize>().ok().and_then(|i| i.checked_sub(1)).and_then(|i| files.get(i))
    else {
        println!("Invalid selection");
        return Ok(());
    };

    println!("1. CDCL 2. A* 3. Backtracking 4. Brute force 5. All");
    let selection = match prompt("Solver: ")?.as_deref() {
        Some("2") => Selection::One(SolverKind::AStar),
        Some("3") => Selection::One(SolverKind::Backtracking),
        Some("4") => Selection::One(SolverKind::BruteForce),
        Some("5") => Selection::All,
        _ => Selection::One(SolverKind::Cdcl),
    };

    fs::create_dir_all(&config.output_dir).context("failed to create output dir")?;
    process_input_file(path, config, selection, interrupter, true);
    Ok(())
}

fn solve_all_files(
    config: &Config,
    selection: Selection,
    interrupter: &InterrupterContainer,
) -> anyhow::Result<Vec<InstanceReport>> {
    fs::create_dir_all(&config.input_dir).context("failed to create input dir")?;
    fs::create_dir_all(&config.output_dir).context("failed to create output dir")?;

    let files = collect_input_files(&config.input_dir)?;
    if files.is_empty() {
        println!("No input files found in '{}'", config.input_dir.display());
        return Ok(Vec::new());
    }
    info!("found {} input file(s) in '{}'", files.len(), config.input_dir.display());

    let mut reports = Vec::new();
    for path in &files {
        reports.push(process_input_file(path, config, selection, interrupter, false));
    }

    let summary_path =
        config.output_dir.join(format!("summary_{}.json", selection.summary_name()));
    report::write_summary(&summary_path, &reports)?;
    info!("summary written to {}", summary_path.display());
    report::print_comparison(&reports);

    Ok(reports)
}

/// Runs the selected solver(s) on one file. Every failure mode is recorded
/// in the returned report; nothing here aborts the batch.
fn process_input_file(
    path: &Path,
    config: &Config,
    selection: Selection,
    interrupter: &InterrupterContainer,
    verbose: bool,
) -> InstanceReport {
    let input_file = path.display().to_string();
    println!("\n# Processing: {}", file_name(path));

    let puzzle = match Puzzle::from_file(path) {
        Ok(puzzle) => puzzle,
        Err(err) => {
            error!("{input_file}: {err}");
            return InstanceReport::invalid(input_file, err.to_string());
        }
    };

    let islands = puzzle.islands();
    let edges = geometry::candidate_edges(islands);
    info!(
        "grid {}, {} island(s), {} candidate edge(s)",
        puzzle.dims(),
        islands.len(),
        edges.len()
    );

    if let Err(err) = encoder::preflight(islands, &edges) {
        error!("{input_file}: {err}");
        return InstanceReport::invalid(input_file, err.to_string());
    }

    let encoding = encoder::encode(islands, &edges);
    let mut solvers = BTreeMap::new();

    for kind in enum_iterator::all::<SolverKind>() {
        if !selection.includes(kind) {
            continue;
        }

        let dims = puzzle.dims();
        if kind == SolverKind::BruteForce
            && !selection.explicit(kind)
            && dims.rows.max(dims.cols) > BRUTE_FORCE_MAX_SIDE
        {
            println!("\n== {kind} ==\nSkipped - grid {dims} too large (>7x7)");
            solvers.insert(
                kind.summary_key(),
                SolverReport {
                    success: false,
                    time: 0.0,
                    note: Some("Skipped (Too Large)".into()),
                },
            );
            continue;
        }

        let budget = config.timeouts.budget(kind);
        println!("\n== {kind} (timeout {}s) ==", budget.as_secs());

        let started = Instant::now();
        let run = panic::catch_unwind(AssertUnwindSafe(|| {
            run_solver(kind, &puzzle, &edges, &encoding, budget, interrupter)
        }));
        let elapsed = started.elapsed().as_secs_f64();

        let bridges = match run {
            Err(_) => {
                error!(target: "solver", "{kind} panicked; treating as a failed run");
                None
            }
            Ok(Run::Failed(reason)) => {
                println!("{reason}");
                None
            }
            Ok(Run::Solved(bridges)) => Some(bridges),
        };

        let mut success = false;
        if let Some(bridges) = bridges {
            match solution::validate(islands, &bridges) {
                Ok(()) => {
                    success = true;
                    println!("Solved in {elapsed:.4}s");
                    let grid = output::build_output_grid(dims, islands, &bridges);
                    let out_path = config
                        .output_dir
                        .join(format!("{}_{}", kind.output_prefix(), file_name(path)));
                    match output::write_grid(&out_path, &grid) {
                        Ok(()) => info!("output written to {}", out_path.display()),
                        Err(err) => error!("failed to write {}: {err}", out_path.display()),
                    }
                    if verbose {
                        for line in output::render_rows(&grid) {
                            println!("{line}");
                        }
                    }
                }
                Err(err) => {
                    // A decoded model failing validation is a solver bug;
                    // report the run as failed rather than ship bad output.
                    error!(target: "validation", "{kind} produced an invalid solution: {err}");
                }
            }
        }

        solvers.insert(kind.summary_key(), SolverReport { success, time: elapsed, note: None });
    }

    InstanceReport::Solved {
        input_file,
        grid_size: puzzle.dims().to_string(),
        islands: islands.len(),
        solvers,
    }
}

enum Run {
    Solved(Bridges),
    Failed(String),
}

fn run_solver(
    kind: SolverKind,
    puzzle: &Puzzle,
    edges: &[Edge],
    encoding: &Encoding,
    budget: Duration,
    interrupter: &InterrupterContainer,
) -> Run {
    let deadline = Instant::now() + budget;
    let islands = puzzle.islands();

    if kind == SolverKind::BruteForce {
        return match brute_force::solve(islands, edges, deadline) {
            Some(bridges) => Run::Solved(bridges),
            None => Run::Failed("No solution found (timeout or exhausted)".into()),
        };
    }

    let n_vars = encoding.n_vars();
    let outcome = refine::solve_connected(encoding, islands, edges, deadline, |cnf, deadline| {
        match kind {
            SolverKind::Cdcl => match oracle::solve(cnf.clone(), n_vars, deadline, interrupter) {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(target: "solver", "oracle failed: {err:#}");
                    SolveOutcome::Timeout
                }
            },
            SolverKind::AStar => astar::solve(cnf, n_vars, deadline),
            SolverKind::Backtracking => backtracking::solve(cnf, n_vars, deadline),
            SolverKind::BruteForce => unreachable!("brute force bypasses the CNF loop"),
        }
    });

    match outcome {
        RefineOutcome::Connected { bridges, attempts } => {
            info!(target: "refine", "{kind}: connected solution on attempt {attempts}");
            Run::Solved(bridges)
        }
        RefineOutcome::Unsat => Run::Failed("UNSAT - no solution exists".into()),
        RefineOutcome::NoConnectedSolution { attempts } => {
            Run::Failed(format!("No connected solution ({} model(s) blocked)", attempts - 1))
        }
        RefineOutcome::Timeout { attempts } => {
            Run::Failed(format!("Timeout after {attempts} attempt(s)"))
        }
    }
}

fn validate_all(config: &Config) -> anyhow::Result<()> {
    let files = collect_input_files(&config.input_dir)?;
    println!("\nVALIDATING {} file(s)", files.len());
    for path in &files {
        match preflight_file(path) {
            Ok(()) => println!("{:<25} {}", file_name(path), "VALID".green()),
            Err(reason) => {
                println!("{:<25} {} ({reason})", file_name(path), "INVALID".red());
            }
        }
    }
    Ok(())
}

fn preflight_file(path: &Path) -> Result<(), String> {
    let puzzle = Puzzle::from_file(path).map_err(|err| err.to_string())?;
    let edges = geometry::candidate_edges(puzzle.islands());
    encoder::preflight(puzzle.islands(), &edges).map_err(|err| err.to_string())
}

fn visualize_all(config: &Config) -> anyhow::Result<()> {
    if !config.output_dir.exists() {
        println!("No output directory '{}'", config.output_dir.display());
        return Ok(());
    }
    fs::create_dir_all(&config.visual_dir).context("failed to create visuals dir")?;

    let mut count = 0usize;
    for entry in fs::read_dir(&config.output_dir).context("failed to read output dir")? {
        let path = entry.context("failed to read output dir entry")?.path();
        if !path.extension().is_some_and(|ext| ext == "txt") {
            continue;
        }
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                error!("failed to read {}: {err}", path.display());
                continue;
            }
        };
        let Some(rows) = output::parse_rendered(&text) else {
            warn!("{}: not an output grid, skipping", path.display());
            continue;
        };

        let target = config.visual_dir.join(file_name(&path));
        fs::write(&target, output::visualize(&rows))
            .with_context(|| format!("failed to write {}", target.display()))?;
        count += 1;
    }

    println!("Rendered {count} output file(s) into '{}'", config.visual_dir.display());
    Ok(())
}

/// Collects `*.txt` files under `dir` (recursively), sorted by path.
fn collect_input_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                walk(&path, files)?;
            } else if path.extension().is_some_and(|ext| ext == "txt") {
                files.push(path);
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    if dir.exists() {
        walk(dir, &mut files)
            .with_context(|| format!("failed to scan {}", dir.display()))?;
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
