#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Star Pilot levels from files.
//!
//! Each invocation handles a single action. The persisted run lives in a
//! snapshot file between invocations, which lets `step` advance one command
//! per call the same way an interactive front end would.

mod config;
mod report;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use star_pilot_system_level_loader::{load_level, LevelData};
use star_pilot_system_program::{ProgramSource, UserCommand, NO_GATE};
use star_pilot_system_step_controller::{Action, Session, StepController};
use star_pilot_world::query;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::CliConfig;

/// Command-line interface for the Star Pilot engine.
#[derive(Debug, Parser)]
#[command(name = "star-pilot", author, version, about)]
struct Cli {
    /// Configuration file; `star-pilot.toml` is used when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Check that a level file describes a playable level.
    Validate {
        /// Level JSON file.
        level: PathBuf,
    },
    /// Print the persisted run, or the fresh level when none is persisted.
    Show(SessionArgs),
    /// Execute the program to completion.
    Run(ProgramArgs),
    /// Execute one command, resuming the persisted run when present.
    Step(ProgramArgs),
    /// Discard the persisted run.
    Reset(SessionArgs),
    /// Append a command to the program's entry function.
    Add(AddArgs),
    /// Empty the program and discard the persisted run.
    Clear(ProgramArgs),
}

#[derive(Debug, Args)]
struct SessionArgs {
    /// Level JSON file.
    level: PathBuf,
    /// Snapshot file overriding the configured one.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ProgramArgs {
    #[command(flatten)]
    session: SessionArgs,
    /// Program JSON file with `main` and optional `helpers`.
    program: PathBuf,
    /// Print every event produced by the action.
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct AddArgs {
    #[command(flatten)]
    session: SessionArgs,
    /// Program JSON file, created when missing.
    program: PathBuf,
    /// Command type: MoveForward, TurnLeft, TurnRight or CallFunction.
    kind: String,
    /// Tile color the command is gated on.
    #[arg(long, default_value = NO_GATE)]
    color: String,
    /// Function targeted by CallFunction.
    #[arg(long)]
    function: Option<usize>,
}

/// Entry point for the Star Pilot command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;
    init_logging(&config.log_filter);

    match cli.command {
        CliCommand::Validate { level } => validate(&level),
        CliCommand::Show(args) => play(&config, &args, None, Action::Show, false),
        CliCommand::Run(args) => play(
            &config,
            &args.session,
            Some(args.program.as_path()),
            Action::Run,
            args.verbose,
        ),
        CliCommand::Step(args) => play(
            &config,
            &args.session,
            Some(args.program.as_path()),
            Action::Step,
            args.verbose,
        ),
        CliCommand::Reset(args) => play(&config, &args, None, Action::Reset, false),
        CliCommand::Add(args) => {
            let mut command = UserCommand::new(args.kind).gated(args.color);
            if let Some(index) = args.function {
                command = command.calling(index);
            }
            play(
                &config,
                &args.session,
                Some(args.program.as_path()),
                Action::Add(command),
                false,
            )
        }
        CliCommand::Clear(args) => play(
            &config,
            &args.session,
            Some(args.program.as_path()),
            Action::Clear,
            args.verbose,
        ),
    }
}

fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn validate(path: &Path) -> Result<()> {
    let level = read_level(path)?;
    let state = load_level(&level).with_context(|| format!("Validating {}", path.display()))?;
    let grid = query::grid(&state);
    println!(
        "{}: {}x{} grid, {} stars, budget {}",
        level.name.as_deref().unwrap_or("level"),
        grid.columns(),
        grid.rows(),
        grid.stars_remaining(),
        query::budget(&state)
    );
    Ok(())
}

fn play(
    config: &CliConfig,
    args: &SessionArgs,
    program: Option<&Path>,
    action: Action,
    verbose: bool,
) -> Result<()> {
    let level = read_level(&args.level)?;
    let snapshot_path = args
        .snapshot
        .clone()
        .unwrap_or_else(|| config.snapshot_path.clone());

    let edits_program = matches!(action, Action::Add(_) | Action::Clear);
    let mut session = Session {
        program: match program {
            Some(path) if edits_program && !path.exists() => ProgramSource::default(),
            Some(path) => read_program(path)?,
            None => ProgramSource::default(),
        },
        snapshot: read_snapshot(&snapshot_path)?,
    };

    let response = StepController::default()
        .handle(&level, &mut session, action)
        .with_context(|| format!("Playing {}", args.level.display()))?;

    write_snapshot(&snapshot_path, session.snapshot.as_deref())?;
    if let Some(path) = program.filter(|_| edits_program) {
        write_program(path, &session.program)?;
    }

    if verbose {
        print!("{}", report::events(&response.events));
    }
    print!("{}", report::summary(&response.state, &response.pending));
    Ok(())
}

fn read_level(path: &Path) -> Result<LevelData> {
    let json =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    LevelData::from_json(&json).with_context(|| format!("Parsing {}", path.display()))
}

fn read_program(path: &Path) -> Result<ProgramSource> {
    let json =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Parsing {}", path.display()))
}

fn write_program(path: &Path, program: &ProgramSource) -> Result<()> {
    let json = serde_json::to_string_pretty(program).context("Serialising program")?;
    fs::write(path, format!("{json}\n"))
        .with_context(|| format!("Writing {}", path.display()))?;
    info!(
        path = %path.display(),
        commands = program.main.len(),
        "program saved"
    );
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    let trimmed = contents.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_owned()))
}

fn write_snapshot(path: &Path, snapshot: Option<&str>) -> Result<()> {
    match snapshot {
        Some(encoded) => {
            fs::write(path, format!("{encoded}\n"))
                .with_context(|| format!("Writing {}", path.display()))?;
            info!(path = %path.display(), "snapshot saved");
        }
        None if path.exists() => {
            fs::remove_file(path).with_context(|| format!("Removing {}", path.display()))?;
            info!(path = %path.display(), "snapshot removed");
        }
        None => {}
    }
    Ok(())
}
