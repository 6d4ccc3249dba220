#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Step controller that drives runs on behalf of a player session.
//!
//! The controller holds no state of its own. Callers own a [`Session`] (the
//! player's program plus the persisted run snapshot), pass it in with every
//! [`Action`], and persist it again afterwards. Running and stepping both go
//! through the world's [`step`](star_pilot_world::step) entry point; the
//! snapshot carries the run between independent step requests.

pub mod snapshot;

use serde::{Deserialize, Serialize};
use star_pilot_core::{Command, Event};
use star_pilot_system_level_loader::{load_level, LevelData};
use star_pilot_system_program::{ProgramSource, UserCommand};
use star_pilot_world::{self as world, query, InvalidLevelData, RunState};
use thiserror::Error;
use tracing::{info, warn};

pub use snapshot::SnapshotError;

/// Requests a player can make against a level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Report the persisted run, or a fresh one when nothing is persisted.
    Show,
    /// Append a command to the entry function and discard the persisted run.
    Add(UserCommand),
    /// Start a fresh run and execute it to completion.
    Run,
    /// Execute a single command of the persisted run, starting one if needed.
    Step,
    /// Discard the persisted run.
    Reset,
    /// Discard every authored command and the persisted run.
    Clear,
}

impl Action {
    /// Short label used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Add(_) => "add",
            Self::Run => "run",
            Self::Step => "step",
            Self::Reset => "reset",
            Self::Clear => "clear",
        }
    }
}

/// Caller-owned record of one player's progress on a level.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Commands the player has authored.
    pub program: ProgramSource,
    /// Encoded run carried between step requests.
    pub snapshot: Option<String>,
}

/// Result of handling an action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionResponse {
    /// Run after the action, possibly terminal.
    pub state: RunState,
    /// Commands still waiting in the queue, head first.
    pub pending: Vec<Command>,
    /// Events produced while handling the action.
    pub events: Vec<Event>,
}

impl ActionResponse {
    fn new(state: RunState, events: Vec<Event>) -> Self {
        let pending = query::pending_commands(&state);
        Self {
            state,
            pending,
            events,
        }
    }
}

/// Failures surfaced by the controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The level could not be turned into a run.
    #[error(transparent)]
    Level(#[from] InvalidLevelData),
    /// The persisted run could not be restored or saved.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Stateless driver translating player actions into engine calls.
#[derive(Debug, Default)]
pub struct StepController;

impl StepController {
    /// Applies `action` to `session` for `level`, returning the resulting run.
    pub fn handle(
        &self,
        level: &LevelData,
        session: &mut Session,
        action: Action,
    ) -> Result<ActionResponse, ControllerError> {
        info!(action = action.name(), "handling action");
        match action {
            Action::Show => {
                let state = match session.snapshot.as_deref() {
                    Some(encoded) => snapshot::decode(encoded)?,
                    None => load_level(level)?,
                };
                Ok(ActionResponse::new(state, Vec::new()))
            }
            Action::Add(command) => {
                if !session.program.push(command, level.max_program_length) {
                    warn!(
                        limit = level.max_program_length,
                        "program is full, command ignored"
                    );
                }
                session.snapshot = None;
                Ok(ActionResponse::new(load_level(level)?, Vec::new()))
            }
            Action::Run => {
                let mut state = seeded_run(level, &session.program)?;
                let mut events = Vec::new();
                world::run(&mut state, &mut events);
                session.snapshot = Some(snapshot::encode(&state)?);
                Ok(ActionResponse::new(state, events))
            }
            Action::Step => {
                let mut state = match session.snapshot.as_deref() {
                    Some(encoded) => snapshot::decode(encoded)?,
                    None => seeded_run(level, &session.program)?,
                };
                let mut events = Vec::new();
                world::step(&mut state, &mut events);
                session.snapshot = Some(snapshot::encode(&state)?);
                Ok(ActionResponse::new(state, events))
            }
            Action::Reset => {
                session.snapshot = None;
                Ok(ActionResponse::new(load_level(level)?, Vec::new()))
            }
            Action::Clear => {
                session.program.clear();
                session.snapshot = None;
                Ok(ActionResponse::new(load_level(level)?, Vec::new()))
            }
        }
    }
}

/// Builds a fresh run for `level` with `program` installed and queued.
pub fn seeded_run(level: &LevelData, program: &ProgramSource) -> Result<RunState, InvalidLevelData> {
    let mut state = load_level(level)?;
    state.load_program(program.assemble());
    Ok(state)
}
