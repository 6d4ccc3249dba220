#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative run state and command interpreter for Star Pilot.
//!
//! A [`RunState`] owns everything one playthrough mutates. [`step`] advances it
//! by a single command and [`run`] repeats that until the run is over. Neither
//! can fail: every command either applies, degrades to a no-op, or is skipped
//! by its color gate. The only failures live at construction time and are
//! reported as [`InvalidLevelData`].

mod grid;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use star_pilot_core::{
    CellCoord, Color, Command, CommandKind, Event, Function, FunctionIndex, Orientation, Outcome,
    Tile,
};
use thiserror::Error;
use tracing::{debug, info, trace};

pub use grid::Grid;

/// Structural problems detected while building or restoring a run.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvalidLevelData {
    /// The level source could not be decoded at all.
    #[error("invalid level data: {reason}")]
    Malformed {
        /// Decoder message describing the failure.
        reason: String,
    },
    /// The grid has no rows or no columns.
    #[error("invalid level data: grid must be at least 1x1, got {columns}x{rows}")]
    EmptyGrid {
        /// Number of columns supplied.
        columns: usize,
        /// Number of rows supplied.
        rows: usize,
    },
    /// The tile matrix row count disagrees with the declared height.
    #[error("invalid level data: expected {expected} rows of tiles, found {actual}")]
    RowCount {
        /// Declared height.
        expected: u32,
        /// Rows present in the tile matrix.
        actual: usize,
    },
    /// A row's tile count disagrees with the declared width.
    #[error("invalid level data: row {row} holds {actual} tiles, expected {expected}")]
    ColumnCount {
        /// Zero-based index of the offending row.
        row: usize,
        /// Declared width.
        expected: u32,
        /// Tiles present in the row.
        actual: usize,
    },
    /// A tile names a color the engine does not know.
    #[error("invalid level data: unknown tile color `{token}` at {cell}")]
    UnknownColor {
        /// Cell holding the unrecognised color.
        cell: CellCoord,
        /// Color token as supplied.
        token: String,
    },
    /// The ship starts outside the grid.
    #[error("invalid level data: ship position {cell} lies outside the {columns}x{rows} grid")]
    ShipOutOfBounds {
        /// Offending ship position.
        cell: CellCoord,
        /// Grid width.
        columns: u32,
        /// Grid height.
        rows: u32,
    },
    /// More commands were counted than the budget allows.
    #[error("invalid level data: {executed} executed commands exceed the budget of {budget}")]
    BudgetExceeded {
        /// Commands counted so far.
        executed: u32,
        /// Maximum number of commands the run may execute.
        budget: u32,
    },
    /// A dimension does not fit the engine's coordinate type.
    #[error("invalid level data: grid dimensions overflow")]
    DimensionOverflow,
    /// The run is marked as won but has not ended.
    #[error("invalid level data: run is marked as won while still running")]
    WinWhileRunning,
}

/// The player's ship.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    position: CellCoord,
    orientation: Orientation,
    collected_stars: u32,
}

impl Ship {
    /// Creates a ship at `position` facing `orientation` with no stars.
    #[must_use]
    pub const fn new(position: CellCoord, orientation: Orientation) -> Self {
        Self {
            position,
            orientation,
            collected_stars: 0,
        }
    }

    /// Cell the ship occupies.
    #[must_use]
    pub const fn position(&self) -> CellCoord {
        self.position
    }

    /// Heading of the ship.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Number of stars collected during the run.
    #[must_use]
    pub const fn collected_stars(&self) -> u32 {
        self.collected_stars
    }
}

/// Progress of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunStatus {
    /// Commands may still execute.
    Running,
    /// The run ended; no further commands execute.
    Over(Outcome),
}

/// Complete mutable state of one playthrough.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    grid: Grid,
    ship: Ship,
    functions: Vec<Function>,
    pending: VecDeque<Command>,
    executed: u32,
    max_executions: u32,
    over: bool,
    win: bool,
}

impl RunState {
    /// Creates a fresh run with no functions and an empty queue.
    pub fn new(grid: Grid, ship: Ship, max_executions: u32) -> Result<Self, InvalidLevelData> {
        let state = Self {
            grid,
            ship,
            functions: Vec::new(),
            pending: VecDeque::new(),
            executed: 0,
            max_executions,
            over: false,
            win: false,
        };
        state.verify()?;
        Ok(state)
    }

    /// Installs `functions` and seeds the queue with the entry function.
    ///
    /// The first function is the entry point; later ones are only reachable
    /// through calls. Counters and the terminal flags are left untouched.
    pub fn load_program(&mut self, functions: Vec<Function>) {
        self.pending = functions
            .first()
            .map(|main| main.commands().iter().copied().collect())
            .unwrap_or_default();
        self.functions = functions;
    }

    /// Checks the invariants a deserialised state must satisfy.
    pub fn verify(&self) -> Result<(), InvalidLevelData> {
        let position = self.ship.position;
        if !self.grid.contains(position) {
            return Err(InvalidLevelData::ShipOutOfBounds {
                cell: position,
                columns: self.grid.columns(),
                rows: self.grid.rows(),
            });
        }
        if self.executed > self.max_executions {
            return Err(InvalidLevelData::BudgetExceeded {
                executed: self.executed,
                budget: self.max_executions,
            });
        }
        if self.win && !self.over {
            return Err(InvalidLevelData::WinWhileRunning);
        }
        Ok(())
    }

    /// Current progress of the run.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        match (self.over, self.win) {
            (false, _) => RunStatus::Running,
            (true, true) => RunStatus::Over(Outcome::Win),
            (true, false) => RunStatus::Over(Outcome::Loss),
        }
    }

    fn can_act(&self) -> bool {
        !self.over && !self.pending.is_empty() && self.executed < self.max_executions
    }

    fn tile_under_ship(&self) -> Tile {
        self.grid
            .tile(self.ship.position)
            .copied()
            .unwrap_or_default()
    }

    fn conclude(&mut self, outcome: Outcome, out_events: &mut Vec<Event>) {
        self.over = true;
        self.win = outcome == Outcome::Win;
        info!(
            %outcome,
            executed = self.executed,
            stars = self.ship.collected_stars,
            "run ended"
        );
        out_events.push(Event::RunEnded { outcome });
    }

    fn conclude_if_exhausted(&mut self, out_events: &mut Vec<Event>) {
        if self.over {
            return;
        }
        if self.pending.is_empty() || self.executed >= self.max_executions {
            let outcome = if self.grid.stars_remaining() == 0 {
                Outcome::Win
            } else {
                Outcome::Loss
            };
            self.conclude(outcome, out_events);
        }
    }

    fn apply_effect(&mut self, command: Command, out_events: &mut Vec<Event>) {
        match command.kind() {
            CommandKind::MoveForward => {
                let from = self.ship.position;
                let to = self.grid.forward(from, self.ship.orientation);
                if to == from {
                    out_events.push(Event::ShipBlocked {
                        at: from,
                        orientation: self.ship.orientation,
                    });
                } else {
                    self.ship.position = to;
                    out_events.push(Event::ShipMoved { from, to });
                }
            }
            CommandKind::TurnLeft => self.turn(self.ship.orientation.turned_left(), out_events),
            CommandKind::TurnRight => self.turn(self.ship.orientation.turned_right(), out_events),
            CommandKind::CallFunction => {
                let index = command.function().unwrap_or(FunctionIndex::MAIN);
                match self.functions.get(index.get()) {
                    Some(function) => {
                        self.pending.extend(function.commands().iter().copied());
                        debug!(
                            function = %index,
                            enqueued = function.len(),
                            pending = self.pending.len(),
                            "function expanded"
                        );
                        out_events.push(Event::FunctionExpanded {
                            function: index,
                            enqueued: function.len(),
                        });
                    }
                    None => {
                        debug!(function = %index, "call to missing function ignored");
                        out_events.push(Event::FunctionCallIgnored { function: index });
                    }
                }
            }
        }
    }

    fn turn(&mut self, to: Orientation, out_events: &mut Vec<Event>) {
        let from = self.ship.orientation;
        self.ship.orientation = to;
        out_events.push(Event::ShipTurned { from, to });
    }

    fn inspect_landing(&mut self, out_events: &mut Vec<Event>) {
        let cell = self.ship.position;
        if self.tile_under_ship().is_blocking() {
            self.conclude(Outcome::Loss, out_events);
            return;
        }

        if self.grid.take_star(cell) {
            self.ship.collected_stars = self.ship.collected_stars.saturating_add(1);
            debug!(%cell, total = self.ship.collected_stars, "star collected");
            out_events.push(Event::StarCollected {
                cell,
                total: self.ship.collected_stars,
            });

            // Star-less grids only finish once the queue or budget runs out.
            if self.grid.stars_remaining() == 0 {
                self.conclude(Outcome::Win, out_events);
            }
        }
    }
}

/// Executes at most one pending command, mutating the run deterministically.
///
/// A finished run is left untouched. When no command can execute, the run is
/// concluded instead.
pub fn step(state: &mut RunState, out_events: &mut Vec<Event>) {
    if state.over {
        return;
    }
    if !state.can_act() {
        state.conclude_if_exhausted(out_events);
        return;
    }
    let Some(command) = state.pending.pop_front() else {
        state.conclude_if_exhausted(out_events);
        return;
    };

    state.executed = state.executed.saturating_add(1);
    let tile = state.tile_under_ship().color();
    trace!(%command, executed = state.executed, %tile, "command dequeued");

    if command.admits(tile) {
        out_events.push(Event::CommandExecuted { command });
        state.apply_effect(command, out_events);
        state.inspect_landing(out_events);
    } else {
        out_events.push(Event::CommandSkipped { command, tile });
    }

    state.conclude_if_exhausted(out_events);
}

/// Steps the run until it is over.
///
/// Terminates within the run's execution budget: every pass either consumes
/// budget or concludes the run.
pub fn run(state: &mut RunState, out_events: &mut Vec<Event>) {
    while !state.over {
        step(state, out_events);
    }
}

/// Query functions that provide read-only access to the run state.
pub mod query {
    use super::{Grid, RunState, RunStatus, Ship};
    use star_pilot_core::{Color, Command, Function};

    /// Provides read-only access to the grid, including remaining stars.
    #[must_use]
    pub fn grid(state: &RunState) -> &Grid {
        &state.grid
    }

    /// Provides read-only access to the ship.
    #[must_use]
    pub fn ship(state: &RunState) -> &Ship {
        &state.ship
    }

    /// Color of the tile currently under the ship.
    #[must_use]
    pub fn tile_color_under_ship(state: &RunState) -> Color {
        state.tile_under_ship().color()
    }

    /// Functions installed for the run, entry function first.
    #[must_use]
    pub fn functions(state: &RunState) -> &[Function] {
        &state.functions
    }

    /// Iterator over the pending commands from head to tail.
    pub fn pending(state: &RunState) -> impl Iterator<Item = &Command> {
        state.pending.iter()
    }

    /// Copies the pending queue for display.
    #[must_use]
    pub fn pending_commands(state: &RunState) -> Vec<Command> {
        state.pending.iter().copied().collect()
    }

    /// Number of commands executed or skipped so far.
    #[must_use]
    pub fn executed(state: &RunState) -> u32 {
        state.executed
    }

    /// Maximum number of commands the run may execute.
    #[must_use]
    pub fn budget(state: &RunState) -> u32 {
        state.max_executions
    }

    /// Current progress of the run.
    #[must_use]
    pub fn status(state: &RunState) -> RunStatus {
        state.status()
    }

    /// Reports whether the run has ended.
    #[must_use]
    pub fn is_over(state: &RunState) -> bool {
        state.over
    }

    /// Reports whether the run ended with every star collected.
    ///
    /// Only meaningful once [`is_over`] returns `true`.
    #[must_use]
    pub fn is_win(state: &RunState) -> bool {
        state.win
    }
}
