#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Star Pilot engine.
//!
//! This crate defines the vocabulary that connects the level loader, the
//! authoritative run state, and the step controller. Players author
//! [`Command`] values grouped into [`Function`] sequences, the world executes
//! those commands one at a time against a grid of [`Tile`] values, and then
//! reports what happened as [`Event`] values. Events carry no authority; they
//! exist so adapters can narrate a run without re-deriving it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tile colors recognised by the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// Uncolored tile. Gates may still require it explicitly.
    #[default]
    None,
    /// Red tile.
    Red,
    /// Blue tile.
    Blue,
    /// Green tile.
    Green,
    /// Forbidden tile; entering it ends the run in a loss.
    White,
}

impl Color {
    /// Every color in declaration order.
    pub const ALL: [Color; 5] = [
        Color::None,
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::White,
    ];

    /// Reports whether standing on this color loses the run.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::White)
    }

    /// Canonical name used by level files and user command lists.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Red => "Red",
            Self::Blue => "Blue",
            Self::Green => "Green",
            Self::White => "White",
        }
    }

    /// Resolves a color name leniently.
    ///
    /// Matching ignores ASCII case and surrounding whitespace, and a trailing
    /// `Color` suffix is stripped first so verbose encodings such as
    /// `"RedColor"` resolve to [`Color::Red`]. Returns `None` when the token
    /// names no known color; callers decide whether that is an error.
    #[must_use]
    pub fn from_name(token: &str) -> Option<Self> {
        let trimmed = token.trim();
        let stem = strip_suffix_ignore_case(trimmed, "color").unwrap_or(trimmed);
        Self::ALL
            .into_iter()
            .find(|color| color.name().eq_ignore_ascii_case(stem))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single grid cell: a fixed color plus an optional star.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    color: Color,
    has_star: bool,
}

impl Tile {
    /// Creates a tile with the provided color and star flag.
    #[must_use]
    pub const fn new(color: Color, has_star: bool) -> Self {
        Self { color, has_star }
    }

    /// Creates a star-less tile of the provided color.
    #[must_use]
    pub const fn plain(color: Color) -> Self {
        Self::new(color, false)
    }

    /// Color painted on the tile.
    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Reports whether an uncollected star rests on the tile.
    #[must_use]
    pub const fn has_star(&self) -> bool {
        self.has_star
    }

    /// Reports whether entering the tile loses the run.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        self.color.is_blocking()
    }

    /// Removes the star, returning whether one was present.
    pub fn take_star(&mut self) -> bool {
        std::mem::replace(&mut self.has_star, false)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Columns grow eastward from zero and rows grow southward from zero, so the
/// column doubles as `x` and the row as `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Heading of the ship.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Facing toward decreasing row indices.
    #[default]
    North,
    /// Facing toward increasing column indices.
    East,
    /// Facing toward increasing row indices.
    South,
    /// Facing toward decreasing column indices.
    West,
}

impl Orientation {
    /// Every orientation in clockwise order starting at north.
    pub const ALL: [Orientation; 4] = [
        Orientation::North,
        Orientation::East,
        Orientation::South,
        Orientation::West,
    ];

    /// Orientation reached after a quarter turn counter-clockwise.
    #[must_use]
    pub const fn turned_left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    /// Orientation reached after a quarter turn clockwise.
    #[must_use]
    pub const fn turned_right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Column and row deltas of a single forward step.
    #[must_use]
    pub const fn delta(self) -> (i64, i64) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Canonical name used by level files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::North => "North",
            Self::East => "East",
            Self::South => "South",
            Self::West => "West",
        }
    }

    /// Resolves an orientation name, ignoring ASCII case and whitespace.
    #[must_use]
    pub fn from_name(token: &str) -> Option<Self> {
        let trimmed = token.trim();
        Self::ALL
            .into_iter()
            .find(|orientation| orientation.name().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Actions a command can perform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// Advance one cell along the current orientation.
    #[default]
    MoveForward,
    /// Rotate a quarter turn counter-clockwise.
    TurnLeft,
    /// Rotate a quarter turn clockwise.
    TurnRight,
    /// Append a function's commands to the back of the pending queue.
    CallFunction,
}

impl CommandKind {
    /// Every command kind in declaration order.
    pub const ALL: [CommandKind; 4] = [
        CommandKind::MoveForward,
        CommandKind::TurnLeft,
        CommandKind::TurnRight,
        CommandKind::CallFunction,
    ];

    /// Canonical name used by user command lists.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MoveForward => "MoveForward",
            Self::TurnLeft => "TurnLeft",
            Self::TurnRight => "TurnRight",
            Self::CallFunction => "CallFunction",
        }
    }

    /// Resolves a command kind name, ignoring ASCII case and whitespace.
    #[must_use]
    pub fn from_name(token: &str) -> Option<Self> {
        let trimmed = token.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Position of a function within a program.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionIndex(usize);

impl FunctionIndex {
    /// Index of the entry function, also the target of unqualified calls.
    pub const MAIN: FunctionIndex = FunctionIndex(0);

    /// Creates a new function index.
    #[must_use]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Retrieves the numeric index.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for FunctionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// A single player-authored instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Command {
    kind: CommandKind,
    gate: Option<Color>,
    function: Option<FunctionIndex>,
}

impl Command {
    /// Creates an ungated command of the provided kind.
    #[must_use]
    pub const fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            gate: None,
            function: None,
        }
    }

    /// Ungated forward move.
    #[must_use]
    pub const fn move_forward() -> Self {
        Self::new(CommandKind::MoveForward)
    }

    /// Ungated left turn.
    #[must_use]
    pub const fn turn_left() -> Self {
        Self::new(CommandKind::TurnLeft)
    }

    /// Ungated right turn.
    #[must_use]
    pub const fn turn_right() -> Self {
        Self::new(CommandKind::TurnRight)
    }

    /// Ungated call of the function at `index`.
    #[must_use]
    pub const fn call(index: FunctionIndex) -> Self {
        Self {
            kind: CommandKind::CallFunction,
            gate: None,
            function: Some(index),
        }
    }

    /// Returns a copy of the command that only fires on `color` tiles.
    #[must_use]
    pub const fn gated(self, color: Color) -> Self {
        Self {
            gate: Some(color),
            ..self
        }
    }

    /// Returns a copy of the command referring to the function at `index`.
    ///
    /// Only [`CommandKind::CallFunction`] consults the reference.
    #[must_use]
    pub const fn with_function(self, index: FunctionIndex) -> Self {
        Self {
            function: Some(index),
            ..self
        }
    }

    /// Action performed by the command.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Tile color required for the command to take effect, if any.
    #[must_use]
    pub const fn gate(&self) -> Option<Color> {
        self.gate
    }

    /// Function referenced by a call, if one was named.
    #[must_use]
    pub const fn function(&self) -> Option<FunctionIndex> {
        self.function
    }

    /// Reports whether the command fires while standing on `color`.
    #[must_use]
    pub fn admits(&self, color: Color) -> bool {
        self.gate.map_or(true, |gate| gate == color)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CommandKind::CallFunction => {
                write!(f, "call {}", self.function.unwrap_or(FunctionIndex::MAIN))?;
            }
            kind => write!(f, "{kind}")?,
        }
        if let Some(gate) = self.gate {
            write!(f, " [{gate}]")?;
        }
        Ok(())
    }
}

/// Ordered, reusable sequence of commands.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Function {
    commands: Vec<Command>,
}

impl Function {
    /// Creates a function from the provided commands.
    #[must_use]
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// Commands in execution order.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of commands in the function.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Reports whether the function contains no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl FromIterator<Command> for Function {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Terminal result of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Every star on the grid was collected.
    Win,
    /// The ship hit a blocking tile, or the run ended with stars remaining.
    Loss,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Win => f.write_str("win"),
            Self::Loss => f.write_str("loss"),
        }
    }
}

/// Events reported by the world while executing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A command was dequeued and counted against the budget.
    CommandExecuted {
        /// Command that was dequeued.
        command: Command,
    },
    /// A gated command was skipped because the tile color did not match.
    CommandSkipped {
        /// Command whose gate rejected the tile.
        command: Command,
        /// Color of the tile the ship was standing on.
        tile: Color,
    },
    /// The ship advanced between two cells.
    ShipMoved {
        /// Cell occupied before the move.
        from: CellCoord,
        /// Cell occupied after the move.
        to: CellCoord,
    },
    /// A forward move was absorbed by the grid edge.
    ShipBlocked {
        /// Cell the ship remains on.
        at: CellCoord,
        /// Heading that pointed off the grid.
        orientation: Orientation,
    },
    /// The ship rotated in place.
    ShipTurned {
        /// Heading before the turn.
        from: Orientation,
        /// Heading after the turn.
        to: Orientation,
    },
    /// A call appended a function's commands to the pending queue.
    FunctionExpanded {
        /// Function that was expanded.
        function: FunctionIndex,
        /// Number of commands appended.
        enqueued: usize,
    },
    /// A call referenced a function that does not exist.
    FunctionCallIgnored {
        /// Index named by the call.
        function: FunctionIndex,
    },
    /// The ship picked up a star.
    StarCollected {
        /// Cell the star was collected from.
        cell: CellCoord,
        /// Stars collected so far, including this one.
        total: u32,
    },
    /// The run reached a terminal state.
    RunEnded {
        /// Result of the run.
        outcome: Outcome,
    },
}

fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    let split = value.len().checked_sub(suffix.len())?;
    if !value.is_char_boundary(split) {
        return None;
    }
    let (stem, tail) = value.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(stem)
}
