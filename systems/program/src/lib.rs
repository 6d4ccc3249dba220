#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns player-authored command lists into functions.
//!
//! Translation never fails. Unknown command types degrade to a forward move
//! and unknown or `"None"` colors degrade to an ungated command, so whatever
//! the player submits can always be executed.

use serde::{Deserialize, Serialize};
use star_pilot_core::{Color, Command, CommandKind, Function, FunctionIndex};

/// Color token that explicitly requests no gate.
pub const NO_GATE: &str = "None";

/// A command as submitted by the player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCommand {
    /// Command type name, for example `"TurnLeft"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Gate color name, or `"None"` for an ungated command.
    #[serde(default = "no_gate")]
    pub color: String,
    /// Function called by a `CallFunction` command; the entry function when absent.
    #[serde(default)]
    pub function: Option<usize>,
}

impl UserCommand {
    /// Creates an ungated user command.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            color: no_gate(),
            function: None,
        }
    }

    /// Returns a copy gated on the named color.
    #[must_use]
    pub fn gated(self, color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            ..self
        }
    }

    /// Returns a copy that calls the function at `index`.
    #[must_use]
    pub fn calling(self, index: usize) -> Self {
        Self {
            function: Some(index),
            ..self
        }
    }
}

/// Everything the player has authored: the entry function plus helpers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSource {
    /// Commands of the entry function, in order.
    #[serde(default)]
    pub main: Vec<UserCommand>,
    /// Helper functions reachable through calls, starting at index 1.
    #[serde(default)]
    pub helpers: Vec<Vec<UserCommand>>,
}

impl ProgramSource {
    /// Creates a program consisting of only an entry function.
    #[must_use]
    pub fn with_main(main: Vec<UserCommand>) -> Self {
        Self {
            main,
            helpers: Vec::new(),
        }
    }

    /// Appends a command to the entry function unless `limit` is reached.
    ///
    /// Returns whether the command was added.
    pub fn push(&mut self, command: UserCommand, limit: Option<usize>) -> bool {
        if limit.is_some_and(|limit| self.main.len() >= limit) {
            return false;
        }
        self.main.push(command);
        true
    }

    /// Removes every authored command.
    pub fn clear(&mut self) {
        self.main.clear();
        self.helpers.clear();
    }

    /// Translates the entry function followed by every helper.
    #[must_use]
    pub fn assemble(&self) -> Vec<Function> {
        std::iter::once(&self.main)
            .chain(self.helpers.iter())
            .map(|commands| translate_function(commands))
            .collect()
    }
}

/// Translates a player-authored list into a function.
#[must_use]
pub fn translate_function(commands: &[UserCommand]) -> Function {
    commands.iter().map(translate_command).collect()
}

/// Translates a single player-authored command.
#[must_use]
pub fn translate_command(command: &UserCommand) -> Command {
    let kind = parse_kind(&command.kind);
    let mut translated = Command::new(kind);
    if let Some(gate) = parse_gate(&command.color) {
        translated = translated.gated(gate);
    }
    if let Some(index) = command.function {
        translated = translated.with_function(FunctionIndex::new(index));
    }
    translated
}

/// Resolves a command type name, defaulting to [`CommandKind::MoveForward`].
#[must_use]
pub fn parse_kind(token: &str) -> CommandKind {
    CommandKind::from_name(token).unwrap_or_default()
}

/// Resolves a gate color name; `"None"` and unknown names yield no gate.
#[must_use]
pub fn parse_gate(token: &str) -> Option<Color> {
    match Color::from_name(token) {
        Some(Color::None) | None => None,
        Some(color) => Some(color),
    }
}

fn no_gate() -> String {
    NO_GATE.to_owned()
}
