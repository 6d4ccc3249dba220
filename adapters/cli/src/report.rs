use std::fmt::Write as _;

use star_pilot_core::{Command, Event};
use star_pilot_world::{query, RunState, RunStatus};

/// Renders the run summary printed after every action.
pub(crate) fn summary(state: &RunState, pending: &[Command]) -> String {
    let ship = query::ship(state);
    let grid = query::grid(state);
    let status = match query::status(state) {
        RunStatus::Running => "running".to_owned(),
        RunStatus::Over(outcome) => outcome.to_string(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "status: {status}");
    let _ = writeln!(
        out,
        "ship: {} facing {} on {}",
        ship.position(),
        ship.orientation(),
        query::tile_color_under_ship(state)
    );
    let _ = writeln!(
        out,
        "stars: {} collected, {} remaining",
        ship.collected_stars(),
        grid.stars_remaining()
    );
    let _ = writeln!(
        out,
        "executed: {}/{}",
        query::executed(state),
        query::budget(state)
    );
    let _ = writeln!(out, "pending: {}", join(pending));
    out
}

/// Renders one line per event.
pub(crate) fn events(events: &[Event]) -> String {
    let mut out = String::new();
    for event in events {
        let line = match event {
            Event::CommandExecuted { command } => format!("exec {command}"),
            Event::CommandSkipped { command, tile } => format!("skip {command} on {tile}"),
            Event::ShipMoved { from, to } => format!("move {from} -> {to}"),
            Event::ShipBlocked { at, orientation } => format!("wall at {at} facing {orientation}"),
            Event::ShipTurned { from, to } => format!("turn {from} -> {to}"),
            Event::FunctionExpanded { function, enqueued } => {
                format!("expand {function} (+{enqueued})")
            }
            Event::FunctionCallIgnored { function } => format!("missing {function}"),
            Event::StarCollected { cell, total } => format!("star at {cell} (total {total})"),
            Event::RunEnded { outcome } => format!("end {outcome}"),
        };
        let _ = writeln!(out, "  {line}");
    }
    out
}

fn join(commands: &[Command]) -> String {
    if commands.is_empty() {
        return "-".to_owned();
    }
    commands
        .iter()
        .map(Command::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
