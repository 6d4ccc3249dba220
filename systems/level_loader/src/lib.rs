#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level loader that validates external level data and builds fresh runs.
//!
//! Level sources describe the grid as a row-major matrix of color names and
//! star flags. The loader is the only consumer of that shape: it checks the
//! declared dimensions against the matrix, resolves every color name, places
//! the ship and hands back a [`RunState`] ready for a program.

use serde::{Deserialize, Serialize};
use star_pilot_core::{CellCoord, Color, Orientation, Tile};
use star_pilot_world::{Grid, InvalidLevelData, RunState, Ship};
use tracing::{debug, warn};

/// Level description as supplied by the level source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelData {
    /// Display name of the level.
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form description shown to players.
    #[serde(default)]
    pub description: Option<String>,
    /// Declared number of columns.
    pub width: u32,
    /// Declared number of rows.
    pub height: u32,
    /// Tile matrix listed row by row, north to south.
    pub tiles: Vec<Vec<TileData>>,
    /// Starting column of the ship.
    pub ship_start_x: u32,
    /// Starting row of the ship.
    pub ship_start_y: u32,
    /// Starting heading of the ship; north when absent or unrecognised.
    #[serde(default)]
    pub ship_start_orientation: Option<String>,
    /// Maximum number of commands a run may execute.
    pub max_commands: u32,
    /// Maximum number of commands a player may add to the entry function.
    #[serde(default)]
    pub max_program_length: Option<usize>,
}

impl LevelData {
    /// Parses level data from its JSON encoding.
    pub fn from_json(json: &str) -> Result<Self, InvalidLevelData> {
        serde_json::from_str(json).map_err(|error| InvalidLevelData::Malformed {
            reason: error.to_string(),
        })
    }

    /// Starting cell of the ship.
    #[must_use]
    pub const fn ship_start(&self) -> CellCoord {
        CellCoord::new(self.ship_start_x, self.ship_start_y)
    }
}

/// A single tile entry within [`LevelData::tiles`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileData {
    /// Color name, for example `"Green"` or `"WhiteColor"`.
    pub color: String,
    /// Whether a star rests on the tile.
    #[serde(default)]
    pub has_star: bool,
}

impl TileData {
    /// Creates a tile entry.
    #[must_use]
    pub fn new(color: impl Into<String>, has_star: bool) -> Self {
        Self {
            color: color.into(),
            has_star,
        }
    }
}

/// Builds a fresh run from validated level data.
///
/// The run has no functions installed and an empty queue.
pub fn load_level(level: &LevelData) -> Result<RunState, InvalidLevelData> {
    let grid = build_grid(level)?;
    let orientation = resolve_orientation(level.ship_start_orientation.as_deref());
    let ship = Ship::new(level.ship_start(), orientation);
    debug!(
        columns = grid.columns(),
        rows = grid.rows(),
        stars = grid.stars_remaining(),
        budget = level.max_commands,
        "level loaded"
    );
    RunState::new(grid, ship, level.max_commands)
}

/// Validates the tile matrix against the declared dimensions and builds the grid.
pub fn build_grid(level: &LevelData) -> Result<Grid, InvalidLevelData> {
    if level.width == 0 || level.height == 0 {
        return Err(InvalidLevelData::EmptyGrid {
            columns: usize::try_from(level.width).unwrap_or(usize::MAX),
            rows: usize::try_from(level.height).unwrap_or(usize::MAX),
        });
    }

    let height = usize::try_from(level.height).map_err(|_| InvalidLevelData::DimensionOverflow)?;
    let width = usize::try_from(level.width).map_err(|_| InvalidLevelData::DimensionOverflow)?;
    if level.tiles.len() != height {
        return Err(InvalidLevelData::RowCount {
            expected: level.height,
            actual: level.tiles.len(),
        });
    }

    let mut rows = Vec::with_capacity(height);
    for (row_index, row) in level.tiles.iter().enumerate() {
        if row.len() != width {
            return Err(InvalidLevelData::ColumnCount {
                row: row_index,
                expected: level.width,
                actual: row.len(),
            });
        }

        let mut tiles = Vec::with_capacity(width);
        for (column_index, entry) in row.iter().enumerate() {
            let color = Color::from_name(&entry.color).ok_or_else(|| {
                InvalidLevelData::UnknownColor {
                    cell: cell_at(column_index, row_index),
                    token: entry.color.clone(),
                }
            })?;
            tiles.push(Tile::new(color, entry.has_star));
        }
        rows.push(tiles);
    }

    Grid::from_rows(rows)
}

/// Resolves the ship's starting heading, falling back to north.
#[must_use]
pub fn resolve_orientation(token: Option<&str>) -> Orientation {
    match token {
        None => Orientation::North,
        Some(name) => Orientation::from_name(name).unwrap_or_else(|| {
            warn!(orientation = name, "unrecognised ship orientation, facing north");
            Orientation::North
        }),
    }
}

fn cell_at(column: usize, row: usize) -> CellCoord {
    CellCoord::new(
        u32::try_from(column).unwrap_or(u32::MAX),
        u32::try_from(row).unwrap_or(u32::MAX),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use star_pilot_world::query;

    fn green_level(width: u32, height: u32) -> LevelData {
        LevelData {
            width,
            height,
            tiles: vec![vec![TileData::new("Green", false); width as usize]; height as usize],
            max_commands: 10,
            ..LevelData::default()
        }
    }

    #[test]
    fn loads_a_valid_level() {
        let mut level = green_level(3, 2);
        level.tiles[1][2] = TileData::new("redColor", true);
        level.ship_start_x = 1;
        level.ship_start_y = 1;
        level.ship_start_orientation = Some("east".to_owned());

        let state = load_level(&level).expect("level loads");

        let ship = query::ship(&state);
        assert_eq!(ship.position(), CellCoord::new(1, 1));
        assert_eq!(ship.orientation(), Orientation::East);
        assert_eq!(query::budget(&state), 10);
        assert_eq!(query::executed(&state), 0);
        assert!(!query::is_over(&state));

        let grid = query::grid(&state);
        assert_eq!(grid.stars_remaining(), 1);
        let tile = grid.tile(CellCoord::new(2, 1)).expect("tile");
        assert_eq!(tile.color(), Color::Red);
        assert!(tile.has_star());
    }

    #[test]
    fn rejects_row_count_mismatch() {
        let mut level = green_level(2, 3);
        let _ = level.tiles.pop();

        assert_eq!(
            load_level(&level),
            Err(InvalidLevelData::RowCount {
                expected: 3,
                actual: 2,
            })
        );
    }

    #[test]
    fn rejects_column_count_mismatch_in_any_row() {
        let mut level = green_level(2, 3);
        level.tiles[2].push(TileData::new("Green", false));

        assert_eq!(
            load_level(&level),
            Err(InvalidLevelData::ColumnCount {
                row: 2,
                expected: 2,
                actual: 3,
            })
        );
    }

    #[test]
    fn rejects_unknown_colors_with_their_position() {
        let mut level = green_level(2, 2);
        level.tiles[1][0] = TileData::new("Purple", false);

        assert_eq!(
            load_level(&level),
            Err(InvalidLevelData::UnknownColor {
                cell: CellCoord::new(0, 1),
                token: "Purple".to_owned(),
            })
        );
    }

    #[test]
    fn rejects_zero_dimensions() {
        let level = green_level(0, 0);
        assert_eq!(
            load_level(&level),
            Err(InvalidLevelData::EmptyGrid {
                columns: 0,
                rows: 0
            })
        );
    }

    #[test]
    fn rejects_ship_outside_grid() {
        let mut level = green_level(2, 2);
        level.ship_start_y = 2;

        assert_eq!(
            load_level(&level),
            Err(InvalidLevelData::ShipOutOfBounds {
                cell: CellCoord::new(0, 2),
                columns: 2,
                rows: 2,
            })
        );
    }

    #[test]
    fn orientation_defaults_to_north() {
        assert_eq!(resolve_orientation(None), Orientation::North);
        assert_eq!(resolve_orientation(Some("sideways")), Orientation::North);
        assert_eq!(resolve_orientation(Some("")), Orientation::North);
        assert_eq!(resolve_orientation(Some("WEST")), Orientation::West);
    }

    #[test]
    fn parses_camel_case_json() {
        let json = r#"{
            "name": "First light",
            "width": 2,
            "height": 1,
            "tiles": [[{"color": "Red", "hasStar": false}, {"color": "GreenColor", "hasStar": true}]],
            "shipStartX": 0,
            "shipStartY": 0,
            "shipStartOrientation": "East",
            "maxCommands": 5,
            "maxProgramLength": 4
        }"#;

        let level = LevelData::from_json(json).expect("json parses");
        assert_eq!(level.name.as_deref(), Some("First light"));
        assert_eq!(level.max_program_length, Some(4));
        assert_eq!(level.tiles[0][1], TileData::new("GreenColor", true));
        assert!(load_level(&level).is_ok());
    }

    #[test]
    fn malformed_json_is_invalid_level_data() {
        let error = LevelData::from_json("{\"width\": 2").expect_err("truncated json");
        assert!(matches!(error, InvalidLevelData::Malformed { .. }));
        assert!(error.to_string().starts_with("invalid level data"));

        let missing_tiles = r#"{"width": 1, "height": 1, "tiles": [[null]], "shipStartX": 0, "shipStartY": 0, "maxCommands": 1}"#;
        assert!(matches!(
            LevelData::from_json(missing_tiles),
            Err(InvalidLevelData::Malformed { .. })
        ));
    }
}
