//! Rectangular tile storage addressed by [`CellCoord`].

use serde::{Deserialize, Serialize};
use star_pilot_core::{CellCoord, Orientation, Tile};

use crate::InvalidLevelData;

/// Row-major grid of tiles. Only star flags change after construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridRows", into = "GridRows")]
pub struct Grid {
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Builds a grid from rows listed north to south, each listing tiles west to east.
    ///
    /// Fails when there are no rows, the first row is empty, or a later row's
    /// length differs from the first.
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Result<Self, InvalidLevelData> {
        let row_count = rows.len();
        let column_count = rows.first().map_or(0, Vec::len);
        if row_count == 0 || column_count == 0 {
            return Err(InvalidLevelData::EmptyGrid {
                columns: column_count,
                rows: row_count,
            });
        }

        let columns =
            u32::try_from(column_count).map_err(|_| InvalidLevelData::DimensionOverflow)?;
        let row_total = u32::try_from(row_count).map_err(|_| InvalidLevelData::DimensionOverflow)?;

        let mut tiles = Vec::with_capacity(row_count * column_count);
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != column_count {
                return Err(InvalidLevelData::ColumnCount {
                    row: index,
                    expected: columns,
                    actual: row.len(),
                });
            }
            tiles.extend(row);
        }

        Ok(Self {
            columns,
            rows: row_total,
            tiles,
        })
    }

    /// Builds a grid where every cell holds a copy of `tile`.
    pub fn filled(columns: u32, rows: u32, tile: Tile) -> Result<Self, InvalidLevelData> {
        let width = usize::try_from(columns).map_err(|_| InvalidLevelData::DimensionOverflow)?;
        let height = usize::try_from(rows).map_err(|_| InvalidLevelData::DimensionOverflow)?;
        Self::from_rows(vec![vec![tile; width]; height])
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Tile stored at the cell, if the cell lies inside the grid.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<&Tile> {
        self.index(cell).and_then(|index| self.tiles.get(index))
    }

    /// Iterator over the rows from north to south.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Tile]> {
        let width = usize::try_from(self.columns).unwrap_or(usize::MAX).max(1);
        self.tiles.chunks(width)
    }

    /// Number of stars still waiting to be collected.
    #[must_use]
    pub fn stars_remaining(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.has_star()).count()
    }

    /// Cell reached by stepping once from `from` along `orientation`.
    ///
    /// Steps that would leave the grid are clamped, so the origin is returned
    /// unchanged when it already touches the edge being faced.
    #[must_use]
    pub fn forward(&self, from: CellCoord, orientation: Orientation) -> CellCoord {
        let (column_delta, row_delta) = orientation.delta();
        CellCoord::new(
            clamp_axis(from.column(), column_delta, self.columns),
            clamp_axis(from.row(), row_delta, self.rows),
        )
    }

    /// Clears the star at `cell`, returning whether one was present.
    pub(crate) fn take_star(&mut self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.tiles.get_mut(index))
            .map_or(false, Tile::take_star)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

fn clamp_axis(value: u32, delta: i64, extent: u32) -> u32 {
    let upper = i64::from(extent.saturating_sub(1));
    let next = (i64::from(value) + delta).clamp(0, upper);
    u32::try_from(next).unwrap_or(value)
}

#[derive(Serialize, Deserialize)]
struct GridRows {
    rows: Vec<Vec<Tile>>,
}

impl TryFrom<GridRows> for Grid {
    type Error = InvalidLevelData;

    fn try_from(value: GridRows) -> Result<Self, Self::Error> {
        Grid::from_rows(value.rows)
    }
}

impl From<Grid> for GridRows {
    fn from(grid: Grid) -> Self {
        Self {
            rows: grid.iter_rows().map(<[Tile]>::to_vec).collect(),
        }
    }
}
