//! Map definition format consumed when a session starts.

use serde::Deserialize;
use thiserror::Error;

use crate::{CellCoord, PlayerId};

/// Errors raised while loading a map definition.
#[derive(Debug, Error)]
pub enum MapError {
    /// The map document is not valid TOML or does not match the schema.
    #[error("failed to parse map: {0}")]
    Parse(#[from] toml::de::Error),
    /// The tile list does not cover the grid exactly.
    #[error("map declares {columns}x{rows} cells but lists {tiles} tiles")]
    TileCountMismatch {
        /// Declared column count.
        columns: u32,
        /// Declared row count.
        rows: u32,
        /// Number of tiles listed.
        tiles: usize,
    },
    /// The map declares no local player.
    #[error("map declares no local player")]
    MissingLocalPlayer,
}

/// Grid dimensions, tiles, players and initial placements of a map.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MapDefinition {
    /// Number of cell columns.
    pub columns: u32,
    /// Number of cell rows.
    pub rows: u32,
    /// Tile id per cell in row-major order; empty means every tile is `0`.
    #[serde(default)]
    pub tiles: Vec<u16>,
    /// Tile ids marked impassable when the map loads.
    #[serde(default)]
    pub impassable_tiles: Vec<u16>,
    /// Participating players, addressed by index.
    pub players: Vec<PlayerSetup>,
    /// Entities present when the session starts.
    #[serde(default)]
    pub placements: Vec<Placement>,
}

impl MapDefinition {
    /// Parses and validates a map document.
    pub fn from_toml_str(contents: &str) -> Result<Self, MapError> {
        let map: Self = toml::from_str(contents)?;
        map.validate()?;
        Ok(map)
    }

    /// Checks the structural consistency of the definition.
    pub fn validate(&self) -> Result<(), MapError> {
        let expected = u64::from(self.columns) * u64::from(self.rows);
        if !self.tiles.is_empty() && self.tiles.len() as u64 != expected {
            return Err(MapError::TileCountMismatch {
                columns: self.columns,
                rows: self.rows,
                tiles: self.tiles.len(),
            });
        }

        if !self.players.iter().any(|player| player.local) {
            return Err(MapError::MissingLocalPlayer);
        }

        Ok(())
    }

    /// Tile id at the provided cell, if it lies within the map.
    #[must_use]
    pub fn tile_at(&self, cell: CellCoord) -> Option<u16> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }

        if self.tiles.is_empty() {
            return Some(0);
        }

        let index = usize::try_from(cell.row()).ok()? * usize::try_from(self.columns).ok()?
            + usize::try_from(cell.column()).ok()?;
        self.tiles.get(index).copied()
    }

    /// Cells whose tile is listed as impassable.
    pub fn impassable_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (0..self.rows)
            .flat_map(move |row| (0..self.columns).map(move |column| CellCoord::new(column, row)))
            .filter(|cell| {
                self.tile_at(*cell)
                    .is_some_and(|tile| self.impassable_tiles.contains(&tile))
            })
    }
}

/// Starting state of a player.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PlayerSetup {
    /// Credits available at the start.
    #[serde(default)]
    pub credits: i64,
    /// Team the player belongs to; players sharing a team are allies.
    #[serde(default)]
    pub team: u8,
    /// Whether this is the player controlling the session.
    #[serde(default)]
    pub local: bool,
}

/// Entity present when the session starts.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Placement {
    /// Rules name of the entity.
    pub name: String,
    /// Column of the anchor cell.
    pub column: u32,
    /// Row of the anchor cell.
    pub row: u32,
    /// Index of the owning player; neutral when absent.
    #[serde(default)]
    pub owner: Option<u8>,
    /// Initial health; full health when absent.
    #[serde(default)]
    pub health: Option<u32>,
    /// Initial body facing slice.
    #[serde(default)]
    pub facing: Option<u8>,
}

impl Placement {
    /// Anchor cell of the placement.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        CellCoord::new(self.column, self.row)
    }

    /// Owning player of the placement.
    #[must_use]
    pub fn owner(&self) -> Option<PlayerId> {
        self.owner.map(PlayerId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impassable_tiles_are_listed_in_row_major_order() {
        let map = MapDefinition {
            columns: 3,
            rows: 2,
            tiles: vec![0, 7, 0, 7, 0, 0],
            impassable_tiles: vec![7],
            players: vec![PlayerSetup {
                credits: 0,
                team: 0,
                local: true,
            }],
            placements: Vec::new(),
        };

        let cells: Vec<_> = map.impassable_cells().collect();
        assert_eq!(cells, vec![CellCoord::new(1, 0), CellCoord::new(0, 1)]);
    }

    #[test]
    fn tile_count_must_match_dimensions() {
        let document = r#"
            columns = 2
            rows = 2
            tiles = [0, 0, 0]

            [[players]]
            local = true
        "#;
        assert!(matches!(
            MapDefinition::from_toml_str(document),
            Err(MapError::TileCountMismatch { tiles: 3, .. })
        ));
    }

    #[test]
    fn local_player_is_required() {
        let document = r#"
            columns = 2
            rows = 2

            [[players]]
            credits = 100
        "#;
        assert!(matches!(
            MapDefinition::from_toml_str(document),
            Err(MapError::MissingLocalPlayer)
        ));
    }
}
