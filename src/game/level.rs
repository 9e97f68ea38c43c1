use crate::game::grid::{Cell, GridMap};
use crate::game::valuable::{ValuableKind, ValuableSet};
use cgmath::Vector2;
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read level file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level file '{path}' is not valid level JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("valuable #{index} has type {code}; only 1 (small) and 2 (large) exist")]
    InvalidValuableType { index: usize, code: u8 },
    #[error("grid must have positive tile size and at least one row and column")]
    InvalidGrid,
    #[error("player starts at {cell:?}, which is off the grid or a wall")]
    BlockedStart { cell: Cell },
}

#[derive(Debug, Clone, Deserialize)]
struct PlayerDef {
    pos: [f32; 2],
}

#[derive(Debug, Clone, Deserialize)]
struct GridDef {
    rows: i32,
    cols: i32,
    tile_size: f32,
    #[serde(default = "default_origin")]
    origin: [f32; 2],
    #[serde(default)]
    walls: Vec<[i32; 2]>,
}

fn default_origin() -> [f32; 2] {
    [30.0, 0.0]
}

impl Default for GridDef {
    fn default() -> Self {
        Self {
            rows: 7,
            cols: 12,
            tile_size: 100.0,
            origin: default_origin(),
            walls: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ValuablesDef {
    /// Each entry is `[[x, y], type]`.
    #[serde(default)]
    start: Vec<([f32; 2], u8)>,
}

#[derive(Debug, Clone, Deserialize)]
struct LevelFile {
    player: PlayerDef,
    #[serde(default)]
    grid: GridDef,
    #[serde(default)]
    valuables: ValuablesDef,
}

/// Validated level layout. Sessions rebuild their entities from this on reset.
#[derive(Debug, Clone)]
pub struct Level {
    pub player_start: Vector2<f32>,
    pub grid: GridMap,
    pub valuables: Vec<(Vector2<f32>, ValuableKind)>,
}

impl Level {
    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let text = fs::read_to_string(path).map_err(|source| LevelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let level = Self::parse(&text).map_err(|e| match e {
            LevelError::Parse { source, .. } => LevelError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        info!(
            "Loaded level '{}': {}x{} grid, {} valuables",
            path.display(),
            level.grid.cols(),
            level.grid.rows(),
            level.valuables.len()
        );
        Ok(level)
    }

    pub fn parse(json: &str) -> Result<Self, LevelError> {
        let file: LevelFile = serde_json::from_str(json).map_err(|source| LevelError::Parse {
            path: PathBuf::new(),
            source,
        })?;

        let g = &file.grid;
        if !(g.tile_size.is_finite() && g.tile_size > 0.0) || g.rows <= 0 || g.cols <= 0 {
            return Err(LevelError::InvalidGrid);
        }
        let grid = GridMap::new(Vector2::from(g.origin), g.tile_size, g.rows, g.cols)
            .with_walls(g.walls.iter().map(|[c, r]| Cell::new(*c, *r)));

        let valuables = file
            .valuables
            .start
            .iter()
            .enumerate()
            .map(|(index, (pos, code))| {
                ValuableKind::try_from(*code)
                    .map(|kind| (Vector2::from(*pos), kind))
                    .map_err(|code| LevelError::InvalidValuableType { index, code })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let player_start = Vector2::from(file.player.pos);
        let start_cell = grid.cell_at(player_start);
        if !grid.is_walkable(start_cell) {
            return Err(LevelError::BlockedStart { cell: start_cell });
        }

        Ok(Self {
            player_start,
            grid,
            valuables,
        })
    }

    pub fn spawn_valuables(&self) -> ValuableSet {
        ValuableSet::from_spawns(self.valuables.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::{Level, LevelError};
    use crate::game::grid::{Cell, TileType};
    use crate::game::valuable::ValuableKind;
    use cgmath::Vector2;
    use std::io::Write;

    const LEVEL: &str = r#"{
        "player": { "pos": [130.0, 50.0] },
        "grid": { "rows": 4, "cols": 6, "tile_size": 100.0, "walls": [[3, 2]] },
        "valuables": { "start": [ [[430.0, 250.0], 1], [[230.0, 50.0], 2] ] }
    }"#;

    #[test]
    fn parses_player_grid_and_valuables() {
        let level = Level::parse(LEVEL).expect("level should parse");
        assert_eq!(level.player_start, Vector2::new(130.0, 50.0));
        assert_eq!(level.grid.rows(), 4);
        assert_eq!(level.grid.cols(), 6);
        assert_eq!(level.grid.tile(Cell::new(3, 2)), TileType::Wall);
        assert_eq!(
            level.valuables,
            vec![
                (Vector2::new(430.0, 250.0), ValuableKind::Small),
                (Vector2::new(230.0, 50.0), ValuableKind::Large)
            ]
        );
        assert_eq!(level.spawn_valuables().len(), 2);
    }

    #[test]
    fn grid_section_is_optional() {
        let level = Level::parse(r#"{ "player": { "pos": [80.0, 50.0] } }"#)
            .expect("defaults should apply");
        assert_eq!(level.grid.cols(), 12);
        assert_eq!(level.grid.rows(), 7);
        assert!(level.valuables.is_empty());
    }

    #[test]
    fn unknown_valuable_type_fails_loudly() {
        let json = r#"{ "player": { "pos": [80.0, 50.0] },
                        "valuables": { "start": [ [[80.0, 50.0], 3] ] } }"#;
        match Level::parse(json) {
            Err(LevelError::InvalidValuableType { index: 0, code: 3 }) => {}
            other => panic!("expected InvalidValuableType, got {:?}", other),
        }
    }

    #[test]
    fn start_inside_a_wall_is_rejected() {
        let json = r#"{ "player": { "pos": [80.0, 50.0] },
                        "grid": { "rows": 2, "cols": 2, "tile_size": 100.0, "walls": [[0, 0]] } }"#;
        assert!(matches!(Level::parse(json), Err(LevelError::BlockedStart { .. })));
    }

    #[test]
    fn shipped_level_is_valid() {
        let level = Level::parse(include_str!("../../assets/level.json"))
            .expect("assets/level.json should parse");
        assert!(!level.valuables.is_empty());
        assert!(level.grid.is_walkable(level.grid.cell_at(level.player_start)));
    }

    #[test]
    fn missing_file_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let err = Level::load(&path).unwrap_err();
        assert!(err.to_string().contains("nope.json"), "got: {}", err);

        let good = dir.path().join("level.json");
        std::fs::File::create(&good)
            .unwrap()
            .write_all(LEVEL.as_bytes())
            .unwrap();
        assert!(Level::load(&good).is_ok());
    }
}
