use crate::game::gesture::Direction;
use cgmath::Vector2;
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub const fn step(self, dir: Direction) -> Self {
        let (dc, dr) = dir.grid_step();
        Self {
            col: self.col + dc,
            row: self.row + dr,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TileType {
    Floor,
    Wall,
}

/// Maps continuous positions onto the tile grid and answers walkability.
#[derive(Clone, Debug)]
pub struct GridMap {
    origin: Vector2<f32>,
    tile_size: f32,
    rows: i32,
    cols: i32,
    walls: HashSet<Cell>,
}

impl GridMap {
    pub fn new(origin: Vector2<f32>, tile_size: f32, rows: i32, cols: i32) -> Self {
        Self {
            origin,
            tile_size,
            rows,
            cols,
            walls: HashSet::new(),
        }
    }

    pub fn with_walls(mut self, walls: impl IntoIterator<Item = Cell>) -> Self {
        self.walls.extend(walls);
        self
    }

    #[inline(always)]
    pub fn rows(&self) -> i32 {
        self.rows
    }

    #[inline(always)]
    pub fn cols(&self) -> i32 {
        self.cols
    }

    /// Floors toward negative infinity, so positions left of the origin land in
    /// column -1 rather than 0.
    pub fn cell_at(&self, position: Vector2<f32>) -> Cell {
        Cell {
            col: ((position.x - self.origin.x) / self.tile_size).floor() as i32,
            row: ((position.y - self.origin.y) / self.tile_size).floor() as i32,
        }
    }

    #[inline(always)]
    pub fn contains(&self, cell: Cell) -> bool {
        (0..self.cols).contains(&cell.col) && (0..self.rows).contains(&cell.row)
    }

    pub fn tile(&self, cell: Cell) -> TileType {
        if self.walls.contains(&cell) {
            TileType::Wall
        } else {
            TileType::Floor
        }
    }

    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.contains(cell) && self.tile(cell) == TileType::Floor
    }

    /// The position one tile away in `dir`, or None when that tile is off the
    /// grid or a wall.
    pub fn step(&self, from: Vector2<f32>, dir: Direction) -> Option<Vector2<f32>> {
        let target = self.cell_at(from).step(dir);
        if !self.is_walkable(target) {
            return None;
        }
        let (dc, dr) = dir.grid_step();
        Some(from + Vector2::new(dc as f32, dr as f32) * self.tile_size)
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, GridMap, TileType};
    use crate::game::gesture::Direction;
    use cgmath::Vector2;

    fn grid() -> GridMap {
        GridMap::new(Vector2::new(30.0, 0.0), 100.0, 3, 4)
    }

    #[test]
    fn cells_floor_toward_negative_infinity() {
        let g = grid();
        assert_eq!(g.cell_at(Vector2::new(30.0, 0.0)), Cell::new(0, 0));
        assert_eq!(g.cell_at(Vector2::new(129.9, 99.9)), Cell::new(0, 0));
        assert_eq!(g.cell_at(Vector2::new(130.0, 100.0)), Cell::new(1, 1));
        assert_eq!(g.cell_at(Vector2::new(29.0, -0.5)), Cell::new(-1, -1));
    }

    #[test]
    fn stepping_off_the_edge_is_blocked() {
        let g = grid();
        let corner = Vector2::new(80.0, 50.0);
        assert_eq!(g.step(corner, Direction::Left), None);
        assert_eq!(g.step(corner, Direction::Down), None);
        assert_eq!(g.step(corner, Direction::Up), Some(Vector2::new(80.0, 150.0)));
        assert_eq!(g.step(corner, Direction::Right), Some(Vector2::new(180.0, 50.0)));

        let far = Vector2::new(380.0, 250.0);
        assert_eq!(g.cell_at(far), Cell::new(3, 2));
        assert_eq!(g.step(far, Direction::Right), None);
        assert_eq!(g.step(far, Direction::Up), None);
    }

    #[test]
    fn walls_block_like_edges() {
        let g = grid().with_walls([Cell::new(1, 0)]);
        assert_eq!(g.tile(Cell::new(1, 0)), TileType::Wall);
        assert!(!g.is_walkable(Cell::new(1, 0)));
        assert_eq!(g.step(Vector2::new(80.0, 50.0), Direction::Right), None);
        assert!(g.is_walkable(Cell::new(1, 1)));
    }
}
