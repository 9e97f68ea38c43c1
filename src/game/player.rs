use crate::game::gesture::Direction;
use crate::game::grid::GridMap;
use crate::game::valuable::ValuableId;
use cgmath::Vector2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u32);

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub position: Vector2<f32>,
    pub carried: Option<ValuableId>,
    pub facing: Direction,
}

impl Player {
    pub fn new(id: PlayerId, position: Vector2<f32>) -> Self {
        Self {
            id,
            position,
            carried: None,
            facing: Direction::Down,
        }
    }

    #[inline(always)]
    pub fn is_carrying(&self) -> bool {
        self.carried.is_some()
    }

    /// Moves one tile. Returns false (and stays put) when the grid blocks it.
    pub fn try_move(&mut self, dir: Direction, grid: &GridMap) -> bool {
        self.facing = dir;
        match grid.step(self.position, dir) {
            Some(next) => {
                self.position = next;
                true
            }
            None => false,
        }
    }
}
