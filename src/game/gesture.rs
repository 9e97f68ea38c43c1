use crate::game::timing::Micros;
use cgmath::{MetricSpace, Vector2};
use log::debug;
use rand::Rng;
use rand::distr::{Distribution, StandardUniform};

/// Squared deadzone (15 units): anything shorter is a tap.
pub const DEFAULT_DEADZONE_SQUARED: f32 = 225.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

impl Direction {
    /// Grid step for this direction. Rows grow upward.
    #[inline(always)]
    pub const fn grid_step(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub const fn arrow(self) -> char {
        match self {
            Direction::Up => '↑',
            Direction::Down => '↓',
            Direction::Left => '←',
            Direction::Right => '→',
        }
    }
}

/// Uniform draw over the four directions.
impl Distribution<Direction> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Direction {
        ALL_DIRECTIONS[rng.random_range(0..ALL_DIRECTIONS.len())]
    }
}

/// One buffered beat action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Action {
    #[default]
    NoInput,
    Tap,
    SwipeUp,
    SwipeDown,
    SwipeLeft,
    SwipeRight,
}

impl Action {
    #[inline(always)]
    pub const fn is_input(self) -> bool {
        !matches!(self, Action::NoInput)
    }

    /// The swipe direction, if this is a swipe.
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Action::SwipeUp => Some(Direction::Up),
            Action::SwipeDown => Some(Direction::Down),
            Action::SwipeLeft => Some(Direction::Left),
            Action::SwipeRight => Some(Direction::Right),
            Action::NoInput | Action::Tap => None,
        }
    }

    #[cfg(test)]
    pub const fn swipe(dir: Direction) -> Self {
        match dir {
            Direction::Up => Action::SwipeUp,
            Direction::Down => Action::SwipeDown,
            Direction::Left => Action::SwipeLeft,
            Direction::Right => Action::SwipeRight,
        }
    }

    /// Integer code written to the diagnostic log.
    pub const fn log_code(self) -> u8 {
        match self {
            Action::NoInput => 0,
            Action::Tap => 1,
            Action::SwipeUp => 2,
            Action::SwipeDown => 3,
            Action::SwipeLeft => 4,
            Action::SwipeRight => 5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerSource {
    Mouse,
    Touch(u64),
    Keyboard,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureEvent {
    pub position: Vector2<f32>,
    pub ready: bool,
    pub source: PointerSource,
    pub timestamp: Micros,
}

impl Default for GestureEvent {
    fn default() -> Self {
        Self {
            position: Vector2::new(0.0, 0.0),
            ready: false,
            source: PointerSource::Mouse,
            timestamp: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletedGesture {
    pub press: GestureEvent,
    pub release: GestureEvent,
}

/// Holds at most one in-flight press/release pair.
#[derive(Clone, Debug, Default)]
pub struct GestureCapture {
    press: GestureEvent,
    release: GestureEvent,
}

impl GestureCapture {
    /// Records a pointer-down. A dangling press with no release yet is replaced.
    pub fn press(&mut self, position: Vector2<f32>, source: PointerSource, timestamp: Micros) {
        if self.press.ready && !self.release.ready {
            debug!("Press from {:?} replaces an unreleased press", source);
        }
        self.press = GestureEvent {
            position,
            ready: true,
            source,
            timestamp,
        };
        self.release = GestureEvent::default();
    }

    /// Records a pointer-up. Ignored unless a press from the same source is waiting for it.
    pub fn release(&mut self, position: Vector2<f32>, source: PointerSource, timestamp: Micros) {
        if !self.press.ready || self.release.ready {
            return;
        }
        if source != self.press.source {
            debug!(
                "Release from {:?} ignored; press came from {:?}",
                source, self.press.source
            );
            return;
        }
        self.release = GestureEvent {
            position,
            ready: true,
            source,
            timestamp,
        };
    }

    #[inline(always)]
    pub fn is_ready(&self) -> bool {
        self.press.ready && self.release.ready
    }

    pub fn peek(&self) -> Option<CompletedGesture> {
        self.is_ready().then_some(CompletedGesture {
            press: self.press,
            release: self.release,
        })
    }

    pub fn clear(&mut self) {
        self.press = GestureEvent::default();
        self.release = GestureEvent::default();
    }
}

/// Tap inside the deadzone, otherwise a swipe along the dominant axis.
/// Positions are window coordinates: x grows right, y grows down.
pub fn classify(gesture: &CompletedGesture, deadzone_squared: f32) -> Action {
    let from = gesture.press.position;
    let to = gesture.release.position;
    if from.distance2(to) <= deadzone_squared {
        return Action::Tap;
    }

    let delta = to - from;
    if delta.x.abs() > delta.y.abs() {
        if delta.x > 0.0 {
            Action::SwipeRight
        } else {
            Action::SwipeLeft
        }
    } else if delta.y < 0.0 {
        Action::SwipeUp
    } else {
        Action::SwipeDown
    }
}
