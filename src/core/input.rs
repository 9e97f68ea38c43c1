use crate::game::gesture::{Direction, PointerSource};
use crate::game::timing::Micros;
use cgmath::Vector2;
use log::debug;
use winit::event::{ElementState, KeyEvent, MouseButton, TouchPhase};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Distance a keyboard-synthesized swipe travels between press and release.
pub const KEY_SWIPE_DISTANCE: f32 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Up,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub position: Vector2<f32>,
    pub source: PointerSource,
    pub timestamp: Micros,
}

/// Everything the session reads from input in one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub pointer_events: Vec<PointerEvent>,
    pub reset_requested: bool,
    pub toggle_minigame: bool,
    pub toggle_logging: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKey {
    Swipe(Direction),
    Tap,
}

impl GestureKey {
    /// Where the synthesized release lands, in window coordinates (y down).
    pub fn release_offset(self) -> Vector2<f32> {
        match self {
            GestureKey::Tap => Vector2::new(0.0, 0.0),
            GestureKey::Swipe(Direction::Up) => Vector2::new(0.0, -KEY_SWIPE_DISTANCE),
            GestureKey::Swipe(Direction::Down) => Vector2::new(0.0, KEY_SWIPE_DISTANCE),
            GestureKey::Swipe(Direction::Left) => Vector2::new(-KEY_SWIPE_DISTANCE, 0.0),
            GestureKey::Swipe(Direction::Right) => Vector2::new(KEY_SWIPE_DISTANCE, 0.0),
        }
    }
}

#[inline(always)]
pub fn gesture_key_from_keycode(code: KeyCode) -> Option<GestureKey> {
    match code {
        KeyCode::ArrowUp => Some(GestureKey::Swipe(Direction::Up)),
        KeyCode::ArrowDown => Some(GestureKey::Swipe(Direction::Down)),
        KeyCode::ArrowLeft => Some(GestureKey::Swipe(Direction::Left)),
        KeyCode::ArrowRight => Some(GestureKey::Swipe(Direction::Right)),
        KeyCode::KeyA => Some(GestureKey::Tap),
        _ => None,
    }
}

/// Collects window events into a `FrameInput` until the next frame drains it.
#[derive(Debug)]
pub struct InputController {
    cursor: Vector2<f32>,
    active_touch: Option<u64>,
    reset_held: bool,
    frame: FrameInput,
}

impl Default for InputController {
    fn default() -> Self {
        Self::new()
    }
}

impl InputController {
    pub fn new() -> Self {
        Self {
            cursor: Vector2::new(0.0, 0.0),
            active_touch: None,
            reset_held: false,
            frame: FrameInput::default(),
        }
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        self.cursor = Vector2::new(x as f32, y as f32);
    }

    pub fn mouse_button(&mut self, button: MouseButton, state: ElementState, timestamp: Micros) {
        if button != MouseButton::Left {
            return;
        }
        let phase = match state {
            ElementState::Pressed => PointerPhase::Down,
            ElementState::Released => PointerPhase::Up,
        };
        self.push(phase, self.cursor, PointerSource::Mouse, timestamp);
    }

    /// Only the first finger down is tracked until it lifts.
    pub fn touch(&mut self, id: u64, phase: TouchPhase, x: f64, y: f64, timestamp: Micros) {
        let position = Vector2::new(x as f32, y as f32);
        match phase {
            TouchPhase::Started if self.active_touch.is_none() => {
                self.active_touch = Some(id);
                self.push(PointerPhase::Down, position, PointerSource::Touch(id), timestamp);
            }
            TouchPhase::Ended if self.active_touch == Some(id) => {
                self.active_touch = None;
                self.push(PointerPhase::Up, position, PointerSource::Touch(id), timestamp);
            }
            TouchPhase::Cancelled if self.active_touch == Some(id) => {
                debug!("Touch {} cancelled", id);
                self.active_touch = None;
            }
            _ => {}
        }
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent, timestamp: Micros) {
        if let PhysicalKey::Code(code) = event.physical_key {
            self.handle_key(
                code,
                event.state == ElementState::Pressed,
                event.repeat,
                timestamp,
            );
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, pressed: bool, repeat: bool, timestamp: Micros) {
        if code == KeyCode::KeyR {
            self.reset_held = pressed;
            return;
        }
        if repeat {
            return;
        }
        if let Some(key) = gesture_key_from_keycode(code) {
            let origin = Vector2::new(0.0, 0.0);
            if pressed {
                self.push(PointerPhase::Down, origin, PointerSource::Keyboard, timestamp);
            } else {
                let release = origin + key.release_offset();
                self.push(PointerPhase::Up, release, PointerSource::Keyboard, timestamp);
            }
            return;
        }
        if !pressed {
            return;
        }
        match code {
            KeyCode::KeyM => self.frame.toggle_minigame = true,
            KeyCode::KeyL => self.frame.toggle_logging = true,
            _ => {}
        }
    }

    /// Held keys are forgotten when the window loses focus.
    pub fn focus_lost(&mut self) {
        self.reset_held = false;
        self.active_touch = None;
    }

    pub fn take_frame(&mut self) -> FrameInput {
        let mut frame = std::mem::take(&mut self.frame);
        frame.reset_requested = self.reset_held;
        frame
    }

    fn push(&mut self, phase: PointerPhase, position: Vector2<f32>, source: PointerSource, timestamp: Micros) {
        self.frame.pointer_events.push(PointerEvent {
            phase,
            position,
            source,
            timestamp,
        });
    }
}
