use crate::config::Config;
use crate::core::input::{FrameInput, PointerEvent, PointerPhase};
use crate::game::diagnostics::{BeatLogRow, DiagnosticsSession};
use crate::game::gesture::{CompletedGesture, Direction, GestureCapture, classify};
use crate::game::grid::Cell;
use crate::game::judgment::{ActionSlots, Judgment, TimingWindows, judge};
use crate::game::level::Level;
use crate::game::minigame::{FailReason, Minigame, MinigameOutcome, SEQUENCE_LEN};
use crate::game::player::{Player, PlayerId};
use crate::game::timing::{BEATS_PER_CYCLE, BeatClock, BeatTransition, Micros, micros_to_ms, window_of};
use crate::game::valuable::{ValuableId, ValuableSet};
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;

const SUMMARY_PERIOD: Micros = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnPhase {
    /// Beats 0 and 1: gestures are collected.
    Input,
    /// Beats 2 and 3: the collected pair resolves on entry.
    Output,
    Minigame,
}

impl TurnPhase {
    #[inline(always)]
    pub const fn for_beat(beat: usize) -> Self {
        if window_of(beat) == 0 {
            TurnPhase::Input
        } else {
            TurnPhase::Output
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Judged(Judgment),
    Moved { direction: Direction, to: Cell },
    PickedUp(ValuableId),
    Dropped(ValuableId),
    MinigameStarted([Direction; SEQUENCE_LEN]),
    MinigameAdvanced { progress: usize },
    MinigameSucceeded,
    MinigameFailed { reason: FailReason },
    PhaseChanged { from: TurnPhase, to: TurnPhase },
    Reset,
}

/// What the presentation side needs to draw a frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionView {
    pub phase: TurnPhase,
    pub beat: usize,
    pub carried: Option<ValuableId>,
    pub expected: Option<[Direction; SEQUENCE_LEN]>,
    pub progress: usize,
    pub countdown: u32,
    pub overlay_visible: bool,
    pub player_cell: Cell,
    pub facing: Direction,
    pub logging: bool,
}

impl fmt::Display for SessionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} | beat {} | cell ({}, {}) facing {}",
            self.phase,
            self.beat,
            self.player_cell.col,
            self.player_cell.row,
            self.facing.arrow()
        )?;
        if let Some(id) = self.carried {
            write!(f, " | carrying #{}", id.0)?;
        }
        if let (true, Some(sequence)) = (self.overlay_visible, self.expected) {
            let arrows: String = sequence.iter().map(|d| d.arrow()).collect();
            write!(f, " | {} {}/{} ({})", arrows, self.progress, SEQUENCE_LEN, self.countdown)?;
        }
        if self.logging {
            write!(f, " | REC")?;
        }
        Ok(())
    }
}

/// One running heist: beat clock, buffered actions and the entities they act on.
pub struct Session {
    clock: BeatClock,
    phase: TurnPhase,
    slots: ActionSlots,
    capture: GestureCapture,
    minigame: Minigame,
    level: Level,
    player: Player,
    valuables: ValuableSet,
    windows: TimingWindows,
    deadzone_squared: f32,
    input_window_moves: bool,
    rng: StdRng,
    diagnostics: DiagnosticsSession,
    next_summary_at: Micros,
}

impl Session {
    pub fn new(config: &Config, level: Level, diagnostics: DiagnosticsSession, now: Micros) -> Self {
        let seed = config.rng_seed.unwrap_or_else(rand::random);
        let clock = BeatClock::new(now, config.beat_interval());
        info!(
            "Session starting: beat interval {}ms, rng seed {}",
            micros_to_ms(clock.interval()),
            seed
        );
        let player = Player::new(PlayerId(0), level.player_start);
        let valuables = level.spawn_valuables();
        Self {
            clock,
            phase: TurnPhase::Input,
            slots: ActionSlots::default(),
            capture: GestureCapture::default(),
            minigame: Minigame::default(),
            level,
            player,
            valuables,
            windows: config.windows,
            deadzone_squared: config.deadzone_squared(),
            input_window_moves: config.input_window_moves,
            rng: StdRng::seed_from_u64(seed),
            diagnostics,
            next_summary_at: SUMMARY_PERIOD,
        }
    }

    /// Runs one frame: clock, toggles, gestures, minigame, then bookkeeping.
    pub fn update(&mut self, now: Micros, input: FrameInput) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if let Some(transition) = self.clock.update(now) {
            self.on_beat(transition, &mut events);
        }

        if input.toggle_logging {
            self.diagnostics.toggle();
        }
        if input.reset_requested {
            self.reset(&mut events);
        }
        if input.toggle_minigame {
            self.enter_minigame(&mut events);
        }

        for event in input.pointer_events {
            self.handle_pointer(event, &mut events);
        }

        if self.phase == TurnPhase::Minigame {
            self.feed_minigame(&mut events);
        }

        self.valuables.follow_carrier(&self.player);
        self.diagnostics.flush();

        let song_time = self.clock.song_time(now);
        if song_time >= self.next_summary_at {
            info!(
                "Beat: {}, Time: {:.2}, Phase: {:?}, Carrying: {:?}",
                self.clock.current_beat(),
                song_time as f64 / 1_000_000.0,
                self.phase,
                self.player.carried.map(|id| id.0)
            );
            while self.next_summary_at <= song_time {
                self.next_summary_at += SUMMARY_PERIOD;
            }
        }

        events
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            beat: self.clock.current_beat(),
            carried: self.player.carried,
            expected: self.minigame.expected().copied(),
            progress: self.minigame.progress(),
            countdown: self.minigame.countdown(),
            overlay_visible: self.minigame.overlay_visible(),
            player_cell: self.level.grid.cell_at(self.player.position),
            facing: self.player.facing,
            logging: self.diagnostics.is_enabled(),
        }
    }

    fn on_beat(&mut self, transition: BeatTransition, events: &mut Vec<SessionEvent>) {
        let beat = transition.to;

        // A minigame started on this very boundary is not ticked by it.
        if transition.crosses_window() && self.minigame.is_active() {
            match self.minigame.on_window_boundary() {
                MinigameOutcome::Failed(reason) => self.fail_minigame(reason, events),
                _ => debug!("Minigame countdown now {}", self.minigame.countdown()),
            }
        }

        if self.phase != TurnPhase::Minigame {
            let next = TurnPhase::for_beat(beat);
            if next != self.phase {
                self.set_phase(next, events);
                if next == TurnPhase::Output {
                    self.resolve_turn(events);
                }
            }
        }

        if beat == 3 && self.phase == TurnPhase::Output {
            self.slots.clear(0);
            self.slots.clear(1);
        }
        // Nothing on time can reach the slot opposite the new beat any more.
        self.slots.clear((beat + 2) % BEATS_PER_CYCLE);
    }

    /// The Input pair only acts when both beats carry the same action.
    fn resolve_turn(&mut self, events: &mut Vec<SessionEvent>) {
        let (first, second) = (self.slots.get(0), self.slots.get(1));
        if first.is_input() && first == second {
            match first.direction() {
                Some(direction) => self.move_player(direction, events),
                None => self.resolve_tap(events),
            }
        } else if first.is_input() || second.is_input() {
            debug!("Discarding unmatched pair {:?} / {:?}", first, second);
        }
        self.slots.clear(0);
        self.slots.clear(1);
    }

    fn resolve_tap(&mut self, events: &mut Vec<SessionEvent>) {
        if self.player.is_carrying() {
            if let Some(id) = self.valuables.drop_carried(&mut self.player) {
                events.push(SessionEvent::Dropped(id));
            }
            return;
        }
        if let Some(id) = self.valuables.try_pickup(&mut self.player, &self.level.grid) {
            events.push(SessionEvent::PickedUp(id));
            self.enter_minigame(events);
        }
    }

    fn move_player(&mut self, direction: Direction, events: &mut Vec<SessionEvent>) {
        if self.player.try_move(direction, &self.level.grid) {
            let to = self.level.grid.cell_at(self.player.position);
            debug!("Player moved {:?} to {:?}", direction, to);
            events.push(SessionEvent::Moved { direction, to });
        } else {
            debug!("Move {:?} blocked", direction);
        }
    }

    fn handle_pointer(&mut self, event: PointerEvent, events: &mut Vec<SessionEvent>) {
        match event.phase {
            PointerPhase::Down => self.capture.press(event.position, event.source, event.timestamp),
            PointerPhase::Up => self.capture.release(event.position, event.source, event.timestamp),
        }
        if let Some(gesture) = self.capture.peek() {
            self.consume_gesture(&gesture, events);
            self.capture.clear();
        }
    }

    fn consume_gesture(&mut self, gesture: &CompletedGesture, events: &mut Vec<SessionEvent>) {
        let action = classify(gesture, self.deadzone_squared);
        let press = gesture.press.timestamp;
        let judgment = judge(
            self.clock.deadlines(),
            self.clock.interval(),
            &self.windows,
            press,
            action,
        );
        debug!(
            "{:?} on beat {}: {:?} ({}ms)",
            action,
            judgment.beat,
            judgment.grade,
            micros_to_ms(judgment.time_error)
        );
        if !judgment.grade.is_hit() {
            return;
        }

        events.push(SessionEvent::Judged(judgment));
        self.diagnostics.record(BeatLogRow::new(
            self.clock.song_time(press),
            judgment.beat,
            judgment.time_error,
            action.log_code(),
        ));

        if !self.slots.try_write(judgment.beat, action) {
            debug!("Slot {} already holds {:?}", judgment.beat, self.slots.get(judgment.beat));
            return;
        }

        if self.phase == TurnPhase::Input
            && self.input_window_moves
            && judgment.beat == self.clock.current_beat()
        {
            if let Some(direction) = action.direction() {
                self.move_player(direction, events);
            }
        }
    }

    fn feed_minigame(&mut self, events: &mut Vec<SessionEvent>) {
        if !self.minigame.accepts_input() {
            return;
        }
        let beat = self.clock.current_beat();
        if !self.slots.get(beat).is_input() {
            return;
        }
        let action = self.slots.take(beat);
        match self.minigame.submit(action) {
            MinigameOutcome::Pending => {}
            MinigameOutcome::Advanced { progress } => {
                events.push(SessionEvent::MinigameAdvanced { progress });
            }
            MinigameOutcome::Succeeded => {
                info!("Minigame cleared, keeping the loot");
                events.push(SessionEvent::MinigameSucceeded);
                self.leave_minigame(events);
            }
            MinigameOutcome::Failed(reason) => self.fail_minigame(reason, events),
        }
    }

    /// Arms a fresh sequence; also used to re-arm one already running.
    fn enter_minigame(&mut self, events: &mut Vec<SessionEvent>) {
        self.minigame.arm(&mut self.rng);
        self.slots.flush();
        if let Some(sequence) = self.minigame.expected() {
            events.push(SessionEvent::MinigameStarted(*sequence));
        }
        self.set_phase(TurnPhase::Minigame, events);
    }

    fn fail_minigame(&mut self, reason: FailReason, events: &mut Vec<SessionEvent>) {
        info!("Minigame failed: {:?}", reason);
        if self.minigame.is_active() {
            self.minigame.cancel();
        }
        events.push(SessionEvent::MinigameFailed { reason });
        if let Some(id) = self.valuables.drop_carried(&mut self.player) {
            events.push(SessionEvent::Dropped(id));
        }
        self.leave_minigame(events);
    }

    fn leave_minigame(&mut self, events: &mut Vec<SessionEvent>) {
        self.slots.flush();
        self.set_phase(TurnPhase::Input, events);
    }

    fn set_phase(&mut self, to: TurnPhase, events: &mut Vec<SessionEvent>) {
        if self.phase == to {
            return;
        }
        let from = self.phase;
        self.phase = to;
        debug!("Phase {:?} -> {:?}", from, to);
        events.push(SessionEvent::PhaseChanged { from, to });
    }

    /// Puts the level back to its starting layout; the beat clock keeps running.
    fn reset(&mut self, events: &mut Vec<SessionEvent>) {
        info!("Resetting session");
        self.player = Player::new(PlayerId(0), self.level.player_start);
        self.valuables = self.level.spawn_valuables();
        self.slots.flush();
        self.capture.clear();
        self.minigame.cancel();
        self.set_phase(TurnPhase::Input, events);
        events.push(SessionEvent::Reset);
    }
}
