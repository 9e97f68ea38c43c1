//! The "grab" minigame: reproduce a four-arrow sequence on beat before the
//! countdown runs out.

use crate::game::gesture::{Action, Direction};
use log::{debug, info};
use rand::Rng;

pub const SEQUENCE_LEN: usize = 4;
pub const COUNTDOWN_START: u32 = 5;
/// Inputs are only read once the countdown drops below this.
pub const INPUT_OPEN_BELOW: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailReason {
    WrongDirection { expected: Direction, got: Direction },
    Timeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MinigameOutcome {
    /// Nothing decided yet.
    Pending,
    /// A correct step; `progress` steps matched so far.
    Advanced { progress: usize },
    Succeeded,
    Failed(FailReason),
}

#[derive(Clone, Debug)]
pub struct Minigame {
    active: bool,
    expected: Option<[Direction; SEQUENCE_LEN]>,
    progress: usize,
    countdown: u32,
    /// A directional input was consumed since the last window boundary.
    input_this_window: bool,
}

impl Default for Minigame {
    fn default() -> Self {
        Self {
            active: false,
            expected: None,
            progress: 0,
            countdown: COUNTDOWN_START,
            input_this_window: false,
        }
    }
}

impl Minigame {
    #[inline(always)]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the overlay should be on screen.
    #[inline(always)]
    pub fn overlay_visible(&self) -> bool {
        self.active
    }

    #[inline(always)]
    pub fn expected(&self) -> Option<&[Direction; SEQUENCE_LEN]> {
        self.expected.as_ref()
    }

    #[inline(always)]
    pub fn progress(&self) -> usize {
        self.progress
    }

    #[inline(always)]
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    #[inline(always)]
    pub fn accepts_input(&self) -> bool {
        self.active && self.countdown < INPUT_OPEN_BELOW
    }

    /// Activates with a freshly drawn sequence, replacing any previous one.
    pub fn arm<R: Rng>(&mut self, rng: &mut R) {
        let sequence: [Direction; SEQUENCE_LEN] = std::array::from_fn(|_| rng.random());
        self.arm_with(sequence);
    }

    /// Activates with a known sequence.
    pub fn arm_with(&mut self, sequence: [Direction; SEQUENCE_LEN]) {
        self.active = true;
        self.expected = Some(sequence);
        self.progress = 0;
        self.countdown = COUNTDOWN_START;
        self.input_this_window = false;
        info!(
            "Minigame armed: {}",
            sequence.iter().map(|d| d.arrow()).collect::<String>()
        );
    }

    /// Feeds one consumed slot action. Taps are swallowed without effect.
    pub fn submit(&mut self, action: Action) -> MinigameOutcome {
        if !self.accepts_input() {
            return MinigameOutcome::Pending;
        }
        let (Some(got), Some(expected)) = (action.direction(), self.expected) else {
            return MinigameOutcome::Pending;
        };

        self.input_this_window = true;
        let want = expected[self.progress];
        if got != want {
            self.finish();
            return MinigameOutcome::Failed(FailReason::WrongDirection {
                expected: want,
                got,
            });
        }

        self.progress += 1;
        debug!("Minigame step {}/{} matched", self.progress, SEQUENCE_LEN);
        if self.progress == SEQUENCE_LEN {
            self.finish();
            return MinigameOutcome::Succeeded;
        }
        MinigameOutcome::Advanced {
            progress: self.progress,
        }
    }

    /// Called when an Input/Output window closes while the overlay is up.
    pub fn on_window_boundary(&mut self) -> MinigameOutcome {
        if !self.active {
            return MinigameOutcome::Pending;
        }
        if self.countdown >= INPUT_OPEN_BELOW {
            self.countdown -= 1;
            self.input_this_window = false;
            return MinigameOutcome::Pending;
        }
        if !self.input_this_window {
            self.finish();
            return MinigameOutcome::Failed(FailReason::Timeout);
        }
        self.countdown = self.countdown.saturating_sub(1);
        self.input_this_window = false;
        MinigameOutcome::Pending
    }

    /// Leaves the minigame without judging it (session reset).
    pub fn cancel(&mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        self.active = false;
        self.expected = None;
        self.progress = 0;
        self.countdown = COUNTDOWN_START;
        self.input_this_window = false;
    }
}

#[cfg(test)]
mod tests {
    use super::{FailReason, Minigame, MinigameOutcome, SEQUENCE_LEN};
    use crate::game::gesture::{Action, Direction};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const SEQ: [Direction; 4] = [
        Direction::Up,
        Direction::Left,
        Direction::Right,
        Direction::Down,
    ];

    /// Runs through the two preview boundaries so inputs are accepted.
    fn opened() -> Minigame {
        let mut game = Minigame::default();
        game.arm_with(SEQ);
        assert_eq!(game.on_window_boundary(), MinigameOutcome::Pending);
        assert!(!game.accepts_input());
        assert_eq!(game.on_window_boundary(), MinigameOutcome::Pending);
        assert!(game.accepts_input());
        game
    }

    #[test]
    fn preview_ignores_input() {
        let mut game = Minigame::default();
        game.arm_with(SEQ);
        assert_eq!(game.submit(Action::SwipeDown), MinigameOutcome::Pending);
        assert_eq!(game.progress(), 0);
        assert!(game.is_active());
    }

    #[test]
    fn full_sequence_succeeds_and_clears() {
        let mut game = opened();
        assert_eq!(
            game.submit(Action::SwipeUp),
            MinigameOutcome::Advanced { progress: 1 }
        );
        assert_eq!(game.on_window_boundary(), MinigameOutcome::Pending);
        assert_eq!(
            game.submit(Action::SwipeLeft),
            MinigameOutcome::Advanced { progress: 2 }
        );
        assert_eq!(
            game.submit(Action::SwipeRight),
            MinigameOutcome::Advanced { progress: 3 }
        );
        assert_eq!(game.submit(Action::SwipeDown), MinigameOutcome::Succeeded);
        assert!(!game.is_active());
        assert!(game.expected().is_none());
        assert_eq!(game.progress(), 0);
        assert_eq!(game.countdown(), 5);
    }

    #[test]
    fn wrong_step_fails_immediately() {
        let mut game = opened();
        game.submit(Action::SwipeUp);
        assert_eq!(
            game.submit(Action::SwipeDown),
            MinigameOutcome::Failed(FailReason::WrongDirection {
                expected: Direction::Left,
                got: Direction::Down
            })
        );
        assert!(!game.overlay_visible());
        assert!(game.expected().is_none());
    }

    #[test]
    fn taps_are_swallowed() {
        let mut game = opened();
        assert_eq!(game.submit(Action::Tap), MinigameOutcome::Pending);
        assert_eq!(game.progress(), 0);
        // A tap does not count as input for the window.
        assert_eq!(
            game.on_window_boundary(),
            MinigameOutcome::Failed(FailReason::Timeout)
        );
    }

    #[test]
    fn silent_window_times_out() {
        let mut game = opened();
        game.submit(Action::SwipeUp);
        assert_eq!(game.on_window_boundary(), MinigameOutcome::Pending);
        assert_eq!(
            game.on_window_boundary(),
            MinigameOutcome::Failed(FailReason::Timeout)
        );
        assert!(!game.is_active());
    }

    #[test]
    fn countdown_bottoms_out_at_zero() {
        let mut game = opened();
        assert_eq!(game.countdown(), 3);
        // Keep the game alive with a correct input each window, then stall.
        let mut rearmed = [Direction::Up; SEQUENCE_LEN];
        rearmed[3] = Direction::Down;
        game.arm_with(rearmed);
        game.on_window_boundary();
        game.on_window_boundary();
        for _ in 0..3 {
            game.submit(Action::SwipeUp);
            game.on_window_boundary();
        }
        assert_eq!(game.countdown(), 0);
        assert!(game.is_active());
        assert_eq!(
            game.on_window_boundary(),
            MinigameOutcome::Failed(FailReason::Timeout)
        );
    }

    #[test]
    fn arming_draws_a_full_sequence_once() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut game = Minigame::default();
        game.arm(&mut rng);
        let first = *game.expected().expect("sequence should be generated");
        assert_eq!(first.len(), SEQUENCE_LEN);
        // Re-arming replaces the sequence and resets progress.
        game.on_window_boundary();
        game.on_window_boundary();
        game.submit(Action::swipe(first[0]));
        assert_eq!(game.progress(), 1);
        game.arm(&mut rng);
        assert_eq!(game.progress(), 0);
        assert_eq!(game.countdown(), 5);
    }
}
