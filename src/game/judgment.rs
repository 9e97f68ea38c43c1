use crate::game::gesture::Action;
use crate::game::timing::{BEATS_PER_CYCLE, Micros};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JudgeGrade {
    Perfect,
    Good,
    Ok,
    Poor,
    Miss,
}

impl JudgeGrade {
    #[inline(always)]
    pub const fn is_hit(self) -> bool {
        !matches!(self, JudgeGrade::Miss)
    }
}

/// Accuracy windows as fractions of the beat interval. A delta strictly
/// greater than a window falls into the next worse grade.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimingWindows {
    pub miss: f64,
    pub poor: f64,
    pub ok: f64,
    pub perfect: f64,
}

impl Default for TimingWindows {
    fn default() -> Self {
        Self {
            miss: 0.35,
            poor: 0.25,
            ok: 0.15,
            perfect: 0.05,
        }
    }
}

impl TimingWindows {
    /// True when `miss > poor > ok > perfect > 0`, which keeps every grade reachable.
    pub fn is_monotonic(&self) -> bool {
        self.miss > self.poor && self.poor > self.ok && self.ok > self.perfect && self.perfect > 0.0
    }

    pub fn grade(&self, delta: Micros, interval: Micros) -> JudgeGrade {
        let fraction = delta.unsigned_abs() as f64 / interval as f64;
        if fraction > self.miss {
            JudgeGrade::Miss
        } else if fraction > self.poor {
            JudgeGrade::Poor
        } else if fraction > self.ok {
            JudgeGrade::Ok
        } else if fraction > self.perfect {
            JudgeGrade::Good
        } else {
            JudgeGrade::Perfect
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Judgment {
    pub beat: usize,
    /// Press time minus the beat's deadline: negative when early.
    pub time_error: Micros,
    pub grade: JudgeGrade,
    pub action: Action,
}

/// Snaps `press` to the beat whose deadline is closest. Ties keep the lowest index.
pub fn nearest_beat(deadlines: &[Micros; BEATS_PER_CYCLE], press: Micros) -> (usize, Micros) {
    let mut best = 0;
    let mut smallest = Micros::MAX;
    for (beat, deadline) in deadlines.iter().enumerate() {
        let delta = (press - deadline).abs();
        if delta < smallest {
            smallest = delta;
            best = beat;
        }
    }
    (best, press - deadlines[best])
}

pub fn judge(
    deadlines: &[Micros; BEATS_PER_CYCLE],
    interval: Micros,
    windows: &TimingWindows,
    press: Micros,
    action: Action,
) -> Judgment {
    let (beat, time_error) = nearest_beat(deadlines, press);
    Judgment {
        beat,
        time_error,
        grade: windows.grade(time_error, interval),
        action,
    }
}

/// Per-beat buffered actions. A slot is written only while it is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionSlots {
    slots: [Action; BEATS_PER_CYCLE],
}

impl ActionSlots {
    #[inline(always)]
    pub fn get(&self, beat: usize) -> Action {
        self.slots[beat]
    }

    /// Returns false, leaving the slot as is, when it already holds input.
    pub fn try_write(&mut self, beat: usize, action: Action) -> bool {
        if self.slots[beat].is_input() {
            return false;
        }
        self.slots[beat] = action;
        true
    }

    /// Takes the slot's action, leaving `NoInput` behind.
    pub fn take(&mut self, beat: usize) -> Action {
        std::mem::take(&mut self.slots[beat])
    }

    pub fn clear(&mut self, beat: usize) {
        self.slots[beat] = Action::NoInput;
    }

    pub fn flush(&mut self) {
        self.slots = Default::default();
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|a| !a.is_input())
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionSlots, JudgeGrade, TimingWindows, judge, nearest_beat};
    use crate::game::gesture::Action;

    const INTERVAL: i64 = 857_000;
    const DEADLINES: [i64; 4] = [0, 857_000, 1_714_000, 2_571_000];

    #[test]
    fn press_just_before_beat_one_is_perfect_and_early() {
        let j = judge(
            &DEADLINES,
            INTERVAL,
            &TimingWindows::default(),
            850_000,
            Action::SwipeUp,
        );
        assert_eq!(j.beat, 1);
        assert_eq!(j.time_error, -7_000);
        assert_eq!(j.grade, JudgeGrade::Perfect);
    }

    #[test]
    fn grade_buckets_follow_window_order() {
        let w = TimingWindows::default();
        let at = |fraction: f64| w.grade((fraction * INTERVAL as f64) as i64, INTERVAL);
        assert_eq!(at(0.0), JudgeGrade::Perfect);
        assert_eq!(at(0.05), JudgeGrade::Perfect);
        assert_eq!(at(0.10), JudgeGrade::Good);
        assert_eq!(at(0.20), JudgeGrade::Ok);
        assert_eq!(at(0.30), JudgeGrade::Poor);
        assert_eq!(at(0.36), JudgeGrade::Miss);
        assert_eq!(w.grade(-(INTERVAL / 5), INTERVAL), JudgeGrade::Ok, "late and early grade alike");
    }

    #[test]
    fn every_grade_is_reachable_with_defaults() {
        let w = TimingWindows::default();
        assert!(w.is_monotonic());
        let inverted = TimingWindows {
            perfect: 0.2,
            ..TimingWindows::default()
        };
        assert!(!inverted.is_monotonic(), "perfect above ok hides the good bucket");
    }

    #[test]
    fn ties_go_to_the_lowest_beat() {
        let deadlines = [0, 1_000, 2_000, 3_000];
        assert_eq!(nearest_beat(&deadlines, 500), (0, 500));
        assert_eq!(nearest_beat(&deadlines, 1_500), (1, 500));
    }

    #[test]
    fn stale_deadlines_in_the_past_still_compare_signed() {
        // Beat 3's deadline is from the previous cycle; no wraparound surprises.
        let deadlines = [4_000_000, 4_857_000, 1_714_000, 2_571_000];
        let (beat, err) = nearest_beat(&deadlines, 3_990_000);
        assert_eq!(beat, 0);
        assert_eq!(err, -10_000);
    }

    #[test]
    fn first_writer_wins() {
        let mut slots = ActionSlots::default();
        assert!(slots.try_write(1, Action::SwipeLeft));
        assert!(!slots.try_write(1, Action::Tap));
        assert_eq!(slots.get(1), Action::SwipeLeft);
        assert_eq!(slots.take(1), Action::SwipeLeft);
        assert_eq!(slots.get(1), Action::NoInput);
        assert!(slots.try_write(1, Action::Tap));
        slots.flush();
        assert!(slots.is_empty());
    }
}
