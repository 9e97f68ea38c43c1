use log::debug;

/// Timestamps on the session timeline, in microseconds. Always signed so that
/// differences in either direction are plain subtraction.
pub type Micros = i64;

pub const BEATS_PER_CYCLE: usize = 4;

#[inline(always)]
pub const fn micros_to_ms(us: Micros) -> i64 {
    // Half away from zero.
    if us >= 0 {
        (us + 500) / 1000
    } else {
        (us - 500) / 1000
    }
}

/// Converts a tempo into the length of one beat. Callers validate `bpm` first.
#[inline(always)]
pub fn interval_for_bpm(bpm: f64) -> Micros {
    (60_000_000.0 / bpm).round() as Micros
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatTransition {
    pub from: usize,
    pub to: usize,
}

impl BeatTransition {
    /// Beat 1→2 or 3→0: the Input and Output windows meet here.
    #[inline(always)]
    pub fn crosses_window(&self) -> bool {
        window_of(self.from) != window_of(self.to)
    }
}

/// 0 for the first half of the cycle (beats 0–1), 1 for the second (beats 2–3).
#[inline(always)]
pub const fn window_of(beat: usize) -> usize {
    beat / 2
}

#[derive(Debug, Clone)]
pub struct BeatClock {
    start: Micros,
    interval: Micros,
    current_beat: usize,
    /// The instant each beat was (or will be) declared current. Refreshed only
    /// on a beat transition.
    deadlines: [Micros; BEATS_PER_CYCLE],
}

impl BeatClock {
    pub fn new(start: Micros, interval: Micros) -> Self {
        debug_assert!(interval > 0, "beat interval must be positive");
        let mut deadlines = [0; BEATS_PER_CYCLE];
        for (i, deadline) in deadlines.iter_mut().enumerate() {
            *deadline = start + interval * i as Micros;
        }
        Self {
            start,
            interval,
            current_beat: 0,
            deadlines,
        }
    }

    #[inline(always)]
    pub fn interval(&self) -> Micros {
        self.interval
    }

    #[inline(always)]
    pub fn current_beat(&self) -> usize {
        self.current_beat
    }

    #[inline(always)]
    pub fn deadlines(&self) -> &[Micros; BEATS_PER_CYCLE] {
        &self.deadlines
    }

    /// Time since the clock started (the "song time").
    #[inline(always)]
    pub fn song_time(&self, now: Micros) -> Micros {
        now - self.start
    }

    /// The beat index `now` falls in, without touching clock state.
    pub fn beat_index_at(&self, now: Micros) -> usize {
        let beats = self.song_time(now).div_euclid(self.interval);
        beats.rem_euclid(BEATS_PER_CYCLE as Micros) as usize
    }

    /// Advances the clock to `now`. Returns the transition when the beat index
    /// changed since the previous update.
    pub fn update(&mut self, now: Micros) -> Option<BeatTransition> {
        let new_beat = self.beat_index_at(now);
        if new_beat == self.current_beat {
            return None;
        }

        let transition = BeatTransition {
            from: self.current_beat,
            to: new_beat,
        };
        self.current_beat = new_beat;
        self.deadlines[new_beat] = now;
        self.deadlines[(new_beat + 1) % BEATS_PER_CYCLE] = now + self.interval;
        debug!(
            "Beat {} -> {} at {}ms",
            transition.from,
            transition.to,
            micros_to_ms(self.song_time(now))
        );
        Some(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::{BeatClock, BeatTransition, interval_for_bpm, micros_to_ms};

    const INTERVAL: i64 = 857_000;

    #[test]
    fn beat_index_follows_floor_mod_four() {
        let clock = BeatClock::new(1_000, INTERVAL);
        for step in 0..40i64 {
            let t = 1_000 + step * 123_457;
            let expected = (((t - 1_000) / INTERVAL) % 4) as usize;
            assert_eq!(clock.beat_index_at(t), expected, "t = {}", t);
        }
    }

    #[test]
    fn update_reports_each_transition_once() {
        let mut clock = BeatClock::new(0, INTERVAL);
        assert_eq!(clock.update(100), None);
        assert_eq!(
            clock.update(INTERVAL + 5),
            Some(BeatTransition { from: 0, to: 1 })
        );
        assert_eq!(clock.update(INTERVAL + 10), None);
        assert_eq!(clock.current_beat(), 1);
    }

    #[test]
    fn transition_refreshes_current_and_next_deadline() {
        let mut clock = BeatClock::new(0, INTERVAL);
        let now = 2 * INTERVAL + 3_000;
        clock.update(now);
        assert_eq!(clock.deadlines()[2], now);
        assert_eq!(clock.deadlines()[3], now + INTERVAL);
        // Untouched deadlines keep their initial schedule.
        assert_eq!(clock.deadlines()[0], 0);
        assert_eq!(clock.deadlines()[1], INTERVAL);
    }

    #[test]
    fn wraparound_is_reported_as_window_crossing() {
        let mut clock = BeatClock::new(0, INTERVAL);
        let mut crossings = Vec::new();
        for beat in 1..=8i64 {
            if let Some(t) = clock.update(beat * INTERVAL + 1) {
                crossings.push((t.to, t.crosses_window()));
            }
        }
        assert_eq!(
            crossings,
            vec![
                (1, false),
                (2, true),
                (3, false),
                (0, true),
                (1, false),
                (2, true),
                (3, false),
                (0, true)
            ]
        );
    }

    #[test]
    fn seventy_bpm_is_857ms() {
        assert_eq!(micros_to_ms(interval_for_bpm(70.0)), 857);
        assert_eq!(micros_to_ms(-7_400), -7);
        assert_eq!(micros_to_ms(-7_600), -8);
    }
}
