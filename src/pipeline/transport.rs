// Play/stop state machine and the step cursor. The transport never reads a
// clock itself: the controller feeds it elapsed time from a `ClockSource`.

use std::time::{Duration, Instant};

use crate::shared::{BPM_MAX, BPM_MIN, DEFAULT_BPM, NUM_STEPS};

/// Length of one sixteenth note at `bpm`, in milliseconds.
pub fn step_interval_ms(bpm: u32) -> f64 {
    60_000.0 / bpm as f64 / 4.0
}

pub fn step_interval(bpm: u32) -> Duration {
    Duration::from_secs_f64(step_interval_ms(bpm) / 1000.0)
}

pub fn clamp_bpm(bpm: u32) -> u32 {
    bpm.clamp(BPM_MIN, BPM_MAX)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Running,
}

#[derive(Clone, Debug)]
pub struct Transport {
    state: PlayState,
    bpm: u32,
    current_step: usize,
    acc: Duration, // time since the last tick
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(DEFAULT_BPM)
    }
}

impl Transport {
    pub fn new(bpm: u32) -> Self {
        Self {
            state: PlayState::Stopped,
            bpm: clamp_bpm(bpm),
            current_step: 0,
            acc: Duration::ZERO,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Running
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn interval(&self) -> Duration {
        step_interval(self.bpm)
    }

    /// Rewind to step 0 and start counting. The first tick is due one
    /// interval from now.
    pub fn start(&mut self) {
        self.state = PlayState::Running;
        self.current_step = 0;
        self.acc = Duration::ZERO;
        log::debug!(target: "transport", "start at {} bpm", self.bpm);
    }

    pub fn stop(&mut self) {
        self.state = PlayState::Stopped;
        self.acc = Duration::ZERO;
        log::debug!(target: "transport", "stop");
    }

    /// Clamp and apply a tempo. A running transport restarts so the new
    /// interval takes effect, which puts the cursor back at 0.
    /// Returns true if it restarted.
    pub fn set_bpm(&mut self, bpm: u32) -> bool {
        self.bpm = clamp_bpm(bpm);
        if self.is_playing() {
            self.stop();
            self.start();
            return true;
        }
        false
    }

    /// Account for `elapsed` wall time and return how many ticks are due.
    /// A stall longer than one bar collapses to one bar's worth of ticks.
    pub fn due_ticks(&mut self, elapsed: Duration) -> usize {
        if !self.is_playing() {
            return 0;
        }
        let interval = self.interval();
        self.acc += elapsed;
        let mut ticks = 0;
        while self.acc >= interval {
            self.acc -= interval;
            ticks += 1;
            if ticks == NUM_STEPS {
                self.acc = Duration::ZERO;
                log::debug!(target: "transport", "fell a bar behind, dropping backlog");
                break;
            }
        }
        ticks
    }

    /// Move the cursor on by one step, wrapping at 16. Returns the new step.
    pub fn advance(&mut self) -> usize {
        self.current_step = (self.current_step + 1) % NUM_STEPS;
        self.current_step
    }
}

/// Where elapsed time comes from: the wall clock when running, a hand-cranked
/// clock in tests.
pub trait ClockSource {
    /// Time since the previous call.
    fn elapsed(&mut self) -> Duration;
}

pub struct SystemClock {
    last: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self { last: Instant::now() }
    }
}

impl ClockSource for SystemClock {
    fn elapsed(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now - self.last;
        self.last = now;
        elapsed
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct ManualClock {
    pending: Duration,
}

#[cfg(test)]
impl ManualClock {
    pub fn advance(&mut self, by: Duration) {
        self.pending += by;
    }
}

#[cfg(test)]
impl ClockSource for ManualClock {
    fn elapsed(&mut self) -> Duration {
        std::mem::take(&mut self.pending)
    }
}
