//! Frame pacing
//!
//! Turns display-refresh ticks of arbitrary cadence into whole emulated
//! frames using a time accumulator. Time is passed in as seconds so the
//! pacer itself never reads a clock.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Largest tick delta honoured; longer gaps (host suspended) are clamped
pub const MAX_TICK_DELTA: f64 = 0.1;
/// Catch-up cap per tick
pub const MAX_STEPS_PER_TICK: u32 = 3;
/// Steps per tick while fast-forwarding
pub const FAST_FORWARD_STEPS: u32 = 3;
/// Rate used when the core reports none
pub const DEFAULT_FPS: f64 = 60.0;

/// Pacer lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacerState {
    /// No game loaded
    Unloaded,
    /// Game loaded, loop not started
    Loaded,
    Running,
    Paused,
    Stopped,
}

/// Accumulator state for one running loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    pub last_time: f64,
    /// Seconds of emulated time owed
    pub accumulator: f64,
    pub target_interval: f64,
}

impl FrameTiming {
    pub fn new(fps: f64, now: f64) -> Self {
        let fps = if fps > 0.0 && fps.is_finite() { fps } else { DEFAULT_FPS };
        Self {
            last_time: now,
            accumulator: 0.0,
            target_interval: 1.0 / fps,
        }
    }
}

/// Shared fast-forward switch. Clones flip the same flag.
#[derive(Debug, Clone, Default)]
pub struct FastForward(Arc<AtomicBool>);

impl FastForward {
    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::AcqRel)
    }
}

/// Result of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Core steps executed
    pub steps: u32,
    /// Fast-forward was switched off since the last tick; buffered audio is stale
    pub fast_forward_ended: bool,
}

/// Seconds source for the pacer
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall clock, seconds since creation
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock for deterministic runs
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            bits: AtomicU64::new(start.to_bits()),
        }
    }

    /// Move forward by `dt` seconds and return the new time
    pub fn advance(&self, dt: f64) -> f64 {
        let now = self.now() + dt;
        self.bits.store(now.to_bits(), Ordering::Release);
        now
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

/// The run loop's scheduler
#[derive(Debug)]
pub struct FramePacer {
    state: PacerState,
    timing: FrameTiming,
    fast_forward: FastForward,
    was_fast_forward: bool,
    total_steps: u64,
}

impl FramePacer {
    pub fn new() -> Self {
        Self::with_fast_forward(FastForward::default())
    }

    pub fn with_fast_forward(fast_forward: FastForward) -> Self {
        Self {
            state: PacerState::Unloaded,
            timing: FrameTiming::new(DEFAULT_FPS, 0.0),
            fast_forward,
            was_fast_forward: false,
            total_steps: 0,
        }
    }

    pub fn state(&self) -> PacerState {
        self.state
    }

    pub fn timing(&self) -> &FrameTiming {
        &self.timing
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn fast_forward(&self) -> &FastForward {
        &self.fast_forward
    }

    /// A game is loaded and ready to start
    pub fn mark_loaded(&mut self) {
        self.state = PacerState::Loaded;
    }

    /// Back to no game at all
    pub fn mark_unloaded(&mut self) {
        self.state = PacerState::Unloaded;
    }

    /// Enter `Running` at `fps`, resetting the accumulator
    pub fn start(&mut self, fps: f64, now: f64) {
        self.timing = FrameTiming::new(fps, now);
        self.was_fast_forward = self.fast_forward.is_enabled();
        self.state = PacerState::Running;
        tracing::info!(
            "Frame loop started at {:.3} fps",
            1.0 / self.timing.target_interval
        );
    }

    /// `Running` to `Paused`. The accumulator is kept.
    pub fn pause(&mut self) -> bool {
        if self.state != PacerState::Running {
            return false;
        }
        self.state = PacerState::Paused;
        true
    }

    /// `Paused` to `Running`. The time spent paused is not owed.
    pub fn resume(&mut self, now: f64) -> bool {
        if self.state != PacerState::Paused {
            return false;
        }
        self.timing.last_time = now;
        self.state = PacerState::Running;
        true
    }

    /// Stop from any state
    pub fn stop(&mut self) {
        if self.state != PacerState::Unloaded {
            self.state = PacerState::Stopped;
        }
    }

    /// Report a fast-forward transition since the last check, if any
    pub fn poll_fast_forward(&mut self) -> Option<bool> {
        let now = self.fast_forward.is_enabled();
        if now == self.was_fast_forward {
            return None;
        }
        self.was_fast_forward = now;
        tracing::debug!("Fast-forward {}", if now { "on" } else { "off" });
        Some(now)
    }

    /// Handle one display tick at time `now`, calling `step` once per emulated frame
    pub fn tick<F: FnMut()>(&mut self, now: f64, mut step: F) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.state != PacerState::Running {
            return outcome;
        }
        outcome.fast_forward_ended = self.poll_fast_forward() == Some(false);

        let dt = (now - self.timing.last_time).clamp(0.0, MAX_TICK_DELTA);
        self.timing.last_time = now;

        if self.was_fast_forward {
            for _ in 0..FAST_FORWARD_STEPS {
                step();
            }
            outcome.steps = FAST_FORWARD_STEPS;
        } else {
            self.timing.accumulator += dt;
            while self.timing.accumulator >= self.timing.target_interval
                && outcome.steps < MAX_STEPS_PER_TICK
            {
                step();
                self.timing.accumulator -= self.timing.target_interval;
                outcome.steps += 1;
            }
        }

        self.total_steps += outcome.steps as u64;
        tracing::trace!("Tick: {} steps", outcome.steps);
        outcome
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new()
    }
}
