//! Fixed timestep accumulator
//!
//! Turns irregular frame timestamps into a whole number of fixed-size
//! simulation ticks. Wall-clock time beyond `max_frame_delta` per frame is
//! discarded so a stall (tab in background, debugger) never triggers an
//! unbounded catch-up.

use crate::consts::{FIXED_DT, MAX_FRAME_DELTA};

/// What one frame callback did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStep {
    /// Clamped frame delta (seconds)
    pub dt: f64,
    /// Simulation ticks executed
    pub ticks: u32,
    /// Wall-clock time thrown away by the clamp (seconds)
    pub discarded: f64,
}

#[derive(Debug, Clone)]
pub struct TimeStepper {
    fixed_dt: f64,
    max_frame_delta: f64,
    max_ticks: u32,
    accumulator: f64,
    last_frame: Option<f64>,
}

impl Default for TimeStepper {
    fn default() -> Self {
        Self::new(FIXED_DT, MAX_FRAME_DELTA)
    }
}

impl TimeStepper {
    pub fn new(fixed_dt: f64, max_frame_delta: f64) -> Self {
        let fixed_dt = fixed_dt.max(1e-6);
        let max_frame_delta = max_frame_delta.max(fixed_dt);
        Self {
            fixed_dt,
            max_frame_delta,
            max_ticks: (max_frame_delta / fixed_dt).round().max(1.0) as u32,
            accumulator: 0.0,
            last_frame: None,
        }
    }

    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// Leftover time not yet consumed by a tick
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Forget timing history (run restart)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last_frame = None;
    }

    /// Feed a frame timestamp (seconds, monotonic) and run due ticks
    ///
    /// The first call only records the timestamp. `tick` receives the fixed
    /// step and is called zero or more times.
    pub fn advance(&mut self, now: f64, mut tick: impl FnMut(f64)) -> FrameStep {
        let raw = match self.last_frame {
            Some(last) => now - last,
            None => 0.0,
        };
        self.last_frame = Some(now);

        let raw = if raw.is_finite() { raw.max(0.0) } else { 0.0 };
        let dt = raw.min(self.max_frame_delta);
        let mut discarded = raw - dt;
        self.accumulator += dt;

        let mut ticks = 0;
        while self.accumulator >= self.fixed_dt && ticks < self.max_ticks {
            tick(self.fixed_dt);
            self.accumulator -= self.fixed_dt;
            ticks += 1;
        }

        // Only reachable through rounding at the cap
        if self.accumulator >= self.fixed_dt {
            let excess = (self.accumulator / self.fixed_dt).floor() * self.fixed_dt;
            self.accumulator -= excess;
            discarded += excess;
        }

        if discarded > 0.0 {
            log::debug!("Frame delta clamped, dropped {:.3}s", discarded);
        }

        FrameStep {
            dt,
            ticks,
            discarded,
        }
    }
}

/// Frames-per-second estimate refreshed every quarter second
#[derive(Debug, Clone, Default)]
pub struct FpsMeter {
    frames: u32,
    elapsed: f64,
    fps: u32,
}

impl FpsMeter {
    const WINDOW: f64 = 0.25;

    pub fn record(&mut self, dt: f64) {
        self.elapsed += dt;
        self.frames += 1;
        if self.elapsed > Self::WINDOW {
            self.fps = (self.frames as f64 / self.elapsed) as u32;
            self.frames = 0;
            self.elapsed = 0.0;
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Frame time in milliseconds for the overlay
    pub fn frame_ms(&self) -> f64 {
        1000.0 / self.fps.max(1) as f64
    }
}
