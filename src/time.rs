//! Frame clock for one display surface.
//!
//! Measures wall time between frames, excludes time spent paused, and can be
//! driven by hand with [`Time::advance`] when the host supplies its own
//! frame deltas.
//!
//! # Example
//!
//! ```
//! use orbscape::time::Time;
//!
//! let mut time = Time::new();
//! time.advance(0.5);
//! time.advance(0.25);
//! assert_eq!(time.frame(), 2);
//! assert!((time.elapsed() - 0.75).abs() < 1e-6);
//! ```

use std::time::{Duration, Instant};

/// Elapsed/delta bookkeeping with pause support.
#[derive(Debug)]
pub struct Time {
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    /// Replaces the measured delta when set.
    fixed_delta: Option<f32>,
    time_scale: f32,
}

impl Time {
    /// Create a clock starting now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
        }
    }

    /// Measure the wall time since the previous frame. Call once per frame.
    ///
    /// Returns `(elapsed, delta)`. While paused the delta is zero.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();
        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, self.delta_secs);
        }

        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.accumulate(self.fixed_delta.unwrap_or(raw_delta));

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        (self.elapsed_secs, self.delta_secs)
    }

    /// Step the clock by a host-supplied `delta` instead of measuring.
    ///
    /// Ignored while paused. Negative or non-finite deltas count as zero.
    pub fn advance(&mut self, delta: f32) -> (f32, f32) {
        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, self.delta_secs);
        }
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        self.last_frame = Instant::now();
        self.accumulate(delta);
        (self.elapsed_secs, self.delta_secs)
    }

    fn accumulate(&mut self, raw: f32) {
        self.delta_secs = raw * self.time_scale;
        self.elapsed_secs += self.delta_secs;
        self.frame_count += 1;
    }

    /// Seconds of unpaused time.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Delta of the most recent frame.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Stop the clock. `elapsed()` holds until [`Time::resume`].
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Restart the clock. Wall time spent paused is skipped.
    pub fn resume(&mut self) {
        if self.paused {
            let now = Instant::now();
            self.last_frame = now;
            self.fps_update_time = now;
            self.fps_frame_count = self.frame_count;
            self.paused = false;
        }
    }

    /// Use a fixed delta for every [`Time::update`]. `None` measures again.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Speed multiplier, clamped to be non-negative.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Back to zero, running.
    pub fn reset(&mut self) {
        let fixed_delta = self.fixed_delta;
        let time_scale = self.time_scale;
        *self = Self::new();
        self.fixed_delta = fixed_delta;
        self.time_scale = time_scale;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
