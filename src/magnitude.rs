//! Magnitude mapping ("orb math").
//!
//! Turns a live, non-negative activity measurement into the handful of visual
//! knobs the simulation reads every frame. The curve is logarithmic: nothing
//! happens below 10³, and everything saturates at 10¹².

use serde::{Deserialize, Serialize};

/// Pulse speed when the caller flags high activity.
pub const HIGH_ACTIVITY_PULSE: f32 = 2.5;
/// Pulse speed otherwise.
pub const BASE_PULSE: f32 = 1.0;
/// Upper bound on the discrete shell count.
pub const MAX_SHELLS: u32 = 5;

/// Visual parameters derived from a magnitude value.
///
/// A plain value: recompute it whenever the magnitude changes (or every
/// frame) and hand it to [`Scene::step`](crate::scene::Scene::step) by
/// reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualParameters {
    /// Overall intensity in `[0, 1]`.
    pub intensity: f32,
    /// Number of visible halo shells, `1..=5`.
    pub shell_count: u32,
    /// Surface noise amount.
    pub noise: f32,
    /// Pulse speed multiplier.
    pub pulse_speed: f32,
    /// `log10(magnitude + 1)`.
    pub log_scale: f32,
}

impl Default for VisualParameters {
    fn default() -> Self {
        map_magnitude(0.0, false)
    }
}

/// Map a magnitude to visual parameters.
///
/// Total: negative and NaN magnitudes are treated as zero, positive infinity
/// saturates.
pub fn map_magnitude(magnitude: f64, high_activity: bool) -> VisualParameters {
    let magnitude = if magnitude.is_nan() || magnitude < 0.0 {
        0.0
    } else {
        magnitude
    };

    let scale = (magnitude + 1.0).log10();
    let intensity = ((scale - 3.0) / 9.0).clamp(0.0, 1.0) as f32;
    let shells = (1.0 + ((scale - 3.0) / 2.0).floor()).clamp(1.0, MAX_SHELLS as f64);

    VisualParameters {
        intensity,
        shell_count: shells as u32,
        noise: 0.02 + intensity * 0.03,
        pulse_speed: if high_activity {
            HIGH_ACTIVITY_PULSE
        } else {
            BASE_PULSE
        },
        log_scale: scale.min(f32::MAX as f64) as f32,
    }
}

/// Linearly interpolate between two parameter sets.
///
/// `t` is clamped to `[0, 1]`; the shell count is rounded to the nearest
/// integer.
pub fn interpolate(from: &VisualParameters, to: &VisualParameters, t: f32) -> VisualParameters {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let lerp = |a: f32, b: f32| a + (b - a) * t;

    VisualParameters {
        intensity: lerp(from.intensity, to.intensity),
        shell_count: lerp(from.shell_count as f32, to.shell_count as f32)
            .round()
            .clamp(1.0, MAX_SHELLS as f32) as u32,
        noise: lerp(from.noise, to.noise),
        pulse_speed: lerp(from.pulse_speed, to.pulse_speed),
        log_scale: lerp(from.log_scale, to.log_scale),
    }
}

/// Eases displayed parameters toward a target so abrupt magnitude changes
/// don't pop.
#[derive(Debug, Clone)]
pub struct ParameterTween {
    from: VisualParameters,
    to: VisualParameters,
    current: VisualParameters,
    progress: f32,
    duration: f32,
}

impl ParameterTween {
    /// Default transition length in seconds.
    pub const DEFAULT_DURATION: f32 = 0.8;

    /// Start settled on `initial`.
    pub fn new(initial: VisualParameters) -> Self {
        Self {
            from: initial,
            to: initial,
            current: initial,
            progress: 1.0,
            duration: Self::DEFAULT_DURATION,
        }
    }

    /// Set the transition length. Zero or negative snaps immediately.
    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration = seconds.max(0.0);
        self
    }

    /// Begin easing from the currently displayed value toward `target`.
    pub fn retarget(&mut self, target: VisualParameters) {
        if target == self.to {
            return;
        }
        self.from = self.current;
        self.to = target;
        self.progress = 0.0;
    }

    /// Jump straight to `target`.
    pub fn snap(&mut self, target: VisualParameters) {
        self.from = target;
        self.to = target;
        self.current = target;
        self.progress = 1.0;
    }

    /// Advance by `dt` seconds and return the displayed parameters.
    pub fn update(&mut self, dt: f32) -> &VisualParameters {
        if self.progress < 1.0 {
            self.progress = if self.duration > 0.0 && dt.is_finite() {
                (self.progress + dt.max(0.0) / self.duration).min(1.0)
            } else {
                1.0
            };
            // smoothstep
            let t = self.progress * self.progress * (3.0 - 2.0 * self.progress);
            self.current = interpolate(&self.from, &self.to, t);
        }
        &self.current
    }

    /// Currently displayed parameters.
    pub fn current(&self) -> &VisualParameters {
        &self.current
    }

    /// Parameters being eased toward.
    pub fn target(&self) -> &VisualParameters {
        &self.to
    }

    /// Whether the transition has finished.
    pub fn is_settled(&self) -> bool {
        self.progress >= 1.0
    }
}
