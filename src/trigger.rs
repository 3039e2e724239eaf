//! Probabilistic burst events driven by live magnitude.
//!
//! The sampler models unrepeatable outside activity, so it draws from an
//! ordinary entropy-seeded generator and never touches the scene's
//! [`SeedStream`](crate::seed::SeedStream).
//!
//! Every `tick_interval` seconds it fires with probability
//! `1 - exp(-interval * magnitude * rate_constant)`, provided its cooldown
//! has run out. A firing resets the cooldown to
//! `min(max_cooldown, cooldown_scale / magnitude)` and invokes the callback.
//! The glow a firing produces lives on the scene, which fades it at
//! `burst_decay` per second.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Sampler tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Events per unit magnitude per second.
    pub rate_constant: f64,
    /// Numerator of the cooldown after a firing.
    pub cooldown_scale: f64,
    /// Cooldown ceiling in seconds.
    pub max_cooldown: f64,
    /// Seconds between probability evaluations.
    pub tick_interval: f64,
    /// Per-second decay of the scene glow started by a firing.
    pub burst_decay: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            rate_constant: 1e-13,
            cooldown_scale: 2e12,
            max_cooldown: 10.0,
            tick_interval: 0.5,
            burst_decay: 1.5,
        }
    }
}

impl SamplerConfig {
    /// Probability of firing in one interval at `magnitude`.
    pub fn fire_probability(&self, interval: f64, magnitude: f64) -> f64 {
        let lambda = interval * magnitude.max(0.0) * self.rate_constant;
        if lambda.is_nan() {
            0.0
        } else {
            1.0 - (-lambda).exp()
        }
    }

    /// Cooldown started by a firing at `magnitude`.
    pub fn cooldown_for(&self, magnitude: f64) -> f64 {
        if magnitude > 0.0 {
            (self.cooldown_scale / magnitude).min(self.max_cooldown)
        } else {
            self.max_cooldown
        }
    }
}

type Callback = Box<dyn FnMut() + Send>;

/// Cooldown-limited Poisson sampler with its own timers.
pub struct BurstSampler<R: Rng = SmallRng> {
    config: SamplerConfig,
    rng: R,
    accumulator: f64,
    cooldown: f64,
    fired: u64,
    callback: Option<Callback>,
}

impl BurstSampler<SmallRng> {
    /// Sampler backed by an entropy-seeded generator.
    pub fn new(config: SamplerConfig) -> Self {
        Self::with_rng(config, SmallRng::from_entropy())
    }
}

impl<R: Rng> BurstSampler<R> {
    /// Sampler drawing from `rng`.
    pub fn with_rng(config: SamplerConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            accumulator: 0.0,
            cooldown: 0.0,
            fired: 0,
            callback: None,
        }
    }

    /// Call `callback` every time the sampler fires.
    pub fn on_fire<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Replace the callback after construction.
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Advance the timers by `dt` seconds. Returns `true` if a burst fired.
    ///
    /// At most one burst fires per call.
    pub fn tick(&mut self, dt: f64, magnitude: f64) -> bool {
        if !dt.is_finite() || dt <= 0.0 {
            return false;
        }
        let magnitude = if magnitude.is_nan() { 0.0 } else { magnitude.max(0.0) };

        self.cooldown = (self.cooldown - dt).max(0.0);
        self.accumulator += dt;

        let interval = self.config.tick_interval.max(f64::EPSILON);
        let mut fired = false;
        while self.accumulator >= interval {
            self.accumulator -= interval;
            if fired || self.cooldown > 0.0 {
                continue;
            }
            let p = self.config.fire_probability(interval, magnitude);
            if p > 0.0 && self.rng.gen::<f64>() < p {
                self.fire(magnitude);
                fired = true;
            }
        }
        fired
    }

    fn fire(&mut self, magnitude: f64) {
        self.cooldown = self.config.cooldown_for(magnitude);
        self.fired += 1;
        log::debug!("burst fired, cooldown {:.2}s", self.cooldown);
        if let Some(callback) = self.callback.as_mut() {
            callback();
        }
    }

    /// Seconds until the sampler may fire again.
    pub fn cooldown(&self) -> f64 {
        self.cooldown
    }

    /// Bursts fired so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Drop pending timer state. The callback and fire count are kept.
    pub fn cancel(&mut self) {
        self.accumulator = 0.0;
        self.cooldown = 0.0;
    }
}

impl<R: Rng> std::fmt::Debug for BurstSampler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BurstSampler")
            .field("config", &self.config)
            .field("accumulator", &self.accumulator)
            .field("cooldown", &self.cooldown)
            .field("fired", &self.fired)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
