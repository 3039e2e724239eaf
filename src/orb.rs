//! Small per-item orb indicators.
//!
//! Each [`OrbRenderer`] is an independent orb-kind surface: its accent color
//! comes from an item identifier, its surface is a `display_size` pixel
//! square, and it can fire burst events through its own sampler. Orbs share
//! nothing with each other.

use glam::{Vec2, Vec3};

use crate::color::id_to_color;
use crate::lifecycle::{
    LifecycleState, RenderBackend, SurfaceLifecycle, SurfaceSettings, Viewport,
};
use crate::scene::SceneKind;
use crate::trigger::{BurstSampler, SamplerConfig};

/// One orb bound to an item identifier.
pub struct OrbRenderer<B: RenderBackend> {
    identity: String,
    accent: Vec3,
    display_size: u32,
    surface: SurfaceLifecycle<B>,
}

impl<B: RenderBackend> OrbRenderer<B> {
    /// Orb for `identity`, seeded by `settings.seed`.
    ///
    /// `settings.kind` is forced to [`SceneKind::Orb`].
    pub fn new(backend: B, identity: &str, settings: SurfaceSettings, display_size: u32) -> Self {
        let accent = id_to_color(identity);
        let settings = SurfaceSettings {
            kind: SceneKind::Orb,
            ..settings
        };
        Self {
            identity: identity.to_string(),
            accent,
            display_size: display_size.max(1),
            surface: SurfaceLifecycle::new(backend, settings).with_accent(accent),
        }
    }

    /// Attach a sampler that calls `on_event` whenever it fires.
    pub fn with_events<F>(mut self, config: SamplerConfig, on_event: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let sampler = BurstSampler::new(config).on_fire(on_event);
        self.surface = self.surface.with_sampler(sampler);
        self
    }

    /// Mount on a square surface and start the frame loop.
    pub fn mount(&mut self) -> LifecycleState {
        self.surface.mount(Viewport::square(self.display_size));
        self.surface.start()
    }

    /// Change the edge length. Never rebuilds the orb.
    pub fn set_display_size(&mut self, size: u32) {
        self.display_size = size.max(1);
        self.surface.resize(Viewport::square(self.display_size));
    }

    pub fn set_magnitude(&mut self, magnitude: f64) {
        self.surface.set_magnitude(magnitude);
    }

    pub fn set_high_activity(&mut self, high_activity: bool) {
        self.surface.set_high_activity(high_activity);
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.surface.set_visible(visible);
    }

    pub fn configure(&mut self, seed: &str, evolution: i32) {
        self.surface.configure(seed, evolution);
    }

    /// One frame of `dt` seconds plus an event tick.
    ///
    /// Returns whether a burst fired.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.surface.advance(dt);
        self.surface.tick_events(dt as f64)
    }

    pub fn pointer_move(&mut self, position: Vec2) -> Option<Vec2> {
        self.surface.pointer_move(position)
    }

    pub fn click(&mut self) {
        self.surface.click();
    }

    pub fn dispose(&mut self) {
        self.surface.dispose();
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn accent(&self) -> Vec3 {
        self.accent
    }

    pub fn display_size(&self) -> u32 {
        self.display_size
    }

    pub fn surface(&self) -> &SurfaceLifecycle<B> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut SurfaceLifecycle<B> {
        &mut self.surface
    }
}
