//! Resource lifecycle of one display surface.
//!
//! [`SurfaceLifecycle`] owns the scene, the backend resources built for it,
//! the camera and the event sampler. It moves through
//!
//! ```text
//! Uninitialized -> Built -> Running <-> Paused -> Disposed
//!        \                                  ^
//!         `-> Fallback ---------------------'
//! ```
//!
//! Resources are handed to [`RenderBackend::release`] by value, so each
//! allocation is released at most once; the lifecycle releases it on the
//! first rebuild or dispose, whichever comes first. Changing the seed or
//! evolution level rebuilds, everything else (magnitude, visibility,
//! resize, pointer input) reuses the live scene.

use glam::{Mat4, Vec2, Vec3};

use crate::camera::OrbitCamera;
use crate::color;
use crate::magnitude::{map_magnitude, ParameterTween, VisualParameters};
use crate::scene::{clamp_evolution, Scene, SceneBuilder, SceneKind};
use crate::seed::hash_to_seed;
use crate::time::Time;
use crate::trigger::BurstSampler;

/// Surface size in physical pixels. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Dimensions are raised to at least one pixel.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::square(1)
    }
}

/// Everything a backend needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub scene: &'a Scene,
    pub params: &'a VisualParameters,
    pub view_proj: Mat4,
    pub camera_right: Vec3,
    pub camera_up: Vec3,
    /// Scene clock in seconds.
    pub elapsed: f64,
    pub burst: f32,
}

/// A rendering capability the lifecycle drives.
///
/// `probe` runs once before anything is allocated. An `Err` there sends the
/// surface to the static fallback instead of half-building it.
pub trait RenderBackend {
    /// Per-scene resources (buffers, pipelines).
    type Resources;
    type Error: std::error::Error;

    /// Check the capability is available and acquire shared state.
    fn probe(&mut self, viewport: Viewport) -> Result<(), Self::Error>;

    /// Allocate resources for a freshly built scene.
    fn allocate(&mut self, scene: &Scene, viewport: Viewport) -> Result<Self::Resources, Self::Error>;

    /// Update viewport-dependent state. Must not reallocate scene resources.
    fn resize(&mut self, resources: &mut Self::Resources, viewport: Viewport);

    fn render(&mut self, resources: &mut Self::Resources, frame: &Frame<'_>) -> Result<(), Self::Error>;

    /// Free resources from [`RenderBackend::allocate`].
    fn release(&mut self, resources: Self::Resources);

    /// Drop shared state acquired in [`RenderBackend::probe`].
    fn shutdown(&mut self) {}
}

/// Where a surface is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Uninitialized,
    /// Scene and resources exist, no frame loop.
    Built,
    Running,
    /// Not visible. Resources kept, no frames, timers cleared.
    Paused,
    /// Rendering capability missing; only a static picture is shown.
    Fallback,
    Disposed,
}

/// Static picture shown when the backend is unavailable.
///
/// The lifecycle only describes the picture. Drawing it is up to the host,
/// since the backend that would draw it is the one that failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticFallback {
    pub kind: SceneKind,
    /// Fill color.
    pub color: Vec3,
    /// Glow strength in `[0, 1]`.
    pub glow: f32,
}

impl StaticFallback {
    pub fn new(kind: SceneKind, accent: Vec3, params: &VisualParameters) -> Self {
        Self {
            kind,
            color: accent,
            glow: 0.3 + 0.7 * params.intensity,
        }
    }

    /// Fill color as 8-bit RGB, for hosts drawing without a GPU.
    pub fn rgb8(&self) -> [u8; 3] {
        let c = (self.color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
        [c.x as u8, c.y as u8, c.z as u8]
    }
}

/// Allocation and release counts of backend resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceLedger {
    pub allocations: u64,
    pub releases: u64,
}

impl ResourceLedger {
    /// Resources currently held.
    pub fn outstanding(&self) -> u64 {
        self.allocations.saturating_sub(self.releases)
    }

    /// Every allocation has been released exactly once.
    pub fn is_balanced(&self) -> bool {
        self.allocations == self.releases
    }
}

/// Host-supplied inputs of a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSettings {
    pub kind: SceneKind,
    pub seed: String,
    /// Clamped to `0..=10` when used.
    pub evolution: i32,
    /// Clamped to `>= 0` when used.
    pub magnitude: f64,
    pub high_activity: bool,
    pub interactive: bool,
    pub visible: bool,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            kind: SceneKind::Chaos,
            seed: String::new(),
            evolution: 0,
            magnitude: 0.0,
            high_activity: false,
            interactive: false,
            visible: true,
        }
    }
}

impl SurfaceSettings {
    pub fn params(&self) -> VisualParameters {
        map_magnitude(self.magnitude, self.high_activity)
    }

    /// The `(seed, evolution)` pair a build depends on.
    fn build_key(&self) -> (u32, u8) {
        (hash_to_seed(&self.seed), clamp_evolution(self.evolution))
    }
}

/// Owns one surface's scene and backend resources.
pub struct SurfaceLifecycle<B: RenderBackend> {
    backend: B,
    state: LifecycleState,
    settings: SurfaceSettings,
    accent: Option<Vec3>,
    built_key: Option<(u32, u8)>,
    scene: Option<Scene>,
    resources: Option<B::Resources>,
    viewport: Viewport,
    camera: OrbitCamera,
    tween: ParameterTween,
    time: Time,
    sampler: Option<BurstSampler>,
    fallback: Option<StaticFallback>,
    ledger: ResourceLedger,
}

impl<B: RenderBackend> SurfaceLifecycle<B> {
    pub fn new(backend: B, settings: SurfaceSettings) -> Self {
        let mut time = Time::new();
        time.pause();
        Self {
            backend,
            state: LifecycleState::Uninitialized,
            camera: OrbitCamera::for_kind(settings.kind),
            tween: ParameterTween::new(settings.params()),
            settings,
            accent: None,
            built_key: None,
            scene: None,
            resources: None,
            viewport: Viewport::default(),
            time,
            sampler: None,
            fallback: None,
            ledger: ResourceLedger::default(),
        }
    }

    /// Attach a burst sampler, ticked by [`SurfaceLifecycle::tick_events`].
    ///
    /// The sampler's `burst_decay` sets how fast the scene glow fades.
    pub fn with_sampler(mut self, sampler: BurstSampler) -> Self {
        if let Some(scene) = self.scene.as_mut() {
            scene.set_burst_decay(sampler.config().burst_decay as f32);
        }
        self.sampler = Some(sampler);
        self
    }

    /// Accent color for the orb halo and the fallback picture.
    pub fn with_accent(mut self, accent: Vec3) -> Self {
        self.accent = Some(accent);
        self
    }

    /// Probe the backend and build the first scene.
    pub fn mount(&mut self, viewport: Viewport) -> LifecycleState {
        if self.state != LifecycleState::Uninitialized {
            log::warn!("mount ignored in state {:?}", self.state);
            return self.state;
        }
        self.viewport = viewport;
        self.camera.set_viewport(viewport);

        if let Err(e) = self.backend.probe(viewport) {
            log::warn!("rendering unavailable, using static fallback: {}", e);
            self.enter_fallback();
            return self.state;
        }

        self.tween.snap(self.settings.params());
        if self.build() {
            self.state = LifecycleState::Built;
        }
        self.state
    }

    /// Start the frame loop, paused if the surface is hidden.
    pub fn start(&mut self) -> LifecycleState {
        if self.state == LifecycleState::Built {
            if self.settings.visible {
                self.time.resume();
                self.state = LifecycleState::Running;
                log::info!("surface running");
            } else {
                self.state = LifecycleState::Paused;
            }
        }
        self.state
    }

    /// Stop the frame loop and clear timers. Resources stay allocated.
    pub fn stop(&mut self) -> LifecycleState {
        if matches!(self.state, LifecycleState::Running | LifecycleState::Paused) {
            self.time.pause();
            self.cancel_timers();
            self.state = LifecycleState::Built;
        }
        self.state
    }

    /// Visibility signal: toggles between running and paused.
    pub fn set_visible(&mut self, visible: bool) {
        self.settings.visible = visible;
        match (self.state, visible) {
            (LifecycleState::Running, false) => {
                self.time.pause();
                self.cancel_timers();
                self.state = LifecycleState::Paused;
                log::debug!("surface paused");
            }
            (LifecycleState::Paused, true) => {
                self.time.resume();
                self.state = LifecycleState::Running;
                log::debug!("surface resumed");
            }
            _ => {}
        }
    }

    pub fn set_seed(&mut self, seed: &str) {
        self.settings.seed = seed.to_string();
        self.rebuild_if_changed();
    }

    pub fn set_evolution(&mut self, level: i32) {
        self.settings.evolution = level;
        self.rebuild_if_changed();
    }

    /// Set seed and evolution together; rebuilds at most once.
    pub fn configure(&mut self, seed: &str, level: i32) {
        self.settings.seed = seed.to_string();
        self.settings.evolution = level;
        self.rebuild_if_changed();
    }

    /// Live magnitude. Eases the parameters, never rebuilds.
    ///
    /// NaN and negative values count as zero. Positive infinity saturates.
    pub fn set_magnitude(&mut self, magnitude: f64) {
        self.settings.magnitude = if magnitude.is_nan() { 0.0 } else { magnitude.max(0.0) };
        self.tween.retarget(self.settings.params());
    }

    pub fn set_high_activity(&mut self, high_activity: bool) {
        self.settings.high_activity = high_activity;
        self.tween.retarget(self.settings.params());
    }

    /// New surface size. Only the projection and backend viewport change.
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.camera.set_viewport(viewport);
        if let Some(resources) = self.resources.as_mut() {
            self.backend.resize(resources, viewport);
        }
        log::debug!("resized to {}x{}", viewport.width, viewport.height);
    }

    /// Run one frame with measured wall time. Returns whether a frame ran.
    pub fn frame(&mut self) -> bool {
        if self.state != LifecycleState::Running {
            return false;
        }
        let (_, dt) = self.time.update();
        self.run_frame(dt)
    }

    /// Run one frame of `dt` seconds. Returns whether a frame ran.
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.state != LifecycleState::Running {
            return false;
        }
        let (_, dt) = self.time.advance(dt);
        self.run_frame(dt)
    }

    fn run_frame(&mut self, dt: f32) -> bool {
        let (Some(scene), Some(resources)) = (self.scene.as_mut(), self.resources.as_mut()) else {
            return false;
        };

        let params = self.tween.update(dt);
        scene.step(dt, params);
        self.camera.update(dt, scene.interaction());
        let scene: &Scene = scene;

        let (camera_right, camera_up) = self.camera.right_up();
        let frame = Frame {
            scene,
            params,
            view_proj: self.camera.view_proj(),
            camera_right,
            camera_up,
            elapsed: scene.elapsed(),
            burst: scene.burst(),
        };
        if let Err(e) = self.backend.render(resources, &frame) {
            log::warn!("frame dropped: {}", e);
        }
        true
    }

    /// Advance the event sampler. Returns whether a burst fired.
    ///
    /// Only runs while the frame loop runs.
    pub fn tick_events(&mut self, dt: f64) -> bool {
        if self.state != LifecycleState::Running {
            return false;
        }
        let Some(sampler) = self.sampler.as_mut() else {
            return false;
        };
        let fired = sampler.tick(dt, self.settings.magnitude);
        if fired {
            if let Some(scene) = self.scene.as_mut() {
                scene.trigger_burst();
            }
        }
        fired
    }

    /// Pointer position in normalized device coordinates.
    ///
    /// Returns the movement since the last call when the surface is
    /// interactive.
    pub fn pointer_move(&mut self, position: Vec2) -> Option<Vec2> {
        self.scene.as_mut()?.pointer_move(position)
    }

    pub fn click(&mut self) {
        if let Some(scene) = self.scene.as_mut() {
            scene.click();
        }
    }

    /// Release everything. Further calls do nothing.
    pub fn dispose(&mut self) {
        if self.state == LifecycleState::Disposed {
            return;
        }
        self.time.pause();
        self.cancel_timers();
        self.release_scene();
        self.backend.shutdown();
        self.fallback = None;
        self.state = LifecycleState::Disposed;
        log::info!(
            "surface disposed ({} allocations, {} releases)",
            self.ledger.allocations,
            self.ledger.releases
        );
    }

    fn rebuild_if_changed(&mut self) {
        if !matches!(
            self.state,
            LifecycleState::Built | LifecycleState::Running | LifecycleState::Paused
        ) {
            return;
        }
        if self.built_key == Some(self.settings.build_key()) {
            return;
        }
        self.release_scene();
        self.build();
    }

    /// Build a scene and allocate its resources. Falls back on failure.
    fn build(&mut self) -> bool {
        let (seed, evolution) = self.settings.build_key();
        let mut builder = SceneBuilder::new(self.settings.kind, seed)
            .with_evolution(evolution as i32)
            .with_params(*self.tween.target())
            .with_interactive(self.settings.interactive);
        if let Some(accent) = self.accent {
            builder = builder.with_accent(accent);
        }
        let mut scene = builder.build();
        if let Some(sampler) = self.sampler.as_ref() {
            scene.set_burst_decay(sampler.config().burst_decay as f32);
        }

        match self.backend.allocate(&scene, self.viewport) {
            Ok(resources) => {
                self.ledger.allocations += 1;
                self.resources = Some(resources);
                self.scene = Some(scene);
                self.built_key = Some((seed, evolution));
                log::debug!("allocated resources for seed {:#010x} level {}", seed, evolution);
                true
            }
            Err(e) => {
                log::warn!("resource allocation failed, using static fallback: {}", e);
                self.enter_fallback();
                false
            }
        }
    }

    fn release_scene(&mut self) {
        if let Some(resources) = self.resources.take() {
            self.backend.release(resources);
            self.ledger.releases += 1;
            log::debug!("released scene resources");
        }
        self.scene = None;
        self.built_key = None;
    }

    fn enter_fallback(&mut self) {
        self.time.pause();
        self.cancel_timers();
        self.release_scene();
        self.backend.shutdown();
        let accent = self.accent.unwrap_or_else(|| color::id_to_color(""));
        self.fallback = Some(StaticFallback::new(self.settings.kind, accent, self.tween.target()));
        self.state = LifecycleState::Fallback;
    }

    fn cancel_timers(&mut self) {
        if let Some(sampler) = self.sampler.as_mut() {
            sampler.cancel();
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }

    pub fn settings(&self) -> &SurfaceSettings {
        &self.settings
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Parameters used by the most recent frame.
    pub fn params(&self) -> &VisualParameters {
        self.tween.current()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn ledger(&self) -> ResourceLedger {
        self.ledger
    }

    /// The picture to show while in [`LifecycleState::Fallback`].
    pub fn fallback(&self) -> Option<&StaticFallback> {
        self.fallback.as_ref()
    }

    pub fn sampler(&self) -> Option<&BurstSampler> {
        self.sampler.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: RenderBackend> Drop for SurfaceLifecycle<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "refused")
        }
    }

    impl std::error::Error for Refused {}

    /// Backend that hands out numbered tokens.
    #[derive(Default)]
    struct Tokens {
        fail_probe: bool,
        next: u32,
        live: Vec<u32>,
        frames: u32,
    }

    impl RenderBackend for Tokens {
        type Resources = u32;
        type Error = Refused;

        fn probe(&mut self, _: Viewport) -> Result<(), Refused> {
            if self.fail_probe {
                Err(Refused)
            } else {
                Ok(())
            }
        }

        fn allocate(&mut self, _: &Scene, _: Viewport) -> Result<u32, Refused> {
            self.next += 1;
            self.live.push(self.next);
            Ok(self.next)
        }

        fn resize(&mut self, _: &mut u32, _: Viewport) {}

        fn render(&mut self, _: &mut u32, _: &Frame<'_>) -> Result<(), Refused> {
            self.frames += 1;
            Ok(())
        }

        fn release(&mut self, token: u32) {
            self.live.retain(|t| *t != token);
        }
    }

    fn settings() -> SurfaceSettings {
        SurfaceSettings {
            seed: "unit".into(),
            ..SurfaceSettings::default()
        }
    }

    #[test]
    fn test_viewport_never_zero() {
        let v = Viewport::new(0, 0);
        assert_eq!((v.width, v.height), (1, 1));
        assert_eq!(Viewport::new(200, 100).aspect(), 2.0);
    }

    #[test]
    fn test_mount_start_dispose() {
        let mut surface = SurfaceLifecycle::new(Tokens::default(), settings());
        assert_eq!(surface.mount(Viewport::square(140)), LifecycleState::Built);
        assert_eq!(surface.start(), LifecycleState::Running);
        assert!(surface.advance(1.0 / 60.0));
        assert_eq!(surface.backend().frames, 1);
        surface.dispose();
        assert_eq!(surface.state(), LifecycleState::Disposed);
        assert!(surface.backend().live.is_empty());
        assert!(surface.ledger().is_balanced());
    }

    #[test]
    fn test_unchanged_configure_does_not_rebuild() {
        let mut surface = SurfaceLifecycle::new(Tokens::default(), settings());
        surface.mount(Viewport::square(140));
        surface.configure("unit", 0);
        surface.set_evolution(-4);
        assert_eq!(surface.ledger().allocations, 1);
        surface.set_evolution(2);
        assert_eq!(surface.ledger().allocations, 2);
        assert_eq!(surface.ledger().outstanding(), 1);
        assert_eq!(surface.backend().live, vec![2]);
    }

    #[test]
    fn test_capability_failure_falls_back() {
        let backend = Tokens {
            fail_probe: true,
            ..Tokens::default()
        };
        let mut surface = SurfaceLifecycle::new(backend, settings());
        assert_eq!(surface.mount(Viewport::square(140)), LifecycleState::Fallback);
        assert!(surface.fallback().is_some());
        assert!(surface.scene().is_none());
        assert_eq!(surface.start(), LifecycleState::Fallback);
        assert!(!surface.advance(0.1));
        assert_eq!(surface.ledger(), ResourceLedger::default());
    }

    #[test]
    fn test_magnitude_change_keeps_scene() {
        let mut surface = SurfaceLifecycle::new(Tokens::default(), settings());
        surface.mount(Viewport::square(140));
        surface.start();
        surface.set_magnitude(1e12);
        surface.set_high_activity(true);
        for _ in 0..120 {
            surface.advance(1.0 / 60.0);
        }
        assert_eq!(surface.ledger().allocations, 1);
        assert_eq!(surface.params().shell_count, 5);
        assert_eq!(surface.params().pulse_speed, 2.5);
    }

    #[test]
    fn test_negative_magnitude_clamped() {
        let mut surface = SurfaceLifecycle::new(Tokens::default(), settings());
        surface.set_magnitude(-5.0);
        assert_eq!(surface.settings().magnitude, 0.0);
        surface.set_magnitude(f64::NAN);
        assert_eq!(surface.settings().magnitude, 0.0);
        surface.set_magnitude(f64::INFINITY);
        assert_eq!(surface.settings().magnitude, f64::INFINITY);
        assert_eq!(surface.tween.target().intensity, 1.0);
    }
}
