//! Windowed host for one scene.
//!
//! Keys: `↑`/`↓` scale the magnitude by ten, `←`/`→` change the evolution
//! level, `N` reseeds, `H` toggles high activity. Clicking pulses the scene
//! and moving the pointer tilts it when the config marks it interactive.
//!
//! The window has no drawing path besides wgpu. When the surface lands in
//! the static fallback, the host names the fallback color in the title bar
//! and leaves the client area to the platform.

use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::config::SceneConfig;
use crate::error::AppError;
use crate::gpu::GpuBackend;
use crate::lifecycle::{LifecycleState, SurfaceLifecycle, Viewport};
use crate::scene::{SceneKind, MAX_EVOLUTION};
use crate::trigger::BurstSampler;

const MAX_MAGNITUDE: f64 = 1e15;

/// Run `config` in a new window until it is closed.
pub fn run(config: SceneConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct App {
    config: SceneConfig,
    window: Option<Arc<Window>>,
    surface: Option<SurfaceLifecycle<GpuBackend>>,
    error: Option<AppError>,
    last_tick: Instant,
    reseeds: u32,
}

impl App {
    fn new(config: SceneConfig) -> Self {
        Self {
            config,
            window: None,
            surface: None,
            error: None,
            last_tick: Instant::now(),
            reseeds: 0,
        }
    }

    fn create(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let (width, height) = match self.config.kind {
            SceneKind::Chaos => (self.config.window.width, self.config.window.height),
            SceneKind::Orb => (self.config.display_size, self.config.display_size),
        };
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(width.max(1), height.max(1)));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let sampler = BurstSampler::new(self.config.sampler).on_fire(|| log::info!("burst event"));
        let mut surface = SurfaceLifecycle::new(GpuBackend::new(window.clone()), self.config.settings())
            .with_sampler(sampler);
        if self.config.kind == SceneKind::Orb {
            surface = surface.with_accent(crate::color::id_to_color(&self.config.identity));
        }

        let size = window.inner_size();
        if surface.mount(Viewport::new(size.width, size.height)) == LifecycleState::Fallback {
            if let Some(fallback) = surface.fallback() {
                let [r, g, b] = fallback.rgb8();
                window.set_title(&format!(
                    "{} (static #{:02x}{:02x}{:02x}, glow {:.2})",
                    self.config.window.title, r, g, b, fallback.glow
                ));
                log::warn!("showing static fallback {:?}", fallback);
            }
        }
        surface.start();

        window.request_redraw();
        self.window = Some(window);
        self.surface = Some(surface);
        Ok(())
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        match &event.logical_key {
            Key::Named(NamedKey::ArrowUp) => {
                let m = surface.settings().magnitude;
                let next = if m < 1.0 { 1e3 } else { (m * 10.0).min(MAX_MAGNITUDE) };
                surface.set_magnitude(next);
                log::info!("magnitude {:e}", next);
            }
            Key::Named(NamedKey::ArrowDown) => {
                let m = surface.settings().magnitude / 10.0;
                let next = if m < 1e3 { 0.0 } else { m };
                surface.set_magnitude(next);
                log::info!("magnitude {:e}", next);
            }
            Key::Named(NamedKey::ArrowRight) | Key::Named(NamedKey::ArrowLeft) => {
                let step = if event.logical_key == Key::Named(NamedKey::ArrowRight) { 1 } else { -1 };
                let level = (surface.settings().evolution + step).clamp(0, MAX_EVOLUTION as i32);
                surface.set_evolution(level);
                log::info!("evolution {}", level);
            }
            Key::Character(c) if c.eq_ignore_ascii_case("n") => {
                self.reseeds += 1;
                let seed = format!("{}-{}", self.config.seed, self.reseeds);
                log::info!("seed {:?}", seed);
                surface.set_seed(&seed);
            }
            Key::Character(c) if c.eq_ignore_ascii_case("h") => {
                let high = !surface.settings().high_activity;
                surface.set_high_activity(high);
                log::info!("high activity {}", high);
            }
            _ => {}
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).as_secs_f64();
        self.last_tick = now;

        if let Some(surface) = self.surface.as_mut() {
            surface.frame();
            surface.tick_events(dt);
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create(event_loop) {
            log::error!("{}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(surface) = self.surface.as_mut() {
                    surface.dispose();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(surface) = self.surface.as_mut() {
                    surface.resize(Viewport::new(size.width, size.height));
                }
            }
            WindowEvent::Occluded(occluded) => {
                let visible = self.config.visible && !occluded;
                if let Some(surface) = self.surface.as_mut() {
                    surface.set_visible(visible);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let Some(surface) = self.surface.as_mut() else {
                    return;
                };
                let viewport = surface.viewport();
                let ndc = Vec2::new(
                    position.x as f32 / viewport.width as f32 * 2.0 - 1.0,
                    1.0 - position.y as f32 / viewport.height as f32 * 2.0,
                );
                if let Some(delta) = surface.pointer_move(ndc) {
                    log::trace!("pointer moved by {:?}", delta);
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(surface) = self.surface.as_mut() {
                    surface.click();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}
