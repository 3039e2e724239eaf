//! # orbscape
//!
//! Deterministic procedural scenes driven by a seed and a live magnitude.
//!
//! A text seed fixes every random attribute of a scene; an evolution level
//! fixes how many entities it has; a magnitude streamed in from outside
//! drives glow, pulse and halo shells without ever rebuilding. Two scales
//! share one engine: a full-viewport "chaos" scene (lava blobs in a glass
//! vessel, orbiting fractals, a particle cloud, rings) and small per-item
//! orbs.
//!
//! ## Quick Start
//!
//! ```
//! use orbscape::prelude::*;
//!
//! let mut scene = SceneBuilder::from_text(SceneKind::Chaos, "seed")
//!     .with_evolution(0)
//!     .build();
//! assert_eq!(scene.counts().particles, 2000);
//!
//! let params = map_magnitude(5e9, false);
//! for _ in 0..60 {
//!     scene.step(1.0 / 60.0, &params);
//! }
//!
//! let mut sprites = Vec::new();
//! scene.instances(&mut sprites);
//! ```
//!
//! ## Hosting
//!
//! [`SurfaceLifecycle`] owns a scene plus whatever a [`RenderBackend`]
//! allocated for it, and handles visibility, resize, reseeding and
//! teardown. [`gpu::GpuBackend`] is the wgpu implementation;
//! [`window::run`] hosts one surface in a winit window.
//!
//! ## Determinism
//!
//! Same seed and evolution level, same scene, bit for bit. The burst
//! sampler in [`trigger`] is the one deliberately non-deterministic part.

pub mod camera;
pub mod color;
pub mod config;
pub mod error;
pub mod gpu;
pub mod lifecycle;
pub mod magnitude;
pub mod orb;
pub mod scene;
pub mod seed;
pub mod simulation;
pub mod time;
pub mod trigger;
pub mod window;

pub use bytemuck;
pub use glam::{Vec2, Vec3, Vec4};

pub use color::id_to_color;
pub use config::SceneConfig;
pub use error::{AppError, ConfigError, GpuError};
pub use lifecycle::{LifecycleState, RenderBackend, SurfaceLifecycle, SurfaceSettings, Viewport};
pub use magnitude::{interpolate, map_magnitude, VisualParameters};
pub use orb::OrbRenderer;
pub use scene::{Scene, SceneBuilder, SceneKind};
pub use seed::{hash_to_seed, SeedStream};
pub use trigger::{BurstSampler, SamplerConfig};

pub mod prelude {
    pub use crate::camera::OrbitCamera;
    pub use crate::color::{hsv_to_rgb, id_to_color};
    pub use crate::config::SceneConfig;
    pub use crate::lifecycle::{
        Frame, LifecycleState, RenderBackend, ResourceLedger, StaticFallback, SurfaceLifecycle,
        SurfaceSettings, Viewport,
    };
    pub use crate::magnitude::{interpolate, map_magnitude, ParameterTween, VisualParameters};
    pub use crate::orb::OrbRenderer;
    pub use crate::scene::{EntityCounts, Instance, Scene, SceneBuilder, SceneEntity, SceneKind};
    pub use crate::seed::{hash_to_seed, SeedStream};
    pub use crate::time::Time;
    pub use crate::trigger::{BurstSampler, SamplerConfig};
    pub use crate::{Vec2, Vec3, Vec4};
}
