//! Procedural scenes: entity model, builder, and render instances.
//!
//! A [`Scene`] owns every entity of one build. It is created by
//! [`SceneBuilder`], advanced by [`Scene::step`], and flattened into GPU-ready
//! point sprites by [`Scene::instances`].

mod builder;
mod entity;
pub mod mesh;

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

pub use builder::{
    clamp_evolution, entity_counts, SceneBuilder, CONTAINER_HALF_HEIGHT, CONTAINER_RADIUS,
    MAX_EVOLUTION, ORB_CORE_RADIUS,
};
pub use entity::{
    Blob, BlobMesh, BlobMotion, Container, Containment, EntityKind, FlowField, Fractal, Halo,
    HaloShell, ParticleCloud, Ring, SceneEntity,
};

use crate::simulation::Interaction;

/// The two scales the engine renders at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    /// Full-viewport decorative scene.
    #[default]
    Chaos,
    /// Small per-item indicator.
    Orb,
}

/// How many of each entity a scene holds. Particles and shells are counted
/// individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityCounts {
    pub containers: u32,
    pub blobs: u32,
    pub fractals: u32,
    pub particles: u32,
    pub rings: u32,
    pub shells: u32,
}

/// One point sprite handed to the renderer.
///
/// Layout matches the vertex attributes of the render shader:
/// `vec4(position, size)` then `vec4(color, alpha)`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Instance {
    pub position: Vec3,
    pub size: f32,
    pub color: Vec3,
    pub alpha: f32,
}

/// All entities of one build plus the simulation clock.
#[derive(Debug, Clone)]
pub struct Scene {
    pub(crate) kind: SceneKind,
    pub(crate) seed: u32,
    pub(crate) evolution: u8,
    pub(crate) entities: Vec<SceneEntity>,
    pub(crate) elapsed: f64,
    pub(crate) frames: u64,
    pub(crate) burst: f32,
    pub(crate) burst_decay: f32,
    pub(crate) interaction: Interaction,
    pub(crate) interactive: bool,
    pub(crate) accent: Vec3,
}

impl Scene {
    pub fn kind(&self) -> SceneKind {
        self.kind
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn evolution(&self) -> u8 {
        self.evolution
    }

    /// Entities in draw order.
    pub fn entities(&self) -> &[SceneEntity] {
        &self.entities
    }

    /// Seconds of simulated time since the build.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Simulation steps taken since the build.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Transient burst glow in `[0, 1]`.
    pub fn burst(&self) -> f32 {
        self.burst
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn accent(&self) -> Vec3 {
        self.accent
    }

    pub fn blobs(&self) -> impl Iterator<Item = &Blob> {
        self.entities.iter().filter_map(|e| match e {
            SceneEntity::Blob(b) => Some(b),
            _ => None,
        })
    }

    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.entities.iter().filter_map(|e| match e {
            SceneEntity::Ring(r) => Some(r),
            _ => None,
        })
    }

    pub fn fractals(&self) -> impl Iterator<Item = &Fractal> {
        self.entities.iter().filter_map(|e| match e {
            SceneEntity::Fractal(f) => Some(f),
            _ => None,
        })
    }

    pub fn particle_cloud(&self) -> Option<&ParticleCloud> {
        self.entities.iter().find_map(|e| match e {
            SceneEntity::ParticleCloud(p) => Some(p),
            _ => None,
        })
    }

    pub fn container(&self) -> Option<&Container> {
        self.entities.iter().find_map(|e| match e {
            SceneEntity::Container(c) => Some(c),
            _ => None,
        })
    }

    pub fn halo(&self) -> Option<&Halo> {
        self.entities.iter().find_map(|e| match e {
            SceneEntity::Halo(h) => Some(h),
            _ => None,
        })
    }

    /// Count entities by kind.
    pub fn counts(&self) -> EntityCounts {
        let mut counts = EntityCounts::default();
        for entity in &self.entities {
            match entity {
                SceneEntity::Container(_) => counts.containers += 1,
                SceneEntity::Blob(_) => counts.blobs += 1,
                SceneEntity::Fractal(_) => counts.fractals += 1,
                SceneEntity::ParticleCloud(p) => counts.particles += p.len() as u32,
                SceneEntity::Ring(_) => counts.rings += 1,
                SceneEntity::Halo(h) => counts.shells += h.shells.len() as u32,
            }
        }
        counts
    }

    /// Maximum number of instances [`Scene::instances`] can write.
    pub fn instance_capacity(&self) -> usize {
        self.entities.iter().map(SceneEntity::instance_capacity).sum()
    }

    /// Flatten the current state into point sprites, replacing `out`.
    pub fn instances(&self, out: &mut Vec<Instance>) {
        out.clear();
        out.reserve(self.instance_capacity());

        for entity in &self.entities {
            match entity {
                SceneEntity::Container(c) => {
                    let rot = Quat::from_rotation_y(c.rotation);
                    out.extend(c.outline.iter().map(|p| Instance {
                        position: rot * *p,
                        size: 0.05,
                        color: c.color,
                        alpha: 0.35,
                    }));
                }
                SceneEntity::Blob(b) => {
                    let color = b.color * (0.6 + b.emissive);
                    let size = b.radius * 0.32;
                    out.extend(b.mesh.deformed.iter().map(|p| Instance {
                        position: b.motion.position + *p,
                        size,
                        color,
                        alpha: 0.55,
                    }));
                }
                SceneEntity::ParticleCloud(cloud) => {
                    out.extend(cloud.positions.iter().zip(&cloud.colors).map(|(p, c)| {
                        Instance {
                            position: *p,
                            size: cloud.size,
                            color: *c,
                            alpha: 0.75,
                        }
                    }));
                }
                SceneEntity::Ring(r) => {
                    let rot = Quat::from_euler(EulerRot::XYZ, r.rotation.x, r.rotation.y, r.rotation.z);
                    out.extend((0..r.samples).map(|i| {
                        let a = std::f32::consts::TAU * i as f32 / r.samples as f32;
                        Instance {
                            position: rot * Vec3::new(r.radius * a.cos(), 0.0, r.radius * a.sin()),
                            size: r.thickness,
                            color: r.color,
                            alpha: 0.6,
                        }
                    }));
                }
                SceneEntity::Fractal(f) => {
                    let rot = Quat::from_rotation_y(f.rotation) * Quat::from_rotation_x(f.tilt);
                    out.extend(f.points.iter().map(|p| Instance {
                        position: f.position + rot * (*p * f.scale),
                        size: 0.05 * f.scale,
                        color: f.color,
                        alpha: 0.7,
                    }));
                }
                SceneEntity::Halo(h) => {
                    for shell in h.shells.iter().take(h.active as usize) {
                        let rot = Quat::from_rotation_y(shell.rotation);
                        let r = shell.radius * shell.scale;
                        out.extend(h.points.iter().map(|p| Instance {
                            position: rot * (*p * r),
                            size: 0.035,
                            color: h.color,
                            alpha: shell.opacity,
                        }));
                    }
                }
            }
        }
    }
}
