//! Procedural scene construction.
//!
//! Consumes a [`SeedStream`] in a fixed order so a `(seed, evolution)` pair
//! always produces the same entities. The order is:
//!
//! 1. container (no draws)
//! 2. blobs, each: position x/y/z, radius, hue, heat, viscosity, buoyancy,
//!    turbulence rate, turbulence strength, phase, wave speed, wave amplitude
//! 3. fractals, each: orbit radius, orbit rate, phase, tilt, scale,
//!    pulse rate, spin rate, hue
//! 4. particles, each: radius, azimuth, polar, velocity x/y/z, hue
//! 5. rings, each: radius, thickness, tilt x, tilt z, spin rate,
//!    wobble rate, hue
//! 6. halo shells, each: phase, spin rate
//!
//! Reordering any of these changes every scene built from the same seed.

use glam::Vec3;
use std::f32::consts::TAU;

use super::entity::{
    Blob, BlobMesh, BlobMotion, Container, Containment, FlowField, Fractal, Halo, HaloShell,
    ParticleCloud, Ring, SceneEntity,
};
use super::mesh;
use super::{EntityCounts, Scene, SceneKind};
use crate::color::{self, BLOB_BAND, FRACTAL_BAND, PARTICLE_BAND, RING_BAND};
use crate::magnitude::{VisualParameters, MAX_SHELLS};
use crate::seed::{hash_to_seed, SeedStream};
use crate::simulation::{Interaction, BURST_DECAY};

/// Highest evolution level.
pub const MAX_EVOLUTION: u8 = 10;

/// Chaos vessel dimensions.
pub const CONTAINER_RADIUS: f32 = 4.0;
pub const CONTAINER_HALF_HEIGHT: f32 = 6.0;

/// Orb core radius at zero intensity.
pub const ORB_CORE_RADIUS: f32 = 0.55;

/// Clamp an evolution level into `0..=10`.
pub fn clamp_evolution(level: i32) -> u8 {
    level.clamp(0, MAX_EVOLUTION as i32) as u8
}

/// Entity counts for a scene kind at an evolution level.
///
/// Linear in the level and fixed; not configurable at runtime.
pub fn entity_counts(kind: SceneKind, evolution: u8) -> EntityCounts {
    let level = evolution.min(MAX_EVOLUTION) as u32;
    match kind {
        SceneKind::Chaos => EntityCounts {
            containers: 1,
            blobs: 4 + (level as f32 * 0.8).floor() as u32,
            fractals: 2 + level / 3,
            particles: 2000 + level * 800,
            rings: 7 + level * 2,
            shells: 0,
        },
        SceneKind::Orb => EntityCounts {
            containers: 0,
            blobs: 1,
            fractals: 0,
            particles: 150 + level * 40,
            rings: 1 + level / 4,
            shells: MAX_SHELLS,
        },
    }
}

/// Builds a [`Scene`] from a seed.
///
/// # Example
///
/// ```
/// use orbscape::scene::{SceneBuilder, SceneKind};
///
/// let scene = SceneBuilder::from_text(SceneKind::Chaos, "seed")
///     .with_evolution(0)
///     .build();
/// assert_eq!(scene.counts().blobs, 4);
/// ```
#[derive(Debug, Clone)]
pub struct SceneBuilder {
    kind: SceneKind,
    seed: u32,
    evolution: u8,
    params: VisualParameters,
    accent: Option<Vec3>,
    interactive: bool,
}

impl SceneBuilder {
    /// Start a builder from a numeric seed.
    pub fn new(kind: SceneKind, seed: u32) -> Self {
        Self {
            kind,
            seed,
            evolution: 0,
            params: VisualParameters::default(),
            accent: None,
            interactive: false,
        }
    }

    /// Start a builder from seed text.
    pub fn from_text(kind: SceneKind, seed: &str) -> Self {
        Self::new(kind, hash_to_seed(seed))
    }

    /// Set the evolution level (clamped to `0..=10`).
    pub fn with_evolution(mut self, level: i32) -> Self {
        self.evolution = clamp_evolution(level);
        self
    }

    /// Parameters used to size the orb core and halo at build time.
    pub fn with_params(mut self, params: VisualParameters) -> Self {
        self.params = params;
        self
    }

    /// Accent color for the orb halo.
    pub fn with_accent(mut self, accent: Vec3) -> Self {
        self.accent = Some(accent);
        self
    }

    /// Whether pointer input should affect the scene.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Counts the build will produce.
    pub fn counts(&self) -> EntityCounts {
        entity_counts(self.kind, self.evolution)
    }

    /// Construct the scene. The stream is consumed here and dropped.
    pub fn build(self) -> Scene {
        let mut stream = SeedStream::new(self.seed);
        let counts = self.counts();
        let level = self.evolution as u32;
        let accent = self.accent.unwrap_or_else(|| color::id_to_color(""));

        let mut entities = Vec::new();
        match self.kind {
            SceneKind::Chaos => {
                entities.push(SceneEntity::Container(chaos_container()));
                for i in 0..counts.blobs {
                    entities.push(SceneEntity::Blob(chaos_blob(&mut stream, i, level)));
                }
                for i in 0..counts.fractals {
                    entities.push(SceneEntity::Fractal(fractal(&mut stream, i, level)));
                }
                entities.push(SceneEntity::ParticleCloud(particle_cloud(
                    &mut stream,
                    counts.particles,
                    CHAOS_FLOW,
                    0.06,
                )));
                for i in 0..counts.rings {
                    entities.push(SceneEntity::Ring(ring(&mut stream, i, 5.0..12.0, 64)));
                }
            }
            SceneKind::Orb => {
                entities.push(SceneEntity::Blob(orb_core(&mut stream, level, &self.params)));
                entities.push(SceneEntity::ParticleCloud(particle_cloud(
                    &mut stream,
                    counts.particles,
                    ORB_FLOW,
                    0.025,
                )));
                for i in 0..counts.rings {
                    entities.push(SceneEntity::Ring(ring(&mut stream, i, 1.25..1.7, 48)));
                }
                entities.push(SceneEntity::Halo(halo(&mut stream, &self.params, accent)));
            }
        }

        log::debug!(
            "built {:?} scene seed={:#010x} evolution={} entities={} draws={}",
            self.kind,
            self.seed,
            self.evolution,
            entities.len(),
            stream.draws()
        );

        Scene {
            kind: self.kind,
            seed: self.seed,
            evolution: self.evolution,
            entities,
            elapsed: 0.0,
            frames: 0,
            burst: 0.0,
            burst_decay: BURST_DECAY,
            interaction: Interaction::default(),
            interactive: self.interactive,
            accent,
        }
    }
}

const CHAOS_FLOW: FlowField = FlowField {
    viscosity: 0.98,
    turbulence: 0.0015,
    drift: 0.0012,
    outer_radius: 14.0,
    inner_radius: 2.5,
};

const ORB_FLOW: FlowField = FlowField {
    viscosity: 0.97,
    turbulence: 0.0004,
    drift: 0.0005,
    outer_radius: 2.2,
    inner_radius: 0.55,
};

fn chaos_container() -> Container {
    Container {
        radius: CONTAINER_RADIUS,
        half_height: CONTAINER_HALF_HEIGHT,
        outline: mesh::cylinder_outline(CONTAINER_RADIUS, CONTAINER_HALF_HEIGHT, 48, 8),
        spin_rate: 0.06,
        rotation: 0.0,
        color: Vec3::new(0.35, 0.22, 0.28),
    }
}

/// Blob draws shared by both scene kinds, in documented order after the
/// position and radius.
struct BlobDraws {
    hue: f32,
    heat: f32,
    viscosity: f32,
    buoyancy: f32,
    turbulence_rate: f32,
    turbulence_strength: f32,
    phase: f32,
    wave_speed: f32,
    wave_amplitude: f32,
}

impl BlobDraws {
    fn draw(stream: &mut SeedStream, buoyancy_scale: f32) -> Self {
        Self {
            hue: BLOB_BAND.sample(stream.next_f32()),
            heat: stream.next_f32(),
            viscosity: stream.range(0.955, 0.985),
            buoyancy: stream.signed() * buoyancy_scale,
            turbulence_rate: stream.range(0.2, 0.7),
            turbulence_strength: stream.range(0.0003, 0.0009),
            phase: stream.range(0.0, TAU),
            wave_speed: stream.range(0.4, 1.2),
            wave_amplitude: stream.range(0.06, 0.16),
        }
    }
}

fn make_blob(index: u32, radius: f32, position: Vec3, draws: BlobDraws, mesh: Vec<Vec3>, bounds: Containment) -> Blob {
    let deformed = mesh.iter().map(|d| *d * radius).collect();
    Blob {
        index,
        radius,
        base_hue: draws.hue,
        mesh: BlobMesh {
            directions: mesh,
            deformed,
        },
        motion: BlobMotion {
            position,
            velocity: Vec3::ZERO,
            buoyancy: draws.buoyancy,
            viscosity: draws.viscosity,
            turbulence_rate: draws.turbulence_rate,
            turbulence_strength: draws.turbulence_strength,
            phase: draws.phase,
            heat: draws.heat,
            wave_speed: draws.wave_speed,
            wave_amplitude: draws.wave_amplitude,
            bounds,
        },
        color: color::hsl_to_rgb(draws.hue, 0.9, 0.5),
        emissive: 0.0,
    }
}

fn chaos_blob(stream: &mut SeedStream, index: u32, level: u32) -> Blob {
    let position = Vec3::new(
        stream.signed() * CONTAINER_RADIUS * 0.5,
        stream.signed() * CONTAINER_HALF_HEIGHT * 0.7,
        stream.signed() * CONTAINER_RADIUS * 0.5,
    );
    let radius = stream.range(0.7, 1.4);
    let draws = BlobDraws::draw(stream, 0.0006);

    let bounds = Containment::Cylinder {
        radius: CONTAINER_RADIUS - radius * 0.5,
        half_height: CONTAINER_HALF_HEIGHT - radius * 0.5,
    };
    make_blob(index, radius, position, draws, mesh::uv_sphere(6 + level, 10 + 2 * level), bounds)
}

fn orb_core(stream: &mut SeedStream, level: u32, params: &VisualParameters) -> Blob {
    let position = Vec3::new(stream.signed() * 0.05, stream.signed() * 0.05, stream.signed() * 0.05);
    let radius = ORB_CORE_RADIUS * stream.range(0.9, 1.05) * (0.85 + 0.3 * params.intensity);
    let draws = BlobDraws::draw(stream, 0.0002);

    let bounds = Containment::Sphere { radius: 0.18 };
    make_blob(0, radius, position, draws, mesh::uv_sphere(10 + level / 2, 16 + level), bounds)
}

fn fractal(stream: &mut SeedStream, index: u32, level: u32) -> Fractal {
    let orbit_radius = stream.range(6.0, 9.5);
    let orbit_rate = stream.range(0.05, 0.18);
    let phase = stream.range(0.0, TAU);
    let tilt = stream.range(-0.6, 0.6);
    let base_scale = stream.range(0.8, 1.6);
    let pulse_rate = stream.range(0.4, 1.2);
    let spin_rate = stream.range(0.1, 0.5);
    let hue = FRACTAL_BAND.sample((stream.next_f32() + index as f32 * 0.37).fract());

    Fractal {
        index,
        points: mesh::sierpinski(2 + level / 4),
        orbit_radius,
        orbit_rate,
        phase,
        tilt,
        base_scale,
        pulse_rate,
        spin_rate,
        color: color::hsv_to_rgb(hue, 0.85, 0.95),
        position: Vec3::ZERO,
        scale: base_scale,
        rotation: 0.0,
    }
}

fn particle_cloud(stream: &mut SeedStream, count: u32, flow: FlowField, size: f32) -> ParticleCloud {
    let mut positions = Vec::with_capacity(count as usize);
    let mut velocities = Vec::with_capacity(count as usize);
    let mut colors = Vec::with_capacity(count as usize);
    let spawn_radius = flow.outer_radius * 0.85;

    for _ in 0..count {
        let r = spawn_radius * stream.next_f32().cbrt();
        let theta = stream.range(0.0, TAU);
        let phi = (stream.signed()).clamp(-1.0, 1.0).acos();
        let (sin_phi, cos_phi) = phi.sin_cos();
        positions.push(Vec3::new(
            r * sin_phi * theta.cos(),
            r * cos_phi,
            r * sin_phi * theta.sin(),
        ));
        velocities.push(Vec3::new(stream.signed(), stream.signed(), stream.signed()) * flow.drift * 4.0);
        let hue = PARTICLE_BAND.sample(stream.next_f32());
        colors.push(color::hsv_to_rgb(hue, 0.85, 1.0));
    }

    ParticleCloud {
        positions,
        velocities,
        colors,
        size,
        flow,
        reinjected: 0,
    }
}

fn ring(stream: &mut SeedStream, index: u32, radius: std::ops::Range<f32>, samples: u32) -> Ring {
    let radius = stream.range(radius.start, radius.end);
    let thickness = stream.range(0.03, 0.08);
    let tilt = Vec3::new(stream.signed() * 1.2, 0.0, stream.signed() * 1.2);
    let spin_rate = stream.signed() * 0.3;
    let wobble_rate = stream.range(0.05, 0.25);
    let hue = RING_BAND.sample(stream.next_f32());

    Ring {
        index,
        radius,
        thickness,
        tilt,
        spin_rate,
        wobble_rate,
        color: color::hsv_to_rgb(hue, 0.7, 0.9),
        samples,
        rotation: tilt,
    }
}

fn halo(stream: &mut SeedStream, params: &VisualParameters, accent: Vec3) -> Halo {
    let shells = (0..MAX_SHELLS)
        .map(|i| HaloShell {
            radius: 0.8 + 0.16 * i as f32,
            phase: stream.range(0.0, TAU),
            spin_rate: stream.signed() * 0.4,
            scale: 1.0,
            opacity: 0.0,
            rotation: 0.0,
        })
        .collect();

    Halo {
        shells,
        points: mesh::fibonacci_sphere(72),
        active: params.shell_count.clamp(1, MAX_SHELLS),
        color: accent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::magnitude::map_magnitude;

    #[test]
    fn test_clamp_evolution() {
        assert_eq!(clamp_evolution(-3), 0);
        assert_eq!(clamp_evolution(4), 4);
        assert_eq!(clamp_evolution(99), 10);
    }

    #[test]
    fn test_chaos_counts_level_zero() {
        let c = entity_counts(SceneKind::Chaos, 0);
        assert_eq!((c.blobs, c.fractals, c.particles, c.rings), (4, 2, 2000, 7));
    }

    #[test]
    fn test_chaos_counts_level_ten() {
        let c = entity_counts(SceneKind::Chaos, 10);
        assert_eq!((c.blobs, c.fractals, c.particles, c.rings), (12, 5, 10_000, 27));
    }

    #[test]
    fn test_same_seed_same_scene() {
        let a = SceneBuilder::from_text(SceneKind::Chaos, "seed").with_evolution(3).build();
        let b = SceneBuilder::from_text(SceneKind::Chaos, "seed").with_evolution(3).build();
        assert_eq!(a.entities(), b.entities());
    }

    #[test]
    fn test_different_seed_different_scene() {
        let a = SceneBuilder::from_text(SceneKind::Chaos, "seed").build();
        let b = SceneBuilder::from_text(SceneKind::Chaos, "other").build();
        assert_ne!(a.entities(), b.entities());
    }

    #[test]
    fn test_hues_stay_in_bands() {
        let scene = SceneBuilder::from_text(SceneKind::Chaos, "bands").with_evolution(5).build();
        for entity in scene.entities() {
            if let SceneEntity::Blob(b) = entity {
                assert!(BLOB_BAND.contains(b.base_hue));
            }
        }
    }

    #[test]
    fn test_orb_uses_params_and_accent() {
        let params = map_magnitude(1e12, false);
        let accent = Vec3::new(0.1, 0.9, 0.4);
        let scene = SceneBuilder::from_text(SceneKind::Orb, "orb")
            .with_params(params)
            .with_accent(accent)
            .build();
        let halo = scene.halo().expect("orb has a halo");
        assert_eq!(halo.active, 5);
        assert_eq!(halo.color, accent);
        assert_eq!(scene.counts().shells, 5);
    }

    #[test]
    fn test_blobs_start_inside_bounds() {
        let scene = SceneBuilder::from_text(SceneKind::Chaos, "inside").with_evolution(10).build();
        for blob in scene.blobs() {
            let p = blob.motion.position;
            assert!(Vec3::new(p.x, 0.0, p.z).length() < CONTAINER_RADIUS);
            assert!(p.y.abs() < CONTAINER_HALF_HEIGHT);
        }
    }
}
