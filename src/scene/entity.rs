//! Scene entities and their per-kind motion state.

use glam::Vec3;

/// Which kind of entity a [`SceneEntity`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Container,
    Blob,
    ParticleCloud,
    Ring,
    Fractal,
    Halo,
}

/// One renderable, independently animated object in a scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEntity {
    Container(Container),
    Blob(Blob),
    ParticleCloud(ParticleCloud),
    Ring(Ring),
    Fractal(Fractal),
    Halo(Halo),
}

impl SceneEntity {
    /// Entity kind tag.
    pub fn kind(&self) -> EntityKind {
        match self {
            SceneEntity::Container(_) => EntityKind::Container,
            SceneEntity::Blob(_) => EntityKind::Blob,
            SceneEntity::ParticleCloud(_) => EntityKind::ParticleCloud,
            SceneEntity::Ring(_) => EntityKind::Ring,
            SceneEntity::Fractal(_) => EntityKind::Fractal,
            SceneEntity::Halo(_) => EntityKind::Halo,
        }
    }

    /// Upper bound on the point sprites this entity can emit per frame.
    pub fn instance_capacity(&self) -> usize {
        match self {
            SceneEntity::Container(c) => c.outline.len(),
            SceneEntity::Blob(b) => b.mesh.len(),
            SceneEntity::ParticleCloud(p) => p.len(),
            SceneEntity::Ring(r) => r.samples as usize,
            SceneEntity::Fractal(f) => f.points.len(),
            SceneEntity::Halo(h) => h.shells.len() * h.points.len(),
        }
    }
}

/// How a body is kept inside the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Containment {
    /// Vertical cylinder around the Y axis.
    Cylinder { radius: f32, half_height: f32 },
    /// Sphere around the origin.
    Sphere { radius: f32 },
}

/// The glass vessel of the chaos scene. Rotates slowly, nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    /// Inner radius of the vessel wall.
    pub radius: f32,
    /// Half the vessel height, measured from the origin.
    pub half_height: f32,
    /// Outline points in local space.
    pub outline: Vec<Vec3>,
    /// Radians per second.
    pub spin_rate: f32,
    /// Current rotation about Y.
    pub rotation: f32,
    /// Outline tint.
    pub color: Vec3,
}

/// Deformable sphere mesh: unit directions plus their displaced positions.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobMesh {
    /// Unit-length rest directions.
    pub directions: Vec<Vec3>,
    /// Displaced positions relative to the blob center.
    pub deformed: Vec<Vec3>,
}

impl BlobMesh {
    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }
}

/// Rigid-body-like motion and thermal state of a blob.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobMotion {
    /// Center in scene space.
    pub position: Vec3,
    /// Units per reference frame (60 Hz).
    pub velocity: Vec3,
    /// Constant vertical force per reference frame.
    pub buoyancy: f32,
    /// Per-reference-frame velocity retention, `< 1`.
    pub viscosity: f32,
    /// Angular rate of the turbulent forcing.
    pub turbulence_rate: f32,
    /// Peak turbulent force per reference frame.
    pub turbulence_strength: f32,
    /// Phase offset of waves and forcing, in radians.
    pub phase: f32,
    /// Fixed heat level in `[0, 1]`.
    pub heat: f32,
    /// Angular rate of the surface waves.
    pub wave_speed: f32,
    /// Surface displacement as a fraction of the radius.
    pub wave_amplitude: f32,
    /// Region the center is kept inside.
    pub bounds: Containment,
}

/// A lava-like deformable body.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    /// Position among the scene's blobs, offsets every phase.
    pub index: u32,
    /// Rest radius of the mesh.
    pub radius: f32,
    /// Hue the color flickers around.
    pub base_hue: f32,
    pub mesh: BlobMesh,
    pub motion: BlobMotion,
    /// Current color, recomputed every frame.
    pub color: Vec3,
    /// Current emissive intensity, recomputed every frame.
    pub emissive: f32,
}

/// Particle flow tuning shared by every particle in a cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowField {
    /// Per-reference-frame velocity retention.
    pub viscosity: f32,
    /// Peak random nudge per reference frame.
    pub turbulence: f32,
    /// Outward drift per reference frame at full intensity.
    pub drift: f32,
    /// Radius beyond which particles are re-injected.
    pub outer_radius: f32,
    /// Radius of the re-injection sphere.
    pub inner_radius: f32,
}

/// A cloud of point particles stored as parallel arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleCloud {
    /// Scene-space positions.
    pub positions: Vec<Vec3>,
    /// Units per reference frame, one per position.
    pub velocities: Vec<Vec3>,
    /// Fixed colors, one per position.
    pub colors: Vec<Vec3>,
    /// Sprite size shared by every particle.
    pub size: f32,
    pub flow: FlowField,
    /// Re-injections since the scene was built.
    pub reinjected: u64,
}

impl ParticleCloud {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// A thin rotating ring.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    /// Position among the scene's rings, offsets the wobble.
    pub index: u32,
    pub radius: f32,
    /// Sprite size of each sample.
    pub thickness: f32,
    /// Rest Euler rotation the wobble is added to.
    pub tilt: Vec3,
    /// Radians per second about Y.
    pub spin_rate: f32,
    /// Angular rate of the X and Z wobble.
    pub wobble_rate: f32,
    pub color: Vec3,
    /// Points drawn along the circumference.
    pub samples: u32,
    /// Current Euler rotation (x, y, z).
    pub rotation: Vec3,
}

/// A Sierpinski-style point fractal orbiting the scene center.
#[derive(Debug, Clone, PartialEq)]
pub struct Fractal {
    /// Position among the scene's fractals, offsets the pulse.
    pub index: u32,
    /// Points in local space.
    pub points: Vec<Vec3>,
    /// Distance of the orbit from the Y axis.
    pub orbit_radius: f32,
    /// Radians per second along the orbit.
    pub orbit_rate: f32,
    /// Starting angle on the orbit.
    pub phase: f32,
    /// Fixed tilt about X, also shifts the vertical bob.
    pub tilt: f32,
    /// Scale before pulsing.
    pub base_scale: f32,
    /// Angular rate of the scale pulse.
    pub pulse_rate: f32,
    /// Radians per second about Y.
    pub spin_rate: f32,
    pub color: Vec3,
    /// Current orbit position, recomputed every frame.
    pub position: Vec3,
    /// Current scale, recomputed every frame.
    pub scale: f32,
    /// Current rotation about Y.
    pub rotation: f32,
}

/// One translucent shell of an orb halo.
#[derive(Debug, Clone, PartialEq)]
pub struct HaloShell {
    /// Rest radius around the core.
    pub radius: f32,
    /// Pulse phase offset, in radians.
    pub phase: f32,
    /// Radians per second about Y.
    pub spin_rate: f32,
    /// Current pulse multiplier on the radius.
    pub scale: f32,
    /// Current opacity in `[0, 1]`.
    pub opacity: f32,
    /// Current rotation about Y.
    pub rotation: f32,
}

/// Concentric pulsing shells around an orb core.
#[derive(Debug, Clone, PartialEq)]
pub struct Halo {
    pub shells: Vec<HaloShell>,
    /// Unit-sphere sample points shared by every shell.
    pub points: Vec<Vec3>,
    /// Shells currently drawn, follows the live shell count.
    pub active: u32,
    /// Accent the shells are tinted with.
    pub color: Vec3,
}
