//! Per-frame scene update.
//!
//! [`Scene::step`] advances every entity in a fixed stage order:
//! blobs, then the particle cloud, then rings, fractals, halo, and the
//! container. Later stages always see the current frame's blob and particle
//! state.
//!
//! Motion integrates with the measured frame time scaled against a 60 Hz
//! reference, so a frame of `1/60` s is one reference step and damping
//! factors are raised to the number of reference steps taken. Colors,
//! rotations and pulses are closed-form functions of elapsed time and never
//! accumulate. The clock is kept in `f64` and every `time * rate` product is
//! reduced to one turn before it is narrowed, so motion stays smooth after
//! days of uptime.

use std::f64::consts::TAU;

use glam::{Vec2, Vec3};

use crate::color;
use crate::magnitude::VisualParameters;
use crate::scene::{
    Blob, BlobMotion, Container, Containment, Fractal, Halo, ParticleCloud, Ring, Scene,
    SceneEntity,
};

/// Frames per second the integration constants are tuned for.
pub const REFERENCE_RATE: f32 = 60.0;

/// Longest step taken in one call. Longer gaps (a stalled host) are cut
/// short instead of teleporting everything.
pub const MAX_STEP: f32 = 0.1;

/// Fraction of the containment radius a blob is pushed back to.
const CONTAINMENT_MARGIN: f32 = 0.95;

/// Velocity coefficient along the boundary normal after a bounce.
const BOUNCE: f32 = -0.35;

/// Rotation added to a re-injected particle's azimuth.
const GOLDEN_ANGLE: f32 = 2.399_963;

/// Default per-second decay of the burst glow.
pub const BURST_DECAY: f32 = 1.5;

/// Per-second easing rate of the pointer tilt.
const TILT_EASE: f32 = 4.0;

/// Per-second decay of the click pulse.
const PULSE_DECAY: f32 = 3.0;

/// Largest tilt, in radians, the pointer can apply.
pub const MAX_TILT: f32 = 0.35;

/// Clamp a frame delta to `[0, MAX_STEP]`. Non-finite values become zero.
pub fn sanitize_step(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_STEP)
    } else {
        0.0
    }
}

/// Transient, cosmetic pointer state local to one scene.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Interaction {
    /// Tilt the camera eases toward (x = yaw, y = pitch).
    pub tilt_target: Vec2,
    /// Current eased tilt.
    pub tilt: Vec2,
    /// Click pulse in `[0, 1]`.
    pub pulse: f32,
    /// Last pointer position in normalized device coordinates.
    pub last_pointer: Option<Vec2>,
}

impl Interaction {
    fn ease(&mut self, dt: f32) {
        let blend = 1.0 - (-dt * TILT_EASE).exp();
        self.tilt += (self.tilt_target - self.tilt) * blend;
        self.pulse *= (-dt * PULSE_DECAY).exp();
    }
}

impl Scene {
    /// Advance the scene by `dt` seconds using the live parameters.
    ///
    /// Never panics: `dt` is sanitized and every other input was validated
    /// when the scene was built.
    pub fn step(&mut self, dt: f32, params: &VisualParameters) {
        let dt = sanitize_step(dt);
        self.elapsed += f64::from(dt);
        self.frames += 1;

        let t = self.elapsed;
        let k = dt * REFERENCE_RATE;
        let glow = self.burst.max(self.interaction.pulse);

        for entity in &mut self.entities {
            if let SceneEntity::Blob(blob) = entity {
                step_blob(blob, t, k, params, glow);
            }
        }

        for entity in &mut self.entities {
            if let SceneEntity::ParticleCloud(cloud) = entity {
                step_particles(cloud, t, k, params);
            }
        }

        for entity in &mut self.entities {
            match entity {
                SceneEntity::Ring(ring) => step_ring(ring, t),
                SceneEntity::Fractal(fractal) => step_fractal(fractal, t),
                SceneEntity::Halo(halo) => step_halo(halo, t, params, glow),
                SceneEntity::Container(container) => step_container(container, t),
                SceneEntity::Blob(_) | SceneEntity::ParticleCloud(_) => {}
            }
        }

        self.burst *= (-dt * self.burst_decay).exp();
        self.interaction.ease(dt);
    }

    /// Start a burst glow. It fades out over the following steps.
    pub fn trigger_burst(&mut self) {
        self.burst = 1.0;
    }

    /// Per-second decay applied to the burst glow.
    pub fn burst_decay(&self) -> f32 {
        self.burst_decay
    }

    /// Change how fast the burst glow fades. Negative or non-finite values
    /// are ignored.
    pub fn set_burst_decay(&mut self, decay: f32) {
        if decay.is_finite() && decay >= 0.0 {
            self.burst_decay = decay;
        }
    }

    /// Feed a pointer position in normalized device coordinates.
    ///
    /// Returns the movement since the previous position, or `None` when the
    /// scene is not interactive or this is the first sample.
    pub fn pointer_move(&mut self, position: Vec2) -> Option<Vec2> {
        if !self.interactive || !position.is_finite() {
            return None;
        }
        let position = position.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
        self.interaction.tilt_target = position * MAX_TILT;
        let delta = self.interaction.last_pointer.map(|last| position - last);
        self.interaction.last_pointer = Some(position);
        delta
    }

    /// Register a click. Ignored when the scene is not interactive.
    pub fn click(&mut self) {
        if self.interactive {
            self.interaction.pulse = 1.0;
        }
    }
}

/// `t * rate` wrapped to `[0, 2π)` and narrowed.
fn phase(t: f64, rate: f32) -> f32 {
    (t * f64::from(rate)).rem_euclid(TAU) as f32
}

fn step_blob(blob: &mut Blob, t: f64, k: f32, params: &VisualParameters, glow: f32) {
    let index = blob.index as f32;
    let m = &mut blob.motion;

    // Surface waves, phase-shifted by index.
    let offset = m.phase + index * 0.7;
    let primary_phase = phase(t, m.wave_speed) + offset;
    let secondary_phase = phase(t, m.wave_speed * 0.8) + offset * 0.8;
    let turbulence_phase = phase(t, m.wave_speed * 2.7) + index * 1.3;
    let heat_phase = phase(t, 0.5 + m.heat) + index * 2.1;
    for (dir, out) in blob.mesh.directions.iter().zip(blob.mesh.deformed.iter_mut()) {
        let primary = (dir.x * 2.0 + primary_phase).sin() * (dir.y * 2.0 + secondary_phase).cos();
        let turbulence = (dir.x * 5.0 + dir.z * 4.0 + turbulence_phase).sin() * 0.35;
        let heat = (dir.y * 3.0 + heat_phase).sin() * m.heat * 0.5;
        *out = *dir * blob.radius * (1.0 + m.wave_amplitude * (primary + turbulence + heat));
    }

    let forcing = Vec3::new(
        (phase(t, m.turbulence_rate) + m.phase).sin(),
        (phase(t, m.turbulence_rate * 1.3) + m.phase * 0.5).cos(),
        (phase(t, m.turbulence_rate * 0.7) + index).sin(),
    ) * m.turbulence_strength;
    m.velocity += (Vec3::Y * m.buoyancy + forcing) * k;
    m.velocity *= m.viscosity.powf(k);
    m.position += m.velocity * k;
    contain(m);

    let flicker = 0.5 + 0.5 * (phase(t, 0.6 * params.pulse_speed) + index * 0.9 + m.heat * 3.0).sin();
    let hue = blob.base_hue + 0.015 * (phase(t, 0.3) + index).sin();
    blob.color = color::hsl_to_rgb(hue, 0.85 + 0.1 * m.heat, 0.45 + 0.1 * flicker);
    blob.emissive = (0.2 + 0.3 * m.heat + 0.35 * flicker) * (0.4 + 0.6 * params.intensity) + 0.5 * glow;
}

/// Soft bounce off the blob's containment.
fn contain(m: &mut BlobMotion) {
    match m.bounds {
        Containment::Cylinder { radius, half_height } => {
            let radial = Vec2::new(m.position.x, m.position.z);
            let distance = radial.length();
            if distance > radius {
                let normal = radial / distance;
                let clamped = normal * radius * CONTAINMENT_MARGIN;
                m.position.x = clamped.x;
                m.position.z = clamped.y;
                let outward = m.velocity.x * normal.x + m.velocity.z * normal.y;
                if outward > 0.0 {
                    let correction = outward * (BOUNCE - 1.0);
                    m.velocity.x += normal.x * correction;
                    m.velocity.z += normal.y * correction;
                }
            }
            if m.position.y.abs() > half_height {
                m.position.y = m.position.y.signum() * half_height * CONTAINMENT_MARGIN;
                m.velocity.y *= BOUNCE;
            }
        }
        Containment::Sphere { radius } => {
            let distance = m.position.length();
            if distance > radius {
                let normal = m.position / distance;
                m.position = normal * radius * CONTAINMENT_MARGIN;
                let outward = m.velocity.dot(normal);
                if outward > 0.0 {
                    m.velocity += normal * outward * (BOUNCE - 1.0);
                }
            }
        }
    }
}

fn step_particles(cloud: &mut ParticleCloud, t: f64, k: f32, params: &VisualParameters) {
    let flow = cloud.flow;
    let (px, py, pz) = (phase(t, 1.7), phase(t, 1.3), phase(t, 1.1));
    let damping = flow.viscosity.powf(k);
    let drift = flow.drift * (0.5 + params.intensity);
    let outer_sq = flow.outer_radius * flow.outer_radius;
    let mut reinjected = 0;

    for (i, (p, v)) in cloud.positions.iter_mut().zip(cloud.velocities.iter_mut()).enumerate() {
        let fi = i as f32;
        let nudge = Vec3::new(
            (px + fi * 0.37).sin(),
            (py + fi * 0.61).cos(),
            (pz + fi * 0.23).sin(),
        ) * flow.turbulence;
        let outward = p.normalize_or_zero() * drift;

        *v = (*v + (nudge + outward) * k) * damping;
        *p += *v * k;

        if p.length_squared() > outer_sq {
            *p = reinjection_point(*p, flow.inner_radius);
            *v *= 0.3;
            reinjected += 1;
        }
    }

    cloud.reinjected += reinjected;
}

/// Where a particle leaving at `exit` re-enters: on the inner sphere, rotated
/// around Y from its exit azimuth and pulled toward the equator.
fn reinjection_point(exit: Vec3, inner_radius: f32) -> Vec3 {
    let azimuth = exit.z.atan2(exit.x) + GOLDEN_ANGLE;
    let y = (exit.y / exit.length()).clamp(-1.0, 1.0) * -0.5;
    let ring = (1.0 - y * y).sqrt();
    Vec3::new(ring * azimuth.cos(), y, ring * azimuth.sin()) * inner_radius
}

fn step_ring(ring: &mut Ring, t: f64) {
    let index = ring.index as f32;
    ring.rotation = ring.tilt
        + Vec3::new(
            (phase(t, ring.wobble_rate) + index).sin() * 0.15,
            phase(t, ring.spin_rate),
            (phase(t, ring.wobble_rate * 0.8) + index).cos() * 0.15,
        );
}

fn step_fractal(fractal: &mut Fractal, t: f64) {
    let angle = fractal.phase + phase(t, fractal.orbit_rate);
    let bob = fractal.phase * 0.5 + phase(t, fractal.orbit_rate * 0.5) + fractal.tilt;
    fractal.position = Vec3::new(
        angle.cos() * fractal.orbit_radius,
        bob.sin() * 1.5,
        angle.sin() * fractal.orbit_radius,
    );
    fractal.scale = fractal.base_scale * (1.0 + 0.15 * (phase(t, fractal.pulse_rate) + fractal.index as f32).sin());
    fractal.rotation = phase(t, fractal.spin_rate);
}

fn step_halo(halo: &mut Halo, t: f64, params: &VisualParameters, glow: f32) {
    halo.active = params.shell_count.clamp(1, halo.shells.len().max(1) as u32);
    let count = halo.shells.len() as f32;

    for (i, shell) in halo.shells.iter_mut().enumerate() {
        let pulse = (phase(t, params.pulse_speed * 2.0) + shell.phase).sin();
        let falloff = 1.0 - i as f32 / (count + 1.0);
        shell.scale = 1.0 + 0.06 * pulse * (0.5 + params.intensity);
        shell.opacity = ((0.12 + 0.25 * params.intensity) * falloff * (0.8 + 0.2 * pulse) + 0.2 * glow).clamp(0.0, 1.0);
        shell.rotation = phase(t, shell.spin_rate);
    }
}

fn step_container(container: &mut Container, t: f64) {
    container.rotation = phase(t, container.spin_rate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::magnitude::map_magnitude;
    use crate::scene::{SceneBuilder, SceneKind};

    const FRAME: f32 = 1.0 / 60.0;

    fn run(scene: &mut Scene, frames: usize, params: &VisualParameters) {
        for _ in 0..frames {
            scene.step(FRAME, params);
        }
    }

    #[test]
    fn test_sanitize_step() {
        assert_eq!(sanitize_step(f32::NAN), 0.0);
        assert_eq!(sanitize_step(f32::INFINITY), 0.0);
        assert_eq!(sanitize_step(-1.0), 0.0);
        assert_eq!(sanitize_step(5.0), MAX_STEP);
        assert_eq!(sanitize_step(0.016), 0.016);
    }

    #[test]
    fn test_step_is_deterministic() {
        let params = map_magnitude(1e8, false);
        let mut a = SceneBuilder::from_text(SceneKind::Chaos, "step").with_evolution(2).build();
        let mut b = a.clone();
        run(&mut a, 120, &params);
        run(&mut b, 120, &params);
        assert_eq!(a.entities(), b.entities());
        assert_eq!(a.frames(), 120);
        assert!((a.elapsed() - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_blobs_stay_contained() {
        let params = map_magnitude(1e12, true);
        let mut scene = SceneBuilder::from_text(SceneKind::Chaos, "lava").with_evolution(10).build();
        run(&mut scene, 1200, &params);
        for blob in scene.blobs() {
            let p = blob.motion.position;
            assert!(p.is_finite());
            if let Containment::Cylinder { radius, half_height } = blob.motion.bounds {
                assert!(Vec2::new(p.x, p.z).length() <= radius + 0.1);
                assert!(p.y.abs() <= half_height + 0.1);
            }
        }
    }

    #[test]
    fn test_particles_reinjected_inside() {
        let params = map_magnitude(1e12, false);
        let mut scene = SceneBuilder::from_text(SceneKind::Orb, "flow").build();
        run(&mut scene, 600, &params);
        let cloud = scene.particle_cloud().expect("orb has particles");
        assert!(cloud.reinjected > 0);
        let limit = cloud.flow.outer_radius + 0.01;
        assert!(cloud.positions.iter().all(|p| p.length() <= limit));
    }

    #[test]
    fn test_reinjection_point_on_inner_sphere() {
        let p = reinjection_point(Vec3::new(3.0, 4.0, 0.0), 0.5);
        assert!((p.length() - 0.5).abs() < 1e-4);
        assert!(p.y < 0.0);
    }

    #[test]
    fn test_color_depends_only_on_time() {
        let params = map_magnitude(5e6, false);
        let mut coarse = SceneBuilder::from_text(SceneKind::Chaos, "hue").build();
        let mut fine = coarse.clone();
        run(&mut coarse, 10, &params);
        for _ in 0..20 {
            fine.step(FRAME / 2.0, &params);
        }
        let a: Vec<Vec3> = coarse.blobs().map(|b| b.color).collect();
        let b: Vec<Vec3> = fine.blobs().map(|b| b.color).collect();
        for (x, y) in a.iter().zip(&b) {
            assert!((*x - *y).abs().max_element() < 1e-4);
        }
    }

    #[test]
    fn test_halo_follows_live_shell_count() {
        let mut scene = SceneBuilder::from_text(SceneKind::Orb, "halo").build();
        scene.step(FRAME, &map_magnitude(0.0, false));
        assert_eq!(scene.halo().map(|h| h.active), Some(1));
        scene.step(FRAME, &map_magnitude(1e12, false));
        assert_eq!(scene.halo().map(|h| h.active), Some(5));
    }

    #[test]
    fn test_burst_decays() {
        let params = VisualParameters::default();
        let mut scene = SceneBuilder::from_text(SceneKind::Orb, "burst").build();
        scene.trigger_burst();
        assert_eq!(scene.burst(), 1.0);
        run(&mut scene, 120, &params);
        assert!(scene.burst() < 0.1);
    }

    #[test]
    fn test_burst_decay_is_configurable() {
        let params = VisualParameters::default();
        let mut slow = SceneBuilder::from_text(SceneKind::Orb, "burst").build();
        let mut fast = slow.clone();
        assert_eq!(slow.burst_decay(), BURST_DECAY);
        slow.set_burst_decay(0.1);
        fast.set_burst_decay(6.0);
        fast.set_burst_decay(f32::NAN);
        fast.set_burst_decay(-1.0);
        assert_eq!(fast.burst_decay(), 6.0);

        slow.trigger_burst();
        fast.trigger_burst();
        run(&mut slow, 60, &params);
        run(&mut fast, 60, &params);
        assert!((slow.burst() - (-0.1f32).exp()).abs() < 1e-3);
        assert!((fast.burst() - (-6.0f32).exp()).abs() < 1e-3);
    }

    #[test]
    fn test_motion_stays_smooth_after_long_uptime() {
        let params = map_magnitude(1e9, false);
        let mut scene = SceneBuilder::from_text(SceneKind::Chaos, "uptime").build();
        scene.elapsed = 36.0 * 3600.0;
        scene.step(FRAME, &params);

        let before: Vec<(f32, Vec3)> = scene
            .entities()
            .iter()
            .filter_map(|e| match e {
                SceneEntity::Ring(ring) => Some((ring.spin_rate, ring.rotation)),
                _ => None,
            })
            .collect();
        let clock = scene.elapsed();
        scene.step(FRAME, &params);
        assert!((scene.elapsed() - clock - f64::from(FRAME)).abs() < 1e-9);

        let tau = std::f32::consts::TAU;
        let rings = scene.entities().iter().filter_map(|e| match e {
            SceneEntity::Ring(ring) => Some(ring.rotation),
            _ => None,
        });
        assert!(!before.is_empty());
        for ((spin_rate, old), new) in before.iter().zip(rings) {
            let drift = (new.y - old.y - spin_rate * FRAME).rem_euclid(tau);
            assert!(drift.min(tau - drift) < 1e-4);
            assert!((new.x - old.x).abs() < 0.01);
        }
    }

    #[test]
    fn test_pointer_ignored_when_not_interactive() {
        let mut scene = SceneBuilder::from_text(SceneKind::Orb, "quiet").build();
        assert_eq!(scene.pointer_move(Vec2::new(0.5, 0.5)), None);
        scene.click();
        assert_eq!(*scene.interaction(), Interaction::default());
    }

    #[test]
    fn test_pointer_echoes_delta() {
        let mut scene = SceneBuilder::from_text(SceneKind::Orb, "touch")
            .with_interactive(true)
            .build();
        assert_eq!(scene.pointer_move(Vec2::new(0.0, 0.0)), None);
        let delta = scene.pointer_move(Vec2::new(0.5, -0.25));
        assert_eq!(delta, Some(Vec2::new(0.5, -0.25)));
        scene.click();
        assert_eq!(scene.interaction().pulse, 1.0);

        run(&mut scene, 60, &VisualParameters::default());
        let tilt = scene.interaction().tilt;
        assert!(tilt.x > 0.0 && tilt.x <= 0.5 * MAX_TILT);
        assert!(scene.interaction().pulse < 0.1);
    }

    #[test]
    fn test_zero_step_keeps_clock() {
        let mut scene = SceneBuilder::from_text(SceneKind::Chaos, "nan").build();
        scene.step(f32::NAN, &VisualParameters::default());
        assert_eq!(scene.elapsed(), 0.0);
        for blob in scene.blobs() {
            assert!(blob.motion.position.is_finite());
        }
    }
}
