//! End-to-end checks of seeding, building and stepping scenes.

use orbscape::prelude::*;
use orbscape::scene::{entity_counts, EntityKind, CONTAINER_HALF_HEIGHT, CONTAINER_RADIUS};

const FRAME: f32 = 1.0 / 60.0;

fn chaos(seed: &str, level: i32) -> Scene {
    SceneBuilder::from_text(SceneKind::Chaos, seed)
        .with_evolution(level)
        .build()
}

fn run(scene: &mut Scene, params: &VisualParameters, frames: usize) {
    for _ in 0..frames {
        scene.step(FRAME, params);
    }
}

#[test]
fn test_known_seed_hash() {
    assert_eq!(hash_to_seed("seed"), 2090719782);
    assert_eq!(hash_to_seed(""), 5381);
}

#[test]
fn test_seed_scene_at_level_zero() {
    let scene = chaos("seed", 0);
    let counts = scene.counts();
    assert_eq!(counts.containers, 1);
    assert_eq!(counts.blobs, 4);
    assert_eq!(counts.fractals, 2);
    assert_eq!(counts.particles, 2000);
    assert_eq!(counts.rings, 7);
    assert_eq!(counts.shells, 0);
    assert_eq!(scene.seed(), 2090719782);
}

#[test]
fn test_counts_grow_with_evolution() {
    let mut previous = entity_counts(SceneKind::Chaos, 0);
    for level in 1..=10 {
        let counts = entity_counts(SceneKind::Chaos, level);
        assert!(counts.blobs >= previous.blobs);
        assert!(counts.fractals >= previous.fractals);
        assert!(counts.particles > previous.particles);
        assert!(counts.rings > previous.rings);
        previous = counts;
    }
    assert_eq!(chaos("seed", 10).counts(), previous);
    assert_eq!(chaos("seed", 42).counts(), previous);
    assert_eq!(chaos("seed", -3).counts(), entity_counts(SceneKind::Chaos, 0));
}

#[test]
fn test_orb_scene_shape() {
    let scene = SceneBuilder::from_text(SceneKind::Orb, "orb").build();
    let counts = scene.counts();
    assert_eq!(counts.containers, 0);
    assert_eq!(counts.blobs, 1);
    assert_eq!(counts.fractals, 0);
    assert_eq!(counts.shells, 5);
    assert!(scene.halo().is_some());
    assert!(scene.container().is_none());
}

#[test]
fn test_entity_order() {
    let kinds: Vec<EntityKind> = chaos("order", 0).entities().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds.first(), Some(&EntityKind::Container));
    assert_eq!(kinds[1..5], [EntityKind::Blob; 4]);
    assert_eq!(kinds[5..7], [EntityKind::Fractal; 2]);
    assert_eq!(kinds[7], EntityKind::ParticleCloud);
    assert!(kinds[8..].iter().all(|k| *k == EntityKind::Ring));

    let orb = SceneBuilder::from_text(SceneKind::Orb, "order").build();
    let kinds: Vec<EntityKind> = orb.entities().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds.first(), Some(&EntityKind::Blob));
    assert_eq!(kinds.last(), Some(&EntityKind::Halo));
}

#[test]
fn test_same_seed_same_trajectory() {
    let params = map_magnitude(3e9, true);
    let mut a = chaos("replay", 4);
    let mut b = chaos("replay", 4);
    run(&mut a, &params, 240);
    run(&mut b, &params, 240);

    let (mut ia, mut ib) = (Vec::new(), Vec::new());
    a.instances(&mut ia);
    b.instances(&mut ib);
    assert_eq!(ia, ib);
}

#[test]
fn test_different_seeds_differ() {
    let (mut ia, mut ib) = (Vec::new(), Vec::new());
    chaos("left", 0).instances(&mut ia);
    chaos("right", 0).instances(&mut ib);
    assert_eq!(ia.len(), ib.len());
    assert_ne!(ia, ib);
}

#[test]
fn test_magnitude_does_not_change_structure() {
    let mut scene = chaos("live", 2);
    let counts = scene.counts();
    let capacity = scene.instance_capacity();
    for magnitude in [0.0, 1e3, 1e6, 1e9, 1e12, 1e15] {
        run(&mut scene, &map_magnitude(magnitude, magnitude > 1e9), 30);
        assert_eq!(scene.counts(), counts);
        assert_eq!(scene.instance_capacity(), capacity);
    }
}

#[test]
fn test_instances_fit_capacity() {
    for kind in [SceneKind::Chaos, SceneKind::Orb] {
        let mut scene = SceneBuilder::from_text(kind, "fit").with_evolution(7).build();
        run(&mut scene, &map_magnitude(1e10, false), 10);
        let mut out = Vec::new();
        scene.instances(&mut out);
        assert!(!out.is_empty());
        assert!(out.len() <= scene.instance_capacity());
        assert!(out.iter().all(|i| i.position.is_finite() && i.size.is_finite()));
    }
}

#[test]
fn test_blobs_stay_in_vessel() {
    let mut scene = chaos("vessel", 10);
    let params = map_magnitude(1e13, true);
    for _ in 0..600 {
        scene.step(FRAME, &params);
        for blob in scene.blobs() {
            let p = blob.motion.position;
            assert!(Vec2::new(p.x, p.z).length() <= CONTAINER_RADIUS + 1e-3);
            assert!(p.y.abs() <= CONTAINER_HALF_HEIGHT + 1e-3);
        }
    }
}

#[test]
fn test_particles_stay_in_shell() {
    let mut scene = chaos("cloud", 3);
    run(&mut scene, &map_magnitude(1e12, false), 900);
    let cloud = scene.particle_cloud().expect("chaos scene has particles");
    let outer = cloud.flow.outer_radius;
    assert!(cloud.positions.iter().all(|p| p.length() <= outer + 1e-3));
}

#[test]
fn test_long_stall_is_capped() {
    let params = map_magnitude(1e9, false);
    let mut stalled = chaos("stall", 1);
    stalled.step(30.0, &params);
    assert!(stalled.elapsed() <= 0.1 + 1e-6);

    let mut bad = chaos("stall", 1);
    bad.step(f32::NAN, &params);
    bad.step(-1.0, &params);
    assert_eq!(bad.elapsed(), 0.0);
}

#[test]
fn test_intensity_is_monotonic() {
    let mut previous = map_magnitude(0.0, false);
    let mut magnitude = 1.0;
    while magnitude < 1e16 {
        let params = map_magnitude(magnitude, false);
        assert!(params.intensity >= previous.intensity);
        assert!(params.shell_count >= previous.shell_count);
        previous = params;
        magnitude *= 3.0;
    }
    assert_eq!(previous.intensity, 1.0);
    assert_eq!(previous.shell_count, 5);
}

#[test]
fn test_magnitude_reference_points() {
    let zero = map_magnitude(0.0, false);
    assert_eq!(zero.intensity, 0.0);
    assert_eq!(zero.shell_count, 1);
    assert_eq!(zero.pulse_speed, 1.0);

    let top = map_magnitude(1e12, true);
    assert!((top.intensity - 1.0).abs() < 1e-4);
    assert_eq!(top.shell_count, 5);
    assert_eq!(top.pulse_speed, 2.5);

    assert_eq!(map_magnitude(-10.0, false), zero);
}

#[test]
fn test_identity_colors() {
    let a = id_to_color("deploy-7");
    assert_eq!(a, id_to_color("deploy-7"));
    assert_ne!(a, id_to_color("deploy-8"));
    assert_eq!(id_to_color(""), id_to_color(""));
    for id in ["x", "ticket-1", "a much longer identifier", "ünïcødé"] {
        let c = id_to_color(id);
        assert!(c.min_element() >= 0.0 && c.max_element() <= 1.0);
    }
}

#[test]
fn test_stream_replays() {
    let mut a = SeedStream::from_text("stream");
    let mut b = SeedStream::new(hash_to_seed("stream"));
    for _ in 0..1000 {
        let x = a.next_f64();
        assert_eq!(x, b.next_f64());
        assert!((0.0..1.0).contains(&x));
    }
}
