//! Point-set geometry generated without randomness.

use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// Unit-sphere vertices laid out in latitude rings plus the two poles.
///
/// Produces `(rings - 1) * segments + 2` points.
pub fn uv_sphere(rings: u32, segments: u32) -> Vec<Vec3> {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let mut points = Vec::with_capacity(((rings - 1) * segments + 2) as usize);

    points.push(Vec3::Y);
    for r in 1..rings {
        let phi = PI * r as f32 / rings as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for s in 0..segments {
            let theta = TAU * s as f32 / segments as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            points.push(Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta));
        }
    }
    points.push(Vec3::NEG_Y);
    points
}

/// Evenly spread points on the unit sphere (golden-angle spiral).
pub fn fibonacci_sphere(count: u32) -> Vec<Vec3> {
    let count = count.max(1);
    let golden = PI * (3.0 - 5.0f32.sqrt());
    (0..count)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as f32 + 0.5) / count as f32;
            let r = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden * i as f32;
            Vec3::new(r * theta.cos(), y, r * theta.sin())
        })
        .collect()
}

/// Corners of the Sierpinski tetrahedron after `depth` subdivisions.
///
/// Yields `4^(depth + 1)` points, fitting inside the unit sphere.
pub fn sierpinski(depth: u32) -> Vec<Vec3> {
    let s = 1.0 / 3.0f32.sqrt();
    let root = [
        Vec3::new(s, s, s),
        Vec3::new(s, -s, -s),
        Vec3::new(-s, s, -s),
        Vec3::new(-s, -s, s),
    ];

    let mut tetrahedra = vec![root];
    for _ in 0..depth {
        let mut next = Vec::with_capacity(tetrahedra.len() * 4);
        for t in &tetrahedra {
            for corner in 0..4 {
                let anchor = t[corner];
                next.push([
                    (t[0] + anchor) * 0.5,
                    (t[1] + anchor) * 0.5,
                    (t[2] + anchor) * 0.5,
                    (t[3] + anchor) * 0.5,
                ]);
            }
        }
        tetrahedra = next;
    }

    tetrahedra.into_iter().flatten().collect()
}

/// Outline of an upright cylinder: top and bottom circles plus struts.
pub fn cylinder_outline(radius: f32, half_height: f32, circle_samples: u32, struts: u32) -> Vec<Vec3> {
    let mut points = Vec::new();
    for y in [-half_height, half_height] {
        for i in 0..circle_samples {
            let a = TAU * i as f32 / circle_samples as f32;
            points.push(Vec3::new(radius * a.cos(), y, radius * a.sin()));
        }
    }
    let strut_samples = 12;
    for i in 0..struts {
        let a = TAU * i as f32 / struts as f32;
        for k in 1..strut_samples {
            let y = -half_height + 2.0 * half_height * k as f32 / strut_samples as f32;
            points.push(Vec3::new(radius * a.cos(), y, radius * a.sin()));
        }
    }
    points
}
