//! Color helpers, reserved hue bands, and identity colors.
//!
//! Every entity type draws its hue from its own band so blobs, fractals,
//! particles and rings stay distinguishable whatever the seed. Identity
//! colors (one accent per orb) come from a separate band.

use glam::Vec3;

/// A contiguous slice of the hue wheel, in turns (`0.0..1.0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueBand {
    /// First hue in the band.
    pub start: f32,
    /// Band width.
    pub width: f32,
}

impl HueBand {
    /// Build a band.
    pub const fn new(start: f32, width: f32) -> Self {
        Self { start, width }
    }

    /// Map a unit draw into the band.
    #[inline]
    pub fn sample(&self, unit: f32) -> f32 {
        self.start + unit.clamp(0.0, 1.0) * self.width
    }

    /// Whether `hue` lies inside the band.
    pub fn contains(&self, hue: f32) -> bool {
        hue >= self.start && hue <= self.start + self.width
    }

    /// Whether two bands share any hue.
    pub fn overlaps(&self, other: &HueBand) -> bool {
        self.start < other.start + other.width && other.start < self.start + self.width
    }
}

/// Deep red to orange.
pub const BLOB_BAND: HueBand = HueBand::new(0.0, 0.07);
/// Orange to amber.
pub const FRACTAL_BAND: HueBand = HueBand::new(0.075, 0.045);
/// Amber to gold sparks.
pub const PARTICLE_BAND: HueBand = HueBand::new(0.125, 0.045);
/// Blue to violet.
pub const RING_BAND: HueBand = HueBand::new(0.58, 0.17);
/// Green to cyan, reserved for identity accents.
pub const IDENTITY_BAND: HueBand = HueBand::new(0.22, 0.3);

/// Identity colors are fully deterministic at these levels.
pub const IDENTITY_SATURATION: f32 = 0.72;
pub const IDENTITY_VALUE: f32 = 0.95;

/// Convert HSV to RGB. Hue wraps; saturation and value are clamped.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);

    let c = v * s;
    let x = c * (1.0 - ((h * 6.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h * 6.0) as u32 % 6 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Vec3::new(r + m, g + m, b + m)
}

/// Convert HSL to RGB. Hue wraps; saturation and lightness are clamped.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    // HSL -> HSV
    let v = l + s * l.min(1.0 - l);
    let sv = if v <= f32::EPSILON { 0.0 } else { 2.0 * (1.0 - l / v) };
    hsv_to_rgb(h, sv, v)
}

/// Polynomial rolling hash used for identity colors.
fn rolling_hash(id: &str) -> u32 {
    id.bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(b as u32))
}

/// Hue used when the identifier is empty.
const DEFAULT_IDENTITY_HUE: f32 = 0.36;

/// Stable accent color for an identifier.
///
/// The same id always yields the same color; different ids almost always
/// differ. Empty ids map to a fixed default.
pub fn id_to_color(id: &str) -> Vec3 {
    let hue = if id.is_empty() {
        DEFAULT_IDENTITY_HUE
    } else {
        let degrees = rolling_hash(id) % 360;
        IDENTITY_BAND.sample(degrees as f32 / 360.0)
    };
    hsv_to_rgb(hue, IDENTITY_SATURATION, IDENTITY_VALUE)
}
