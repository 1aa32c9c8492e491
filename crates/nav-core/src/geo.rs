//! Positions and vector math.
//!
//! `Vec3` is single precision: landblocks are 192 units across, so `f32`
//! keeps well under a millimetre of error.  Navigation thresholds are all
//! compared in **planar squared distance** (`x`/`y` only) so that stairs and
//! ramps do not count against "reached" checks.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use crate::{CellId, RegionKey};

// ── Vec3 ──────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub fn dot(self, o: Vec3) -> f32 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    #[inline]
    pub fn cross(self, o: Vec3) -> Vec3 {
        Vec3::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    #[inline]
    pub fn distance(self, o: Vec3) -> f32 {
        (self - o).length()
    }

    /// Squared distance ignoring the vertical axis.
    #[inline]
    pub fn distance_2d_squared(self, o: Vec3) -> f32 {
        let dx = self.x - o.x;
        let dy = self.y - o.y;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn lerp(self, o: Vec3, t: f32) -> Vec3 {
        self + (o - self) * t
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, o: Vec3) {
        *self = *self + o;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, s: f32) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

// ── Position ──────────────────────────────────────────────────────────────────

/// A world location: owning cell, local coordinates within the landblock, and
/// facing.
///
/// `heading` is in radians, measured clockwise from +y; `0.0` faces +y and
/// `π/2` faces +x.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub cell:    CellId,
    pub pos:     Vec3,
    pub heading: f32,
}

impl Position {
    #[inline]
    pub fn new(cell: CellId, pos: Vec3) -> Self {
        Self { cell, pos, heading: 0.0 }
    }

    #[inline]
    pub fn with_heading(mut self, heading: f32) -> Self {
        self.heading = heading;
        self
    }

    #[inline]
    pub fn region(&self) -> RegionKey {
        self.cell.region()
    }

    #[inline]
    pub fn distance_2d_squared(&self, other: &Position) -> f32 {
        self.pos.distance_2d_squared(other.pos)
    }

    /// Same cell and facing, different coordinates.
    #[inline]
    pub fn moved_to(&self, pos: Vec3) -> Position {
        Position { cell: self.cell, pos, heading: self.heading }
    }

    /// Point `dist` units ahead along the current heading, same height.
    pub fn in_front_of(&self, dist: f32) -> Position {
        let (sin, cos) = self.heading.sin_cos();
        self.moved_to(self.pos + Vec3::new(sin * dist, cos * dist, 0.0))
    }

    /// Heading that faces `target` from here, in the same convention.
    pub fn heading_to(&self, target: Vec3) -> f32 {
        let d = target - self.pos;
        d.x.atan2(d.y)
    }
}
