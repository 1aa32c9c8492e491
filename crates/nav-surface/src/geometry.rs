//! Raw level geometry handed to the surface builder.
//!
//! A geometry provider returns a [`RegionGeometry`] in world space (z up).
//! The engine consumes [`EngineGeometry`], the same data with the vertical
//! axis moved to index 1.

use nav_core::Vec3;

use crate::{SurfaceError, SurfaceResult};

/// A point in engine space: `[x, up, y]`.
pub type EnginePoint = [f32; 3];

/// World → engine: `(x, y, z)` becomes `[x, z, y]`.
#[inline]
pub fn to_engine(v: Vec3) -> EnginePoint {
    [v.x, v.z, v.y]
}

/// Engine → world: `[x, up, y]` becomes `(x, y, up)`.
#[inline]
pub fn from_engine(p: EnginePoint) -> Vec3 {
    Vec3::new(p[0], p[2], p[1])
}

// ── RegionGeometry ────────────────────────────────────────────────────────────

/// Triangle soup for one region, world space.
#[derive(Clone, Debug, Default)]
pub struct RegionGeometry {
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
    pub vertices:   Vec<Vec3>,
    pub triangles:  Vec<[u32; 3]>,
}

impl RegionGeometry {
    /// Wrap vertices and triangles, deriving bounds from the vertices.
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        let mut g = RegionGeometry { vertices, triangles, ..Default::default() };
        g.recompute_bounds();
        g
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn recompute_bounds(&mut self) {
        let mut min = Vec3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Vec3::new(f32::MIN, f32::MIN, f32::MIN);
        for v in &self.vertices {
            min = Vec3::new(min.x.min(v.x), min.y.min(v.y), min.z.min(v.z));
            max = Vec3::new(max.x.max(v.x), max.y.max(v.y), max.z.max(v.z));
        }
        if self.vertices.is_empty() {
            min = Vec3::ZERO;
            max = Vec3::ZERO;
        }
        self.bounds_min = min;
        self.bounds_max = max;
    }

    pub fn push_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let base = self.vertices.len() as u32;
        self.vertices.extend([a, b, c]);
        self.triangles.push([base, base + 1, base + 2]);
        self.recompute_bounds();
    }

    /// Quad `a b c d` in order around its perimeter, split along `a–c`.
    pub fn push_quad(&mut self, a: Vec3, b: Vec3, c: Vec3, d: Vec3) {
        let base = self.vertices.len() as u32;
        self.vertices.extend([a, b, c, d]);
        self.triangles.push([base, base + 1, base + 2]);
        self.triangles.push([base, base + 2, base + 3]);
        self.recompute_bounds();
    }

    /// Flat rectangular floor at height `z`, tessellated into `step`-sized
    /// squares that share vertices.  `step` must be positive and the bounds
    /// finite with `min <= max`; nothing is added otherwise.
    pub fn push_floor(&mut self, min: (f32, f32), max: (f32, f32), z: f32, step: f32) -> SurfaceResult<()> {
        if !(step.is_finite() && step > 0.0) {
            return Err(SurfaceError::InvalidGeometry(format!("floor step must be positive, got {step}")));
        }
        let finite = [min.0, min.1, max.0, max.1, z].iter().all(|v| v.is_finite());
        if !finite || min.0 > max.0 || min.1 > max.1 {
            return Err(SurfaceError::InvalidGeometry(format!(
                "floor bounds {min:?}..{max:?} at z {z} are not a finite rectangle"
            )));
        }
        let nx = (((max.0 - min.0) / step).ceil() as u32).max(1);
        let ny = (((max.1 - min.1) / step).ceil() as u32).max(1);
        let base = self.vertices.len() as u32;
        for j in 0..=ny {
            for i in 0..=nx {
                let x = (min.0 + i as f32 * step).min(max.0);
                let y = (min.1 + j as f32 * step).min(max.1);
                self.vertices.push(Vec3::new(x, y, z));
            }
        }
        let row = nx + 1;
        for j in 0..ny {
            for i in 0..nx {
                let v00 = base + j * row + i;
                let v10 = v00 + 1;
                let v01 = v00 + row;
                let v11 = v01 + 1;
                self.triangles.push([v00, v10, v11]);
                self.triangles.push([v00, v11, v01]);
            }
        }
        self.recompute_bounds();
        Ok(())
    }

    /// Index and finiteness checks.
    pub fn validate(&self) -> SurfaceResult<()> {
        let n = self.vertices.len() as u32;
        if let Some(t) = self.triangles.iter().find(|t| t.iter().any(|&i| i >= n)) {
            return Err(SurfaceError::InvalidGeometry(format!(
                "triangle {t:?} indexes past {n} vertices"
            )));
        }
        if self.vertices.iter().any(|v| !v.is_finite()) {
            return Err(SurfaceError::InvalidGeometry("non-finite vertex".into()));
        }
        Ok(())
    }

    /// Convert to engine space.
    pub fn to_engine(&self) -> EngineGeometry {
        EngineGeometry {
            bounds_min: to_engine(self.bounds_min),
            bounds_max: to_engine(self.bounds_max),
            vertices:   self.vertices.iter().copied().map(to_engine).collect(),
            triangles:  self.triangles.clone(),
        }
    }
}

// ── EngineGeometry ────────────────────────────────────────────────────────────

/// Engine-space geometry as consumed by [`SurfaceEngine::build`](crate::SurfaceEngine::build).
#[derive(Clone, Debug, Default)]
pub struct EngineGeometry {
    pub bounds_min: EnginePoint,
    pub bounds_max: EnginePoint,
    pub vertices:   Vec<EnginePoint>,
    pub triangles:  Vec<[u32; 3]>,
}
