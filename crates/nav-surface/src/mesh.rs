//! Triangle surface and its builder.
//!
//! # Data layout
//!
//! A [`NavSurface`] is a welded triangle mesh in engine space.  Each
//! [`SurfaceTri`] stores its three vertex indices and, per edge, the index of
//! the triangle across that edge (`NO_NEIGHBOR` on boundaries).  Edge `s`
//! runs from `verts[s]` to `verts[(s + 1) % 3]`.
//!
//! The persisted part is [`SurfaceData`]; the R-tree over triangle bounds is
//! rebuilt on load and never serialized.
//!
//! # Build pipeline
//!
//! 1. keep triangles whose centroid lies inside the region bounds
//! 2. weld vertices on a `cell_size` × `cell_height` grid
//! 3. drop degenerate and too-steep triangles
//! 4. link triangles sharing an edge in plan whose endpoint heights differ by
//!    at most `agent_max_climb`
//! 5. drop connected islands smaller than the minimum region area
//! 6. compact and index

use std::collections::VecDeque;

use rstar::{AABB, RTree, RTreeObject};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::FLAG_WALK;
use crate::geometry::{EngineGeometry, EnginePoint};
use crate::{BuildSettings, SurfaceError, SurfaceResult};

/// Neighbor sentinel for boundary edges.
pub const NO_NEIGHBOR: u32 = u32::MAX;

// ── Persisted data ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceTri {
    pub verts:     [u32; 3],
    pub neighbors: [u32; 3],
    pub flags:     u16,
    /// Area projected onto the ground plane.
    pub area:      f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceData {
    pub bounds_min: EnginePoint,
    pub bounds_max: EnginePoint,
    pub vertices:   Vec<EnginePoint>,
    pub tris:       Vec<SurfaceTri>,
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub(crate) struct TriEntry {
    pub(crate) tri: u32,
    min: EnginePoint,
    max: EnginePoint,
}

impl RTreeObject for TriEntry {
    type Envelope = AABB<[f32; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

// ── NavSurface ────────────────────────────────────────────────────────────────

/// An immutable, queryable walkable surface.
#[derive(Debug)]
pub struct NavSurface {
    data:             SurfaceData,
    pub(crate) index: RTree<TriEntry>,
}

impl PartialEq for NavSurface {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl NavSurface {
    /// Validate persisted data and rebuild the spatial index.
    pub fn from_data(data: SurfaceData) -> SurfaceResult<Self> {
        let nv = data.vertices.len() as u32;
        let nt = data.tris.len() as u32;
        if nt == 0 {
            return Err(SurfaceError::Corrupt("surface has no triangles".into()));
        }
        if data.vertices.iter().flatten().any(|c| !c.is_finite()) {
            return Err(SurfaceError::Corrupt("non-finite vertex".into()));
        }
        for (i, t) in data.tris.iter().enumerate() {
            if t.verts.iter().any(|&v| v >= nv) {
                return Err(SurfaceError::Corrupt(format!("triangle {i} indexes past {nv} vertices")));
            }
            if t.neighbors.iter().any(|&n| n != NO_NEIGHBOR && n >= nt) {
                return Err(SurfaceError::Corrupt(format!("triangle {i} links past {nt} triangles")));
            }
            if !(t.area.is_finite() && t.area >= 0.0) {
                return Err(SurfaceError::Corrupt(format!("triangle {i} has area {}", t.area)));
            }
        }

        let entries = (0..nt)
            .map(|i| {
                let [a, b, c] = tri_points(&data, i);
                TriEntry {
                    tri: i,
                    min: [a[0].min(b[0]).min(c[0]), a[1].min(b[1]).min(c[1]), a[2].min(b[2]).min(c[2])],
                    max: [a[0].max(b[0]).max(c[0]), a[1].max(b[1]).max(c[1]), a[2].max(b[2]).max(c[2])],
                }
            })
            .collect();

        Ok(NavSurface { data, index: RTree::bulk_load(entries) })
    }

    #[inline]
    pub fn data(&self) -> &SurfaceData {
        &self.data
    }

    #[inline]
    pub fn tri_count(&self) -> usize {
        self.data.tris.len()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.data.vertices.len()
    }

    #[inline]
    pub fn tri(&self, i: u32) -> &SurfaceTri {
        &self.data.tris[i as usize]
    }

    #[inline]
    pub fn tri_points(&self, i: u32) -> [EnginePoint; 3] {
        tri_points(&self.data, i)
    }

    pub fn centroid(&self, i: u32) -> EnginePoint {
        let [a, b, c] = self.tri_points(i);
        [(a[0] + b[0] + c[0]) / 3.0, (a[1] + b[1] + c[1]) / 3.0, (a[2] + b[2] + c[2]) / 3.0]
    }

    /// Endpoints of edge `slot` of triangle `i`.
    #[inline]
    pub fn edge(&self, i: u32, slot: usize) -> (EnginePoint, EnginePoint) {
        let t = self.tri(i);
        (
            self.data.vertices[t.verts[slot] as usize],
            self.data.vertices[t.verts[(slot + 1) % 3] as usize],
        )
    }

    pub fn total_area(&self) -> f32 {
        self.data.tris.iter().map(|t| t.area).sum()
    }

    pub fn bounds(&self) -> (EnginePoint, EnginePoint) {
        (self.data.bounds_min, self.data.bounds_max)
    }

    /// Number of connected components.
    pub fn island_count(&self) -> usize {
        components(&self.data.tris).1
    }
}

fn tri_points(data: &SurfaceData, i: u32) -> [EnginePoint; 3] {
    let t = &data.tris[i as usize];
    [
        data.vertices[t.verts[0] as usize],
        data.vertices[t.verts[1] as usize],
        data.vertices[t.verts[2] as usize],
    ]
}

/// Component label per triangle and the component count.
fn components(tris: &[SurfaceTri]) -> (Vec<u32>, usize) {
    let mut label = vec![u32::MAX; tris.len()];
    let mut count = 0u32;
    let mut queue = VecDeque::new();
    for seed in 0..tris.len() {
        if label[seed] != u32::MAX {
            continue;
        }
        label[seed] = count;
        queue.push_back(seed as u32);
        while let Some(t) = queue.pop_front() {
            for &n in &tris[t as usize].neighbors {
                if n != NO_NEIGHBOR && label[n as usize] == u32::MAX {
                    label[n as usize] = count;
                    queue.push_back(n);
                }
            }
        }
        count += 1;
    }
    (label, count as usize)
}

// ── SurfaceBuilder ────────────────────────────────────────────────────────────

type GridKey = (i32, i32, i32);
type PlanKey = (i32, i32);

/// One triangle edge as seen by the linker.
struct EdgeRef {
    tri:     u32,
    slot:    usize,
    /// Endpoint heights ordered to match the sorted plan key.
    heights: [f32; 2],
}

/// Builds a [`NavSurface`] from engine-space geometry.
pub struct SurfaceBuilder {
    settings: BuildSettings,
}

impl SurfaceBuilder {
    pub fn new(settings: BuildSettings) -> Self {
        Self { settings }
    }

    pub fn build(&self, geometry: &EngineGeometry) -> SurfaceResult<NavSurface> {
        self.settings.validate()?;
        let nv = geometry.vertices.len() as u32;
        if geometry.triangles.iter().flatten().any(|&i| i >= nv) {
            return Err(SurfaceError::InvalidGeometry("triangle index out of range".into()));
        }

        let (vertices, mut tris) = self.weld_and_filter(geometry);
        let input = geometry.triangles.len();
        let walkable = tris.len();

        self.link(&vertices, &mut tris);
        let tris = self.drop_islands(tris);
        if tris.is_empty() {
            return Err(SurfaceError::NoWalkableSurface);
        }
        let data = compact(vertices, tris);

        debug!(
            input,
            walkable,
            kept = data.tris.len(),
            vertices = data.vertices.len(),
            "surface built"
        );
        NavSurface::from_data(data)
    }

    fn grid_key(&self, p: EnginePoint) -> GridKey {
        let cs = self.settings.cell_size;
        let ch = self.settings.cell_height;
        ((p[0] / cs).round() as i32, (p[1] / ch).round() as i32, (p[2] / cs).round() as i32)
    }

    fn plan_key(&self, p: EnginePoint) -> PlanKey {
        let cs = self.settings.cell_size;
        ((p[0] / cs).round() as i32, (p[2] / cs).round() as i32)
    }

    /// Steps 1–3: welded vertex list and unlinked walkable triangles.
    fn weld_and_filter(&self, geometry: &EngineGeometry) -> (Vec<EnginePoint>, Vec<SurfaceTri>) {
        let min_up = self.settings.agent_max_slope.to_radians().cos();
        let (bmin, bmax) = (geometry.bounds_min, geometry.bounds_max);
        let eps = self.settings.cell_size;

        let mut welded: FxHashMap<GridKey, u32> = FxHashMap::default();
        let mut vertices: Vec<EnginePoint> = Vec::new();
        let mut tris = Vec::new();

        for src in &geometry.triangles {
            let p = [
                geometry.vertices[src[0] as usize],
                geometry.vertices[src[1] as usize],
                geometry.vertices[src[2] as usize],
            ];
            let cx = (p[0][0] + p[1][0] + p[2][0]) / 3.0;
            let cy = (p[0][2] + p[1][2] + p[2][2]) / 3.0;
            if cx < bmin[0] - eps || cx > bmax[0] + eps || cy < bmin[2] - eps || cy > bmax[2] + eps {
                continue;
            }

            let n = cross(sub(p[1], p[0]), sub(p[2], p[0]));
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            let plan_area = n[1].abs() * 0.5;
            if len <= f32::EPSILON || plan_area <= 1e-6 || n[1].abs() < min_up * len {
                continue;
            }

            let verts = p.map(|v| {
                *welded.entry(self.grid_key(v)).or_insert_with(|| {
                    vertices.push(v);
                    vertices.len() as u32 - 1
                })
            });
            if verts[0] == verts[1] || verts[1] == verts[2] || verts[0] == verts[2] {
                continue;
            }

            tris.push(SurfaceTri {
                verts,
                neighbors: [NO_NEIGHBOR; 3],
                flags: FLAG_WALK,
                area: plan_area,
            });
        }
        (vertices, tris)
    }

    /// Step 4.  Edges are grouped by their endpoints' plan cells so stacked
    /// floors sharing an outline stay unlinked unless within climb height.
    fn link(&self, vertices: &[EnginePoint], tris: &mut [SurfaceTri]) {
        let climb = self.settings.agent_max_climb;
        let mut groups: FxHashMap<(PlanKey, PlanKey), Vec<EdgeRef>> = FxHashMap::default();
        let mut order: Vec<(PlanKey, PlanKey)> = Vec::new();

        for (ti, t) in tris.iter().enumerate() {
            for slot in 0..3 {
                let a = vertices[t.verts[slot] as usize];
                let b = vertices[t.verts[(slot + 1) % 3] as usize];
                let (ka, kb) = (self.plan_key(a), self.plan_key(b));
                if ka == kb {
                    continue;
                }
                let (key, heights) = if ka < kb { ((ka, kb), [a[1], b[1]]) } else { ((kb, ka), [b[1], a[1]]) };
                groups
                    .entry(key)
                    .or_insert_with(|| {
                        order.push(key);
                        Vec::new()
                    })
                    .push(EdgeRef { tri: ti as u32, slot, heights });
            }
        }

        for key in order {
            let Some(edges) = groups.get(&key) else { continue };
            for i in 0..edges.len() {
                for j in (i + 1)..edges.len() {
                    let (e, f) = (&edges[i], &edges[j]);
                    if e.tri == f.tri
                        || tris[e.tri as usize].neighbors[e.slot] != NO_NEIGHBOR
                        || tris[f.tri as usize].neighbors[f.slot] != NO_NEIGHBOR
                    {
                        continue;
                    }
                    if (e.heights[0] - f.heights[0]).abs() <= climb
                        && (e.heights[1] - f.heights[1]).abs() <= climb
                    {
                        tris[e.tri as usize].neighbors[e.slot] = f.tri;
                        tris[f.tri as usize].neighbors[f.slot] = e.tri;
                    }
                }
            }
        }
    }

    /// Step 5.
    fn drop_islands(&self, tris: Vec<SurfaceTri>) -> Vec<SurfaceTri> {
        let (label, count) = components(&tris);
        let mut area = vec![0.0f32; count];
        for (t, &l) in tris.iter().zip(&label) {
            area[l as usize] += t.area;
        }
        let min_area = self.settings.min_island_area();
        let keep: Vec<bool> = area.iter().map(|&a| a >= min_area).collect();

        let mut remap = vec![NO_NEIGHBOR; tris.len()];
        let mut next = 0u32;
        for (i, &l) in label.iter().enumerate() {
            if keep[l as usize] {
                remap[i] = next;
                next += 1;
            }
        }

        tris.into_iter()
            .zip(label)
            .filter(|(_, l)| keep[*l as usize])
            .map(|(mut t, _)| {
                for n in &mut t.neighbors {
                    if *n != NO_NEIGHBOR {
                        *n = remap[*n as usize];
                    }
                }
                t
            })
            .collect()
    }
}

/// Step 6: drop unreferenced vertices and compute bounds.
fn compact(vertices: Vec<EnginePoint>, mut tris: Vec<SurfaceTri>) -> SurfaceData {
    let mut remap = vec![u32::MAX; vertices.len()];
    let mut kept = Vec::new();
    for t in &mut tris {
        for v in &mut t.verts {
            let old = *v as usize;
            if remap[old] == u32::MAX {
                remap[old] = kept.len() as u32;
                kept.push(vertices[old]);
            }
            *v = remap[old];
        }
    }

    let mut bounds_min = [f32::MAX; 3];
    let mut bounds_max = [f32::MIN; 3];
    for v in &kept {
        for k in 0..3 {
            bounds_min[k] = bounds_min[k].min(v[k]);
            bounds_max[k] = bounds_max[k].max(v[k]);
        }
    }
    SurfaceData { bounds_min, bounds_max, vertices: kept, tris }
}

#[inline]
fn sub(a: EnginePoint, b: EnginePoint) -> EnginePoint {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn cross(a: EnginePoint, b: EnginePoint) -> EnginePoint {
    [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]]
}
