//! Queries over a [`NavSurface`].
//!
//! # Route search
//!
//! A* runs over the triangle adjacency graph.  A node's position is the
//! midpoint of the edge it was entered through (the start point for the
//! start triangle), and costs are integer millimetres so the heap ordering
//! is total and ties break on triangle index.  The resulting corridor is
//! reduced to straight segments with the funnel algorithm; all funnel tests
//! are on the ground plane (`x`, `y` in world terms, indices 0 and 2 here).
//!
//! # Random points
//!
//! Unbounded sampling picks a triangle weighted by plan area, then a uniform
//! barycentric point.  The bounded variant first collects the triangles
//! reachable from the start through edges within `max_distance`, then
//! samples those, rejecting points outside the circle.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use rand::{Rng, RngCore};

use crate::engine::{PolyRef, QueryFilter, SurfacePoint};
use crate::geometry::EnginePoint;
use crate::mesh::{NO_NEIGHBOR, NavSurface};

/// Samples drawn by area weight before switching to disc sampling.
const AREA_ATTEMPTS: u32 = 8;
/// Disc samples drawn before giving up.
const DISC_ATTEMPTS: u32 = 24;

// ── Nearest point ─────────────────────────────────────────────────────────────

pub fn nearest_point(
    surface:      &NavSurface,
    point:        EnginePoint,
    half_extents: EnginePoint,
    filter:       &QueryFilter,
) -> Option<SurfacePoint> {
    if !point.iter().chain(half_extents.iter()).all(|c| c.is_finite()) {
        return None;
    }
    let lo = sub(point, half_extents);
    let hi = add(point, half_extents);
    let envelope = rstar::AABB::from_corners(lo, hi);

    let mut best: Option<(f32, u32, EnginePoint)> = None;
    for entry in surface.index.locate_in_envelope_intersecting(&envelope) {
        if !filter.passes(surface.tri(entry.tri).flags) {
            continue;
        }
        let [a, b, c] = surface.tri_points(entry.tri);
        let q = closest_point_on_triangle(point, a, b, c);
        let d = dist_sq(point, q);
        let better = match best {
            None => true,
            Some((bd, bt, _)) => d < bd || (d == bd && entry.tri < bt),
        };
        if better {
            best = Some((d, entry.tri, q));
        }
    }
    best.map(|(_, tri, pos)| SurfacePoint { poly: PolyRef(tri), pos })
}

// ── Corridor (A*) ─────────────────────────────────────────────────────────────

#[inline]
fn cost_mm(d: f32) -> u32 {
    (d * 1000.0) as u32
}

fn valid_poly(surface: &NavSurface, p: PolyRef, filter: &QueryFilter) -> bool {
    (p.0 as usize) < surface.tri_count() && filter.passes(surface.tri(p.0).flags)
}

/// Triangle sequence from `start.poly` to `end.poly`, both included.
pub fn find_corridor(
    surface: &NavSurface,
    start:   SurfacePoint,
    end:     SurfacePoint,
    filter:  &QueryFilter,
) -> Option<Vec<u32>> {
    if !valid_poly(surface, start.poly, filter) || !valid_poly(surface, end.poly, filter) {
        return None;
    }
    let (from, to) = (start.poly.0, end.poly.0);
    if from == to {
        return Some(vec![from]);
    }

    let n = surface.tri_count();
    let mut g      = vec![u32::MAX; n];
    let mut prev   = vec![NO_NEIGHBOR; n];
    let mut pos    = vec![[0.0f32; 3]; n];
    let mut closed = vec![false; n];

    g[from as usize] = 0;
    pos[from as usize] = start.pos;

    let mut heap: BinaryHeap<Reverse<(u32, u32)>> = BinaryHeap::new();
    heap.push(Reverse((cost_mm(dist(start.pos, end.pos)), from)));

    while let Some(Reverse((_, tri))) = heap.pop() {
        if tri == to {
            let mut corridor = vec![to];
            let mut cur = to;
            while prev[cur as usize] != NO_NEIGHBOR {
                cur = prev[cur as usize];
                corridor.push(cur);
            }
            corridor.reverse();
            return Some(corridor);
        }
        if closed[tri as usize] {
            continue;
        }
        closed[tri as usize] = true;

        for (slot, &nb) in surface.tri(tri).neighbors.iter().enumerate() {
            if nb == NO_NEIGHBOR || closed[nb as usize] || !filter.passes(surface.tri(nb).flags) {
                continue;
            }
            let (a, b) = surface.edge(tri, slot);
            let mid = midpoint(a, b);
            let step = if nb == to {
                dist(pos[tri as usize], mid) + dist(mid, end.pos)
            } else {
                dist(pos[tri as usize], mid)
            };
            let ng = g[tri as usize].saturating_add(cost_mm(step));
            if ng < g[nb as usize] {
                g[nb as usize] = ng;
                prev[nb as usize] = tri;
                pos[nb as usize] = mid;
                let h = if nb == to { 0 } else { cost_mm(dist(mid, end.pos)) };
                heap.push(Reverse((ng.saturating_add(h), nb)));
            }
        }
    }
    None
}

// ── Funnel ────────────────────────────────────────────────────────────────────

/// Twice the signed plan area of `a b c`; `<= 0` means `c` is right of or on
/// the ray `a → b` when looking along travel direction.
#[inline]
fn triarea2(a: EnginePoint, b: EnginePoint, c: EnginePoint) -> f32 {
    let (ax, az) = (b[0] - a[0], b[2] - a[2]);
    let (bx, bz) = (c[0] - a[0], c[2] - a[2]);
    bx * az - ax * bz
}

#[inline]
fn plan_equal(a: EnginePoint, b: EnginePoint) -> bool {
    dist_2d_sq(a, b) < 1e-6
}

/// Portal `(left, right)` shared by consecutive corridor triangles.
fn portal(surface: &NavSurface, from: u32, to: u32) -> Option<(EnginePoint, EnginePoint)> {
    let slot = surface.tri(from).neighbors.iter().position(|&n| n == to)?;
    let (p, q) = surface.edge(from, slot);
    let c = surface.centroid(from);
    let m = midpoint(p, q);
    let dir = [m[0] - c[0], 0.0, m[2] - c[2]];
    let side = |v: EnginePoint| dir[0] * (v[2] - c[2]) - dir[2] * (v[0] - c[0]);
    if side(p) < side(q) { Some((q, p)) } else { Some((p, q)) }
}

/// Reduce a corridor to its straight-line waypoints, `start` and `end`
/// included.  Consecutive duplicates are removed.
pub fn string_pull(
    surface:  &NavSurface,
    corridor: &[u32],
    start:    EnginePoint,
    end:      EnginePoint,
) -> Vec<EnginePoint> {
    let mut portals = Vec::with_capacity(corridor.len() + 1);
    portals.push((start, start));
    for w in corridor.windows(2) {
        match portal(surface, w[0], w[1]) {
            Some(p) => portals.push(p),
            None => return dedup(vec![start, end]),
        }
    }
    portals.push((end, end));

    let mut pts = vec![start];
    let (mut apex, mut left, mut right) = (start, start, start);
    let (mut left_i, mut right_i) = (0usize, 0usize);

    let mut i = 1;
    while i < portals.len() {
        let (pl, pr) = portals[i];

        if triarea2(apex, right, pr) <= 0.0 {
            if plan_equal(apex, right) || triarea2(apex, left, pr) > 0.0 {
                right = pr;
                right_i = i;
            } else {
                pts.push(left);
                apex = left;
                right = apex;
                right_i = left_i;
                i = left_i + 1;
                continue;
            }
        }

        if triarea2(apex, left, pl) >= 0.0 {
            if plan_equal(apex, left) || triarea2(apex, right, pl) < 0.0 {
                left = pl;
                left_i = i;
            } else {
                pts.push(right);
                apex = right;
                left = apex;
                left_i = right_i;
                i = right_i + 1;
                continue;
            }
        }

        i += 1;
    }
    pts.push(end);
    dedup(pts)
}

fn dedup(mut pts: Vec<EnginePoint>) -> Vec<EnginePoint> {
    pts.dedup_by(|b, a| dist_sq(*a, *b) < 1e-8);
    pts
}

// ── Random points ─────────────────────────────────────────────────────────────

fn sample_triangle(surface: &NavSurface, tri: u32, rng: &mut dyn RngCore) -> EnginePoint {
    let [a, b, c] = surface.tri_points(tri);
    let mut s: f32 = rng.r#gen();
    let mut t: f32 = rng.r#gen();
    if s + t > 1.0 {
        s = 1.0 - s;
        t = 1.0 - t;
    }
    add(a, add(scale(sub(b, a), s), scale(sub(c, a), t)))
}

/// Area-weighted pick among `candidates`.
fn pick_by_area(surface: &NavSurface, candidates: &[u32], rng: &mut dyn RngCore) -> Option<u32> {
    let total: f32 = candidates.iter().map(|&t| surface.tri(t).area).sum();
    if !(total > 0.0) {
        return None;
    }
    let r = rng.r#gen::<f32>() * total;
    let mut acc = 0.0;
    for &t in candidates {
        acc += surface.tri(t).area;
        if r < acc {
            return Some(t);
        }
    }
    candidates.last().copied()
}

pub fn random_point(
    surface: &NavSurface,
    filter:  &QueryFilter,
    rng:     &mut dyn RngCore,
) -> Option<SurfacePoint> {
    let candidates: Vec<u32> = (0..surface.tri_count() as u32)
        .filter(|&t| filter.passes(surface.tri(t).flags))
        .collect();
    let tri = pick_by_area(surface, &candidates, rng)?;
    Some(SurfacePoint { poly: PolyRef(tri), pos: sample_triangle(surface, tri, rng) })
}

pub fn random_point_within(
    surface:      &NavSurface,
    start:        SurfacePoint,
    max_distance: f32,
    filter:       &QueryFilter,
    rng:          &mut dyn RngCore,
) -> Option<SurfacePoint> {
    if !valid_poly(surface, start.poly, filter) || !(max_distance.is_finite() && max_distance > 0.0) {
        return None;
    }
    let max_sq = max_distance * max_distance;

    let mut reached = vec![false; surface.tri_count()];
    let mut candidates = vec![start.poly.0];
    let mut queue = VecDeque::from([start.poly.0]);
    reached[start.poly.0 as usize] = true;
    while let Some(tri) = queue.pop_front() {
        for (slot, &nb) in surface.tri(tri).neighbors.iter().enumerate() {
            if nb == NO_NEIGHBOR || reached[nb as usize] || !filter.passes(surface.tri(nb).flags) {
                continue;
            }
            let (a, b) = surface.edge(tri, slot);
            if dist_point_segment_2d_sq(start.pos, a, b) > max_sq {
                continue;
            }
            reached[nb as usize] = true;
            candidates.push(nb);
            queue.push_back(nb);
        }
    }

    for _ in 0..AREA_ATTEMPTS {
        let tri = pick_by_area(surface, &candidates, rng)?;
        let p = sample_triangle(surface, tri, rng);
        if dist_2d_sq(p, start.pos) <= max_sq {
            return Some(SurfacePoint { poly: PolyRef(tri), pos: p });
        }
    }

    // Surface much larger than the circle: sample the disc instead.
    for _ in 0..DISC_ATTEMPTS {
        let r = max_distance * rng.r#gen::<f32>().sqrt();
        let theta = rng.r#gen::<f32>() * std::f32::consts::TAU;
        let (x, z) = (start.pos[0] + r * theta.cos(), start.pos[2] + r * theta.sin());
        for &tri in &candidates {
            if let Some(y) = height_in_triangle(surface, tri, x, z) {
                return Some(SurfacePoint { poly: PolyRef(tri), pos: [x, y, z] });
            }
        }
    }
    None
}

/// Interpolated height of `(x, z)` if it falls inside `tri` in plan.
fn height_in_triangle(surface: &NavSurface, tri: u32, x: f32, z: f32) -> Option<f32> {
    let [a, b, c] = surface.tri_points(tri);
    let v0 = [c[0] - a[0], c[2] - a[2]];
    let v1 = [b[0] - a[0], b[2] - a[2]];
    let v2 = [x - a[0], z - a[2]];
    let d00 = v0[0] * v0[0] + v0[1] * v0[1];
    let d01 = v0[0] * v1[0] + v0[1] * v1[1];
    let d02 = v0[0] * v2[0] + v0[1] * v2[1];
    let d11 = v1[0] * v1[0] + v1[1] * v1[1];
    let d12 = v1[0] * v2[0] + v1[1] * v2[1];
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() <= f32::EPSILON {
        return None;
    }
    let u = (d11 * d02 - d01 * d12) / denom;
    let v = (d00 * d12 - d01 * d02) / denom;
    const EPS: f32 = 1e-4;
    if u >= -EPS && v >= -EPS && u + v <= 1.0 + EPS {
        Some(a[1] + (c[1] - a[1]) * u + (b[1] - a[1]) * v)
    } else {
        None
    }
}

// ── Geometry helpers ──────────────────────────────────────────────────────────

/// Closest point on triangle `abc` to `p` (Ericson, Real-Time Collision
/// Detection §5.1.5).
pub fn closest_point_on_triangle(p: EnginePoint, a: EnginePoint, b: EnginePoint, c: EnginePoint) -> EnginePoint {
    let ab = sub(b, a);
    let ac = sub(c, a);
    let ap = sub(p, a);
    let d1 = dot(ab, ap);
    let d2 = dot(ac, ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = sub(p, b);
    let d3 = dot(ab, bp);
    let d4 = dot(ac, bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return add(a, scale(ab, v));
    }

    let cp = sub(p, c);
    let d5 = dot(ab, cp);
    let d6 = dot(ac, cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return add(a, scale(ac, w));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return add(b, scale(sub(c, b), w));
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    add(a, add(scale(ab, v), scale(ac, w)))
}

fn dist_point_segment_2d_sq(p: EnginePoint, a: EnginePoint, b: EnginePoint) -> f32 {
    let (dx, dz) = (b[0] - a[0], b[2] - a[2]);
    let len_sq = dx * dx + dz * dz;
    let t = if len_sq > 0.0 {
        (((p[0] - a[0]) * dx + (p[2] - a[2]) * dz) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (qx, qz) = (a[0] + t * dx, a[2] + t * dz);
    (p[0] - qx) * (p[0] - qx) + (p[2] - qz) * (p[2] - qz)
}

#[inline]
fn add(a: EnginePoint, b: EnginePoint) -> EnginePoint {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
fn sub(a: EnginePoint, b: EnginePoint) -> EnginePoint {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn scale(a: EnginePoint, s: f32) -> EnginePoint {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
fn dot(a: EnginePoint, b: EnginePoint) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
fn midpoint(a: EnginePoint, b: EnginePoint) -> EnginePoint {
    scale(add(a, b), 0.5)
}

#[inline]
fn dist_sq(a: EnginePoint, b: EnginePoint) -> f32 {
    let d = sub(a, b);
    dot(d, d)
}

#[inline]
fn dist(a: EnginePoint, b: EnginePoint) -> f32 {
    dist_sq(a, b).sqrt()
}

#[inline]
pub(crate) fn dist_2d_sq(a: EnginePoint, b: EnginePoint) -> f32 {
    let (dx, dz) = (a[0] - b[0], a[2] - b[2]);
    dx * dx + dz * dz
}
