//! Unit tests for nav-surface.

use nav_core::Vec3;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::geometry::{from_engine, to_engine};
use crate::{
    BuildSettings, EngineGeometry, NavSurface, QueryFilter, RegionGeometry, SurfaceEngine,
    SurfacePoint, TriSurfaceEngine,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const EXTENTS: [f32; 3] = [1.25, 1.25, 1.25];

fn floor(min: (f32, f32), max: (f32, f32), z: f32) -> RegionGeometry {
    let mut g = RegionGeometry::default();
    g.push_floor(min, max, z, 1.0).unwrap();
    g
}

/// L-shaped corridor built from three coarse quads: an east–west leg
/// `0..8 × 0..2`, the elbow `8..10 × 0..2` and a north leg `8..10 × 2..10`.
/// The inner corner is at (8, 2).
fn l_shape() -> RegionGeometry {
    let mut g = RegionGeometry::default();
    g.push_floor((0.0, 0.0), (8.0, 2.0), 0.0, 8.0).unwrap();
    g.push_floor((8.0, 0.0), (10.0, 2.0), 0.0, 2.0).unwrap();
    g.push_floor((8.0, 2.0), (10.0, 10.0), 0.0, 8.0).unwrap();
    g
}

fn build(g: &RegionGeometry) -> NavSurface {
    TriSurfaceEngine.build(&g.to_engine(), &BuildSettings::default()).unwrap()
}

fn snap(surface: &NavSurface, x: f32, y: f32) -> SurfacePoint {
    TriSurfaceEngine
        .find_nearest_point(surface, to_engine(Vec3::new(x, y, 0.0)), EXTENTS, &QueryFilter::default())
        .unwrap()
}

fn route(surface: &NavSurface, from: (f32, f32), to: (f32, f32)) -> Option<Vec<Vec3>> {
    let a = snap(surface, from.0, from.1);
    let b = snap(surface, to.0, to.1);
    TriSurfaceEngine
        .find_straight_route(surface, a, b, &QueryFilter::default())
        .map(|pts| pts.into_iter().map(from_engine).collect())
}

fn near(a: Vec3, x: f32, y: f32) -> bool {
    (a.x - x).abs() < 1e-3 && (a.y - y).abs() < 1e-3
}

// ── Geometry ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod geometry_tests {
    use super::*;

    #[test]
    fn axis_swap_roundtrip() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(to_engine(v), [1.0, 3.0, 2.0]);
        assert_eq!(from_engine(to_engine(v)), v);
    }

    #[test]
    fn floor_tessellation_counts() {
        let g = floor((0.0, 0.0), (4.0, 3.0), 0.0);
        assert_eq!(g.vertices.len(), 5 * 4);
        assert_eq!(g.triangles.len(), 4 * 3 * 2);
        assert_eq!(g.bounds_max, Vec3::new(4.0, 3.0, 0.0));
    }

    #[test]
    fn floor_rejects_bad_step_or_bounds() {
        let mut g = RegionGeometry::default();
        for step in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = g.push_floor((0.0, 0.0), (4.0, 4.0), 0.0, step).unwrap_err();
            assert!(matches!(err, crate::SurfaceError::InvalidGeometry(_)), "step = {step}");
        }
        assert!(g.push_floor((4.0, 0.0), (0.0, 4.0), 0.0, 1.0).is_err());
        assert!(g.push_floor((0.0, 0.0), (f32::INFINITY, 4.0), 0.0, 1.0).is_err());
        assert!(g.is_empty());
    }

    #[test]
    fn validate_rejects_bad_index() {
        let g = RegionGeometry::new(vec![Vec3::ZERO; 3], vec![[0, 1, 3]]);
        assert!(g.validate().is_err());
    }
}

// ── Build ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod build_tests {
    use super::*;
    use crate::SurfaceError;
    use crate::mesh::NO_NEIGHBOR;

    #[test]
    fn flat_floor_is_one_island_with_full_area() {
        let s = build(&floor((0.0, 0.0), (10.0, 10.0), 0.0));
        assert_eq!(s.tri_count(), 200);
        assert_eq!(s.vertex_count(), 121);
        assert_eq!(s.island_count(), 1);
        assert!((s.total_area() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn interior_triangles_have_three_neighbors() {
        let s = build(&floor((0.0, 0.0), (3.0, 3.0), 0.0));
        let linked: usize = (0..s.tri_count() as u32)
            .map(|t| s.tri(t).neighbors.iter().filter(|&&n| n != NO_NEIGHBOR).count())
            .sum();
        // 9 squares × 2 triangles; each interior edge counted twice.
        // Interior edges: 9 diagonals + 12 grid edges = 21.
        assert_eq!(linked, 42);
    }

    #[test]
    fn walls_are_not_walkable() {
        let mut g = floor((0.0, 0.0), (4.0, 4.0), 0.0);
        g.push_quad(
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 4.0, 0.0),
            Vec3::new(2.0, 4.0, 3.0),
            Vec3::new(2.0, 0.0, 3.0),
        );
        let s = build(&g);
        assert_eq!(s.tri_count(), 32);
    }

    #[test]
    fn small_islands_are_dropped() {
        let mut g = floor((0.0, 0.0), (4.0, 4.0), 0.0);
        g.push_triangle(
            Vec3::new(20.0, 20.0, 0.0),
            Vec3::new(20.5, 20.0, 0.0),
            Vec3::new(20.0, 20.5, 0.0),
        );
        let s = build(&g);
        assert_eq!(s.island_count(), 1);
        assert_eq!(s.tri_count(), 32);
    }

    #[test]
    fn step_within_climb_links_floors() {
        let mut g = floor((0.0, 0.0), (5.0, 5.0), 0.0);
        g.push_floor((5.0, 0.0), (10.0, 5.0), 0.5, 1.0).unwrap();
        let s = build(&g);
        assert_eq!(s.island_count(), 1);
        assert!(route(&s, (1.0, 2.5), (9.0, 2.5)).is_some());
    }

    #[test]
    fn ledge_above_climb_splits_floors() {
        let mut g = floor((0.0, 0.0), (5.0, 5.0), 0.0);
        g.push_floor((5.0, 0.0), (10.0, 5.0), 2.0, 1.0).unwrap();
        let s = build(&g);
        assert_eq!(s.island_count(), 2);
        let a = snap(&s, 1.0, 2.5);
        let b = TriSurfaceEngine
            .find_nearest_point(&s, to_engine(Vec3::new(9.0, 2.5, 2.0)), EXTENTS, &QueryFilter::default())
            .unwrap();
        assert!(TriSurfaceEngine.find_straight_route(&s, a, b, &QueryFilter::default()).is_none());
    }

    #[test]
    fn empty_geometry_has_no_surface() {
        let g = RegionGeometry::default();
        let err = TriSurfaceEngine.build(&g.to_engine(), &BuildSettings::default()).unwrap_err();
        assert!(matches!(err, SurfaceError::NoWalkableSurface));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let g = EngineGeometry { triangles: vec![[0, 1, 2]], ..Default::default() };
        let err = TriSurfaceEngine.build(&g, &BuildSettings::default()).unwrap_err();
        assert!(matches!(err, SurfaceError::InvalidGeometry(_)));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = BuildSettings { agent_max_slope: 95.0, ..Default::default() };
        let g = floor((0.0, 0.0), (2.0, 2.0), 0.0);
        let err = TriSurfaceEngine.build(&g.to_engine(), &settings).unwrap_err();
        assert!(matches!(err, SurfaceError::InvalidSettings(_)));
    }

    #[test]
    fn build_is_deterministic() {
        let g = l_shape();
        assert_eq!(build(&g), build(&g));
    }
}

// ── Queries ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod query_tests {
    use super::*;

    #[test]
    fn nearest_point_projects_onto_floor() {
        let s = build(&floor((0.0, 0.0), (10.0, 10.0), 0.0));
        let p = TriSurfaceEngine
            .find_nearest_point(&s, to_engine(Vec3::new(5.3, 4.2, 1.0)), EXTENTS, &QueryFilter::default())
            .unwrap();
        let w = from_engine(p.pos);
        assert!(near(w, 5.3, 4.2));
        assert!(w.z.abs() < 1e-5);
    }

    #[test]
    fn nearest_point_outside_extents_is_none() {
        let s = build(&floor((0.0, 0.0), (10.0, 10.0), 0.0));
        let p = TriSurfaceEngine.find_nearest_point(
            &s,
            to_engine(Vec3::new(50.0, 50.0, 0.0)),
            EXTENTS,
            &QueryFilter::default(),
        );
        assert!(p.is_none());
    }

    #[test]
    fn excluded_flags_hide_polygons() {
        let s = build(&floor((0.0, 0.0), (10.0, 10.0), 0.0));
        let filter = QueryFilter { include: 0xFFFF, exclude: crate::engine::FLAG_WALK };
        let p = TriSurfaceEngine.find_nearest_point(&s, to_engine(Vec3::new(5.0, 5.0, 0.0)), EXTENTS, &filter);
        assert!(p.is_none());
    }

    #[test]
    fn open_floor_route_is_straight() {
        let mut g = RegionGeometry::default();
        g.push_floor((0.0, 0.0), (10.0, 10.0), 0.0, 10.0).unwrap();
        let s = build(&g);
        let pts = route(&s, (1.0, 2.5), (8.5, 7.5)).unwrap();
        assert_eq!(pts.len(), 2);
        assert!(near(pts[0], 1.0, 2.5));
        assert!(near(pts[1], 8.5, 7.5));
    }

    #[test]
    fn l_route_bends_at_inner_corner() {
        let s = build(&l_shape());
        let pts = route(&s, (1.0, 1.0), (9.0, 9.0)).unwrap();
        assert!(pts.len() >= 3, "{pts:?}");
        assert!(near(pts[0], 1.0, 1.0));
        assert!(near(*pts.last().unwrap(), 9.0, 9.0));
        assert!(pts.iter().any(|p| near(*p, 8.0, 2.0)), "{pts:?}");
    }

    #[test]
    fn same_polygon_route_has_both_ends() {
        let s = build(&floor((0.0, 0.0), (10.0, 10.0), 0.0));
        let a = snap(&s, 0.6, 0.2);
        let b = snap(&s, 0.8, 0.1);
        assert_eq!(a.poly, b.poly);
        let pts = TriSurfaceEngine.find_straight_route(&s, a, b, &QueryFilter::default()).unwrap();
        assert_eq!(pts.len(), 2);
    }

    #[test]
    fn random_points_lie_on_surface() {
        let s = build(&l_shape());
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..64 {
            let p = TriSurfaceEngine.find_random_point(&s, &QueryFilter::default(), &mut rng).unwrap();
            let w = from_engine(p.pos);
            let in_leg_a = (0.0..=8.0).contains(&w.x) && (0.0..=2.0).contains(&w.y);
            let in_leg_b = (8.0..=10.0).contains(&w.x) && (0.0..=10.0).contains(&w.y);
            assert!(in_leg_a || in_leg_b, "{w:?}");
        }
    }

    #[test]
    fn bounded_random_points_stay_within_distance() {
        let s = build(&floor((0.0, 0.0), (40.0, 40.0), 0.0));
        let start = snap(&s, 20.0, 20.0);
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..64 {
            let p = TriSurfaceEngine
                .find_random_point_within(&s, start, 3.0, &QueryFilter::default(), &mut rng)
                .unwrap();
            let w = from_engine(p.pos);
            assert!(w.distance_2d_squared(Vec3::new(20.0, 20.0, 0.0)) <= 9.0 + 1e-3);
        }
    }

    #[test]
    fn bounded_random_rejects_bad_distance() {
        let s = build(&floor((0.0, 0.0), (4.0, 4.0), 0.0));
        let start = snap(&s, 2.0, 2.0);
        let mut rng = SmallRng::seed_from_u64(1);
        let f = QueryFilter::default();
        assert!(TriSurfaceEngine.find_random_point_within(&s, start, 0.0, &f, &mut rng).is_none());
        assert!(TriSurfaceEngine.find_random_point_within(&s, start, f32::NAN, &f, &mut rng).is_none());
    }
}

// ── Codec ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod codec_tests {
    use super::*;
    use crate::SurfaceError;
    use crate::codec::{HEADER_LEN, MAGIC, VERSION};

    #[test]
    fn header_layout() {
        let s = build(&floor((0.0, 0.0), (2.0, 2.0), 0.0));
        let bytes = TriSurfaceEngine.serialize(&s).unwrap();
        assert_eq!(&bytes[0..4], b"NSRF");
        assert_eq!(u32::from_le_bytes(bytes[0..4].try_into().unwrap()), MAGIC);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), VERSION);
        let len = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
        assert_eq!(len as usize, bytes.len() - HEADER_LEN);
    }

    #[test]
    fn reloaded_surface_answers_identically() {
        let s = build(&l_shape());
        let bytes = TriSurfaceEngine.serialize(&s).unwrap();
        let r = TriSurfaceEngine.deserialize(&bytes).unwrap();
        assert_eq!(s, r);

        let f = QueryFilter::default();
        for &(x, y) in &[(1.0, 1.0), (9.0, 9.0), (8.2, 1.7), (4.4, 0.3)] {
            let p = to_engine(Vec3::new(x, y, 0.5));
            assert_eq!(
                TriSurfaceEngine.find_nearest_point(&s, p, EXTENTS, &f),
                TriSurfaceEngine.find_nearest_point(&r, p, EXTENTS, &f),
            );
        }

        assert_eq!(route(&s, (1.0, 1.0), (9.0, 9.0)), route(&r, (1.0, 1.0), (9.0, 9.0)));

        let mut rng_a = SmallRng::seed_from_u64(99);
        let mut rng_b = SmallRng::seed_from_u64(99);
        for _ in 0..16 {
            assert_eq!(
                TriSurfaceEngine.find_random_point(&s, &f, &mut rng_a),
                TriSurfaceEngine.find_random_point(&r, &f, &mut rng_b),
            );
        }
        let start = snap(&s, 9.0, 5.0);
        assert_eq!(
            TriSurfaceEngine.find_random_point_within(&s, start, 4.0, &f, &mut rng_a),
            TriSurfaceEngine.find_random_point_within(&r, start, 4.0, &f, &mut rng_b),
        );
    }

    #[test]
    fn truncated_bytes_are_corrupt() {
        let s = build(&floor((0.0, 0.0), (2.0, 2.0), 0.0));
        let bytes = TriSurfaceEngine.serialize(&s).unwrap();
        let err = TriSurfaceEngine.deserialize(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, SurfaceError::Corrupt(_)));
        assert!(TriSurfaceEngine.deserialize(&bytes[..8]).is_err());
        assert!(TriSurfaceEngine.deserialize(&[]).is_err());
    }

    #[test]
    fn foreign_magic_is_corrupt() {
        let s = build(&floor((0.0, 0.0), (2.0, 2.0), 0.0));
        let mut bytes = TriSurfaceEngine.serialize(&s).unwrap();
        bytes[0] = b'X';
        assert!(matches!(TriSurfaceEngine.deserialize(&bytes), Err(SurfaceError::Corrupt(_))));
    }

    #[test]
    fn newer_version_is_rejected() {
        let s = build(&floor((0.0, 0.0), (2.0, 2.0), 0.0));
        let mut bytes = TriSurfaceEngine.serialize(&s).unwrap();
        bytes[4..8].copy_from_slice(&(VERSION + 1).to_le_bytes());
        assert!(matches!(
            TriSurfaceEngine.deserialize(&bytes),
            Err(SurfaceError::VersionMismatch { found, .. }) if found == VERSION + 1
        ));
    }

    #[test]
    fn garbage_payload_is_corrupt() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC.to_le_bytes());
        bytes.extend_from_slice(&VERSION.to_le_bytes());
        bytes.extend_from_slice(&64u64.to_le_bytes());
        bytes.extend_from_slice(&[0xFF; 64]);
        assert!(matches!(TriSurfaceEngine.deserialize(&bytes), Err(SurfaceError::Corrupt(_))));
    }
}
