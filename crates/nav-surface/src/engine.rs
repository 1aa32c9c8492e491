//! The engine contract consumed by the surface service.
//!
//! # Pluggability
//!
//! `nav-cache` is generic over [`SurfaceEngine`]; tests drive it with fake
//! engines that count calls, the demo and the simulation use
//! [`TriSurfaceEngine`].  All coordinates crossing this trait are engine
//! space (`[x, up, y]`).
//!
//! # Thread safety
//!
//! Builds run on worker threads and queries run on whichever thread ticks
//! the agent, so engines and their surfaces must be `Send + Sync`.  A built
//! surface is never mutated.

use std::fmt;

use rand::RngCore;

use crate::geometry::{EngineGeometry, EnginePoint};
use crate::mesh::{NavSurface, SurfaceBuilder};
use crate::{BuildSettings, SurfaceResult, codec, query};

// ── Handles and filters ───────────────────────────────────────────────────────

/// Opaque reference to one polygon of a surface.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct PolyRef(pub u32);

impl fmt::Display for PolyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PolyRef({})", self.0)
    }
}

/// A point on the surface together with the polygon containing it.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SurfacePoint {
    pub poly: PolyRef,
    pub pos:  EnginePoint,
}

/// Polygon flag set every built polygon carries.
pub const FLAG_WALK: u16 = 0x01;

/// Include/exclude masks tested against polygon flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QueryFilter {
    pub include: u16,
    pub exclude: u16,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self { include: 0xFFFF, exclude: 0 }
    }
}

impl QueryFilter {
    #[inline]
    pub fn passes(&self, flags: u16) -> bool {
        flags & self.include != 0 && flags & self.exclude == 0
    }
}

// ── SurfaceEngine ─────────────────────────────────────────────────────────────

pub trait SurfaceEngine: Send + Sync + 'static {
    type Surface: Send + Sync + 'static;

    /// Deterministic: the same geometry and settings always give an
    /// equivalent surface.
    fn build(&self, geometry: &EngineGeometry, settings: &BuildSettings) -> SurfaceResult<Self::Surface>;

    fn serialize(&self, surface: &Self::Surface) -> SurfaceResult<Vec<u8>>;

    /// Must reject truncated or foreign bytes with an error, never panic.
    fn deserialize(&self, bytes: &[u8]) -> SurfaceResult<Self::Surface>;

    /// Nearest polygon overlapping the box `point ± half_extents`.
    fn find_nearest_point(
        &self,
        surface:      &Self::Surface,
        point:        EnginePoint,
        half_extents: EnginePoint,
        filter:       &QueryFilter,
    ) -> Option<SurfacePoint>;

    /// Straight-line-reduced waypoints from `start` to `end`, both included.
    fn find_straight_route(
        &self,
        surface: &Self::Surface,
        start:   SurfacePoint,
        end:     SurfacePoint,
        filter:  &QueryFilter,
    ) -> Option<Vec<EnginePoint>>;

    fn find_random_point(
        &self,
        surface: &Self::Surface,
        filter:  &QueryFilter,
        rng:     &mut dyn RngCore,
    ) -> Option<SurfacePoint>;

    /// Random point reachable from `start` within `max_distance` of it.
    fn find_random_point_within(
        &self,
        surface:      &Self::Surface,
        start:        SurfacePoint,
        max_distance: f32,
        filter:       &QueryFilter,
        rng:          &mut dyn RngCore,
    ) -> Option<SurfacePoint>;
}

// ── TriSurfaceEngine ──────────────────────────────────────────────────────────

/// Engine over [`NavSurface`] triangle meshes.
#[derive(Copy, Clone, Debug, Default)]
pub struct TriSurfaceEngine;

impl SurfaceEngine for TriSurfaceEngine {
    type Surface = NavSurface;

    fn build(&self, geometry: &EngineGeometry, settings: &BuildSettings) -> SurfaceResult<NavSurface> {
        SurfaceBuilder::new(settings.clone()).build(geometry)
    }

    fn serialize(&self, surface: &NavSurface) -> SurfaceResult<Vec<u8>> {
        codec::encode(surface.data())
    }

    fn deserialize(&self, bytes: &[u8]) -> SurfaceResult<NavSurface> {
        NavSurface::from_data(codec::decode(bytes)?)
    }

    fn find_nearest_point(
        &self,
        surface:      &NavSurface,
        point:        EnginePoint,
        half_extents: EnginePoint,
        filter:       &QueryFilter,
    ) -> Option<SurfacePoint> {
        query::nearest_point(surface, point, half_extents, filter)
    }

    fn find_straight_route(
        &self,
        surface: &NavSurface,
        start:   SurfacePoint,
        end:     SurfacePoint,
        filter:  &QueryFilter,
    ) -> Option<Vec<EnginePoint>> {
        let corridor = query::find_corridor(surface, start, end, filter)?;
        Some(query::string_pull(surface, &corridor, start.pos, end.pos))
    }

    fn find_random_point(
        &self,
        surface: &NavSurface,
        filter:  &QueryFilter,
        rng:     &mut dyn RngCore,
    ) -> Option<SurfacePoint> {
        query::random_point(surface, filter, rng)
    }

    fn find_random_point_within(
        &self,
        surface:      &NavSurface,
        start:        SurfacePoint,
        max_distance: f32,
        filter:       &QueryFilter,
        rng:          &mut dyn RngCore,
    ) -> Option<SurfacePoint> {
        query::random_point_within(surface, start, max_distance, filter, rng)
    }
}
