//! `nav-surface` — walkable surfaces: build, persist, query.
//!
//! The service in `nav-cache` talks to surfaces only through the
//! [`SurfaceEngine`] trait, so a different engine (a voxelising navmesh
//! generator, a baked third-party format) can be dropped in without touching
//! the cache or the agents.  [`TriSurfaceEngine`] is the engine shipped here:
//! it keeps the walkable triangles of the input geometry, links them into an
//! adjacency graph and answers queries with A* plus funnel string-pulling.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`geometry`] | `RegionGeometry` (world space), `EngineGeometry`, axis swap |
//! | [`settings`] | `BuildSettings` — the fixed build profile                  |
//! | [`engine`]   | `SurfaceEngine` trait, `SurfacePoint`, `QueryFilter`       |
//! | [`mesh`]     | `NavSurface`, `SurfaceBuilder`                              |
//! | [`query`]    | nearest point, A* corridor, funnel, random sampling        |
//! | [`codec`]    | versioned binary container for persisted surfaces          |
//! | [`error`]    | `SurfaceError`, `SurfaceResult<T>`                          |
//!
//! # Coordinates
//!
//! Engines work in `[x, up, y]` order ("engine space").  World positions are
//! `(x, y, z)` with `z` up.  [`geometry::to_engine`] / [`geometry::from_engine`]
//! convert between the two.

pub mod codec;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod query;
pub mod settings;

#[cfg(test)]
mod tests;

pub use engine::{PolyRef, QueryFilter, SurfaceEngine, SurfacePoint, TriSurfaceEngine};
pub use error::{SurfaceError, SurfaceResult};
pub use geometry::{EngineGeometry, EnginePoint, RegionGeometry};
pub use mesh::{NavSurface, SurfaceBuilder};
pub use settings::{BuildSettings, PartitionType};
