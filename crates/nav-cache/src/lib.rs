//! `nav-cache` — the navigable-surface cache and query service.
//!
//! One [`SurfaceService`] is constructed per process and shared (it is a
//! cheap `Arc` clone) with every navigator.  Queries never block: a region
//! whose surface is not ready yet answers `None` and kicks off acquisition on
//! the [`BuildExecutor`].
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`provider`] | `GeometryProvider` trait, `StaticGeometry`                |
//! | [`store`]    | `SurfaceStore` trait, file/memory/null stores             |
//! | [`executor`] | `BuildExecutor` trait, `RayonExecutor`, `InlineExecutor`  |
//! | [`service`]  | `SurfaceService`, `SurfaceServiceBuilder`, `ServiceConfig` |
//! | [`route`]    | `Route`                                                   |
//! | [`error`]    | `AcquireError`, `AcquireResult<T>`                        |

pub mod error;
pub mod executor;
pub mod provider;
pub mod route;
pub mod service;
pub mod store;


pub use error::{AcquireError, AcquireResult};
pub use executor::{BuildExecutor, BuildJob, InlineExecutor, RayonExecutor};
pub use provider::{GeometryProvider, StaticGeometry};
pub use route::Route;
pub use service::{ServiceConfig, ServiceStats, SurfaceService, SurfaceServiceBuilder, SurfaceStatus};
pub use store::{FileSurfaceStore, MemorySurfaceStore, NullSurfaceStore, SurfaceStore};
