//! `nav-core` — foundational types for the landblock navigation crates.
//!
//! Every other `nav-*` crate depends on this one.  It has no `nav-*`
//! dependencies and only `rand` and `thiserror` externally, plus optional
//! `serde`.
//!
//! # What lives here
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`ids`]      | `ObjectId`, `CellId`, `RegionKey`                         |
//! | [`geo`]      | `Vec3`, `Position`, planar distance helpers               |
//! | [`time`]     | `SimTime` (seconds since world start)                     |
//! | [`rng`]      | `AgentRng` (per-agent), `SimRng` (global)                 |
//! | [`config`]   | `NavConfig` — reach/engage/door/stuck thresholds, timers  |
//! | [`error`]    | `NavError`, `NavResult`                                   |
//!
//! # Coordinate convention
//!
//! World positions are `(x, y)` on the ground plane with `z` up.  Only the
//! surface engine works in its own `(x, up, y)` layout; conversion happens at
//! the service boundary in `nav-cache`.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::NavConfig;
pub use error::{NavError, NavResult};
pub use geo::{Position, Vec3};
pub use ids::{CellId, ObjectId, RegionKey};
pub use rng::{AgentRng, SimRng};
pub use time::SimTime;
