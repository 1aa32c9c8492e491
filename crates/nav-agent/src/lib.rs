//! `nav-agent` — the per-agent navigation state machine.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                        |
//! |---------------|-----------------------------------------------------------------|
//! | [`state`]     | `NavIntent`, `NavStatus`, `TargetLayers`, `NavState`            |
//! | [`world`]     | `NavWorld`, `MovementExecutor`, `RouteQueries`, `Sighting`      |
//! | [`navigator`] | `Navigator` — intents, tick, scan, stuck recovery, completion   |
//! | [`decision`]  | `Decision`, `Finish` — what each tick did                       |
//! | [`error`]     | `AgentError`, `AgentResult<T>`                                  |
//!
//! # Design notes
//!
//! A navigator is owned by its agent and mutated only by that agent's tick
//! and its intent operations.  Everything else (other objects, doors, the
//! surface service) is reached through the [`NavWorld`] and [`RouteQueries`]
//! traits, so a tick never blocks and never holds another object alive.
//!
//! Targets are layered.  Each tick steers for the highest present layer:
//!
//! ```text
//! detour  >  hostile sighting  >  followed object  >  primary target
//! ```
//!
//! Reaching a layer pops only that layer; the one below resumes on the next
//! tick.

pub mod decision;
pub mod error;
pub mod navigator;
pub mod state;
pub mod world;

#[cfg(test)]
mod tests;

pub use decision::{Decision, Finish};
pub use error::{AgentError, AgentResult};
pub use navigator::Navigator;
pub use state::{NavIntent, NavState, NavStatus, TargetLayer, TargetLayers};
pub use world::{MovementExecutor, NavWorld, RouteQueries, Sighting, SightingKind};
