//! `nav-sim` — a reference world and fixed-step scheduler for navigators.
//!
//! # Step loop
//!
//! ```text
//! for each step of step_secs:
//!   ① Advance — movers travel toward their destinations; the clock moves.
//!   ② Tick    — every navigator that is navigating (or was woken) runs
//!               Navigator::tick(now, world, queries), in slot order.
//! ```
//!
//! Combat resolution is not simulated: callers decide outcomes with
//! [`SimWorld::kill`] and [`NavSim::leave_combat`].
//!
//! # Crate layout
//!
//! | Module       | Contents                                                 |
//! |--------------|----------------------------------------------------------|
//! | [`world`]    | `SimWorld`, `WorldObject`, `ObjectKind`, `Alert`         |
//! | [`sim`]      | `NavSim`, `AgentSlot`                                    |
//! | [`builder`]  | `NavSimBuilder`                                          |
//! | [`observer`] | `NavObserver`, `NoopObserver`                            |
//! | [`error`]    | `SimError`, `SimResult<T>`                               |

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;
pub mod world;


pub use builder::NavSimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NavObserver, NoopObserver};
pub use sim::{AgentSlot, NavSim};
pub use world::{Alert, ObjectKind, SimWorld, WorldObject};
