//! What a tick did, and why.

use nav_core::{ObjectId, Position};

use crate::TargetLayer;

/// How a navigation layer ended.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Finish {
    /// The given layer was reached (or its target left the region) and was
    /// popped.
    Reached(TargetLayer),
    /// A patrol point was reached and a new patrol started.
    PatrolRenewed,
    /// Every layer was cleared: nothing left to steer for.
    Forced,
}

/// Outcome of one [`Navigator::tick`](crate::Navigator::tick).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Decision {
    /// A tick for this agent was already running.
    Reentrant,
    /// The decision timer has not elapsed; only housekeeping ran.
    Waiting,
    Idle,
    /// The intent's required target is missing (or the agent is not in the
    /// world); nothing to do until it appears.
    Stalled,
    InCombat,
    Finished(Finish),
    /// A move is in flight and was issued too recently to replace.
    Cooldown,
    /// No route (surface not ready, off-surface, unreachable); any move in
    /// flight was cancelled.
    NoRoute,
    /// Entered combat with this creature.
    Engaged(ObjectId),
    DoorOpened(ObjectId),
    Moved {
        destination: Position,
        /// The move was the step-forward issued while stuck.
        stuck:       bool,
    },
}

impl Decision {
    /// `true` for decisions that issued a move command.
    pub fn moved(&self) -> bool {
        matches!(self, Decision::Moved { .. })
    }
}
