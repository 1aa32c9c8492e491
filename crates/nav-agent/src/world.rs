//! What a navigator needs from the world around it.
//!
//! The navigator never owns other objects.  It names them by [`ObjectId`] and
//! asks the world for their current state on every use, so a destroyed target
//! simply stops resolving.

use nav_cache::{Route, SurfaceService};
use nav_core::{ObjectId, Position};
use nav_surface::SurfaceEngine;
use rand::RngCore;

// ── Sightings ─────────────────────────────────────────────────────────────────

/// An object the agent can currently see.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sighting {
    pub id:       ObjectId,
    pub position: Position,
    pub kind:     SightingKind,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SightingKind {
    Creature {
        dead:       bool,
        /// Administrators and other objects agents never attack.
        privileged: bool,
        /// Same side as the looking agent.
        ally:       bool,
    },
    Door {
        open:   bool,
        locked: bool,
    },
    Other,
}

impl SightingKind {
    /// A creature the agent may fight.
    pub fn is_hostile_creature(self) -> bool {
        matches!(self, SightingKind::Creature { dead: false, privileged: false, ally: false })
    }
}

// ── Traits ────────────────────────────────────────────────────────────────────

/// Performs movement and its broadcast.  Calls return immediately; the move
/// itself plays out over later ticks.
pub trait MovementExecutor {
    fn move_to(&mut self, agent: ObjectId, destination: Position);

    fn cancel_move(&mut self, agent: ObjectId);

    fn is_moving(&self, agent: ObjectId) -> bool;

    /// Per-tick housekeeping: settle the physics position and send the
    /// outbound position update.
    fn sync_position(&mut self, agent: ObjectId);
}

/// World bookkeeping the navigator reads and the side effects it triggers.
pub trait NavWorld: MovementExecutor {
    /// Current position of any object, the agent itself included.  `None`
    /// once the object is gone.
    fn object_position(&self, id: ObjectId) -> Option<Position>;

    /// Everything `agent` can see, in no particular order.
    fn visible_objects(&self, agent: ObjectId) -> Vec<Sighting>;

    fn add_follower(&mut self, target: ObjectId, follower: ObjectId);

    fn remove_follower(&mut self, target: ObjectId, follower: ObjectId);

    fn open_door(&mut self, door: ObjectId);

    fn set_attack_target(&mut self, agent: ObjectId, target: ObjectId);

    fn clear_attack_target(&mut self, agent: ObjectId);

    /// Let creatures near `agent` know it has spotted `hostile`.
    fn alert_nearby(&mut self, agent: ObjectId, hostile: ObjectId);

    /// Make sure `agent` gets ticked.
    fn wake(&mut self, agent: ObjectId);
}

/// The surface queries a navigator issues.  Implemented by
/// [`SurfaceService`]; tests substitute scripted answers.
pub trait RouteQueries {
    fn find_route(&self, start: &Position, end: &Position) -> Option<Route>;

    fn random_point(
        &self,
        start:        &Position,
        max_distance: Option<f32>,
        rng:          &mut dyn RngCore,
    ) -> Option<Position>;
}

impl<E: SurfaceEngine> RouteQueries for SurfaceService<E> {
    fn find_route(&self, start: &Position, end: &Position) -> Option<Route> {
        SurfaceService::find_route(self, start, end)
    }

    fn random_point(
        &self,
        start:        &Position,
        max_distance: Option<f32>,
        rng:          &mut dyn RngCore,
    ) -> Option<Position> {
        SurfaceService::random_point(self, start, max_distance, rng)
    }
}
