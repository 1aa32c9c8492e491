//! The per-agent navigation state machine.
//!
//! # Decision step
//!
//! Runs at most once per `move_interval_secs`, in this order; the first rule
//! that applies ends the step:
//!
//! 1. `Idle` → nothing.
//! 2. The intent's required target is missing → stall.  A patrol without a
//!    point tries to roll one first.
//! 3. `Combat` → nothing until [`Navigator::leave_combat`].
//! 4. No effective target (see [`TargetLayers::resolve`]) → forced finish.
//! 5. Within `reach_distance_sq` of the target → natural finish.
//! 6. Target in another region → natural finish.
//! 7. A move is in flight and younger than `move_cooldown_secs` → nothing.
//! 8. Ask for a route; none → cancel the move in flight.  Otherwise run the
//!    movement step: stuck detection, environment scan, one move command.
//!
//! [`TargetLayers::resolve`]: crate::TargetLayers::resolve

use std::sync::Arc;

use nav_core::{AgentRng, NavConfig, ObjectId, Position, SimTime};
use tracing::{debug, info, trace, warn};

use crate::world::{NavWorld, RouteQueries, SightingKind};
use crate::{AgentError, AgentResult, Decision, Finish, NavIntent, NavState, NavStatus, TargetLayer};

pub struct Navigator {
    id:     ObjectId,
    state:  NavState,
    rng:    AgentRng,
    config: Arc<NavConfig>,
}

impl Navigator {
    /// A navigator for agent `id`, starting `Idle`.  The RNG is seeded from
    /// `global_seed` and `id`.
    pub fn new(id: ObjectId, config: Arc<NavConfig>, global_seed: u64) -> AgentResult<Self> {
        config.validate()?;
        Ok(Self {
            id,
            state: NavState::new(config.hostile_range),
            rng: AgentRng::new(global_seed, id),
            config,
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn state(&self) -> &NavState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut NavState {
        &mut self.state
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn intent(&self) -> NavIntent {
        self.state.intent
    }

    pub fn status(&self) -> NavStatus {
        self.state.status
    }

    pub fn is_patrolling(&self) -> bool {
        self.state.intent == NavIntent::Patrol
    }

    pub fn is_navigating_to_position(&self) -> bool {
        self.state.intent == NavIntent::NavToPosition
    }

    pub fn is_navigating_to_object(&self) -> bool {
        self.state.intent == NavIntent::NavToObject
    }

    /// Executing a route, detours included.
    pub fn is_navigating(&self) -> bool {
        matches!(self.state.status, NavStatus::Navigating | NavStatus::Reset)
    }

    pub fn is_in_combat(&self) -> bool {
        self.state.status == NavStatus::Combat
    }

    pub fn is_resetting(&self) -> bool {
        self.state.status == NavStatus::Reset
    }

    pub fn attack_initiated(&self) -> bool {
        self.state.attack_initiated
    }

    /// Combat resolution records that it has started attacking.
    pub fn mark_attack_initiated(&mut self) {
        self.state.attack_initiated = true;
    }

    /// Override the hostile-detection range of the current intent.  Each new
    /// intent starts from `NavConfig::hostile_range`.
    pub fn set_hostile_range(&mut self, range: f32) {
        self.state.hostile_range = range.max(0.0);
    }

    /// Mark the agent idle without touching its targets, so a new intent
    /// can be issued.  For owners that take over movement themselves.
    pub fn set_idle(&mut self) {
        self.state.status = NavStatus::Idle;
    }

    // ── Intents ───────────────────────────────────────────────────────────

    pub fn nav_to_position<W: NavWorld + ?Sized>(
        &mut self,
        target: Position,
        world:  &mut W,
    ) -> AgentResult<()> {
        self.begin(NavIntent::NavToPosition, world)?;
        self.state.layers.primary = Some(target);
        debug!(agent = %self.id, target = ?target.pos, "navigating to position");
        world.wake(self.id);
        Ok(())
    }

    /// Follow a live object.  The agent is registered as its follower until
    /// the navigation ends.
    pub fn nav_to_object<W: NavWorld + ?Sized>(
        &mut self,
        target: ObjectId,
        world:  &mut W,
    ) -> AgentResult<()> {
        self.begin(NavIntent::NavToObject, world)?;
        self.state.layers.tracked = Some(target);
        world.add_follower(target, self.id);
        debug!(agent = %self.id, %target, "navigating to object");
        world.wake(self.id);
        Ok(())
    }

    /// Wander between random reachable points within `max_distance`.
    pub fn patrol<W, Q>(&mut self, max_distance: f32, world: &mut W, queries: &Q) -> AgentResult<()>
    where
        W: NavWorld + ?Sized,
        Q: RouteQueries + ?Sized,
    {
        self.begin(NavIntent::Patrol, world)?;
        self.state.patrol_distance = max_distance;
        self.roll_patrol_point(world, queries);
        debug!(agent = %self.id, max_distance, "patrolling");
        world.wake(self.id);
        Ok(())
    }

    fn begin<W: NavWorld + ?Sized>(&mut self, requested: NavIntent, world: &mut W) -> AgentResult<()> {
        if self.state.status != NavStatus::Idle {
            let err = AgentError::InvalidTransition {
                agent:   self.id,
                requested,
                current: self.state.intent,
                status:  self.state.status,
            };
            warn!(agent = %self.id, error = %err, "navigation request rejected");
            return Err(err);
        }
        self.release_follow(world);
        self.state.clear();
        self.state.intent = requested;
        self.state.status = NavStatus::Navigating;
        self.state.hostile_range = self.config.hostile_range;
        Ok(())
    }

    fn roll_patrol_point<W, Q>(&mut self, world: &W, queries: &Q) -> bool
    where
        W: NavWorld + ?Sized,
        Q: RouteQueries + ?Sized,
    {
        let Some(me) = world.object_position(self.id) else {
            return false;
        };
        let point = queries.random_point(&me, Some(self.state.patrol_distance), self.rng.inner());
        if let Some(p) = point {
            trace!(agent = %self.id, point = ?p.pos, "patrol point");
        }
        self.state.layers.primary = point;
        point.is_some()
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Advance the agent to `now`.  Housekeeping always runs, even when a
    /// tick is already in progress; the decision step runs when its timer has
    /// elapsed.
    pub fn tick<W, Q>(&mut self, now: SimTime, world: &mut W, queries: &Q) -> Decision
    where
        W: NavWorld + ?Sized,
        Q: RouteQueries + ?Sized,
    {
        world.sync_position(self.id);

        if self.state.in_tick {
            trace!(agent = %self.id, "tick already running");
            return Decision::Reentrant;
        }
        self.state.in_tick = true;

        let decision = if now >= self.state.next_decision {
            self.state.next_decision = now + self.config.move_interval_secs;
            self.decide(now, world, queries)
        } else {
            Decision::Waiting
        };

        self.state.in_tick = false;
        decision
    }

    fn decide<W, Q>(&mut self, now: SimTime, world: &mut W, queries: &Q) -> Decision
    where
        W: NavWorld + ?Sized,
        Q: RouteQueries + ?Sized,
    {
        if self.state.status == NavStatus::Idle {
            return Decision::Idle;
        }

        let has_target = match self.state.intent {
            NavIntent::NavToPosition => self.state.layers.primary.is_some(),
            NavIntent::NavToObject => self.state.layers.tracked.is_some(),
            NavIntent::Patrol => {
                self.state.layers.primary.is_some() || self.roll_patrol_point(world, queries)
            }
            NavIntent::None => true,
        };
        if !has_target {
            debug!(agent = %self.id, intent = ?self.state.intent, "target missing, stalled");
            return Decision::Stalled;
        }

        if self.state.status == NavStatus::Combat {
            return Decision::InCombat;
        }

        let Some(me) = world.object_position(self.id) else {
            debug!(agent = %self.id, "agent not in world, stalled");
            return Decision::Stalled;
        };

        let Some((layer, target)) = self.state.layers.resolve(|id| world.object_position(id)) else {
            debug!(agent = %self.id, "no target left");
            self.force_finish(world);
            return Decision::Finished(Finish::Forced);
        };

        if me.distance_2d_squared(&target) < self.config.reach_distance_sq {
            return self.finish_natural(layer, world, queries);
        }

        if target.region() != me.region() {
            debug!(agent = %self.id, from = %me.region(), to = %target.region(), "target left the region");
            return self.finish_natural(layer, world, queries);
        }

        let cooldown = self.config.move_cooldown_secs;
        if world.is_moving(self.id) && self.state.last_move_time.is_some_and(|t| now < t + cooldown) {
            return Decision::Cooldown;
        }

        let Some(route) = queries.find_route(&me, &target) else {
            world.cancel_move(self.id);
            return Decision::NoRoute;
        };
        let Some(destination) = route.next_destination().copied() else {
            return self.finish_natural(layer, world, queries);
        };
        self.movement_step(now, me, destination, world, queries)
    }

    fn movement_step<W, Q>(
        &mut self,
        now:         SimTime,
        me:          Position,
        destination: Position,
        world:       &mut W,
        queries:     &Q,
    ) -> Decision
    where
        W: NavWorld + ?Sized,
        Q: RouteQueries + ?Sized,
    {
        let stuck = now > self.state.next_stuck_backoff
            && self
                .state
                .last_position
                .is_some_and(|last| last.distance_2d_squared(&me) < self.config.stuck_distance_sq);

        if stuck {
            self.state.stuck_count += 1;
            debug!(agent = %self.id, count = self.state.stuck_count, "agent stuck");
            if self.state.stuck_count > self.config.stuck_tolerance {
                self.begin_detour(now, &me, queries);
            }
        }

        if let Some(decision) = self.scan(&me, world) {
            return decision;
        }

        let destination = if stuck {
            me.in_front_of(self.config.stuck_step_distance)
        } else {
            self.state.last_move_time = Some(now);
            self.state.stuck_count = 0;
            destination
        };
        self.state.last_position = Some(me);
        world.move_to(self.id, destination);
        Decision::Moved { destination, stuck }
    }

    /// Pick a random reachable point far enough away and make it the top
    /// target.  Gives up for this step after `detour_attempts` draws.
    fn begin_detour<Q: RouteQueries + ?Sized>(&mut self, now: SimTime, me: &Position, queries: &Q) {
        for _ in 0..self.config.detour_attempts {
            let Some(p) = queries.random_point(me, Some(self.config.detour_radius), self.rng.inner())
            else {
                break;
            };
            if p.distance_2d_squared(me) >= self.config.detour_min_distance_sq {
                self.state.layers.detour = Some(p);
                self.state.status = NavStatus::Reset;
                self.state.last_position = None;
                self.state.stuck_count = 0;
                self.state.next_stuck_backoff = now + self.config.stuck_backoff_secs;
                info!(agent = %self.id, from = ?me.pos, to = ?p.pos, "taking detour");
                return;
            }
        }
        debug!(agent = %self.id, "no detour point found");
    }

    // ── Scan ──────────────────────────────────────────────────────────────

    /// Creature then door.  `Some` when the scan acted and the move must be
    /// skipped.
    fn scan<W: NavWorld + ?Sized>(&mut self, me: &Position, world: &mut W) -> Option<Decision> {
        let sightings = world.visible_objects(self.id);

        let creature = sightings
            .iter()
            .filter(|s| s.id != self.id && s.kind.is_hostile_creature())
            .map(|s| (s, s.position.distance_2d_squared(me)))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((hostile, dist_sq)) = creature {
            if dist_sq < self.config.engage_distance_sq {
                self.state.status = NavStatus::Combat;
                self.state.last_position = None;
                world.set_attack_target(self.id, hostile.id);
                world.alert_nearby(self.id, hostile.id);
                info!(agent = %self.id, target = %hostile.id, "entering combat");
                return Some(Decision::Engaged(hostile.id));
            }
            let range = self.state.hostile_range;
            if self.state.layers.hostile.is_none() && dist_sq < range * range {
                self.state.layers.hostile = Some(hostile.position);
                world.alert_nearby(self.id, hostile.id);
                debug!(agent = %self.id, target = %hostile.id, "hostile sighted");
            }
        }

        let door = sightings
            .iter()
            .filter(|s| matches!(s.kind, SightingKind::Door { .. }))
            .map(|s| (s, s.position.distance_2d_squared(me)))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((door, dist_sq)) = door {
            let closed_unlocked = matches!(door.kind, SightingKind::Door { open: false, locked: false });
            if closed_unlocked && dist_sq < self.config.door_distance_sq {
                world.open_door(door.id);
                debug!(agent = %self.id, door = %door.id, "opening door");
                return Some(Decision::DoorOpened(door.id));
            }
        }
        None
    }

    // ── Combat / completion ───────────────────────────────────────────────

    /// Called by combat resolution when the fight is over.
    pub fn leave_combat<W: NavWorld + ?Sized>(&mut self, world: &mut W) {
        if self.state.status != NavStatus::Combat {
            return;
        }
        world.clear_attack_target(self.id);
        self.state.status = NavStatus::Navigating;
        self.state.attack_initiated = false;

        if let (Some(hostile), Some(me)) = (self.state.layers.hostile, world.object_position(self.id)) {
            if me.distance_2d_squared(&hostile) < self.config.reach_distance_sq {
                self.state.layers.hostile = None;
            }
        }
        debug!(agent = %self.id, "leaving combat");
        world.wake(self.id);
    }

    /// Pop the layer that was just reached.
    fn finish_natural<W, Q>(&mut self, layer: TargetLayer, world: &mut W, queries: &Q) -> Decision
    where
        W: NavWorld + ?Sized,
        Q: RouteQueries + ?Sized,
    {
        if let Some(target) = self.state.layers.clear(layer) {
            world.remove_follower(target, self.id);
        }

        match layer {
            TargetLayer::Detour | TargetLayer::Hostile => {
                self.state.status = NavStatus::Navigating;
                debug!(agent = %self.id, ?layer, "temporary target reached");
                Decision::Finished(Finish::Reached(layer))
            }
            TargetLayer::Tracked | TargetLayer::Primary if self.is_patrolling() => {
                let distance = self.state.patrol_distance;
                self.state.clear();
                self.state.intent = NavIntent::Patrol;
                self.state.status = NavStatus::Navigating;
                self.state.patrol_distance = distance;
                self.roll_patrol_point(world, queries);
                debug!(agent = %self.id, "patrol point reached");
                Decision::Finished(Finish::PatrolRenewed)
            }
            TargetLayer::Tracked | TargetLayer::Primary => {
                self.state.clear();
                debug!(agent = %self.id, "navigation complete");
                Decision::Finished(Finish::Reached(layer))
            }
        }
    }

    /// Drop every layer and go `Idle`, releasing any follow relation.
    pub fn force_finish<W: NavWorld + ?Sized>(&mut self, world: &mut W) {
        self.release_follow(world);
        self.state.clear();
        debug!(agent = %self.id, "navigation cancelled");
    }

    /// The world destroyed `target`.  Returns `true` if this agent was
    /// following it and has been force-finished.
    pub fn on_target_destroyed<W: NavWorld + ?Sized>(&mut self, target: ObjectId, world: &mut W) -> bool {
        if self.state.layers.tracked != Some(target) {
            return false;
        }
        self.force_finish(world);
        true
    }

    fn release_follow<W: NavWorld + ?Sized>(&mut self, world: &mut W) {
        if let Some(target) = self.state.layers.tracked.take() {
            world.remove_follower(target, self.id);
        }
    }
}
