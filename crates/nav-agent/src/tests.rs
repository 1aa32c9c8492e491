//! Unit tests for nav-agent.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use nav_cache::Route;
use nav_core::{CellId, NavConfig, ObjectId, Position, SimTime, Vec3};
use rand::RngCore;

use crate::{
    AgentError, Decision, Finish, MovementExecutor, NavIntent, NavStatus, NavWorld, Navigator,
    RouteQueries, Sighting, SightingKind, TargetLayer, TargetLayers,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const AGENT: ObjectId = ObjectId(1);
const OTHER: ObjectId = ObjectId(2);
const DOOR: ObjectId = ObjectId(3);

fn at(x: f32, y: f32) -> Position {
    Position::new(CellId(0x0001_0001), Vec3::new(x, y, 0.0))
}

fn t(secs: f64) -> SimTime {
    SimTime(secs)
}

fn navigator() -> Navigator {
    Navigator::new(AGENT, Arc::new(NavConfig::default()), 7).unwrap()
}

/// A world where nothing moves unless the test moves it.
#[derive(Default)]
struct FakeWorld {
    positions: HashMap<ObjectId, Position>,
    sightings: Vec<Sighting>,
    moving:    bool,
    moves:     Vec<Position>,
    cancels:   usize,
    syncs:     usize,
    wakes:     usize,
    followers: Vec<(ObjectId, ObjectId)>,
    opened:    Vec<ObjectId>,
    attacking: Option<ObjectId>,
    alerts:    Vec<ObjectId>,
}

impl FakeWorld {
    fn with_agent_at(p: Position) -> Self {
        let mut w = Self::default();
        w.positions.insert(AGENT, p);
        w
    }

    fn place(&mut self, id: ObjectId, p: Position) {
        self.positions.insert(id, p);
    }

    fn see(&mut self, id: ObjectId, p: Position, kind: SightingKind) {
        self.sightings.push(Sighting { id, position: p, kind });
    }
}

impl MovementExecutor for FakeWorld {
    fn move_to(&mut self, _agent: ObjectId, destination: Position) {
        self.moves.push(destination);
    }

    fn cancel_move(&mut self, _agent: ObjectId) {
        self.cancels += 1;
    }

    fn is_moving(&self, _agent: ObjectId) -> bool {
        self.moving
    }

    fn sync_position(&mut self, _agent: ObjectId) {
        self.syncs += 1;
    }
}

impl NavWorld for FakeWorld {
    fn object_position(&self, id: ObjectId) -> Option<Position> {
        self.positions.get(&id).copied()
    }

    fn visible_objects(&self, _agent: ObjectId) -> Vec<Sighting> {
        self.sightings.clone()
    }

    fn add_follower(&mut self, target: ObjectId, follower: ObjectId) {
        self.followers.push((target, follower));
    }

    fn remove_follower(&mut self, target: ObjectId, follower: ObjectId) {
        self.followers.retain(|&f| f != (target, follower));
    }

    fn open_door(&mut self, door: ObjectId) {
        self.opened.push(door);
    }

    fn set_attack_target(&mut self, _agent: ObjectId, target: ObjectId) {
        self.attacking = Some(target);
    }

    fn clear_attack_target(&mut self, _agent: ObjectId) {
        self.attacking = None;
    }

    fn alert_nearby(&mut self, _agent: ObjectId, hostile: ObjectId) {
        self.alerts.push(hostile);
    }

    fn wake(&mut self, _agent: ObjectId) {
        self.wakes += 1;
    }
}

/// Straight two-point routes within one region; random points from a queue.
#[derive(Default)]
struct FakeQueries {
    unavailable: bool,
    requests:    RefCell<Vec<Position>>,
    points:      RefCell<VecDeque<Position>>,
}

impl FakeQueries {
    fn with_points(points: impl IntoIterator<Item = Position>) -> Self {
        Self { points: RefCell::new(points.into_iter().collect()), ..Default::default() }
    }

    fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    fn last_request(&self) -> Option<Position> {
        self.requests.borrow().last().copied()
    }
}

impl RouteQueries for FakeQueries {
    fn find_route(&self, start: &Position, end: &Position) -> Option<Route> {
        if self.unavailable || start.region() != end.region() {
            return None;
        }
        self.requests.borrow_mut().push(*end);
        Some(Route::new(vec![*start, *end]))
    }

    fn random_point(
        &self,
        _start:        &Position,
        _max_distance: Option<f32>,
        _rng:          &mut dyn RngCore,
    ) -> Option<Position> {
        self.points.borrow_mut().pop_front()
    }
}

fn hostile() -> SightingKind {
    SightingKind::Creature { dead: false, privileged: false, ally: false }
}

// ── Target layers ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod layer_tests {
    use super::*;

    fn all_layers() -> TargetLayers {
        TargetLayers {
            detour:  Some(at(1.0, 0.0)),
            hostile: Some(at(2.0, 0.0)),
            tracked: Some(OTHER),
            primary: Some(at(4.0, 0.0)),
        }
    }

    #[test]
    fn resolves_top_down() {
        let mut layers = all_layers();
        let lookup = |_: ObjectId| Some(at(3.0, 0.0));
        assert_eq!(layers.resolve(lookup), Some((TargetLayer::Detour, at(1.0, 0.0))));
        layers.clear(TargetLayer::Detour);
        assert_eq!(layers.resolve(lookup), Some((TargetLayer::Hostile, at(2.0, 0.0))));
        layers.clear(TargetLayer::Hostile);
        assert_eq!(layers.resolve(lookup), Some((TargetLayer::Tracked, at(3.0, 0.0))));
        assert_eq!(layers.clear(TargetLayer::Tracked), Some(OTHER));
        assert_eq!(layers.resolve(lookup), Some((TargetLayer::Primary, at(4.0, 0.0))));
        layers.clear(TargetLayer::Primary);
        assert_eq!(layers.resolve(lookup), None);
    }

    #[test]
    fn vanished_object_does_not_fall_through() {
        let layers = TargetLayers { tracked: Some(OTHER), primary: Some(at(4.0, 0.0)), ..Default::default() };
        assert_eq!(layers.resolve(|_| None), None);
    }
}

// ── Intents ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod intent_tests {
    use super::*;

    #[test]
    fn new_navigator_is_idle() {
        let nav = navigator();
        assert_eq!(nav.intent(), NavIntent::None);
        assert_eq!(nav.status(), NavStatus::Idle);
        assert!(!nav.is_navigating());
    }

    #[test]
    fn invalid_config_rejected() {
        let config = NavConfig { reach_distance_sq: -1.0, ..Default::default() };
        assert!(matches!(
            Navigator::new(AGENT, Arc::new(config), 0),
            Err(AgentError::Nav(_))
        ));
    }

    #[test]
    fn nav_to_position_starts_navigating() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let mut nav = navigator();
        nav.nav_to_position(at(10.0, 0.0), &mut world).unwrap();
        assert!(nav.is_navigating_to_position());
        assert_eq!(nav.status(), NavStatus::Navigating);
        assert_eq!(nav.state().layers.primary, Some(at(10.0, 0.0)));
        assert_eq!(world.wakes, 1);
    }

    #[test]
    fn nav_to_object_registers_follower() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let mut nav = navigator();
        nav.nav_to_object(OTHER, &mut world).unwrap();
        assert!(nav.is_navigating_to_object());
        assert_eq!(world.followers, vec![(OTHER, AGENT)]);
    }

    #[test]
    fn intent_rejected_unless_idle() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_position(at(10.0, 0.0), &mut world).unwrap();
        let before = nav.state().clone();

        let err = nav.nav_to_object(OTHER, &mut world).unwrap_err();
        assert!(matches!(
            err,
            AgentError::InvalidTransition { requested: NavIntent::NavToObject, status: NavStatus::Navigating, .. }
        ));
        assert!(nav.patrol(5.0, &mut world, &queries).is_err());
        assert!(nav.nav_to_position(at(3.0, 3.0), &mut world).is_err());
        assert_eq!(*nav.state(), before);
        assert!(world.followers.is_empty());
    }

    #[test]
    fn set_idle_allows_new_intent_and_drops_old_follow() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let mut nav = navigator();
        nav.nav_to_object(OTHER, &mut world).unwrap();
        nav.set_idle();
        assert_eq!(nav.intent(), NavIntent::NavToObject);

        nav.nav_to_position(at(5.0, 5.0), &mut world).unwrap();
        assert!(world.followers.is_empty());
        assert_eq!(nav.state().layers.tracked, None);
    }

    #[test]
    fn patrol_rolls_a_point() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let queries = FakeQueries::with_points([at(8.0, 8.0)]);
        let mut nav = navigator();
        nav.patrol(20.0, &mut world, &queries).unwrap();
        assert!(nav.is_patrolling());
        assert_eq!(nav.state().patrol_distance, 20.0);
        assert_eq!(nav.state().layers.primary, Some(at(8.0, 8.0)));
    }

    #[test]
    fn hostile_range_resets_per_intent() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let mut nav = navigator();
        nav.nav_to_position(at(10.0, 0.0), &mut world).unwrap();
        nav.set_hostile_range(4.0);
        assert_eq!(nav.state().hostile_range, 4.0);
        nav.set_idle();
        nav.nav_to_position(at(10.0, 0.0), &mut world).unwrap();
        assert_eq!(nav.state().hostile_range, NavConfig::default().hostile_range);
    }
}

// ── Tick ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tick_tests {
    use super::*;

    #[test]
    fn reentrant_tick_keeps_housekeeping_skips_decision() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_position(at(10.0, 0.0), &mut world).unwrap();
        nav.state_mut().in_tick = true;
        assert_eq!(nav.tick(t(0.0), &mut world, &queries), Decision::Reentrant);
        assert_eq!(world.syncs, 1);
        assert!(world.moves.is_empty());
        assert_eq!(queries.request_count(), 0);
        assert_eq!(nav.state().next_decision, SimTime::ZERO);
    }

    #[test]
    fn housekeeping_every_tick_decisions_on_interval() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        world.moving = true;
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_position(at(10.0, 0.0), &mut world).unwrap();

        assert!(nav.tick(t(0.0), &mut world, &queries).moved());
        assert_eq!(nav.tick(t(0.5), &mut world, &queries), Decision::Waiting);
        assert_eq!(nav.tick(t(1.0), &mut world, &queries), Decision::Cooldown);
        assert_eq!(world.syncs, 3);
        assert!(!nav.state().in_tick);
    }

    #[test]
    fn idle_does_nothing() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let queries = FakeQueries::default();
        let mut nav = navigator();
        assert_eq!(nav.tick(t(0.0), &mut world, &queries), Decision::Idle);
        assert_eq!(queries.request_count(), 0);
    }

    #[test]
    fn close_target_finishes_without_route() {
        let start = Position::new(CellId(0x0001_0000), Vec3::new(0.0, 0.0, 0.0));
        let target = Position::new(CellId(0x0001_0000), Vec3::new(1.0, 0.0, 0.0));
        let mut world = FakeWorld::with_agent_at(start);
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_position(target, &mut world).unwrap();

        assert_eq!(
            nav.tick(t(0.0), &mut world, &queries),
            Decision::Finished(Finish::Reached(TargetLayer::Primary))
        );
        assert_eq!(queries.request_count(), 0);
        assert_eq!(nav.status(), NavStatus::Idle);
        assert_eq!(nav.intent(), NavIntent::None);
    }

    #[test]
    fn target_in_other_region_finishes() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let queries = FakeQueries::default();
        let mut nav = navigator();
        let elsewhere = Position::new(CellId(0x0002_0001), Vec3::new(50.0, 0.0, 0.0));
        nav.nav_to_position(elsewhere, &mut world).unwrap();
        assert!(matches!(nav.tick(t(0.0), &mut world, &queries), Decision::Finished(_)));
        assert_eq!(queries.request_count(), 0);
        assert_eq!(nav.status(), NavStatus::Idle);
    }

    #[test]
    fn missing_route_cancels_move() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let queries = FakeQueries { unavailable: true, ..Default::default() };
        let mut nav = navigator();
        nav.nav_to_position(at(10.0, 0.0), &mut world).unwrap();
        assert_eq!(nav.tick(t(0.0), &mut world, &queries), Decision::NoRoute);
        assert_eq!(world.cancels, 1);
        assert_eq!(nav.status(), NavStatus::Navigating);
    }

    #[test]
    fn move_cooldown_holds_for_five_seconds() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        world.moving = true;
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_position(at(10.0, 0.0), &mut world).unwrap();

        assert!(nav.tick(t(0.0), &mut world, &queries).moved());
        for s in 1..5 {
            assert_eq!(nav.tick(t(s as f64), &mut world, &queries), Decision::Cooldown);
        }
        assert!(nav.tick(t(5.0), &mut world, &queries).moved());
        assert_eq!(world.moves.len(), 2);
    }

    #[test]
    fn moves_to_next_waypoint() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_position(at(10.0, 0.0), &mut world).unwrap();
        assert_eq!(
            nav.tick(t(0.0), &mut world, &queries),
            Decision::Moved { destination: at(10.0, 0.0), stuck: false }
        );
        assert_eq!(nav.state().last_position, Some(at(0.0, 0.0)));
        assert_eq!(nav.state().last_move_time, Some(t(0.0)));
    }

    #[test]
    fn follows_live_object_position() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        world.place(OTHER, at(10.0, 0.0));
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_object(OTHER, &mut world).unwrap();

        nav.tick(t(0.0), &mut world, &queries);
        assert_eq!(queries.last_request(), Some(at(10.0, 0.0)));
        world.place(OTHER, at(10.0, 6.0));
        nav.tick(t(1.0), &mut world, &queries);
        assert_eq!(queries.last_request(), Some(at(10.0, 6.0)));
    }

    #[test]
    fn vanished_object_forces_finish() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        world.place(OTHER, at(10.0, 0.0));
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_object(OTHER, &mut world).unwrap();
        world.positions.remove(&OTHER);

        assert_eq!(nav.tick(t(0.0), &mut world, &queries), Decision::Finished(Finish::Forced));
        assert_eq!(nav.status(), NavStatus::Idle);
        assert!(world.followers.is_empty());
    }

    #[test]
    fn patrol_without_point_stalls_then_recovers() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.patrol(10.0, &mut world, &queries).unwrap();
        assert_eq!(nav.tick(t(0.0), &mut world, &queries), Decision::Stalled);

        queries.points.borrow_mut().push_back(at(6.0, 6.0));
        assert!(nav.tick(t(1.0), &mut world, &queries).moved());
        assert_eq!(queries.last_request(), Some(at(6.0, 6.0)));
    }
}

// ── Stuck recovery ────────────────────────────────────────────────────────────

#[cfg(test)]
mod stuck_tests {
    use super::*;

    #[test]
    fn second_stuck_tick_takes_detour_then_resumes() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let queries = FakeQueries::with_points([at(1.0, 1.0), at(5.0, 5.0)]);
        let mut nav = navigator();
        nav.nav_to_position(at(20.0, 0.0), &mut world).unwrap();

        assert_eq!(
            nav.tick(t(0.0), &mut world, &queries),
            Decision::Moved { destination: at(20.0, 0.0), stuck: false }
        );

        // Heading 0 faces +y.
        assert_eq!(
            nav.tick(t(1.0), &mut world, &queries),
            Decision::Moved { destination: at(0.0, 3.0), stuck: true }
        );
        assert_eq!(nav.state().stuck_count, 1);
        assert_eq!(nav.status(), NavStatus::Navigating);

        assert!(nav.tick(t(2.0), &mut world, &queries).moved());
        assert!(nav.is_resetting());
        assert_eq!(nav.state().layers.detour, Some(at(5.0, 5.0)));
        assert_eq!(nav.state().next_stuck_backoff, t(12.0));

        nav.tick(t(3.0), &mut world, &queries);
        assert_eq!(queries.last_request(), Some(at(5.0, 5.0)));

        world.place(AGENT, at(5.0, 4.5));
        assert_eq!(
            nav.tick(t(4.0), &mut world, &queries),
            Decision::Finished(Finish::Reached(TargetLayer::Detour))
        );
        assert_eq!(nav.status(), NavStatus::Navigating);

        nav.tick(t(5.0), &mut world, &queries);
        assert_eq!(queries.last_request(), Some(at(20.0, 0.0)));
    }

    #[test]
    fn no_detour_point_keeps_stepping_forward() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_position(at(20.0, 0.0), &mut world).unwrap();
        for s in 0..4 {
            nav.tick(t(s as f64), &mut world, &queries);
        }
        assert_eq!(nav.status(), NavStatus::Navigating);
        assert_eq!(nav.state().stuck_count, 3);
        assert_eq!(world.moves.last(), Some(&at(0.0, 3.0)));
    }

    #[test]
    fn moving_agent_is_not_stuck() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_position(at(20.0, 0.0), &mut world).unwrap();
        for s in 0..5 {
            world.place(AGENT, at(s as f32 * 2.0, 0.0));
            let d = nav.tick(t(s as f64), &mut world, &queries);
            assert!(matches!(d, Decision::Moved { stuck: false, .. }));
        }
        assert_eq!(nav.state().stuck_count, 0);
    }

    #[test]
    fn detour_outranks_hostile_and_primary() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_position(at(20.0, 0.0), &mut world).unwrap();
        nav.state_mut().layers.hostile = Some(at(0.0, 15.0));
        nav.state_mut().layers.detour = Some(at(-8.0, -8.0));
        nav.state_mut().status = NavStatus::Reset;

        nav.tick(t(0.0), &mut world, &queries);
        assert_eq!(queries.last_request(), Some(at(-8.0, -8.0)));
    }
}

// ── Scan ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scan_tests {
    use super::*;

    #[test]
    fn close_creature_enters_combat() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        world.see(OTHER, at(1.5, 0.5), hostile());
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_position(at(20.0, 0.0), &mut world).unwrap();

        assert_eq!(nav.tick(t(0.0), &mut world, &queries), Decision::Engaged(OTHER));
        assert!(nav.is_in_combat());
        assert_eq!(world.attacking, Some(OTHER));
        assert_eq!(world.alerts, vec![OTHER]);
        assert_eq!(nav.state().last_position, None);
        assert!(world.moves.is_empty());

        let requests = queries.request_count();
        for s in 1..4 {
            assert_eq!(nav.tick(t(s as f64), &mut world, &queries), Decision::InCombat);
        }
        assert_eq!(queries.request_count(), requests);

        nav.mark_attack_initiated();
        world.sightings.clear();
        nav.leave_combat(&mut world);
        assert_eq!(nav.status(), NavStatus::Navigating);
        assert!(!nav.attack_initiated());
        assert_eq!(world.attacking, None);
        assert!(nav.tick(t(4.0), &mut world, &queries).moved());
    }

    #[test]
    fn distant_creature_is_remembered_not_handled() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        world.see(OTHER, at(0.0, 12.0), hostile());
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_position(at(20.0, 0.0), &mut world).unwrap();

        assert!(nav.tick(t(0.0), &mut world, &queries).moved());
        assert_eq!(nav.state().layers.hostile, Some(at(0.0, 12.0)));
        assert_eq!(world.alerts, vec![OTHER]);

        world.place(AGENT, at(0.0, 2.0));
        nav.tick(t(1.0), &mut world, &queries);
        assert_eq!(queries.last_request(), Some(at(0.0, 12.0)));
    }

    #[test]
    fn creature_beyond_hostile_range_ignored() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        world.see(OTHER, at(0.0, 30.0), hostile());
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_position(at(20.0, 0.0), &mut world).unwrap();
        nav.tick(t(0.0), &mut world, &queries);
        assert_eq!(nav.state().layers.hostile, None);
        assert!(world.alerts.is_empty());
    }

    #[test]
    fn dead_allied_and_privileged_creatures_ignored() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let near = at(1.0, 0.0);
        world.see(ObjectId(10), near, SightingKind::Creature { dead: true, privileged: false, ally: false });
        world.see(ObjectId(11), near, SightingKind::Creature { dead: false, privileged: true, ally: false });
        world.see(ObjectId(12), near, SightingKind::Creature { dead: false, privileged: false, ally: true });
        world.see(AGENT, near, hostile());
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_position(at(20.0, 0.0), &mut world).unwrap();
        assert!(nav.tick(t(0.0), &mut world, &queries).moved());
        assert_eq!(nav.status(), NavStatus::Navigating);
    }

    #[test]
    fn nearby_closed_door_is_opened() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        world.see(DOOR, at(5.0, 0.0), SightingKind::Door { open: false, locked: false });
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_position(at(20.0, 0.0), &mut world).unwrap();
        assert_eq!(nav.tick(t(0.0), &mut world, &queries), Decision::DoorOpened(DOOR));
        assert_eq!(world.opened, vec![DOOR]);
        assert!(world.moves.is_empty());
    }

    #[test]
    fn locked_open_or_far_doors_are_left_alone() {
        for (kind, pos) in [
            (SightingKind::Door { open: false, locked: true }, at(5.0, 0.0)),
            (SightingKind::Door { open: true, locked: false }, at(5.0, 0.0)),
            (SightingKind::Door { open: false, locked: false }, at(8.0, 0.0)),
        ] {
            let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
            world.see(DOOR, pos, kind);
            let queries = FakeQueries::default();
            let mut nav = navigator();
            nav.nav_to_position(at(20.0, 0.0), &mut world).unwrap();
            assert!(nav.tick(t(0.0), &mut world, &queries).moved());
            assert!(world.opened.is_empty());
        }
    }

    #[test]
    fn leaving_combat_near_hostile_memory_drops_it() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let mut nav = navigator();
        nav.nav_to_position(at(20.0, 0.0), &mut world).unwrap();
        nav.state_mut().layers.hostile = Some(at(1.0, 0.0));
        nav.state_mut().status = NavStatus::Combat;
        nav.leave_combat(&mut world);
        assert_eq!(nav.state().layers.hostile, None);

        nav.state_mut().layers.hostile = Some(at(9.0, 0.0));
        nav.state_mut().status = NavStatus::Combat;
        nav.leave_combat(&mut world);
        assert_eq!(nav.state().layers.hostile, Some(at(9.0, 0.0)));
    }
}

// ── Completion ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod completion_tests {
    use super::*;

    #[test]
    fn patrol_completion_renews_target() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let queries = FakeQueries::with_points([at(10.0, 0.0), at(-10.0, 0.0)]);
        let mut nav = navigator();
        nav.patrol(15.0, &mut world, &queries).unwrap();
        assert!(nav.tick(t(0.0), &mut world, &queries).moved());

        world.place(AGENT, at(9.5, 0.0));
        assert_eq!(
            nav.tick(t(1.0), &mut world, &queries),
            Decision::Finished(Finish::PatrolRenewed)
        );
        assert!(nav.is_patrolling());
        assert_eq!(nav.status(), NavStatus::Navigating);
        assert_eq!(nav.state().layers.primary, Some(at(-10.0, 0.0)));
        assert_eq!(nav.state().patrol_distance, 15.0);

        assert!(nav.tick(t(2.0), &mut world, &queries).moved());
        assert_eq!(queries.last_request(), Some(at(-10.0, 0.0)));
    }

    #[test]
    fn hostile_layer_pops_back_to_primary() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_position(at(20.0, 0.0), &mut world).unwrap();
        nav.state_mut().layers.hostile = Some(at(0.5, 0.5));

        assert_eq!(
            nav.tick(t(0.0), &mut world, &queries),
            Decision::Finished(Finish::Reached(TargetLayer::Hostile))
        );
        assert_eq!(nav.status(), NavStatus::Navigating);
        assert_eq!(nav.state().layers.primary, Some(at(20.0, 0.0)));
    }

    #[test]
    fn reaching_followed_object_deregisters() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        world.place(OTHER, at(1.0, 0.0));
        let queries = FakeQueries::default();
        let mut nav = navigator();
        nav.nav_to_object(OTHER, &mut world).unwrap();
        assert_eq!(
            nav.tick(t(0.0), &mut world, &queries),
            Decision::Finished(Finish::Reached(TargetLayer::Tracked))
        );
        assert!(world.followers.is_empty());
        assert_eq!(nav.intent(), NavIntent::None);
    }

    #[test]
    fn destroyed_target_force_finishes_follower() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        world.place(OTHER, at(10.0, 0.0));
        let mut nav = navigator();
        nav.nav_to_object(OTHER, &mut world).unwrap();

        assert!(!nav.on_target_destroyed(DOOR, &mut world));
        assert!(nav.on_target_destroyed(OTHER, &mut world));
        assert_eq!(nav.status(), NavStatus::Idle);
        assert_eq!(nav.state().layers, TargetLayers::default());
        assert!(world.followers.is_empty());
    }

    #[test]
    fn force_finish_clears_every_layer() {
        let mut world = FakeWorld::with_agent_at(at(0.0, 0.0));
        let mut nav = navigator();
        nav.nav_to_position(at(20.0, 0.0), &mut world).unwrap();
        nav.state_mut().layers.detour = Some(at(3.0, 3.0));
        nav.state_mut().layers.hostile = Some(at(4.0, 4.0));
        nav.state_mut().status = NavStatus::Reset;
        nav.force_finish(&mut world);
        assert_eq!(nav.status(), NavStatus::Idle);
        assert_eq!(nav.intent(), NavIntent::None);
        assert_eq!(nav.state().layers, TargetLayers::default());
    }
}
