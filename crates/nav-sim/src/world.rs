//! In-memory reference world.
//!
//! Objects live in a `BTreeMap` so scans and sightings come out in id order
//! and runs are reproducible.  Movement is straight-line at a fixed run
//! speed; a closed door blocks any mover that would pass within
//! `door_block_radius` of it.

use std::collections::{BTreeMap, VecDeque};

use nav_agent::{MovementExecutor, NavWorld, Sighting, SightingKind};
use nav_core::{ObjectId, Position, SimRng, SimTime, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

// ── Objects ───────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    /// Creatures of the same faction are allies.
    Creature {
        faction:    u16,
        dead:       bool,
        privileged: bool,
    },
    Door {
        open:   bool,
        locked: bool,
    },
    /// Scenery: visible but never acted on.
    Prop,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorldObject {
    pub id:       ObjectId,
    pub name:     String,
    pub position: Position,
    pub kind:     ObjectKind,
}

/// An alert raised by `agent` about `hostile`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Alert {
    pub time:    SimTime,
    pub agent:   ObjectId,
    pub hostile: ObjectId,
}

// ── SimWorld ──────────────────────────────────────────────────────────────────

pub struct SimWorld {
    objects:           BTreeMap<ObjectId, WorldObject>,
    destinations:      FxHashMap<ObjectId, Position>,
    followers:         FxHashMap<ObjectId, Vec<ObjectId>>,
    attack_targets:    FxHashMap<ObjectId, ObjectId>,
    woken:             FxHashSet<ObjectId>,
    alerts:            VecDeque<Alert>,
    now:               SimTime,
    next_id:           u32,
    position_updates:  u64,

    /// Units per second.
    pub run_speed:         f32,
    /// Planar range of `visible_objects`.
    pub visibility_radius: f32,
    pub door_block_radius: f32,
    /// Undrained alerts kept; the oldest are dropped beyond this.
    pub alert_capacity:    usize,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    pub fn new() -> Self {
        Self {
            objects:           BTreeMap::new(),
            destinations:      FxHashMap::default(),
            followers:         FxHashMap::default(),
            attack_targets:    FxHashMap::default(),
            woken:             FxHashSet::default(),
            alerts:            VecDeque::new(),
            now:               SimTime::ZERO,
            next_id:           1,
            position_updates:  0,
            run_speed:         4.0,
            visibility_radius: 30.0,
            door_block_radius: 1.0,
            alert_capacity:    256,
        }
    }

    // ── Population ────────────────────────────────────────────────────────

    pub fn spawn(&mut self, name: impl Into<String>, position: Position, kind: ObjectKind) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let name = name.into();
        debug!(%id, %name, pos = ?position.pos, "spawned");
        self.objects.insert(id, WorldObject { id, name, position, kind });
        id
    }

    pub fn spawn_creature(&mut self, name: impl Into<String>, position: Position, faction: u16) -> ObjectId {
        self.spawn(name, position, ObjectKind::Creature { faction, dead: false, privileged: false })
    }

    pub fn spawn_door(&mut self, name: impl Into<String>, position: Position, locked: bool) -> ObjectId {
        self.spawn(name, position, ObjectKind::Door { open: false, locked })
    }

    /// Spawn `count` creatures named `{prefix}-{n}` uniformly inside the
    /// planar disc of `radius` around `center`, in `center`'s cell.
    pub fn scatter_creatures(
        &mut self,
        prefix:  &str,
        count:   usize,
        center:  Position,
        radius:  f32,
        faction: u16,
        rng:     &mut SimRng,
    ) -> Vec<ObjectId> {
        (0..count)
            .map(|n| {
                let r = radius * rng.gen_range(0.0f32..=1.0).sqrt();
                let theta = rng.gen_range(0.0f32..std::f32::consts::TAU);
                let pos = center.pos + Vec3::new(r * theta.sin(), r * theta.cos(), 0.0);
                self.spawn_creature(format!("{prefix}-{n}"), center.moved_to(pos), faction)
            })
            .collect()
    }

    /// Remove an object and everything that refers to it.  Returns the ids
    /// that were following it.
    pub fn despawn(&mut self, id: ObjectId) -> Option<Vec<ObjectId>> {
        self.objects.remove(&id)?;
        self.destinations.remove(&id);
        self.attack_targets.remove(&id);
        self.attack_targets.retain(|_, target| *target != id);
        for list in self.followers.values_mut() {
            list.retain(|&f| f != id);
        }
        Some(self.followers.remove(&id).unwrap_or_default())
    }

    pub fn object(&self, id: ObjectId) -> Option<&WorldObject> {
        self.objects.get(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Teleport, cancelling any move in flight.
    pub fn set_position(&mut self, id: ObjectId, position: Position) -> bool {
        self.destinations.remove(&id);
        match self.objects.get_mut(&id) {
            Some(obj) => {
                obj.position = position;
                true
            }
            None => false,
        }
    }

    /// Mark a creature dead (combat resolution).
    pub fn kill(&mut self, id: ObjectId) -> bool {
        match self.objects.get_mut(&id).map(|o| &mut o.kind) {
            Some(ObjectKind::Creature { dead, .. }) => {
                *dead = true;
                self.destinations.remove(&id);
                true
            }
            _ => false,
        }
    }

    pub fn set_door(&mut self, id: ObjectId, open: bool, locked: bool) -> bool {
        match self.objects.get_mut(&id).map(|o| &mut o.kind) {
            Some(ObjectKind::Door { open: o, locked: l }) => {
                *o = open;
                *l = locked;
                true
            }
            _ => false,
        }
    }

    pub fn door_is_open(&self, id: ObjectId) -> Option<bool> {
        match self.objects.get(&id)?.kind {
            ObjectKind::Door { open, .. } => Some(open),
            _ => None,
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn followers_of(&self, target: ObjectId) -> &[ObjectId] {
        self.followers.get(&target).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn attack_target(&self, agent: ObjectId) -> Option<ObjectId> {
        self.attack_targets.get(&agent).copied()
    }

    /// Alerts raised since the last [`take_alerts`](Self::take_alerts),
    /// oldest first.
    pub fn alerts(&self) -> &VecDeque<Alert> {
        &self.alerts
    }

    pub fn take_alerts(&mut self) -> Vec<Alert> {
        self.alerts.drain(..).collect()
    }

    pub fn destination(&self, id: ObjectId) -> Option<Position> {
        self.destinations.get(&id).copied()
    }

    pub fn position_updates(&self) -> u64 {
        self.position_updates
    }

    /// Drain the agents woken since the last call.
    pub fn take_woken(&mut self) -> FxHashSet<ObjectId> {
        std::mem::take(&mut self.woken)
    }

    // ── Movement ──────────────────────────────────────────────────────────

    /// Move every mover `dt` seconds along its straight line.
    pub fn advance(&mut self, dt: f64) {
        self.now += dt;
        let step = self.run_speed * dt as f32;
        let closed_doors: Vec<Position> = self
            .objects
            .values()
            .filter(|o| matches!(o.kind, ObjectKind::Door { open: false, .. }))
            .map(|o| o.position)
            .collect();
        let block_sq = self.door_block_radius * self.door_block_radius;

        let mut arrived = Vec::new();
        for (&id, dest) in &self.destinations {
            let Some(obj) = self.objects.get_mut(&id) else {
                arrived.push(id);
                continue;
            };
            let remaining = obj.position.distance_2d_squared(dest).sqrt();
            let next = if remaining <= step {
                dest.pos
            } else {
                obj.position.pos.lerp(dest.pos, step / remaining)
            };
            let candidate = obj.position.moved_to(next);
            if closed_doors.iter().any(|d| d.distance_2d_squared(&candidate) < block_sq) {
                trace!(%id, "blocked by closed door");
                continue;
            }
            obj.position = candidate;
            if remaining <= step {
                arrived.push(id);
            }
        }
        for id in arrived {
            self.destinations.remove(&id);
        }
    }
}

// ── Navigator-facing traits ───────────────────────────────────────────────────

impl MovementExecutor for SimWorld {
    fn move_to(&mut self, agent: ObjectId, destination: Position) {
        if let Some(obj) = self.objects.get_mut(&agent) {
            obj.position.heading = obj.position.heading_to(destination.pos);
            self.destinations.insert(agent, destination);
        }
    }

    fn cancel_move(&mut self, agent: ObjectId) {
        self.destinations.remove(&agent);
    }

    fn is_moving(&self, agent: ObjectId) -> bool {
        self.destinations.contains_key(&agent)
    }

    fn sync_position(&mut self, _agent: ObjectId) {
        self.position_updates += 1;
    }
}

impl NavWorld for SimWorld {
    fn object_position(&self, id: ObjectId) -> Option<Position> {
        self.objects.get(&id).map(|o| o.position)
    }

    fn visible_objects(&self, agent: ObjectId) -> Vec<Sighting> {
        let Some(me) = self.objects.get(&agent) else {
            return Vec::new();
        };
        let my_faction = match me.kind {
            ObjectKind::Creature { faction, .. } => Some(faction),
            _ => None,
        };
        let radius_sq = self.visibility_radius * self.visibility_radius;
        self.objects
            .values()
            .filter(|o| o.id != agent && o.position.region() == me.position.region())
            .filter(|o| o.position.distance_2d_squared(&me.position) <= radius_sq)
            .map(|o| Sighting {
                id:       o.id,
                position: o.position,
                kind:     match o.kind {
                    ObjectKind::Creature { faction, dead, privileged } => SightingKind::Creature {
                        dead,
                        privileged,
                        ally: my_faction == Some(faction),
                    },
                    ObjectKind::Door { open, locked } => SightingKind::Door { open, locked },
                    ObjectKind::Prop => SightingKind::Other,
                },
            })
            .collect()
    }

    fn add_follower(&mut self, target: ObjectId, follower: ObjectId) {
        let list = self.followers.entry(target).or_default();
        if !list.contains(&follower) {
            list.push(follower);
        }
    }

    fn remove_follower(&mut self, target: ObjectId, follower: ObjectId) {
        if let Some(list) = self.followers.get_mut(&target) {
            list.retain(|&f| f != follower);
            if list.is_empty() {
                self.followers.remove(&target);
            }
        }
    }

    fn open_door(&mut self, door: ObjectId) {
        if let Some(ObjectKind::Door { open, locked: false }) = self.objects.get_mut(&door).map(|o| &mut o.kind) {
            *open = true;
            debug!(%door, "door opened");
        }
    }

    fn set_attack_target(&mut self, agent: ObjectId, target: ObjectId) {
        self.attack_targets.insert(agent, target);
    }

    fn clear_attack_target(&mut self, agent: ObjectId) {
        self.attack_targets.remove(&agent);
    }

    fn alert_nearby(&mut self, agent: ObjectId, hostile: ObjectId) {
        if self.alert_capacity == 0 {
            return;
        }
        while self.alerts.len() >= self.alert_capacity {
            self.alerts.pop_front();
        }
        self.alerts.push_back(Alert { time: self.now, agent, hostile });
    }

    fn wake(&mut self, agent: ObjectId) {
        self.woken.insert(agent);
    }
}
