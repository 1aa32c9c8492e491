//! The `NavSim` struct and its fixed-step loop.

use std::sync::Arc;

use nav_agent::{Navigator, NavStatus, RouteQueries};
use nav_core::{NavConfig, ObjectId, Position, SimTime};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::{NavObserver, SimError, SimResult, SimWorld};

/// Index of a navigator inside a [`NavSim`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentSlot(pub u32);

impl AgentSlot {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The external scheduler: owns the world, the navigators and the clock.
///
/// Each [`step`](Self::step):
///
/// 1. advances the world by `step_secs` (movers travel, the clock moves);
/// 2. ticks, in slot order, every navigator that is not `Idle` or was woken
///    since the last step.
///
/// Create via [`NavSimBuilder`][crate::NavSimBuilder].
pub struct NavSim<Q: RouteQueries> {
    pub world:   SimWorld,
    pub queries: Q,

    pub(crate) navigators: Vec<Navigator>,
    pub(crate) slots:      FxHashMap<ObjectId, AgentSlot>,
    pub(crate) config:     Arc<NavConfig>,
    pub(crate) seed:       u64,
    pub(crate) step_secs:  f64,
}

impl<Q: RouteQueries> NavSim<Q> {
    pub fn now(&self) -> SimTime {
        self.world.now()
    }

    pub fn step_secs(&self) -> f64 {
        self.step_secs
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.navigators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.navigators.is_empty()
    }

    /// Give the existing world object `id` a navigator.
    pub fn add_navigator(&mut self, id: ObjectId) -> SimResult<AgentSlot> {
        if self.world.object(id).is_none() {
            return Err(SimError::UnknownObject(id));
        }
        if self.slots.contains_key(&id) {
            return Err(SimError::DuplicateNavigator(id));
        }
        let slot = AgentSlot(self.navigators.len() as u32);
        self.navigators.push(Navigator::new(id, Arc::clone(&self.config), self.seed)?);
        self.slots.insert(id, slot);
        Ok(slot)
    }

    pub fn slot_of(&self, id: ObjectId) -> Option<AgentSlot> {
        self.slots.get(&id).copied()
    }

    pub fn navigator(&self, slot: AgentSlot) -> SimResult<&Navigator> {
        self.navigators.get(slot.index()).ok_or(SimError::UnknownSlot(slot))
    }

    pub fn navigators(&self) -> impl Iterator<Item = &Navigator> {
        self.navigators.iter()
    }

    // ── Intents ───────────────────────────────────────────────────────────

    pub fn nav_to_position(&mut self, slot: AgentSlot, target: Position) -> SimResult<()> {
        let nav = self.navigators.get_mut(slot.index()).ok_or(SimError::UnknownSlot(slot))?;
        nav.nav_to_position(target, &mut self.world)?;
        Ok(())
    }

    pub fn nav_to_object(&mut self, slot: AgentSlot, target: ObjectId) -> SimResult<()> {
        if self.world.object(target).is_none() {
            return Err(SimError::UnknownObject(target));
        }
        let nav = self.navigators.get_mut(slot.index()).ok_or(SimError::UnknownSlot(slot))?;
        nav.nav_to_object(target, &mut self.world)?;
        Ok(())
    }

    pub fn patrol(&mut self, slot: AgentSlot, max_distance: f32) -> SimResult<()> {
        let nav = self.navigators.get_mut(slot.index()).ok_or(SimError::UnknownSlot(slot))?;
        nav.patrol(max_distance, &mut self.world, &self.queries)?;
        Ok(())
    }

    /// Combat resolution for `slot` is over.
    pub fn leave_combat(&mut self, slot: AgentSlot) -> SimResult<()> {
        let nav = self.navigators.get_mut(slot.index()).ok_or(SimError::UnknownSlot(slot))?;
        nav.leave_combat(&mut self.world);
        Ok(())
    }

    pub fn force_finish(&mut self, slot: AgentSlot) -> SimResult<()> {
        let nav = self.navigators.get_mut(slot.index()).ok_or(SimError::UnknownSlot(slot))?;
        nav.force_finish(&mut self.world);
        Ok(())
    }

    /// Remove `id` from the world and force-finish every navigator that was
    /// following it.  Returns `false` if there was no such object.
    pub fn destroy_object(&mut self, id: ObjectId) -> bool {
        let Some(followers) = self.world.despawn(id) else {
            return false;
        };
        for follower in followers {
            let Some(slot) = self.slots.get(&follower).copied() else {
                continue;
            };
            if let Some(nav) = self.navigators.get_mut(slot.index()) {
                nav.on_target_destroyed(id, &mut self.world);
            }
        }
        if let Some(slot) = self.slots.get(&id).copied() {
            if let Some(nav) = self.navigators.get_mut(slot.index()) {
                nav.force_finish(&mut self.world);
            }
        }
        debug!(%id, "object destroyed");
        true
    }

    // ── Loop ──────────────────────────────────────────────────────────────

    /// Advance one fixed step.  Returns the number of navigators ticked.
    pub fn step<O: NavObserver>(&mut self, observer: &mut O) -> usize {
        self.world.advance(self.step_secs);
        let now = self.world.now();
        observer.on_step_start(now);

        let woken = self.world.take_woken();
        let mut ticked = 0;
        for nav in &mut self.navigators {
            if nav.status() == NavStatus::Idle && !woken.contains(&nav.id()) {
                continue;
            }
            let decision = nav.tick(now, &mut self.world, &self.queries);
            trace!(agent = %nav.id(), ?decision, "tick");
            observer.on_decision(now, nav.id(), &decision);
            ticked += 1;
        }

        observer.on_step_end(now, ticked);
        ticked
    }

    /// Step until `secs` of simulated time have passed.
    pub fn run_for<O: NavObserver>(&mut self, secs: f64, observer: &mut O) {
        let end = self.world.now() + secs;
        while self.world.now() < end {
            self.step(observer);
        }
        observer.on_run_end(self.world.now());
    }
}
