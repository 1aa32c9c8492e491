//! Per-agent navigation state.

use nav_core::{ObjectId, Position, SimTime};

/// What the agent has been asked to do.  Exactly one is active.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum NavIntent {
    #[default]
    None,
    NavToPosition,
    NavToObject,
    Patrol,
}

/// How route execution is going.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum NavStatus {
    /// No route execution; new intents may start.
    #[default]
    Idle,
    Navigating,
    /// Route execution suspended until combat resolution calls
    /// [`Navigator::leave_combat`](crate::Navigator::leave_combat).
    Combat,
    /// A temporary detour target is active.
    Reset,
}

// ── Target layers ─────────────────────────────────────────────────────────────

/// One entry of the target precedence list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TargetLayer {
    Detour,
    Hostile,
    Tracked,
    Primary,
}

impl TargetLayer {
    /// Highest precedence first.
    pub const PRECEDENCE: [TargetLayer; 4] = [
        TargetLayer::Detour,
        TargetLayer::Hostile,
        TargetLayer::Tracked,
        TargetLayer::Primary,
    ];
}

/// The optional targets an agent may be steering for.  The effective target
/// is the first present layer in [`TargetLayer::PRECEDENCE`] order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetLayers {
    /// Random reachable point taken after getting stuck.
    pub detour:  Option<Position>,
    /// Where a hostile creature was last sighted.
    pub hostile: Option<Position>,
    /// Live object being followed; its position is looked up every step.
    pub tracked: Option<ObjectId>,
    /// Fixed target of `NavToPosition`, or the current patrol point.
    pub primary: Option<Position>,
}

impl TargetLayers {
    pub fn is_set(&self, layer: TargetLayer) -> bool {
        match layer {
            TargetLayer::Detour => self.detour.is_some(),
            TargetLayer::Hostile => self.hostile.is_some(),
            TargetLayer::Tracked => self.tracked.is_some(),
            TargetLayer::Primary => self.primary.is_some(),
        }
    }

    /// The highest present layer, or `None` when no layer is set.
    pub fn top(&self) -> Option<TargetLayer> {
        TargetLayer::PRECEDENCE.into_iter().find(|&l| self.is_set(l))
    }

    /// Position of the highest present layer.  `lookup` resolves the tracked
    /// object; a tracked object that no longer resolves yields `None`
    /// rather than falling through to a lower layer.
    pub fn resolve(
        &self,
        lookup: impl FnOnce(ObjectId) -> Option<Position>,
    ) -> Option<(TargetLayer, Position)> {
        let layer = self.top()?;
        let pos = match layer {
            TargetLayer::Detour => self.detour,
            TargetLayer::Hostile => self.hostile,
            TargetLayer::Tracked => self.tracked.and_then(lookup),
            TargetLayer::Primary => self.primary,
        }?;
        Some((layer, pos))
    }

    /// Drop one layer.  Returns the tracked object when that layer was cleared.
    pub fn clear(&mut self, layer: TargetLayer) -> Option<ObjectId> {
        match layer {
            TargetLayer::Detour => self.detour = None,
            TargetLayer::Hostile => self.hostile = None,
            TargetLayer::Tracked => return self.tracked.take(),
            TargetLayer::Primary => self.primary = None,
        }
        None
    }
}

// ── NavState ──────────────────────────────────────────────────────────────────

/// Everything the navigator remembers between ticks.
#[derive(Clone, Debug, PartialEq)]
pub struct NavState {
    pub intent:             NavIntent,
    pub status:             NavStatus,
    pub layers:             TargetLayers,

    /// Position before the last executed move; the stuck baseline.
    pub last_position:      Option<Position>,

    /// Earliest time of the next decision step.
    pub next_decision:      SimTime,
    /// When the last non-stuck move was issued.
    pub last_move_time:     Option<SimTime>,
    /// Stuck detection is suspended until this time.
    pub next_stuck_backoff: SimTime,

    /// Set while a tick is running.
    pub in_tick:            bool,
    pub stuck_count:        u32,
    pub attack_initiated:   bool,

    pub hostile_range:      f32,
    pub patrol_distance:    f32,
}

impl NavState {
    pub fn new(hostile_range: f32) -> Self {
        Self {
            intent:             NavIntent::None,
            status:             NavStatus::Idle,
            layers:             TargetLayers::default(),
            last_position:      None,
            next_decision:      SimTime::ZERO,
            last_move_time:     None,
            next_stuck_backoff: SimTime::ZERO,
            in_tick:            false,
            stuck_count:        0,
            attack_initiated:   false,
            hostile_range,
            patrol_distance:    0.0,
        }
    }

    /// Back to `Idle`/`None` with every layer and stuck tracker cleared.
    /// Timers and ranges are kept.
    pub(crate) fn clear(&mut self) {
        self.intent = NavIntent::None;
        self.status = NavStatus::Idle;
        self.layers = TargetLayers::default();
        self.last_position = None;
        self.stuck_count = 0;
    }
}
