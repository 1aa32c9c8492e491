//! Observer hooks for [`NavSim`](crate::NavSim) runs.

use nav_agent::Decision;
use nav_core::{ObjectId, SimTime};

/// Callbacks invoked by [`NavSim::step`][crate::NavSim::step].
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — count detours
///
/// ```rust,ignore
/// struct DetourCounter(usize);
///
/// impl NavObserver for DetourCounter {
///     fn on_decision(&mut self, _now: SimTime, _agent: ObjectId, decision: &Decision) {
///         if let Decision::Finished(Finish::Reached(TargetLayer::Detour)) = decision {
///             self.0 += 1;
///         }
///     }
/// }
/// ```
pub trait NavObserver {
    /// Called after the world has advanced, before any navigator ticks.
    fn on_step_start(&mut self, _now: SimTime) {}

    /// Called for every navigator ticked this step.
    fn on_decision(&mut self, _now: SimTime, _agent: ObjectId, _decision: &Decision) {}

    /// `ticked` is the number of navigators ticked this step.
    fn on_step_end(&mut self, _now: SimTime, _ticked: usize) {}

    /// Called once when [`NavSim::run_for`][crate::NavSim::run_for] returns.
    fn on_run_end(&mut self, _now: SimTime) {}
}

/// A [`NavObserver`] that does nothing.
pub struct NoopObserver;

impl NavObserver for NoopObserver {}
