//! Navigation tuning constants.
//!
//! All distance thresholds are **planar squared distances** in world units,
//! matching how the navigator compares them.  Values are loaded by the
//! application (e.g. from a server config file) and handed to the navigators
//! and the simulation builder; nothing here reads files.

use crate::{NavError, NavResult};

/// Per-world navigation configuration shared by every navigator.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NavConfig {
    /// Below this the effective target counts as reached.  Default: 2.
    pub reach_distance_sq: f32,

    /// Nearest hostile creature within this enters combat.  Default: 5.
    pub engage_distance_sq: f32,

    /// Closed, unlocked doors within this get opened.  Default: 50.
    pub door_distance_sq: f32,

    /// Movement since the last tick below this counts as stuck.  Default: 0.2.
    pub stuck_distance_sq: f32,

    /// Stuck ticks tolerated before a detour is taken.  Default: 1 (the
    /// second consecutive stuck tick detours).
    pub stuck_tolerance: u32,

    /// Minimum distance of a detour point from where the agent got stuck.
    /// Default: 10.
    pub detour_min_distance_sq: f32,

    /// Search radius for detour points.  Default: 100.
    pub detour_radius: f32,

    /// Random draws attempted per detour before giving up for this tick.
    pub detour_attempts: u32,

    /// Offset of the "step forward" move issued while stuck.  Default: 3.
    pub stuck_step_distance: f32,

    /// Seconds between decision steps.  Default: 1.
    pub move_interval_secs: f64,

    /// While a move is in flight, no new move is issued for this long.
    /// Default: 5.
    pub move_cooldown_secs: f64,

    /// Seconds after a detour during which stuck detection is suspended.
    /// Default: 10.
    pub stuck_backoff_secs: f64,

    /// Default hostile-detection range for new intents.  Default: 20.
    pub hostile_range: f32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            reach_distance_sq:      2.0,
            engage_distance_sq:     5.0,
            door_distance_sq:       50.0,
            stuck_distance_sq:      0.2,
            stuck_tolerance:        1,
            detour_min_distance_sq: 10.0,
            detour_radius:          100.0,
            detour_attempts:        16,
            stuck_step_distance:    3.0,
            move_interval_secs:     1.0,
            move_cooldown_secs:     5.0,
            stuck_backoff_secs:     10.0,
            hostile_range:          20.0,
        }
    }
}

impl NavConfig {
    /// Reject values that would make the navigator spin or never finish.
    pub fn validate(&self) -> NavResult<()> {
        let positive = [
            ("reach_distance_sq", self.reach_distance_sq),
            ("engage_distance_sq", self.engage_distance_sq),
            ("door_distance_sq", self.door_distance_sq),
            ("stuck_distance_sq", self.stuck_distance_sq),
            ("detour_radius", self.detour_radius),
            ("stuck_step_distance", self.stuck_step_distance),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(NavError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        if !(self.move_interval_secs.is_finite() && self.move_interval_secs > 0.0) {
            return Err(NavError::Config(format!(
                "move_interval_secs must be positive, got {}",
                self.move_interval_secs
            )));
        }
        if self.move_cooldown_secs < 0.0 || self.stuck_backoff_secs < 0.0 {
            return Err(NavError::Config("timers must not be negative".into()));
        }
        if self.detour_attempts == 0 {
            return Err(NavError::Config("detour_attempts must be at least 1".into()));
        }
        if self.detour_min_distance_sq >= self.detour_radius * self.detour_radius {
            return Err(NavError::Config(format!(
                "detour_min_distance_sq {} unreachable within detour_radius {}",
                self.detour_min_distance_sq, self.detour_radius
            )));
        }
        if self.hostile_range < 0.0 {
            return Err(NavError::Config("hostile_range must not be negative".into()));
        }
        Ok(())
    }
}
