//! Fluent builder for constructing a [`NavSim`].

use std::sync::Arc;

use nav_agent::RouteQueries;
use nav_core::NavConfig;
use rustc_hash::FxHashMap;
use tracing::info;

use crate::{NavSim, SimError, SimResult, SimWorld};

/// Fluent builder for [`NavSim<Q>`].
///
/// # Required inputs
///
/// - [`SimWorld`] — objects already spawned
/// - `Q: RouteQueries` — usually a `nav_cache::SurfaceService`
///
/// # Optional inputs (have defaults)
///
/// | Method           | Default                |
/// |------------------|------------------------|
/// | `.config(c)`     | `NavConfig::default()` |
/// | `.seed(s)`       | `0`                    |
/// | `.step_secs(dt)` | `0.25`                 |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = NavSimBuilder::new(world, service)
///     .seed(42)
///     .build()?;
/// let guard = sim.add_navigator(guard_id)?;
/// sim.patrol(guard, 20.0)?;
/// sim.run_for(60.0, &mut NoopObserver);
/// ```
pub struct NavSimBuilder<Q: RouteQueries> {
    world:     SimWorld,
    queries:   Q,
    config:    NavConfig,
    seed:      u64,
    step_secs: f64,
}

impl<Q: RouteQueries> NavSimBuilder<Q> {
    pub fn new(world: SimWorld, queries: Q) -> Self {
        Self {
            world,
            queries,
            config:    NavConfig::default(),
            seed:      0,
            step_secs: 0.25,
        }
    }

    pub fn config(mut self, config: NavConfig) -> Self {
        self.config = config;
        self
    }

    /// World seed every navigator RNG is derived from.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn step_secs(mut self, step_secs: f64) -> Self {
        self.step_secs = step_secs;
        self
    }

    pub fn build(self) -> SimResult<NavSim<Q>> {
        self.config.validate()?;
        if !(self.step_secs.is_finite() && self.step_secs > 0.0) {
            return Err(SimError::Config(format!(
                "step_secs must be positive, got {}",
                self.step_secs
            )));
        }
        if self.step_secs > self.config.move_interval_secs {
            return Err(SimError::Config(format!(
                "step_secs {} exceeds the decision interval {}",
                self.step_secs, self.config.move_interval_secs
            )));
        }
        info!(seed = self.seed, step_secs = self.step_secs, objects = self.world.len(), "nav sim ready");
        Ok(NavSim {
            world:      self.world,
            queries:    self.queries,
            navigators: Vec::new(),
            slots:      FxHashMap::default(),
            config:     Arc::new(self.config),
            seed:       self.seed,
            step_secs:  self.step_secs,
        })
    }
}
