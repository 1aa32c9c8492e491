//! The navigable-surface cache and query service.
//!
//! # Slot lifecycle
//!
//! ```text
//! absent ──first reference──▶ Pending(gen) ──acquire ok──▶ Ready(surface)
//!                                  │
//!                                  └──────acquire failed──▶ Unavailable
//! any ──invalidate──▶ absent
//! ```
//!
//! The `Pending` placeholder is inserted through the map's entry API, so of
//! any number of concurrent first references exactly one wins and spawns the
//! acquisition.  The map guard is released before the job is handed to the
//! executor.  A finished acquisition installs its result only if the slot is
//! still `Pending` with the job's own generation; anything else means the
//! region was invalidated meanwhile and the result is dropped.
//!
//! Queries take an `Arc` of a `Ready` surface and run without any lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use nav_core::{Position, RegionKey, Vec3};
use nav_surface::geometry::{from_engine, to_engine};
use nav_surface::{BuildSettings, QueryFilter, SurfaceEngine, SurfacePoint};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::executor::{BuildExecutor, RayonExecutor};
use crate::provider::GeometryProvider;
use crate::store::{NullSurfaceStore, SurfaceStore};
use crate::{AcquireError, AcquireResult, Route};

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Search box half size used to snap query points onto the surface,
    /// world axes.
    pub half_extents:   Vec3,
    /// Profile every region is built with.
    pub build_settings: BuildSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            half_extents:   Vec3::new(1.25, 1.25, 1.25),
            build_settings: BuildSettings::default(),
        }
    }
}

// ── Status / stats ────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SurfaceStatus {
    Absent,
    Pending,
    Ready,
    Unavailable,
}

/// Counters since construction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceStats {
    /// Acquisition jobs spawned.
    pub acquisitions:     u64,
    /// Surfaces built from geometry.
    pub builds:           u64,
    /// Surfaces decoded from the store.
    pub loads:            u64,
    /// Persisted blobs that failed to decode.
    pub corrupt:          u64,
    /// Acquisitions that left the region unavailable.
    pub failures:         u64,
    /// Built surfaces that could not be written to the store.
    pub persist_failures: u64,
    /// Acquisitions dropped before any work because the region was
    /// invalidated after they were queued.
    pub superseded:       u64,
}

#[derive(Default)]
struct Counters {
    acquisitions:     AtomicU64,
    builds:           AtomicU64,
    loads:            AtomicU64,
    corrupt:          AtomicU64,
    failures:         AtomicU64,
    persist_failures: AtomicU64,
    superseded:       AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ServiceStats {
        ServiceStats {
            acquisitions:     self.acquisitions.load(Ordering::Relaxed),
            builds:           self.builds.load(Ordering::Relaxed),
            loads:            self.loads.load(Ordering::Relaxed),
            corrupt:          self.corrupt.load(Ordering::Relaxed),
            failures:         self.failures.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
            superseded:       self.superseded.load(Ordering::Relaxed),
        }
    }
}

// ── Slots ─────────────────────────────────────────────────────────────────────

enum Slot<S> {
    Pending { generation: u64 },
    Ready(Arc<S>),
    Unavailable,
}

impl<S> Slot<S> {
    fn status(&self) -> SurfaceStatus {
        match self {
            Slot::Pending { .. } => SurfaceStatus::Pending,
            Slot::Ready(_) => SurfaceStatus::Ready,
            Slot::Unavailable => SurfaceStatus::Unavailable,
        }
    }

    fn ready(&self) -> Option<Arc<S>> {
        match self {
            Slot::Ready(s) => Some(Arc::clone(s)),
            _ => None,
        }
    }
}

struct Inner<E: SurfaceEngine> {
    engine:     E,
    provider:   Arc<dyn GeometryProvider>,
    store:      Arc<dyn SurfaceStore>,
    executor:   Arc<dyn BuildExecutor>,
    config:     ServiceConfig,
    slots:      DashMap<RegionKey, Slot<E::Surface>>,
    generation: AtomicU64,
    counters:   Counters,
}

// ── SurfaceService ────────────────────────────────────────────────────────────

/// Shared handle to the cache.  Clones refer to the same cache.
pub struct SurfaceService<E: SurfaceEngine> {
    inner: Arc<Inner<E>>,
}

impl<E: SurfaceEngine> Clone for SurfaceService<E> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<E: SurfaceEngine> SurfaceService<E> {
    pub fn builder(engine: E, provider: Arc<dyn GeometryProvider>) -> SurfaceServiceBuilder<E> {
        SurfaceServiceBuilder::new(engine, provider)
    }

    pub fn engine(&self) -> &E {
        &self.inner.engine
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    pub fn stats(&self) -> ServiceStats {
        self.inner.counters.snapshot()
    }

    pub fn status(&self, region: RegionKey) -> SurfaceStatus {
        self.inner
            .slots
            .get(&region)
            .map_or(SurfaceStatus::Absent, |slot| slot.status())
    }

    /// The ready surface, without triggering acquisition.
    pub fn ready_surface(&self, region: RegionKey) -> Option<Arc<E::Surface>> {
        self.inner.slots.get(&region).and_then(|slot| slot.ready())
    }

    /// Start acquiring `region` if nothing is cached for it yet.
    pub fn prefetch(&self, region: RegionKey) {
        let _ = self.ensure(region);
    }

    /// Forget `region` so the next reference acquires it again.  With
    /// `purge_store` the persisted blob is deleted too, forcing a rebuild.
    ///
    /// A queued acquisition for the old slot is dropped when it starts.  One
    /// already past that point runs to completion next to the new one and
    /// its result is discarded on install.
    pub fn invalidate(&self, region: RegionKey, purge_store: bool) {
        self.inner.slots.remove(&region);
        if purge_store {
            if let Err(e) = self.inner.store.remove(region) {
                warn!(%region, error = %e, "failed to remove persisted surface");
            }
        }
        debug!(%region, purge_store, "surface invalidated");
    }

    /// Poll until `region` is no longer pending or `timeout` passes.  For
    /// startup and tooling; never call from an agent tick.
    pub fn wait_settled(&self, region: RegionKey, timeout: Duration) -> SurfaceStatus {
        let deadline = Instant::now() + timeout;
        loop {
            let status = self.status(region);
            if status != SurfaceStatus::Pending || Instant::now() >= deadline {
                return status;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Ready surface for `region`, or `None` after making sure an
    /// acquisition is under way (or has already failed).
    fn ensure(&self, region: RegionKey) -> Option<Arc<E::Surface>> {
        if let Some(slot) = self.inner.slots.get(&region) {
            return slot.ready();
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        match self.inner.slots.entry(region) {
            Entry::Occupied(slot) => return slot.get().ready(),
            Entry::Vacant(slot) => {
                slot.insert(Slot::Pending { generation });
            }
        }

        Counters::bump(&self.inner.counters.acquisitions);
        debug!(%region, generation, "surface acquisition queued");
        let inner = Arc::clone(&self.inner);
        self.inner
            .executor
            .spawn(Box::new(move || inner.acquire(region, generation)));
        None
    }

    fn snap(&self, surface: &E::Surface, p: &Position) -> Option<SurfacePoint> {
        self.inner.engine.find_nearest_point(
            surface,
            to_engine(p.pos),
            to_engine(self.inner.config.half_extents),
            &QueryFilter::default(),
        )
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Waypoints from `start` to `end`, each carrying `start`'s cell.
    ///
    /// `None` when the points are in different regions (the surface is not
    /// even looked up), when the region's surface is not ready, or when
    /// either end is off the surface or unreachable.
    pub fn find_route(&self, start: &Position, end: &Position) -> Option<Route> {
        let region = start.region();
        if region != end.region() {
            debug!(from = %region, to = %end.region(), "route request crosses regions");
            return None;
        }
        let surface = self.ensure(region)?;
        let a = self.snap(&surface, start)?;
        let b = self.snap(&surface, end)?;
        let points = self
            .inner
            .engine
            .find_straight_route(&surface, a, b, &QueryFilter::default())?;
        Some(Route::new(
            points
                .into_iter()
                .map(|p| start.moved_to(from_engine(p)))
                .collect(),
        ))
    }

    /// A random point on `start`'s region surface; with `max_distance`, one
    /// reachable from `start` within that distance (no unbounded fallback).
    pub fn random_point(
        &self,
        start:        &Position,
        max_distance: Option<f32>,
        rng:          &mut dyn RngCore,
    ) -> Option<Position> {
        let surface = self.ensure(start.region())?;
        let engine = &self.inner.engine;
        let filter = QueryFilter::default();
        let point = match max_distance {
            Some(d) => {
                let origin = self.snap(&surface, start)?;
                engine.find_random_point_within(&surface, origin, d, &filter, rng)?
            }
            None => engine.find_random_point(&surface, &filter, rng)?,
        };
        Some(start.moved_to(from_engine(point.pos)))
    }
}

// ── Acquisition ───────────────────────────────────────────────────────────────

impl<E: SurfaceEngine> Inner<E> {
    fn acquire(&self, region: RegionKey, generation: u64) {
        if !self.is_current(region, generation) {
            Counters::bump(&self.counters.superseded);
            debug!(%region, generation, "superseded acquisition skipped");
            return;
        }
        let started = Instant::now();
        let slot = match self.load_or_build(region) {
            Ok(surface) => {
                info!(%region, elapsed_ms = started.elapsed().as_millis() as u64, "surface ready");
                Slot::Ready(Arc::new(surface))
            }
            Err(e) => {
                Counters::bump(&self.counters.failures);
                warn!(%region, error = %e, "surface unavailable");
                Slot::Unavailable
            }
        };
        self.install(region, generation, slot);
    }

    fn load_or_build(&self, region: RegionKey) -> AcquireResult<E::Surface> {
        let geometry = self
            .provider
            .geometry(region)
            .ok_or(AcquireError::NoGeometry(region))?;

        match self.store.load(region) {
            Ok(Some(bytes)) => match self.engine.deserialize(&bytes) {
                Ok(surface) => {
                    Counters::bump(&self.counters.loads);
                    debug!(%region, bytes = bytes.len(), "surface loaded from store");
                    return Ok(surface);
                }
                Err(e) => {
                    Counters::bump(&self.counters.corrupt);
                    warn!(%region, error = %e, "persisted surface unreadable, rebuilding");
                }
            },
            Ok(None) => {}
            Err(e) => warn!(%region, error = %e, "surface store read failed, rebuilding"),
        }

        geometry.validate()?;
        let surface = self
            .engine
            .build(&geometry.to_engine(), &self.config.build_settings)?;
        Counters::bump(&self.counters.builds);

        if let Err(e) = self.persist(region, &surface) {
            Counters::bump(&self.counters.persist_failures);
            warn!(%region, error = %e, "failed to persist surface");
        }
        Ok(surface)
    }

    fn persist(&self, region: RegionKey, surface: &E::Surface) -> AcquireResult<()> {
        let bytes = self.engine.serialize(surface)?;
        self.store.save(region, &bytes)?;
        debug!(%region, bytes = bytes.len(), "surface persisted");
        Ok(())
    }

    fn is_current(&self, region: RegionKey, generation: u64) -> bool {
        self.slots
            .get(&region)
            .is_some_and(|slot| matches!(*slot, Slot::Pending { generation: g } if g == generation))
    }

    fn install(&self, region: RegionKey, generation: u64, slot: Slot<E::Surface>) {
        match self.slots.get_mut(&region) {
            Some(mut current) if matches!(*current, Slot::Pending { generation: g } if g == generation) => {
                *current = slot;
            }
            _ => debug!(%region, generation, "stale acquisition discarded"),
        }
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Fluent builder for [`SurfaceService`].
///
/// | Method        | Default                    |
/// |---------------|----------------------------|
/// | `.store(s)`   | [`NullSurfaceStore`]       |
/// | `.executor(x)`| [`RayonExecutor::global`]  |
/// | `.config(c)`  | [`ServiceConfig::default`] |
pub struct SurfaceServiceBuilder<E: SurfaceEngine> {
    engine:   E,
    provider: Arc<dyn GeometryProvider>,
    store:    Option<Arc<dyn SurfaceStore>>,
    executor: Option<Arc<dyn BuildExecutor>>,
    config:   ServiceConfig,
}

impl<E: SurfaceEngine> SurfaceServiceBuilder<E> {
    pub fn new(engine: E, provider: Arc<dyn GeometryProvider>) -> Self {
        Self {
            engine,
            provider,
            store:    None,
            executor: None,
            config:   ServiceConfig::default(),
        }
    }

    pub fn store(mut self, store: Arc<dyn SurfaceStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn BuildExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> AcquireResult<SurfaceService<E>> {
        self.config.build_settings.validate()?;
        info!(
            cell_size = self.config.build_settings.cell_size,
            agent_radius = self.config.build_settings.agent_radius,
            "surface service initialised"
        );
        Ok(SurfaceService {
            inner: Arc::new(Inner {
                engine:     self.engine,
                provider:   self.provider,
                store:      self.store.unwrap_or_else(|| Arc::new(NullSurfaceStore)),
                executor:   self.executor.unwrap_or_else(|| Arc::new(RayonExecutor::global())),
                config:     self.config,
                slots:      DashMap::new(),
                generation: AtomicU64::new(0),
                counters:   Counters::default(),
            }),
        })
    }
}
