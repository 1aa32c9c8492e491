//! Region geometry sources.

use std::sync::Arc;

use nav_core::RegionKey;
use nav_surface::RegionGeometry;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Supplies the raw walkable geometry of a region, or `None` when the region
/// has none (open ocean, unloaded dungeon).  Called from build workers.
pub trait GeometryProvider: Send + Sync {
    fn geometry(&self, region: RegionKey) -> Option<RegionGeometry>;
}

impl<F> GeometryProvider for F
where
    F: Fn(RegionKey) -> Option<RegionGeometry> + Send + Sync,
{
    fn geometry(&self, region: RegionKey) -> Option<RegionGeometry> {
        self(region)
    }
}

/// In-memory provider, filled up front by the application or a test.
#[derive(Default)]
pub struct StaticGeometry {
    regions: RwLock<FxHashMap<RegionKey, Arc<RegionGeometry>>>,
}

impl StaticGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, region: RegionKey, geometry: RegionGeometry) -> Self {
        self.insert(region, geometry);
        self
    }

    pub fn insert(&self, region: RegionKey, geometry: RegionGeometry) {
        self.regions.write().insert(region, Arc::new(geometry));
    }

    pub fn remove(&self, region: RegionKey) -> bool {
        self.regions.write().remove(&region).is_some()
    }

    pub fn len(&self) -> usize {
        self.regions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.read().is_empty()
    }
}

impl GeometryProvider for StaticGeometry {
    fn geometry(&self, region: RegionKey) -> Option<RegionGeometry> {
        self.regions.read().get(&region).map(|g| RegionGeometry::clone(g))
    }
}
