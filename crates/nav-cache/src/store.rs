//! Persisted surface blobs, one per region.
//!
//! The store knows nothing about the blob format; the engine's codec owns
//! it.  A blob that fails to decode is handled by the service (rebuild and
//! overwrite), so stores only report I/O.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use nav_core::RegionKey;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

pub trait SurfaceStore: Send + Sync {
    /// `Ok(None)` when nothing is stored for `region`.
    fn load(&self, region: RegionKey) -> io::Result<Option<Vec<u8>>>;

    /// Replace whatever is stored for `region`.  Readers never observe a
    /// partially written blob.
    fn save(&self, region: RegionKey, bytes: &[u8]) -> io::Result<()>;

    /// Missing entries are not an error.
    fn remove(&self, region: RegionKey) -> io::Result<()>;
}

// ── FileSurfaceStore ──────────────────────────────────────────────────────────

/// One `{region:08X}.mesh` file per region in a directory.
#[derive(Clone, Debug)]
pub struct FileSurfaceStore {
    dir: PathBuf,
}

impl FileSurfaceStore {
    /// Open (creating if needed) the surface directory.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, region: RegionKey) -> PathBuf {
        self.dir.join(format!("{}.mesh", region.file_stem()))
    }
}

impl SurfaceStore for FileSurfaceStore {
    fn load(&self, region: RegionKey) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(region)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, region: RegionKey, bytes: &[u8]) -> io::Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(region)).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, region: RegionKey) -> io::Result<()> {
        match fs::remove_file(self.path_for(region)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

// ── MemorySurfaceStore ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemorySurfaceStore {
    blobs: Mutex<FxHashMap<RegionKey, Vec<u8>>>,
}

impl MemorySurfaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a blob directly, e.g. to plant a corrupt file in tests.
    pub fn put(&self, region: RegionKey, bytes: Vec<u8>) {
        self.blobs.lock().insert(region, bytes);
    }

    pub fn contains(&self, region: RegionKey) -> bool {
        self.blobs.lock().contains_key(&region)
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.lock().is_empty()
    }
}

impl SurfaceStore for MemorySurfaceStore {
    fn load(&self, region: RegionKey) -> io::Result<Option<Vec<u8>>> {
        Ok(self.blobs.lock().get(&region).cloned())
    }

    fn save(&self, region: RegionKey, bytes: &[u8]) -> io::Result<()> {
        self.blobs.lock().insert(region, bytes.to_vec());
        Ok(())
    }

    fn remove(&self, region: RegionKey) -> io::Result<()> {
        self.blobs.lock().remove(&region);
        Ok(())
    }
}

// ── NullSurfaceStore ──────────────────────────────────────────────────────────

/// Persists nothing; every acquisition builds.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSurfaceStore;

impl SurfaceStore for NullSurfaceStore {
    fn load(&self, _region: RegionKey) -> io::Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn save(&self, _region: RegionKey, _bytes: &[u8]) -> io::Result<()> {
        Ok(())
    }

    fn remove(&self, _region: RegionKey) -> io::Result<()> {
        Ok(())
    }
}
