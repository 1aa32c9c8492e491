use nav_core::RegionKey;
use nav_surface::SurfaceError;
use thiserror::Error;

/// Why a region's surface could not be acquired or persisted.  Logged and
/// counted, never surfaced to navigators.  Acquisition failures mark the
/// region unavailable; a failed save only costs the next process a rebuild.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("no geometry for region {0}")]
    NoGeometry(RegionKey),

    #[error("surface engine: {0}")]
    Surface(#[from] SurfaceError),

    #[error("surface store: {0}")]
    Store(#[from] std::io::Error),
}

pub type AcquireResult<T> = Result<T, AcquireError>;
