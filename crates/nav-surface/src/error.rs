use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("geometry has no walkable triangles after filtering")]
    NoWalkableSurface,

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid build settings: {0}")]
    InvalidSettings(String),

    #[error("corrupt surface data: {0}")]
    Corrupt(String),

    #[error("surface format version {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("surface encoding failed: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SurfaceResult<T> = Result<T, SurfaceError>;
