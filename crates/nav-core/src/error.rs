//! Base error type.
//!
//! Sub-crates keep their own enums (`SurfaceError`, `AcquireError`,
//! `AgentError`, `SimError`) and wrap `NavError` as one variant where they
//! need it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for the `nav-*` crates.
pub type NavResult<T> = Result<T, NavError>;
