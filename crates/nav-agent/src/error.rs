use nav_core::{NavError, ObjectId};
use thiserror::Error;

use crate::{NavIntent, NavStatus};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent {agent} cannot start {requested:?} while {status:?} ({current:?})")]
    InvalidTransition {
        agent:     ObjectId,
        requested: NavIntent,
        current:   NavIntent,
        status:    NavStatus,
    },

    #[error(transparent)]
    Nav(#[from] NavError),
}

pub type AgentResult<T> = Result<T, AgentError>;
