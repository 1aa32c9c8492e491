use nav_agent::AgentError;
use nav_core::{NavError, ObjectId};
use thiserror::Error;

use crate::AgentSlot;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("object {0} does not exist")]
    UnknownObject(ObjectId),

    #[error("object {0} already has a navigator")]
    DuplicateNavigator(ObjectId),

    #[error("no navigator in slot {0:?}")]
    UnknownSlot(AgentSlot),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Nav(#[from] NavError),
}

pub type SimResult<T> = Result<T, SimError>;
