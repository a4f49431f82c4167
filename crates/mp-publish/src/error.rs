//! Error types for the publish workflow

use std::fmt;

use mp_graph::GraphError;
use thiserror::Error;

/// Publish-type call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    Feed,
    Photo,
    MediaContainer,
    MediaPublish,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feed => write!(f, "FB text post"),
            Self::Photo => write!(f, "FB photo post"),
            Self::MediaContainer => write!(f, "IG container create"),
            Self::MediaPublish => write!(f, "IG publish"),
        }
    }
}

/// Workflow error, classified by the step it came from
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Raised before any network call
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to get Page token")]
    Authentication(#[source] GraphError),

    #[error("Failed to get IG account from Page")]
    Lookup(#[source] GraphError),

    #[error("{step} failed")]
    Publish {
        step: PublishStep,
        #[source]
        source: GraphError,
    },
}

impl WorkflowError {
    pub(crate) fn publish(step: PublishStep) -> impl FnOnce(GraphError) -> Self {
        move |source| Self::Publish { step, source }
    }
}

impl From<mp_core::Error> for WorkflowError {
    fn from(err: mp_core::Error) -> Self {
        match err {
            mp_core::Error::Config(message) => WorkflowError::Configuration(message),
            other => WorkflowError::Configuration(other.to_string()),
        }
    }
}


/// Result type alias
pub type Result<T> = std::result::Result<T, WorkflowError>;
