use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Precondition failures raised while driving a [`crate::agent::ForagingAgent`].
///
/// None of these are recoverable inside an episode; the host is expected to
/// fix its wiring and begin a new one.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AgentError {
    #[error("environment has no dependent entity to feed")]
    MissingDependent,

    #[error("episode has not begun; call on_episode_begin first")]
    EpisodeNotStarted,

    #[error("action vector needs {expected} values, got {got}")]
    ActionArity { expected: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parsing config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum DemoError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("not a demonstration file (bad magic)")]
    BadMagic,

    #[error("unsupported demonstration version {0}")]
    UnsupportedVersion(u32),

    #[error("corrupt demonstration: {0}")]
    Corrupt(String),

    #[error("demonstration metadata: {0}")]
    Meta(#[from] serde_json::Error),
}
