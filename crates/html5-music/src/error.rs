use crate::config::ConfigError;
use crate::events::EventError;

/// Error type for mounting and running a player widget.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error("audio analysis unavailable: {0}")]
    AnalysisUnavailable(String),

    #[error("page integration failed: {0}")]
    Dom(String),
}
