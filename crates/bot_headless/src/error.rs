//! Error type for the headless runner.

use bot_core::error::{BotError, ConfigError};
use thiserror::Error;

/// Anything that stops a run before or after the tick loop.
#[derive(Debug, Error)]
pub enum HeadlessError {
    /// The strategy file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The strategy did not validate.
    #[error("Invalid strategy: {0}")]
    Bot(#[from] BotError),

    /// Results could not be written.
    #[error("Failed to write results: {0}")]
    Io(#[from] std::io::Error),

    /// Results could not be encoded.
    #[error("Failed to encode results: {0}")]
    Json(#[from] serde_json::Error),
}
