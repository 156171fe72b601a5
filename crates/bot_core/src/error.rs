//! Error types for the decision core.
//!
//! Only configuration problems are errors. Everything that can go wrong while
//! playing (unaffordable step, busy producer, no placement) is a
//! [`SkipReason`](crate::dispatch::SkipReason) and is retried next tick.

use thiserror::Error;

/// Result type alias using [`BotError`].
pub type Result<T> = std::result::Result<T, BotError>;

/// Top-level error type for startup-time configuration faults.
#[derive(Debug, Error)]
pub enum BotError {
    /// A build ladder was configured without any steps.
    #[error("Build ladder '{0}' has no steps")]
    EmptyLadder(String),

    /// A composition ratio is negative or not a finite number.
    #[error("Invalid composition ratio for {unit}: {ratio}")]
    InvalidRatio {
        /// Tracked unit type name.
        unit: String,
        /// Offending ratio.
        ratio: f64,
    },

    /// Composition ratios add up to more than the whole army.
    #[error("Composition ratios sum to {0}, must be at most 1.0")]
    RatioSumExceeded(f64),

    /// A tracked or reserved unit type has no producer in the catalog.
    #[error("Unit {0} has no producer in the catalog")]
    MissingProducer(String),

    /// A configuration value is outside its legal range.
    #[error("Invalid configuration value for {field}: {message}")]
    InvalidValue {
        /// Name of the configuration field.
        field: &'static str,
        /// Why it was rejected.
        message: String,
    },

    /// Configuration source could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Error type for loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Failed to write RON.
    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] ron::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts_into_bot_error() {
        let err: BotError = ConfigError::FileNotFound("missing.ron".into()).into();
        assert!(matches!(err, BotError::Config(_)));
        assert_eq!(err.to_string(), "Configuration file not found: missing.ron");
    }

    #[test]
    fn test_ratio_error_message() {
        let err = BotError::InvalidRatio {
            unit: "Zealot".into(),
            ratio: -0.5,
        };
        assert_eq!(err.to_string(), "Invalid composition ratio for Zealot: -0.5");
    }
}
