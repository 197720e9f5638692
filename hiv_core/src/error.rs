//! Error types for the HIV dynamics simulator.

use thiserror::Error;

/// Errors raised while validating parameters or exporting results.
///
/// The recurrence itself never fails; every variant here comes from the
/// edges of the system (parameter checks, preset lookup, file output).
#[derive(Debug, Error)]
pub enum SimError {
    /// The time horizon is shorter than a single step
    #[error("t_max must be at least 1, got {0}")]
    InvalidHorizon(i64),

    /// The time horizon exceeds the configured step limit
    #[error("t_max {requested} exceeds the limit of {limit} steps")]
    HorizonTooLarge { requested: i64, limit: u32 },

    /// The therapy release rate is NaN or infinite
    #[error("release_rate must be a finite number, got {0}")]
    NonFiniteRate(f64),

    /// A population left the range of finite numbers
    #[error("simulation overflowed at step {step}; shorten t_max or change the rates")]
    NonFiniteState { step: u32 },

    /// No preset with this name exists
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    /// Writing an export failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SimError {
    /// Returns true if the error was caused by caller-supplied input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidHorizon(_)
                | Self::HorizonTooLarge { .. }
                | Self::NonFiniteRate(_)
                | Self::NonFiniteState { .. }
                | Self::UnknownScenario(_)
        )
    }
}
