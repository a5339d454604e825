//! Error types
//!
//! Navigation entry points never return errors; they degrade locally.
//! [`ContractViolation`] records programmer errors (ordering bugs, missing
//! containers) so they are logged and observable from tests instead of
//! crashing. [`CoordinationError`] covers the fallible edges around the core:
//! configuration loading and the event bus.

use thiserror::Error;
use tracing::Level;

use crate::slots::ContentKey;

/// Result type alias for fallible coordination operations
pub type CoordinationResult<T> = Result<T, CoordinationError>;

/// Errors at the edges of the coordination core
#[derive(Error, Debug)]
pub enum CoordinationError {
    /// Configuration TOML could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] toml::de::Error),

    /// A configuration value is out of range
    #[error("Invalid configuration value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Event could not be broadcast
    #[error("Failed to publish event: {0}")]
    PublishFailed(String),
}

/// A contract violation by a caller of the coordination core.
///
/// These are programmer errors. They are logged with diagnostic context and
/// the call degrades to a safe no-op (or lazy construction).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// The current presenter was requested before `show_app_ui` ran.
    #[error("presenter requested before the app UI was shown")]
    PresenterNotBuilt,

    /// A detail push was requested but no content is live in the columns.
    #[error("no active detail container for {operation}")]
    MissingDetailContainer { operation: String },

    /// A live content key has no retained entry in the registry.
    #[error("content entry missing for {key:?}")]
    MissingContent { key: ContentKey },
}

impl ContractViolation {
    /// Level the violation is logged at. An early presenter request is
    /// served by building lazily, so it only warns.
    pub fn level(&self) -> Level {
        match self {
            Self::PresenterNotBuilt => Level::WARN,
            Self::MissingDetailContainer { .. } | Self::MissingContent { .. } => Level::ERROR,
        }
    }
}

/// Log a contract violation and record it in `sink`.
pub(crate) fn report(sink: &mut Vec<ContractViolation>, violation: ContractViolation) {
    if violation.level() == Level::WARN {
        tracing::warn!(violation = %violation, "Contract violation");
    } else {
        tracing::error!(violation = %violation, "Contract violation");
    }
    sink.push(violation);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_early_presenter_request_only_warns() {
        assert_eq!(ContractViolation::PresenterNotBuilt.level(), Level::WARN);
        assert_eq!(
            ContractViolation::MissingDetailContainer {
                operation: "push_screen".into()
            }
            .level(),
            Level::ERROR
        );
    }

    #[test]
    fn test_report_records_violation() {
        let mut sink = Vec::new();
        report(&mut sink, ContractViolation::PresenterNotBuilt);
        assert_eq!(sink, vec![ContractViolation::PresenterNotBuilt]);
    }
}
