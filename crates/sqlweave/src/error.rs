//! Error types for sqlweave

use std::time::Duration;
use thiserror::Error;

/// Result type alias for sqlweave operations
pub type WeaveResult<T> = Result<T, WeaveError>;

/// Error types for query assembly and execution.
///
/// Builder-side errors (see [`WeaveError::is_validation`]) are raised before anything
/// reaches an executor and are never worth retrying: fix the call sequence instead.
#[derive(Debug, Error)]
pub enum WeaveError {
    /// Operator token outside the closed vocabulary
    #[error("Invalid operator: '{0}'")]
    InvalidOperator(String),

    /// Value not accepted by the operator (e.g. `null` with anything but "true"/"false")
    #[error("Invalid value '{value}' for operator '{operator}'")]
    InvalidValue { operator: String, value: String },

    /// Aggregate function outside the closed vocabulary
    #[error("Invalid aggregate function: '{0}'")]
    InvalidAggregate(String),

    /// `end_group` without a matching `start_group`, or groups left open at render time
    #[error("Unbalanced condition groups: {0}")]
    UnbalancedGroup(String),

    /// A group was closed without any condition inside it
    #[error("Empty condition group")]
    EmptyGroup,

    /// The query has no table
    #[error("No table set for query")]
    MissingTable,

    /// Identifier, alias or other builder input rejected
    #[error("Validation error: {0}")]
    Validation(String),

    /// Failure reported by an executor
    #[error("Execution error: {0}")]
    Execution(String),

    /// Driver error, passed through unmodified
    #[cfg(feature = "mysql")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Named connection missing from a registry
    #[error("Unknown connection: '{0}'")]
    UnknownConnection(String),

    /// Configuration could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),
}

impl WeaveError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid value error
    pub fn invalid_value(operator: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// Check if this error was raised by a builder before execution.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidOperator(_)
                | Self::InvalidValue { .. }
                | Self::InvalidAggregate(_)
                | Self::UnbalancedGroup(_)
                | Self::EmptyGroup
                | Self::MissingTable
                | Self::Validation(_)
        )
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl Clone for WeaveError {
    fn clone(&self) -> Self {
        match self {
            Self::InvalidOperator(s) => Self::InvalidOperator(s.clone()),
            Self::InvalidValue { operator, value } => Self::InvalidValue {
                operator: operator.clone(),
                value: value.clone(),
            },
            Self::InvalidAggregate(s) => Self::InvalidAggregate(s.clone()),
            Self::UnbalancedGroup(s) => Self::UnbalancedGroup(s.clone()),
            Self::EmptyGroup => Self::EmptyGroup,
            Self::MissingTable => Self::MissingTable,
            Self::Validation(s) => Self::Validation(s.clone()),
            Self::Execution(s) => Self::Execution(s.clone()),
            // sqlx::Error is not Clone; keep the message.
            #[cfg(feature = "mysql")]
            Self::Database(e) => Self::Execution(e.to_string()),
            Self::Timeout(d) => Self::Timeout(*d),
            Self::Decode { column, message } => Self::Decode {
                column: column.clone(),
                message: message.clone(),
            },
            Self::UnknownConnection(s) => Self::UnknownConnection(s.clone()),
            Self::Config(s) => Self::Config(s.clone()),
        }
    }
}

impl From<toml::de::Error> for WeaveError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_class() {
        assert!(WeaveError::InvalidOperator("xx".into()).is_validation());
        assert!(WeaveError::EmptyGroup.is_validation());
        assert!(WeaveError::MissingTable.is_validation());
        assert!(!WeaveError::Execution("boom".into()).is_validation());
        assert!(!WeaveError::Timeout(Duration::from_secs(1)).is_validation());
    }

    #[test]
    fn display_messages() {
        let err = WeaveError::invalid_value("null", "maybe");
        assert_eq!(err.to_string(), "Invalid value 'maybe' for operator 'null'");
    }
}
