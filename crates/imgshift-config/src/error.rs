//! Error types for configuration resolution.

use thiserror::Error;

/// Primary error type for configuration problems. Every variant is fatal for a run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required field was not supplied.
    #[error("missing configuration field")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
        /// Environment variable that would supply it.
        env: &'static str,
    },
    /// A field still carries its placeholder value.
    #[error("configuration field still holds a placeholder")]
    Placeholder {
        /// Name of the unconfigured field.
        field: &'static str,
        /// Placeholder value found.
        value: String,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

impl ConfigError {
    /// Operator-facing one-line description including the offending field.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::MissingField { field, env } => {
                format!("{field} is not configured (set {env} or pass the matching flag)")
            }
            Self::Placeholder { field, value } if value.is_empty() => {
                format!("{field} is not configured")
            }
            Self::Placeholder { field, value } => {
                format!("{field} is still set to the placeholder '{value}'")
            }
            Self::InvalidField {
                field,
                value: Some(value),
                reason,
            } => format!("{field} '{value}' is invalid: {reason}"),
            Self::InvalidField {
                field,
                value: None,
                reason,
            } => format!("{field} is invalid: {reason}"),
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_names_field_and_reason() {
        let err = ConfigError::InvalidField {
            field: "batch_size",
            value: Some("0".into()),
            reason: "must be greater than zero",
        };
        assert_eq!(
            err.describe(),
            "batch_size '0' is invalid: must be greater than zero"
        );
        let missing = ConfigError::MissingField {
            field: "upload_preset",
            env: "IMGSHIFT_UPLOAD_PRESET",
        };
        assert!(missing.describe().contains("IMGSHIFT_UPLOAD_PRESET"));
        let unset = ConfigError::Placeholder {
            field: "cloud_name",
            value: String::new(),
        };
        assert_eq!(unset.describe(), "cloud_name is not configured");
    }
}
