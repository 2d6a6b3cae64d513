//! Error types for the migration core.
//!
//! # Design
//! - Collaborator errors (`StoreError`, `GatewayError`) are transport-neutral so adapters
//!   can box their client errors as sources.
//! - `RecordError` attributes a per-record failure to the stage that produced it.
//! - Only `MigrationError` aborts a run.

use std::error::Error;

use thiserror::Error;

use crate::model::RecordStage;

/// Boxed error used to carry adapter-specific sources.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Failures while turning an inline payload into binary image data.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload carried no data after stripping the prefix and whitespace.
    #[error("inline payload is empty")]
    EmptyPayload,
    /// Payload body was not valid base64.
    #[error("inline payload is not valid base64")]
    InvalidBase64 {
        /// Underlying base64 error.
        source: base64::DecodeError,
    },
}

/// Failures reported by the upload gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request could not be delivered or the response could not be read.
    #[error("upload request failed")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying client error.
        #[source]
        source: BoxError,
    },
    /// The gateway answered with an embedded error object or a failure status.
    #[error("upload rejected by gateway (status {status}): {message}")]
    Rejected {
        /// HTTP status code of the response.
        status: u16,
        /// Message reported by the gateway.
        message: String,
    },
    /// The response body did not match the expected upload result shape.
    #[error("upload response could not be decoded (status {status})")]
    MalformedResponse {
        /// HTTP status code of the response.
        status: u16,
        /// Underlying decoding error.
        #[source]
        source: BoxError,
    },
}

/// Convenience alias for gateway results.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures reported by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request could not be built or delivered.
    #[error("record store request failed")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying client error.
        #[source]
        source: BoxError,
    },
    /// The store answered with a non-success status.
    #[error("record store returned status {status}: {message}")]
    Status {
        /// Operation identifier.
        operation: &'static str,
        /// HTTP status code returned by the store.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },
    /// An update filter matched no row, so nothing was written.
    #[error("record {id} matched no row")]
    NoMatch {
        /// Operation identifier.
        operation: &'static str,
        /// Record id used as the filter.
        id: String,
    },
    /// The store response could not be decoded into records.
    #[error("record store response could not be decoded")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying decoding error.
        #[source]
        source: BoxError,
    },
}

/// Convenience alias for record store results.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure that ends processing of a single record without aborting the run.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The record could not be re-read from the store.
    #[error("record fetch failed")]
    Fetch {
        /// Underlying store error.
        source: StoreError,
    },
    /// The record disappeared between listing and fetching.
    #[error("record no longer exists")]
    Missing,
    /// The inline payload could not be decoded.
    #[error("inline payload decode failed")]
    Decode {
        /// Underlying decode error.
        source: DecodeError,
    },
    /// The upload gateway failed.
    #[error("image upload failed")]
    Gateway {
        /// Underlying gateway error.
        source: GatewayError,
    },
    /// The store rejected the new URL after a successful upload.
    #[error("image url write-back failed; uploaded asset {public_id} has no record reference")]
    WriteBack {
        /// Public id of the asset left without a record reference.
        public_id: String,
        /// Underlying store error.
        source: StoreError,
    },
}

impl RecordError {
    /// Stage of the per-record pipeline that produced this error.
    #[must_use]
    pub const fn stage(&self) -> RecordStage {
        match self {
            Self::Fetch { .. } | Self::Missing => RecordStage::Fetch,
            Self::Decode { .. } => RecordStage::Decode,
            Self::Gateway { .. } => RecordStage::Upload,
            Self::WriteBack { .. } => RecordStage::WriteBack,
        }
    }
}

/// Fatal errors that abort a migration run.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Candidate records could not be listed.
    #[error("candidate listing failed")]
    Listing {
        /// Underlying store error.
        source: StoreError,
    },
}

/// Convenience alias for migration run results.
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Render an error and its source chain as a single line.
#[must_use]
pub fn error_chain(error: &(dyn Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut current = error.source();
    while let Some(source) = current {
        message.push_str(": ");
        message.push_str(&source.to_string());
        current = source.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn error_chain_joins_sources() {
        let err = RecordError::Gateway {
            source: GatewayError::Transport {
                operation: "gateway.upload",
                source: Box::new(io::Error::other("connection reset")),
            },
        };
        assert_eq!(
            error_chain(&err),
            "image upload failed: upload request failed: connection reset"
        );
    }

    #[test]
    fn record_errors_map_to_stages() {
        assert_eq!(RecordError::Missing.stage(), RecordStage::Fetch);
        assert_eq!(
            RecordError::Decode {
                source: DecodeError::EmptyPayload
            }
            .stage(),
            RecordStage::Decode
        );
        let write_back = RecordError::WriteBack {
            public_id: "product-7".into(),
            source: StoreError::Status {
                operation: "store.update_image",
                status: 409,
                message: "conflict".into(),
            },
        };
        assert_eq!(write_back.stage(), RecordStage::WriteBack);
        assert!(error_chain(&write_back).contains("product-7"));
        assert!(error_chain(&write_back).ends_with("record store returned status 409: conflict"));
    }
}
