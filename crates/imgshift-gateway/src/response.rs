//! Upload response decoding.

use imgshift_core::{GatewayError, GatewayResult, UploadResult};
use serde::Deserialize;
use thiserror::Error;

/// Body of an upload response: an embedded error wins over everything else.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum UploadReply {
    Failure { error: ErrorObject },
    Success(UploadedAsset),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorObject {
    message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadedAsset {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    format: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    bytes: u64,
}

#[derive(Debug, Error)]
#[error("upload succeeded with unexpected status")]
struct UnexpectedStatus;

impl UploadReply {
    /// Decode a response body.
    pub(crate) fn parse(status: u16, body: &[u8]) -> GatewayResult<Self> {
        serde_json::from_slice(body).map_err(|source| GatewayError::MalformedResponse {
            status,
            source: Box::new(source),
        })
    }

    /// Project the reply onto the gateway contract.
    pub(crate) fn into_result(self, status: u16) -> GatewayResult<UploadResult> {
        match self {
            Self::Failure { error } => Err(GatewayError::Rejected {
                status,
                message: error.message,
            }),
            Self::Success(_) if !(200..300).contains(&status) => {
                Err(GatewayError::MalformedResponse {
                    status,
                    source: Box::new(UnexpectedStatus),
                })
            }
            Self::Success(asset) => Ok(UploadResult {
                url: asset.secure_url,
                public_id: asset.public_id,
                format: asset.format,
                width: asset.width,
                height: asset.height,
                bytes: asset.bytes,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_error_is_rejected_even_on_success_status() -> GatewayResult<()> {
        let reply = UploadReply::parse(
            200,
            br#"{"error":{"message":"Upload preset not found"},"secure_url":"x"}"#,
        )?;
        match reply.into_result(200) {
            Err(GatewayError::Rejected { status, message }) => {
                assert_eq!(status, 200);
                assert_eq!(message, "Upload preset not found");
            }
            other => panic!("unexpected reply: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn success_body_projects_asset_metadata() -> GatewayResult<()> {
        let reply = UploadReply::parse(
            200,
            br#"{"secure_url":"https://res.cloudinary.com/demo/image/upload/v1/products/product-1.png",
                "public_id":"products/product-1","format":"png","width":64,"height":32,"bytes":2048,
                "resource_type":"image"}"#,
        )?;
        let result = reply.into_result(200)?;
        assert_eq!(result.public_id, "products/product-1");
        assert_eq!((result.width, result.height, result.bytes), (64, 32, 2048));
        Ok(())
    }

    #[test]
    fn missing_url_is_malformed() {
        let parsed = UploadReply::parse(200, br#"{"public_id":"products/product-1"}"#);
        assert!(matches!(
            parsed,
            Err(GatewayError::MalformedResponse { status: 200, .. })
        ));
    }
}
