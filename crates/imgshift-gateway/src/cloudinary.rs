//! Unsigned uploads to Cloudinary.
//!
//! # Design
//! - The preset and upload URL are fixed at construction; a request only carries the
//!   image, its folder and its public id.
//! - Uploads reuse the record's stable public id, so retries overwrite instead of
//!   duplicating assets.

use async_trait::async_trait;
use imgshift_core::{
    GatewayError, GatewayResult, UploadGateway, UploadRequest, UploadResult, extension_for_mime,
};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument};
use url::Url;

use crate::response::UploadReply;

const OPERATION: &str = "cloudinary.upload";

/// Upload gateway posting multipart forms to `.../v1_1/<cloud>/image/upload`.
#[derive(Clone)]
pub struct CloudinaryGateway {
    client: Client,
    upload_url: Url,
    upload_preset: String,
}

impl CloudinaryGateway {
    /// Build a gateway for an unsigned upload preset.
    #[must_use]
    pub fn new(client: Client, upload_url: Url, upload_preset: impl Into<String>) -> Self {
        Self {
            client,
            upload_url,
            upload_preset: upload_preset.into(),
        }
    }

    /// Endpoint receiving uploads.
    #[must_use]
    pub const fn upload_url(&self) -> &Url {
        &self.upload_url
    }

    fn form(&self, request: UploadRequest) -> GatewayResult<Form> {
        let file_name = file_name(&request);
        let file = Part::bytes(request.bytes)
            .file_name(file_name)
            .mime_str(&request.mime)
            .map_err(|source| GatewayError::Transport {
                operation: OPERATION,
                source: Box::new(source),
            })?;
        Ok(Form::new()
            .part("file", file)
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", request.folder)
            .text("public_id", request.public_id))
    }
}

fn file_name(request: &UploadRequest) -> String {
    format!("{}.{}", request.public_id, extension_for_mime(&request.mime))
}

#[async_trait]
impl UploadGateway for CloudinaryGateway {
    #[instrument(
        name = "cloudinary.upload",
        skip(self, request),
        fields(public_id = %request.public_id, bytes = request.bytes.len())
    )]
    async fn upload(&self, request: UploadRequest) -> GatewayResult<UploadResult> {
        let form = self.form(request)?;
        let response = self
            .client
            .post(self.upload_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                operation: OPERATION,
                source: Box::new(source),
            })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|source| GatewayError::Transport {
                operation: OPERATION,
                source: Box::new(source),
            })?;

        let result = UploadReply::parse(status, &body)?.into_result(status)?;
        debug!(url = %result.url, format = %result.format, "upload accepted");
        Ok(result)
    }
}
