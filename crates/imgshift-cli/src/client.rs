//! Shared client utilities, collaborators, and error types for the CLI.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use anyhow::anyhow;
use imgshift_config::{ConfigError, MigrationConfig};
use imgshift_core::{RecordSource, UploadGateway};
use imgshift_gateway::CloudinaryGateway;
use imgshift_store::{PostgrestStore, StoreEndpoint};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        Self::Validation(format!("configuration error: {}", error.describe()))
    }
}

/// Store and gateway a command operates on.
#[derive(Clone)]
pub(crate) struct Collaborators {
    pub(crate) source: Arc<dyn RecordSource>,
    pub(crate) gateway: Arc<dyn UploadGateway>,
}

/// Dependencies constructed from a validated configuration.
pub(crate) struct CliDependencies;

impl CliDependencies {
    /// Build the shared HTTP client, `PostgREST` store, and Cloudinary gateway.
    pub(crate) fn connect(config: &MigrationConfig, run_id: &str) -> CliResult<Collaborators> {
        let client = build_client(config, run_id)?;

        let mut endpoint =
            StoreEndpoint::new(&config.store.url, &config.store.table, &config.store.key)
                .map_err(|err| CliError::validation(format!("invalid store endpoint: {err}")))?;
        if let Some(order) = &config.store.order_by {
            endpoint = endpoint.with_order(Some(order.clone()));
        }
        let source = PostgrestStore::new(client.clone(), endpoint);

        let gateway = CloudinaryGateway::new(
            client,
            config.cloudinary.upload_url.clone(),
            config.cloudinary.upload_preset.clone(),
        );

        Ok(Collaborators {
            source: Arc::new(source),
            gateway: Arc::new(gateway),
        })
    }
}

/// HTTP client with the configured timeout and the run id as request id.
pub(crate) fn build_client(config: &MigrationConfig, run_id: &str) -> CliResult<Client> {
    let mut default_headers = HeaderMap::new();
    let request_id = HeaderValue::from_str(run_id)
        .map_err(|_| CliError::failure(anyhow!("run identifier contains invalid characters")))?;
    default_headers.insert(HEADER_REQUEST_ID, request_id);

    Client::builder()
        .timeout(config.http_timeout())
        .default_headers(default_headers)
        .build()
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::prelude::*;
    use imgshift_config::{RawConfig, RunConfig, resolve};

    fn config(base: &str) -> Result<MigrationConfig> {
        let raw = RawConfig {
            cloud_name: Some("shop".into()),
            upload_preset: Some("unsigned".into()),
            store_url: Some(base.to_string()),
            store_key: Some("service-role".into()),
            order_by: Some("name.desc".into()),
            ..RawConfig::default()
        };
        resolve(&raw, RunConfig::default()).map_err(|err| anyhow!(err.describe()))
    }

    #[test]
    fn exit_codes_split_validation_from_failure() {
        assert_eq!(CliError::validation("bad flag").exit_code(), 2);
        assert_eq!(CliError::failure(anyhow!("listing failed")).exit_code(), 3);
        let err = CliError::from(ConfigError::Placeholder {
            field: "cloud_name",
            value: "your-cloud-name".into(),
        });
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("your-cloud-name"));
    }

    #[test]
    fn failure_message_includes_context_chain() {
        let err = CliError::failure(anyhow!("connection refused").context("listing failed"));
        assert_eq!(err.display_message(), "listing failed: connection refused");
    }

    #[test]
    fn build_client_rejects_unprintable_run_id() -> Result<()> {
        let config = config("https://abc.supabase.co")?;
        assert!(build_client(&config, "bad\nid").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn connected_store_sends_request_id_and_configured_order() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/products")
                .header("x-request-id", "run-42")
                .query_param("order", "name.desc");
            then.status(200).json_body(serde_json::json!([]));
        });

        let config = config(&server.base_url())?;
        let collaborators = CliDependencies::connect(&config, "run-42")
            .map_err(|err| anyhow!(err.display_message()))?;
        let records = collaborators.source.list_candidates(None).await?;

        mock.assert();
        assert!(records.is_empty());
        Ok(())
    }
}
