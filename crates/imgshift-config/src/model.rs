//! Raw and validated configuration models.
//!
//! # Design
//! - [`RawConfig`] holds text exactly as supplied; only [`crate::resolve`] turns it into
//!   a [`MigrationConfig`], so a validated config can never carry a placeholder.
//! - Secrets are redacted from `Debug` and `Serialize` output.

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use imgshift_core::{DriverSettings, FetchStrategy};
use serde::{Serialize, Serializer};
use url::Url;

use crate::defaults::DEFAULT_HTTP_TIMEOUT_SECS;

const REDACTED: &str = "<redacted>";

/// Unvalidated connection settings as supplied by flags or the environment.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RawConfig {
    /// Cloudinary cloud name.
    pub cloud_name: Option<String>,
    /// Unsigned upload preset.
    pub upload_preset: Option<String>,
    /// Destination folder.
    pub folder: Option<String>,
    /// Base of the upload API.
    pub upload_api: Option<String>,
    /// Base URL of the `PostgREST` service.
    pub store_url: Option<String>,
    /// API key for the `PostgREST` service.
    pub store_key: Option<String>,
    /// Table holding the product records.
    pub table: Option<String>,
    /// Listing order (`<column>.<asc|desc>`).
    pub order_by: Option<String>,
}

impl Debug for RawConfig {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RawConfig")
            .field("cloud_name", &self.cloud_name)
            .field("upload_preset", &self.upload_preset)
            .field("folder", &self.folder)
            .field("upload_api", &self.upload_api)
            .field("store_url", &self.store_url)
            .field("store_key", &self.store_key.as_ref().map(|_| REDACTED))
            .field("table", &self.table)
            .field("order_by", &self.order_by)
            .finish()
    }
}

/// Validated upload target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloudinaryConfig {
    /// Cloud name, never the placeholder.
    pub cloud_name: String,
    /// Unsigned upload preset.
    pub upload_preset: String,
    /// Destination folder, without surrounding slashes.
    pub folder: String,
    /// Fully resolved upload endpoint.
    pub upload_url: Url,
}

/// Validated record store connection.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct StoreConfig {
    /// Base URL of the `PostgREST` service.
    pub url: Url,
    /// API key sent as `apikey` and bearer token.
    #[serde(serialize_with = "redact")]
    pub key: String,
    /// Table holding the product records.
    pub table: String,
    /// Listing order; `None` leaves ordering to the store.
    pub order_by: Option<String>,
}

impl Debug for StoreConfig {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StoreConfig")
            .field("url", &self.url.as_str())
            .field("key", &REDACTED)
            .field("table", &self.table)
            .field("order_by", &self.order_by)
            .finish()
    }
}

fn redact<S: Serializer>(_: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(REDACTED)
}

/// Run tunables; unset values fall back to the strategy defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    /// Listing strategy.
    pub strategy: FetchStrategy,
    /// Records per batch.
    pub batch_size: Option<usize>,
    /// Pause between batches in milliseconds.
    pub batch_delay_ms: Option<u64>,
    /// Pause after each migrated record in milliseconds.
    pub record_delay_ms: Option<u64>,
    /// Maximum number of candidates listed.
    pub limit: Option<usize>,
    /// Classify and decode only.
    pub dry_run: bool,
    /// Prefix of the stable public id.
    pub public_id_prefix: Option<String>,
    /// Substring identifying already-migrated URLs.
    pub target_marker: Option<String>,
    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            strategy: FetchStrategy::default(),
            batch_size: None,
            batch_delay_ms: None,
            record_delay_ms: None,
            limit: None,
            dry_run: false,
            public_id_prefix: None,
            target_marker: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Fully validated configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationConfig {
    /// Upload target.
    pub cloudinary: CloudinaryConfig,
    /// Record store connection.
    pub store: StoreConfig,
    /// Run tunables.
    pub run: RunConfig,
}

impl MigrationConfig {
    /// Driver settings: strategy defaults overlaid with every explicit tunable.
    #[must_use]
    pub fn driver_settings(&self) -> DriverSettings {
        let run = &self.run;
        let mut settings = DriverSettings::for_strategy(run.strategy);
        if let Some(batch_size) = run.batch_size {
            settings.batch_size = batch_size;
        }
        if let Some(delay) = run.batch_delay_ms {
            settings.batch_delay = Duration::from_millis(delay);
        }
        if let Some(delay) = run.record_delay_ms {
            settings.record_delay = Duration::from_millis(delay);
        }
        if run.limit.is_some() {
            settings.candidate_cap = run.limit;
        }
        if let Some(prefix) = &run.public_id_prefix {
            settings.public_id_prefix.clone_from(prefix);
        }
        if let Some(marker) = &run.target_marker {
            settings.target_marker.clone_from(marker);
        }
        settings.folder.clone_from(&self.cloudinary.folder);
        settings.dry_run = run.dry_run;
        settings
    }

    /// Timeout applied to every HTTP client.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.run.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(run: RunConfig) -> Result<MigrationConfig, url::ParseError> {
        Ok(MigrationConfig {
            cloudinary: CloudinaryConfig {
                cloud_name: "shop".into(),
                upload_preset: "unsigned".into(),
                folder: "catalog".into(),
                upload_url: Url::parse("https://api.cloudinary.com/v1_1/shop/image/upload")?,
            },
            store: StoreConfig {
                url: Url::parse("https://abc.supabase.co")?,
                key: "service-role-secret".into(),
                table: "products".into(),
                order_by: None,
            },
            run,
        })
    }

    #[test]
    fn driver_settings_fall_back_to_strategy_defaults() -> Result<(), url::ParseError> {
        let settings = config(RunConfig {
            strategy: FetchStrategy::ById,
            ..RunConfig::default()
        })?
        .driver_settings();
        assert_eq!(settings.batch_size, 5);
        assert_eq!(settings.candidate_cap, Some(100));
        assert_eq!(settings.folder, "catalog");
        assert_eq!(settings.public_id_prefix, "product");
        Ok(())
    }

    #[test]
    fn explicit_tunables_override_defaults() -> Result<(), url::ParseError> {
        let settings = config(RunConfig {
            batch_size: Some(3),
            batch_delay_ms: Some(0),
            record_delay_ms: Some(250),
            limit: Some(40),
            dry_run: true,
            public_id_prefix: Some("sku".into()),
            ..RunConfig::default()
        })?
        .driver_settings();
        assert_eq!(settings.batch_size, 3);
        assert_eq!(settings.batch_delay, Duration::ZERO);
        assert_eq!(settings.record_delay, Duration::from_millis(250));
        assert_eq!(settings.candidate_cap, Some(40));
        assert!(settings.dry_run);
        assert_eq!(settings.public_id_for("9"), "sku-9");
        Ok(())
    }

    #[test]
    fn secrets_are_redacted() -> Result<(), Box<dyn std::error::Error>> {
        let config = config(RunConfig::default())?;
        assert!(!format!("{config:?}").contains("service-role-secret"));
        let json = serde_json::to_string(&config)?;
        assert!(!json.contains("service-role-secret"));
        assert!(json.contains(REDACTED));
        Ok(())
    }
}
