//! Validation and normalisation of raw configuration.
//!
//! # Design
//! - Resolution happens before any collaborator is built; a failure here means no
//!   store read and no upload ever happen.
//! - Values are trimmed; an all-whitespace value counts as absent.

use imgshift_core::DEFAULT_FOLDER;
use tracing::debug;
use url::Url;

use crate::defaults::{
    DEFAULT_TABLE, DEFAULT_UPLOAD_API, PLACEHOLDER_CLOUD_NAME, PLACEHOLDER_UPLOAD_PRESET,
};
use crate::error::{ConfigError, ConfigResult};
use crate::env::{ENV_STORE_KEY, ENV_STORE_URL, ENV_UPLOAD_PRESET};
use crate::model::{CloudinaryConfig, MigrationConfig, RawConfig, RunConfig, StoreConfig};

/// Validate raw connection settings and run tunables into a [`MigrationConfig`].
///
/// # Errors
///
/// Returns [`ConfigError`] for missing fields, placeholder values, malformed URLs or
/// out-of-range tunables.
pub fn resolve(raw: &RawConfig, run: RunConfig) -> ConfigResult<MigrationConfig> {
    let cloudinary = cloudinary(raw)?;
    let store = store(raw)?;
    validate_run(&run)?;
    debug!(
        cloud_name = %cloudinary.cloud_name,
        table = %store.table,
        strategy = run.strategy.as_str(),
        "configuration resolved"
    );
    Ok(MigrationConfig {
        cloudinary,
        store,
        run,
    })
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|text| text.trim()).filter(|text| !text.is_empty())
}

fn required<'a>(
    value: Option<&'a String>,
    field: &'static str,
    env: &'static str,
) -> ConfigResult<&'a str> {
    present(value).ok_or(ConfigError::MissingField { field, env })
}

fn reject_placeholder(value: &str, field: &'static str, placeholder: &str) -> ConfigResult<()> {
    if value.eq_ignore_ascii_case(placeholder) {
        return Err(ConfigError::Placeholder {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn invalid(field: &'static str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidField {
        field,
        value: Some(value.to_string()),
        reason,
    }
}

fn is_identifier(value: &str, extra: &[char]) -> bool {
    value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || extra.contains(&ch))
}

/// Parse an absolute `http`/`https` URL.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value does not parse or uses another scheme.
pub fn parse_http_url(value: &str, field: &'static str) -> ConfigResult<Url> {
    let url = Url::parse(value).map_err(|_| invalid(field, value, "must be an absolute URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(field, value, "must use http or https"));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid(field, value, "must include a host"));
    }
    Ok(url)
}

fn cloudinary(raw: &RawConfig) -> ConfigResult<CloudinaryConfig> {
    let cloud_name = present(raw.cloud_name.as_ref()).ok_or(ConfigError::Placeholder {
        field: "cloud_name",
        value: String::new(),
    })?;
    reject_placeholder(cloud_name, "cloud_name", PLACEHOLDER_CLOUD_NAME)?;
    if !is_identifier(cloud_name, &['-']) {
        return Err(invalid(
            "cloud_name",
            cloud_name,
            "must contain only letters, digits, '-' or '_'",
        ));
    }

    let upload_preset = required(raw.upload_preset.as_ref(), "upload_preset", ENV_UPLOAD_PRESET)?;
    reject_placeholder(upload_preset, "upload_preset", PLACEHOLDER_UPLOAD_PRESET)?;

    let folder = present(raw.folder.as_ref())
        .map(|folder| folder.trim_matches('/'))
        .filter(|folder| !folder.is_empty())
        .unwrap_or(DEFAULT_FOLDER);

    let api_text = present(raw.upload_api.as_ref()).unwrap_or(DEFAULT_UPLOAD_API);
    let mut api = parse_http_url(api_text, "upload_api")?;
    if !api.path().ends_with('/') {
        let path = format!("{}/", api.path());
        api.set_path(&path);
    }
    let upload_url = api
        .join(&format!("{cloud_name}/image/upload"))
        .map_err(|_| invalid("upload_api", api_text, "cannot be joined with the cloud name"))?;

    Ok(CloudinaryConfig {
        cloud_name: cloud_name.to_string(),
        upload_preset: upload_preset.to_string(),
        folder: folder.to_string(),
        upload_url,
    })
}

fn store(raw: &RawConfig) -> ConfigResult<StoreConfig> {
    let url_text = required(raw.store_url.as_ref(), "store_url", ENV_STORE_URL)?;
    let url = parse_http_url(url_text, "store_url")?;
    let key = required(raw.store_key.as_ref(), "store_key", ENV_STORE_KEY)?;

    let table = present(raw.table.as_ref()).unwrap_or(DEFAULT_TABLE);
    if !is_identifier(table, &[]) {
        return Err(invalid(
            "table",
            table,
            "must contain only letters, digits or '_'",
        ));
    }

    let order_by = present(raw.order_by.as_ref())
        .map(|order| validate_order(order).map(str::to_string))
        .transpose()?;

    Ok(StoreConfig {
        url,
        key: key.to_string(),
        table: table.to_string(),
        order_by,
    })
}

fn validate_order(order: &str) -> ConfigResult<&str> {
    let valid = order.split_once('.').is_some_and(|(column, direction)| {
        !column.is_empty()
            && is_identifier(column, &[])
            && matches!(direction, "asc" | "desc")
    });
    if valid {
        Ok(order)
    } else {
        Err(invalid("order_by", order, "must look like <column>.asc or <column>.desc"))
    }
}

fn validate_run(run: &RunConfig) -> ConfigResult<()> {
    if run.batch_size == Some(0) {
        return Err(invalid("batch_size", "0", "must be greater than zero"));
    }
    if run.limit == Some(0) {
        return Err(invalid("limit", "0", "must be greater than zero"));
    }
    if run.http_timeout_secs == 0 {
        return Err(invalid("http_timeout_secs", "0", "must be greater than zero"));
    }
    if let Some(marker) = &run.target_marker
        && marker.trim().is_empty()
    {
        return Err(ConfigError::InvalidField {
            field: "target_marker",
            value: None,
            reason: "must not be empty",
        });
    }
    if let Some(prefix) = &run.public_id_prefix
        && !(is_identifier(prefix, &['-']) && !prefix.is_empty())
    {
        return Err(invalid(
            "public_id_prefix",
            prefix,
            "must contain only letters, digits, '-' or '_'",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgshift_core::FetchStrategy;

    fn raw() -> RawConfig {
        RawConfig {
            cloud_name: Some("shop-assets".into()),
            upload_preset: Some("unsigned_products".into()),
            store_url: Some("https://abc.supabase.co".into()),
            store_key: Some("service-role".into()),
            ..RawConfig::default()
        }
    }

    #[test]
    fn resolves_defaults() -> ConfigResult<()> {
        let config = resolve(&raw(), RunConfig::default())?;
        assert_eq!(
            config.cloudinary.upload_url.as_str(),
            "https://api.cloudinary.com/v1_1/shop-assets/image/upload"
        );
        assert_eq!(config.cloudinary.folder, DEFAULT_FOLDER);
        assert_eq!(config.store.table, DEFAULT_TABLE);
        assert_eq!(config.store.order_by, None);
        assert_eq!(config.run.strategy, FetchStrategy::Bulk);
        Ok(())
    }

    #[test]
    fn placeholder_cloud_name_is_rejected() {
        for value in ["your-cloud-name", "YOUR-CLOUD-NAME", "  ", ""] {
            let raw = RawConfig {
                cloud_name: Some(value.into()),
                ..raw()
            };
            assert!(
                matches!(
                    resolve(&raw, RunConfig::default()),
                    Err(ConfigError::Placeholder {
                        field: "cloud_name",
                        ..
                    })
                ),
                "{value:?} should be rejected"
            );
        }
        let unset = RawConfig {
            cloud_name: None,
            ..raw()
        };
        assert!(matches!(
            resolve(&unset, RunConfig::default()),
            Err(ConfigError::Placeholder { .. })
        ));
    }

    #[test]
    fn upload_api_override_keeps_its_path() -> ConfigResult<()> {
        let raw = RawConfig {
            upload_api: Some("http://127.0.0.1:9000/proxy/v1_1".into()),
            folder: Some("/catalog/images/".into()),
            ..raw()
        };
        let config = resolve(&raw, RunConfig::default())?;
        assert_eq!(
            config.cloudinary.upload_url.as_str(),
            "http://127.0.0.1:9000/proxy/v1_1/shop-assets/image/upload"
        );
        assert_eq!(config.cloudinary.folder, "catalog/images");
        Ok(())
    }

    #[test]
    fn store_fields_are_required_and_checked() {
        let missing_key = RawConfig {
            store_key: None,
            ..raw()
        };
        assert_eq!(
            resolve(&missing_key, RunConfig::default()),
            Err(ConfigError::MissingField {
                field: "store_key",
                env: ENV_STORE_KEY,
            })
        );

        let ftp = RawConfig {
            store_url: Some("ftp://abc.supabase.co".into()),
            ..raw()
        };
        assert!(matches!(
            resolve(&ftp, RunConfig::default()),
            Err(ConfigError::InvalidField {
                field: "store_url",
                ..
            })
        ));

        let bad_order = RawConfig {
            order_by: Some("created_at.sideways".into()),
            ..raw()
        };
        assert!(resolve(&bad_order, RunConfig::default()).is_err());
    }

    #[test]
    fn zero_tunables_are_rejected() {
        for run in [
            RunConfig {
                batch_size: Some(0),
                ..RunConfig::default()
            },
            RunConfig {
                limit: Some(0),
                ..RunConfig::default()
            },
            RunConfig {
                http_timeout_secs: 0,
                ..RunConfig::default()
            },
        ] {
            assert!(matches!(
                resolve(&raw(), run),
                Err(ConfigError::InvalidField { .. })
            ));
        }
    }

    #[test]
    fn order_by_accepts_column_direction() -> ConfigResult<()> {
        let raw = RawConfig {
            order_by: Some("created_at.asc".into()),
            ..raw()
        };
        let config = resolve(&raw, RunConfig::default())?;
        assert_eq!(config.store.order_by.as_deref(), Some("created_at.asc"));
        Ok(())
    }
}
