use std::time::Duration;

use anyhow::Result;
use imgshift_config::env::ENV_STORE_URL;
use imgshift_config::{ConfigError, RawConfig, RunConfig, resolve};
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
fn by_id_run_takes_strategy_defaults_and_overrides() -> Result<()> {
    let config = resolve(
        &RawConfig {
            table: Some("catalog_items".into()),
            ..raw()
        },
        RunConfig {
            strategy: FetchStrategy::ById,
            batch_delay_ms: Some(1500),
            limit: Some(25),
            dry_run: true,
            ..RunConfig::default()
        },
    )?;

    assert_eq!(config.run.strategy, FetchStrategy::ById);
    assert_eq!(config.store.table, "catalog_items");
    let settings = config.driver_settings();
    assert_eq!(settings.batch_size, 5);
    assert_eq!(settings.batch_delay, Duration::from_millis(1500));
    assert_eq!(settings.record_delay, Duration::from_millis(500));
    assert_eq!(settings.candidate_cap, Some(25));
    assert!(settings.dry_run);
    assert_eq!(config.http_timeout(), Duration::from_secs(30));
    Ok(())
}

#[test]
fn placeholder_cloud_name_stops_resolution() {
    let err = resolve(
        &RawConfig {
            cloud_name: Some("your-cloud-name".into()),
            ..raw()
        },
        RunConfig::default(),
    )
    .expect_err("placeholder must fail");
    assert_eq!(
        err,
        ConfigError::Placeholder {
            field: "cloud_name",
            value: "your-cloud-name".to_string(),
        }
    );
}

#[test]
fn blank_optional_values_fall_back_to_defaults() -> Result<()> {
    let config = resolve(
        &RawConfig {
            table: Some("  ".into()),
            folder: Some(String::new()),
            ..raw()
        },
        RunConfig::default(),
    )?;
    assert_eq!(config.run.strategy, FetchStrategy::Bulk);
    assert_eq!(config.store.table, "products");
    assert_eq!(config.driver_settings().batch_size, 10);
    Ok(())
}

#[test]
fn missing_store_url_names_its_variable() {
    let err = resolve(
        &RawConfig {
            store_url: None,
            ..raw()
        },
        RunConfig::default(),
    )
    .expect_err("store url required");
    assert_eq!(
        err,
        ConfigError::MissingField {
            field: "store_url",
            env: ENV_STORE_URL,
        }
    );
}
