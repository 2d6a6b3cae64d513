//! `migrate` and `scan` handlers.
//!
//! Configuration is resolved before `connect` is called, so a rejected configuration
//! never reaches the store or the gateway.

use std::sync::Arc;

use anyhow::Context;
use imgshift_config::{MigrationConfig, resolve};
use imgshift_core::{MigrationDriver, RunResult, ScanReport};
use tracing::info;

use crate::cli::{Globals, MigrateArgs, OutputFormat, ScanArgs};
use crate::client::{CliError, CliResult, Collaborators};
use crate::output::{ConsoleProgress, render_run_result, render_scan_report};

pub(crate) async fn handle_migrate<C>(
    args: &MigrateArgs,
    globals: Globals,
    connect: C,
) -> CliResult<()>
where
    C: FnOnce(&MigrationConfig) -> CliResult<Collaborators> + Send,
{
    let config = resolve(
        &args.connection.raw(),
        args.run_config(globals.http_timeout_secs),
    )?;
    let collaborators = connect(&config)?;
    let result = migrate(&config, collaborators, globals.output).await?;
    render_run_result(&result, globals.output)
}

pub(crate) async fn handle_scan<C>(args: &ScanArgs, globals: Globals, connect: C) -> CliResult<()>
where
    C: FnOnce(&MigrationConfig) -> CliResult<Collaborators> + Send,
{
    let config = resolve(
        &args.connection.raw(),
        args.run_config(globals.http_timeout_secs),
    )?;
    let collaborators = connect(&config)?;
    let report = scan(&config, collaborators).await?;
    render_scan_report(&report, globals.output)
}

fn driver(config: &MigrationConfig, collaborators: Collaborators) -> MigrationDriver {
    let settings = config.driver_settings();
    info!(
        strategy = settings.strategy.as_str(),
        batch_size = settings.batch_size,
        cap = ?settings.candidate_cap,
        folder = %settings.folder,
        dry_run = settings.dry_run,
        "driver configured"
    );
    MigrationDriver::new(collaborators.source, collaborators.gateway, settings)
}

pub(crate) async fn migrate(
    config: &MigrationConfig,
    collaborators: Collaborators,
    format: OutputFormat,
) -> CliResult<RunResult> {
    let mut driver = driver(config, collaborators);
    if format == OutputFormat::Table {
        driver = driver.with_progress(Arc::new(ConsoleProgress));
    }
    driver
        .run()
        .await
        .context("migration aborted")
        .map_err(CliError::failure)
}

pub(crate) async fn scan(
    config: &MigrationConfig,
    collaborators: Collaborators,
) -> CliResult<ScanReport> {
    driver(config, collaborators)
        .scan()
        .await
        .context("scan aborted")
        .map_err(CliError::failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ConnectionArgs, ListingArgs};
    use anyhow::{Result, anyhow};
    use imgshift_config::RunConfig;
    use imgshift_core::FetchStrategy;
    use imgshift_test_support::fixtures::{inline_catalog, mixed_catalog};
    use imgshift_test_support::{MemoryStore, ScriptedGateway};

    const GLOBALS: Globals = Globals {
        output: OutputFormat::Json,
        http_timeout_secs: 30,
    };

    fn connection(cloud_name: &str) -> ConnectionArgs {
        ConnectionArgs {
            cloud_name: Some(cloud_name.into()),
            upload_preset: Some("unsigned".into()),
            store_url: Some("https://abc.supabase.co".into()),
            store_key: Some("service-role".into()),
            ..ConnectionArgs::default()
        }
    }

    fn migrate_args(cloud_name: &str) -> MigrateArgs {
        MigrateArgs {
            connection: connection(cloud_name),
            batch_delay_ms: Some(0),
            record_delay_ms: Some(0),
            ..MigrateArgs::default()
        }
    }

    fn collaborators(store: &Arc<MemoryStore>, gateway: &Arc<ScriptedGateway>) -> Collaborators {
        Collaborators {
            source: store.clone(),
            gateway: gateway.clone(),
        }
    }

    fn config(run: RunConfig) -> Result<MigrationConfig> {
        resolve(&connection("shop").raw(), run).map_err(|err| anyhow!(err.describe()))
    }

    fn fast() -> RunConfig {
        RunConfig {
            batch_delay_ms: Some(0),
            record_delay_ms: Some(0),
            ..RunConfig::default()
        }
    }

    #[tokio::test]
    async fn placeholder_cloud_name_aborts_before_any_store_read() {
        let store = Arc::new(MemoryStore::new(mixed_catalog()));
        let gateway = Arc::new(ScriptedGateway::new("shop"));

        let result = handle_migrate(&migrate_args("your-cloud-name"), GLOBALS, |_| {
            Ok(collaborators(&store, &gateway))
        })
        .await;

        let Err(err) = result else {
            panic!("placeholder cloud name must abort the run");
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("cloud_name"));
        assert_eq!(store.reads(), 0);
        assert_eq!(gateway.upload_count(), 0);
    }

    #[tokio::test]
    async fn migrate_handler_completes_with_record_errors() -> Result<()> {
        let store = Arc::new(MemoryStore::new(inline_catalog(3)));
        let gateway = Arc::new(ScriptedGateway::new("shop").rejecting("product-2"));

        handle_migrate(&migrate_args("shop"), GLOBALS, |_| {
            Ok(collaborators(&store, &gateway))
        })
        .await
        .map_err(|err| anyhow!(err.display_message()))?;

        assert_eq!(gateway.upload_count(), 3);
        assert_eq!(store.writes().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn migrate_reports_tally() -> Result<()> {
        let store = Arc::new(MemoryStore::new(mixed_catalog()));
        let gateway = Arc::new(ScriptedGateway::new("shop"));

        let result = migrate(
            &config(fast())?,
            collaborators(&store, &gateway),
            OutputFormat::Table,
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;

        assert_eq!(
            (result.migrated, result.skipped, result.errors, result.total),
            (1, 2, 0, 3)
        );
        let uploads = gateway.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].public_id, "product-3");
        assert_eq!(uploads[0].folder, "products");
        Ok(())
    }

    #[tokio::test]
    async fn listing_failure_maps_to_failure_exit_code() -> Result<()> {
        let store = Arc::new(MemoryStore::new(mixed_catalog()).failing_listing());
        let gateway = Arc::new(ScriptedGateway::new("shop"));

        let Err(err) = migrate(
            &config(fast())?,
            collaborators(&store, &gateway),
            OutputFormat::Json,
        )
        .await
        else {
            return Err(anyhow!("listing failure must abort the run"));
        };

        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().starts_with("migration aborted"));
        assert_eq!(gateway.upload_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn scan_never_uploads_or_writes() -> Result<()> {
        let store = Arc::new(MemoryStore::new(mixed_catalog()));
        let gateway = Arc::new(ScriptedGateway::new("shop"));
        let args = ScanArgs {
            connection: connection("shop"),
            listing: ListingArgs {
                strategy: FetchStrategy::ById,
                ..ListingArgs::default()
            },
        };

        handle_scan(&args, GLOBALS, |_| Ok(collaborators(&store, &gateway)))
            .await
            .map_err(|err| anyhow!(err.display_message()))?;

        let report = scan(&config(fast())?, collaborators(&store, &gateway))
            .await
            .map_err(|err| anyhow!(err.display_message()))?;
        assert_eq!(report.total, 3);
        assert_eq!(report.migratable, 1);
        assert_eq!(report.already_migrated, 1);
        assert_eq!(report.absent, 1);
        assert_eq!(gateway.upload_count(), 0);
        assert!(store.writes().is_empty());
        Ok(())
    }
}
