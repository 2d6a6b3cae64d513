//! Argument parsing and command dispatch for the `imgshift` binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use imgshift_config::defaults::DEFAULT_HTTP_TIMEOUT_SECS;
use imgshift_config::env::{
    ENV_BATCH_DELAY_MS, ENV_BATCH_SIZE, ENV_CLOUD_NAME, ENV_DRY_RUN, ENV_FOLDER,
    ENV_HTTP_TIMEOUT_SECS, ENV_LIMIT, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_ORDER_BY,
    ENV_PUBLIC_ID_PREFIX, ENV_RECORD_DELAY_MS, ENV_STORE_KEY, ENV_STORE_URL, ENV_STRATEGY,
    ENV_TABLE, ENV_TARGET_MARKER, ENV_UPLOAD_API, ENV_UPLOAD_PRESET, parse_strategy,
};
use imgshift_config::{MigrationConfig, RawConfig, RunConfig};
use imgshift_core::FetchStrategy;
use imgshift_gateway::Preset;
use imgshift_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging, run_span};
use tracing::Instrument;
use uuid::Uuid;

use crate::client::{CliDependencies, CliError, CliResult};
use crate::commands::config::handle_config_show;
use crate::commands::delivery::handle_delivery_url;
use crate::commands::migrate::{handle_migrate, handle_scan};

const BUILD_SHA: &str = match option_env!("IMGSHIFT_BUILD_SHA") {
    Some(sha) => sha,
    None => "dev",
};

/// Parses CLI arguments, installs logging, and executes the requested command
/// inside a run span. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    if let Err(err) = install_logging(&cli) {
        eprintln!("error: {}", err.display_message());
        return err.exit_code();
    }

    let run_id = Uuid::new_v4().to_string();
    let span = run_span(command_label(&cli.command), &run_id);
    let result = dispatch(cli, &run_id).instrument(span.clone()).await;

    match result {
        Ok(()) => 0,
        Err(err) => {
            let exit_code = err.exit_code();
            let message = err.display_message();
            span.in_scope(|| tracing::error!(exit_code, error = %message, "command failed"));
            eprintln!("error: {message}");
            exit_code
        }
    }
}

fn install_logging(cli: &Cli) -> CliResult<()> {
    let config = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
        build_sha: BUILD_SHA,
    };
    init_logging(&config)
        .map_err(|err| CliError::failure(anyhow::Error::new(err).context("logging setup failed")))
}

async fn dispatch(cli: Cli, run_id: &str) -> CliResult<()> {
    let globals = Globals {
        output: cli.output,
        http_timeout_secs: cli.http_timeout_secs,
    };
    let connect = |config: &MigrationConfig| CliDependencies::connect(config, run_id);

    match cli.command {
        Command::Migrate(args) => handle_migrate(&args, globals, connect).await,
        Command::Scan(args) => handle_scan(&args, globals, connect).await,
        Command::DeliveryUrl(args) => handle_delivery_url(&args, globals.output),
        Command::Config(ConfigCommand::Show(args)) => handle_config_show(&args, globals),
    }
}

#[derive(Parser)]
#[command(
    name = "imgshift",
    version,
    about = "Move inline product images to Cloudinary and rewrite the stored URLs"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = ENV_HTTP_TIMEOUT_SECS,
        default_value_t = DEFAULT_HTTP_TIMEOUT_SECS
    )]
    http_timeout_secs: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for command results"
    )]
    output: OutputFormat,
    #[arg(
        long,
        global = true,
        env = ENV_LOG_FORMAT,
        value_parser = parse_log_format,
        help = "Log format: json, pretty or auto"
    )]
    log_format: Option<LogFormat>,
    #[arg(long, global = true, env = ENV_LOG_LEVEL, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload inline images and write the delivery URLs back.
    Migrate(MigrateArgs),
    /// Classify candidates without uploading or writing anything.
    Scan(ScanArgs),
    /// Build a delivery URL for a migrated asset.
    DeliveryUrl(DeliveryUrlArgs),
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the resolved configuration with secrets redacted.
    Show(MigrateArgs),
}

/// Global flags every handler needs.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Globals {
    pub(crate) output: OutputFormat,
    pub(crate) http_timeout_secs: u64,
}

#[derive(Args, Clone, Default)]
pub(crate) struct ConnectionArgs {
    #[arg(long, env = ENV_CLOUD_NAME)]
    pub(crate) cloud_name: Option<String>,
    #[arg(long, env = ENV_UPLOAD_PRESET)]
    pub(crate) upload_preset: Option<String>,
    #[arg(long, env = ENV_FOLDER)]
    pub(crate) folder: Option<String>,
    #[arg(long, env = ENV_UPLOAD_API, help = "Override the upload API base URL")]
    pub(crate) upload_api: Option<String>,
    #[arg(long, env = ENV_STORE_URL)]
    pub(crate) store_url: Option<String>,
    #[arg(long, env = ENV_STORE_KEY, hide_env_values = true)]
    pub(crate) store_key: Option<String>,
    #[arg(long, env = ENV_TABLE)]
    pub(crate) table: Option<String>,
    #[arg(long, env = ENV_ORDER_BY, help = "Listing order, e.g. id.asc")]
    pub(crate) order_by: Option<String>,
}

impl ConnectionArgs {
    pub(crate) fn raw(&self) -> RawConfig {
        RawConfig {
            cloud_name: self.cloud_name.clone(),
            upload_preset: self.upload_preset.clone(),
            folder: self.folder.clone(),
            upload_api: self.upload_api.clone(),
            store_url: self.store_url.clone(),
            store_key: self.store_key.clone(),
            table: self.table.clone(),
            order_by: self.order_by.clone(),
        }
    }
}

#[derive(Args, Clone, Default)]
pub(crate) struct ListingArgs {
    #[arg(
        long,
        env = ENV_STRATEGY,
        value_parser = parse_strategy_arg,
        default_value = "bulk",
        help = "Listing strategy: bulk or by-id"
    )]
    pub(crate) strategy: FetchStrategy,
    #[arg(long, env = ENV_LIMIT, help = "Maximum number of candidates listed")]
    pub(crate) limit: Option<usize>,
    #[arg(long, env = ENV_TARGET_MARKER)]
    pub(crate) target_marker: Option<String>,
}

#[derive(Args, Clone, Default)]
pub(crate) struct MigrateArgs {
    #[command(flatten)]
    pub(crate) connection: ConnectionArgs,
    #[command(flatten)]
    pub(crate) listing: ListingArgs,
    #[arg(long, env = ENV_BATCH_SIZE)]
    pub(crate) batch_size: Option<usize>,
    #[arg(long, env = ENV_BATCH_DELAY_MS)]
    pub(crate) batch_delay_ms: Option<u64>,
    #[arg(long, env = ENV_RECORD_DELAY_MS)]
    pub(crate) record_delay_ms: Option<u64>,
    #[arg(long, env = ENV_PUBLIC_ID_PREFIX)]
    pub(crate) public_id_prefix: Option<String>,
    #[arg(long, env = ENV_DRY_RUN, help = "Classify and decode only")]
    pub(crate) dry_run: bool,
}

impl MigrateArgs {
    pub(crate) fn run_config(&self, http_timeout_secs: u64) -> RunConfig {
        RunConfig {
            strategy: self.listing.strategy,
            batch_size: self.batch_size,
            batch_delay_ms: self.batch_delay_ms,
            record_delay_ms: self.record_delay_ms,
            limit: self.listing.limit,
            dry_run: self.dry_run,
            public_id_prefix: self.public_id_prefix.clone(),
            target_marker: self.listing.target_marker.clone(),
            http_timeout_secs,
        }
    }
}

#[derive(Args, Clone, Default)]
pub(crate) struct ScanArgs {
    #[command(flatten)]
    pub(crate) connection: ConnectionArgs,
    #[command(flatten)]
    pub(crate) listing: ListingArgs,
}

impl ScanArgs {
    pub(crate) fn run_config(&self, http_timeout_secs: u64) -> RunConfig {
        RunConfig {
            strategy: self.listing.strategy,
            limit: self.listing.limit,
            dry_run: true,
            target_marker: self.listing.target_marker.clone(),
            http_timeout_secs,
            ..RunConfig::default()
        }
    }
}

#[derive(Args, Clone)]
pub(crate) struct DeliveryUrlArgs {
    #[arg(help = "Public id (e.g. products/product-42) or an existing delivery URL")]
    pub(crate) target: String,
    #[arg(long, env = ENV_CLOUD_NAME)]
    pub(crate) cloud_name: Option<String>,
    #[arg(long, value_parser = parse_preset)]
    pub(crate) preset: Option<Preset>,
    #[arg(long)]
    pub(crate) width: Option<u32>,
    #[arg(long)]
    pub(crate) height: Option<u32>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Migrate(_) => "migrate",
        Command::Scan(_) => "scan",
        Command::DeliveryUrl(_) => "delivery_url",
        Command::Config(ConfigCommand::Show(_)) => "config_show",
    }
}

fn parse_strategy_arg(input: &str) -> Result<FetchStrategy, String> {
    parse_strategy(input.trim()).ok_or_else(|| format!("unknown strategy '{input}'"))
}

fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input.parse::<LogFormat>().map_err(|err| err.to_string())
}

fn parse_preset(input: &str) -> Result<Preset, String> {
    input.parse::<Preset>().map_err(|err| err.to_string())
}
