use imgshift_config::resolve;

use crate::cli::{Globals, MigrateArgs};
use crate::client::CliResult;
use crate::output::render_config;

/// Resolve the configuration a `migrate` with the same flags would use and print it.
pub(crate) fn handle_config_show(args: &MigrateArgs, globals: Globals) -> CliResult<()> {
    let config = resolve(
        &args.connection.raw(),
        args.run_config(globals.http_timeout_secs),
    )?;
    render_config(&config, globals.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ConnectionArgs, OutputFormat};

    #[test]
    fn show_rejects_missing_store_key() {
        let args = MigrateArgs {
            connection: ConnectionArgs {
                cloud_name: Some("shop".into()),
                upload_preset: Some("unsigned".into()),
                store_url: Some("https://abc.supabase.co".into()),
                ..ConnectionArgs::default()
            },
            ..MigrateArgs::default()
        };
        let globals = Globals {
            output: OutputFormat::Table,
            http_timeout_secs: 30,
        };
        let err = handle_config_show(&args, globals).expect_err("store key is required");
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("IMGSHIFT_STORE_KEY"));
    }
}
