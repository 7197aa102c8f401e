mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use onevisitor_core::Dashboard;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Local-only commands: no backend session
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),
        Command::Tenant(args) => commands::tenant::handle(&args, &cli.global),
        Command::Completions(args) => {
            use clap::CommandFactory;

            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "onevisitor", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let (profile_name, client_config) = config::build_client_config(&cli.global)?;
            let timeout_secs = client_config.timeout.as_secs();
            let tokens = config::token_store(&cli.global, &profile_name);
            let dashboard = Dashboard::new(client_config, tokens)?;

            tracing::debug!(command = ?cmd, profile = %profile_name, tenant = %dashboard.tenant_id(), "dispatching command");
            commands::dispatch(cmd, &dashboard, &cli.global)
                .await
                .map_err(|e| e.with_timeout(timeout_secs).with_profile(&profile_name))
        }
    }
}
