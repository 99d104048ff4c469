use clap::Parser;

mod cli;
mod interact;
mod options;
mod run;

use cli::Cli;
use fleetkey_core::constants::FLEETKEY_LOG_VAR;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run::execute(cli).await {
        // all hosts provisioned
        Ok(0) => Ok(()),
        // at least one host failed during provisioning
        Ok(failed) => {
            tracing::error!(failed, "run finished with host failures");
            std::process::exit(1);
        }
        // configuration or credential error before any host was attempted
        Err(err) => {
            eprintln!("fleetkey: {err}");
            std::process::exit(2);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_env(FLEETKEY_LOG_VAR)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
