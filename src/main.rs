//! OSDU quickstart - demo servers for login, search and file delivery
//!
#![doc = "Main entry point for the osdu-quickstart servers."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use osdu_quickstart::cli::Cli;
use osdu_quickstart::config::Config;
use osdu_quickstart::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration for the routes this command mounts
    config.validate(cli.command)?;

    tracing::info!(command = ?cli.command, "Starting server");
    server::serve(cli.command, &config).await
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool, json_logs: bool) {
    let default_filter = if verbose {
        "osdu_quickstart=debug"
    } else {
        "osdu_quickstart=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
