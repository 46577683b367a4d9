//! Uploadcare command line client

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uploadcare_cli::{run, Cli};
use uploadcare_client::UploadcareClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr, command output to stdout
    let log_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("uploadcare_cli={0},uploadcare_client={0}", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.connection.client_config();
    tracing::debug!("Using public key {}", config.public_key);
    if !config.has_secret() {
        tracing::warn!("No secret key configured, only uploads and CDN URLs will work");
    }

    let client = UploadcareClient::new(config)?;
    let mut stdout = std::io::stdout().lock();
    run(&client, cli.command, &mut stdout).await
}
