use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ghtoken::cli::{run_command, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = cli.file_config()?;

    // Initialize logging; stdout is reserved for the token
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&file_config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting ghtoken v{}", env!("CARGO_PKG_VERSION"));

    run_command(&cli, &file_config).await
}
