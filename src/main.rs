use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use aws_state_client::cli::Cli;
use aws_state_client::{AppConfig, QontractClient, VaultClient, config, new_client};

const LOG_FILE: &str = "aws-state-client.log";

fn init_logging(log_path: Option<&str>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_path.filter(|p| !p.is_empty()) {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(non_blocking)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

async fn run(cli: Cli, app_config: &AppConfig) -> anyhow::Result<()> {
    let accounts = QontractClient::new(&app_config.qontract)?;
    let secrets = VaultClient::new(&app_config.vault)?;
    let client = new_client(app_config, &accounts, &secrets, cli.account.as_deref())
        .await
        .context("failed to create S3 client")?;

    cli.command.execute(&client, &mut std::io::stdout()).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (app_config, load_error) = config::load_config();
    let guard = init_logging(app_config.log_path.as_deref());
    if let Some(e) = load_error {
        warn!("Could not load config file, using defaults: {}", e);
    }
    info!("Config loaded from: {:?}", config::get_config_path());

    if let Err(e) = run(cli, &app_config).await {
        error!("{:#}", e);
        // exit skips destructors; flush the file log first.
        drop(guard);
        std::process::exit(1);
    }
}
