use clap::Parser;
use color_eyre::eyre::Result;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use oxigram::infrastructure::config::ConfigOrigin;
use oxigram::infrastructure::{AppConfig, CliArgs, ConfigLoader};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<(AppConfig, ConfigOrigin)> {
    let (mut config, origin) = ConfigLoader::locate(args.config.as_deref())?.load()?;
    config.merge_with_args(args);
    Ok((config, origin))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();
    let (config, origin) = load_config(&args)?;

    init_logging(&config)?;

    info!(version = oxigram::VERSION, "Starting {}", oxigram::NAME);
    match &origin {
        ConfigOrigin::Fallback { .. } => warn!(%origin, "Configuration"),
        _ => info!(%origin, "Configuration"),
    }

    oxigram::presentation::run(args.command, config).await
}
