//! framesnap - multi-frame hybrid page snapshots
//!
//! Main entry point for the framesnap CLI.

mod cli;
mod cmd_capture;

use clap::Parser;
use tracing::{debug, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use framesnap_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};

use crate::cli::{Cli, Commands};
use crate::cmd_capture::{run_capture, run_frames, CaptureCommand};

/// Initialize tracing: console output on stderr plus an optional daily log file.
///
/// `RUST_LOG` wins over `--log`, which wins over the configured level.
fn init_tracing(
    logging: &LoggingConfig,
    cli_filter: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cli_filter.unwrap_or(&logging.level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match logging.file_dir() {
        Some(log_dir) => {
            std::fs::create_dir_all(&log_dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("framesnap")
                .filename_suffix("log")
                .max_log_files(14)
                .build(&log_dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // keep the writer alive for the program duration
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let config = ConfigLoader::load_or_default(cli.config.as_deref())?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.logging, cli.log.as_deref())?;

    let validation = ConfigValidator::validate(&config);
    for warning in &validation.warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    if let Some(err) = validation.into_error() {
        return Err(err.into());
    }
    debug!(endpoint = %config.browser.endpoint, "Configuration loaded");

    match cli.command {
        Commands::Capture {
            browser,
            focus,
            experimental,
            per_frame,
            format,
            output,
        } => {
            let command = CaptureCommand::resolve(&config, focus, experimental, per_frame, format);
            run_capture(&config, &browser, command, output.as_deref()).await
        }
        Commands::Frames { browser } => run_frames(&config, &browser).await,
    }
}
