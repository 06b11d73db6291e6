use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Where tracing output goes
pub enum LogTarget<'a> {
    /// stderr, with colors
    Stderr,
    /// Append to a file; used while the terminal UI owns the screen
    File(&'a Path),
}

/// Initialize the tracing subscriber
///
/// The filter comes from `RUST_LOG`, falling back to `info`.
pub fn initialize(target: LogTarget<'_>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    );

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
        LogTarget::File(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            let log_file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::sync::Arc::new(log_file))
                        .with_ansi(false),
                )
                .try_init()?;
        }
    }

    Ok(())
}
