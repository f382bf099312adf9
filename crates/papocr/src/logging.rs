use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "papocr=info";

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Failed to bridge log records into tracing: {0}")]
    LogBridge(#[from] log::SetLoggerError),
}

/// Installs the global subscriber. Output goes to stderr, as JSON lines
/// when `json` is set.
///
/// Records emitted through the `log` facade are forwarded too.
pub fn init_tracing(json: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)));

    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}
