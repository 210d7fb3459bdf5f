use std::{io::IsTerminal as _, path::Path};

use rama::{
    error::{BoxError, ErrorContext as _},
    telemetry::tracing::{
        self,
        metadata::LevelFilter,
        subscriber::{EnvFilter, fmt::writer::BoxMakeWriter},
    },
};

/// Logging options of the mock, as passed on the command line.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig<'a> {
    pub verbose: bool,
    pub pretty: bool,
    pub output: Option<&'a Path>,
}

/// Install the global subscriber. `RUST_LOG` takes precedence
/// over the default level (INFO, or DEBUG when verbose).
pub fn init_tracing(cfg: TelemetryConfig<'_>) -> Result<(), BoxError> {
    let default_level = if cfg.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let ansi = cfg.output.is_none() && std::io::stderr().is_terminal();
    let subscriber = tracing::subscriber::fmt()
        .with_ansi(ansi)
        .with_env_filter(filter)
        .with_writer(log_writer(cfg.output)?);

    if cfg.pretty {
        subscriber.pretty().try_init()?;
    } else {
        subscriber.try_init()?;
    }
    Ok(())
}

fn log_writer(output: Option<&Path>) -> Result<BoxMakeWriter, BoxError> {
    let Some(path) = output else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };

    let file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .context("open ticket-mock log file")
        .with_context_debug_field("path", || path.to_owned())?;
    Ok(BoxMakeWriter::new(file))
}
