#![cfg_attr(
    not(test),
    warn(clippy::print_stdout, clippy::dbg_macro),
    deny(clippy::unwrap_used, clippy::expect_used)
)]

use std::{path::PathBuf, time::Duration};

use rama::{
    error::{BoxError, ErrorContext as _},
    graceful,
    net::socket::Interface,
    telemetry::tracing::{self, Instrument as _},
};

use clap::Parser;

pub mod config;
pub mod server;
pub mod simulator;
pub mod utils;

use crate::{
    config::{Scenario, SettingsArgs},
    simulator::{SeededRoll, Simulator},
};

#[cfg(target_family = "unix")]
#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[cfg(target_os = "windows")]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// CLI arguments for configuring the mock ticketing server.
#[derive(Debug, Clone, Parser)]
#[command(name = "ticket-mock")]
#[command(bin_name = "ticket-mock")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// network interface to bind the mock http server to
    #[arg(
        long,
        short = 'b',
        value_name = "INTERFACE",
        default_value = "127.0.0.1:3000"
    )]
    pub bind: Interface,

    #[arg(long)]
    /// Scenario to start with,
    /// manually defined settings overwrite scenario settings.
    pub scenario: Option<Scenario>,

    #[clap(flatten)]
    pub settings: SettingsArgs,

    /// seed the failure roll, for reproducible random failures
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// debug logging as default instead of Info; use RUST_LOG env for more options
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,

    /// enable pretty logging (format for humans)
    #[arg(long, default_value_t = false)]
    pub pretty: bool,

    /// write the tracing output to the provided (log) file instead of stderr
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// directory in which data will be stored on the filesystem
    #[arg(long, short = 'D', default_value = ".ticket-mock")]
    pub data: PathBuf,

    #[arg(long, value_name = "SECONDS", default_value_t = 1.)]
    /// the graceful shutdown timeout (<= 0.0 = no timeout)
    pub graceful: f64,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = Args::parse();

    utils::telemetry::init_tracing(utils::telemetry::TelemetryConfig {
        verbose: args.verbose,
        pretty: args.pretty,
        output: args.output.as_deref(),
    })?;

    let base_shutdown_signal = graceful::default_signal();
    if let Err(err) = run_with_args(base_shutdown_signal, args).await {
        eprintln!("🚩 exit with error: {err}");
        std::process::exit(1);
    }

    Ok(())
}

/// Runs the mock server and blocks until
/// a critical error occurs or the (graceful) shutdown has been initiated.
async fn run_with_args<F>(base_shutdown_signal: F, args: Args) -> Result<(), BoxError>
where
    F: Future<Output: Send + 'static> + Send + 'static,
{
    tokio::fs::create_dir_all(&args.data)
        .await
        .context("create data directory")
        .with_context_debug_field("path", || args.data.clone())?;

    let graceful_timeout = (args.graceful > 0.).then(|| Duration::from_secs_f64(args.graceful));

    let settings = config::initial_settings(args.scenario, args.settings);
    let simulator = match args.seed {
        Some(seed) => {
            tracing::info!("seed failure roll with: {seed}");
            Simulator::new_with_roll(settings, SeededRoll::new(seed))
        }
        None => Simulator::new(settings),
    };

    let (error_tx, error_rx) = tokio::sync::mpsc::channel::<BoxError>(1);
    let graceful = graceful::Shutdown::new(new_shutdown_signal(error_rx, base_shutdown_signal));

    graceful.spawn_task_fn(move |guard| async move {
        tracing::info!("spawning mock ticketing server...");
        if let Err(err) = server::run_mock_server(&args.data, guard, args.bind, simulator)
            .instrument(tracing::debug_span!(
                "mock server lifetime",
                server.service.name = env!("CARGO_PKG_NAME"),
                otel.kind = "server",
                network.protocol.name = "http",
            ))
            .await
        {
            tracing::error!("mock server exited with an error: {err}");
            let _ = error_tx.send(err).await;
        }
    });

    let delay = match graceful_timeout {
        Some(duration) => graceful.shutdown_with_limit(duration).await?,
        None => graceful.shutdown().await,
    };

    tracing::info!("gracefully shutdown with a delay of: {delay:?}");
    Ok(())
}

fn new_shutdown_signal(
    error_rx: tokio::sync::mpsc::Receiver<BoxError>,
    base_shutdown_signal: impl Future<Output: Send + 'static> + Send + 'static,
) -> impl Future + Send + 'static {
    async move {
        let mut mut_error_rx = error_rx;
        let mut signal = Box::pin(base_shutdown_signal);

        tokio::select! {
            _ = signal.as_mut() => {
                tracing::debug!("default signal triggered: init graceful shutdown");
            }
            err = mut_error_rx.recv() => {
                if let Some(err) = err {
                    tracing::error!("fatal err received: {err}; abort");
                } else {
                    tracing::info!("wait for default signal, no error was received");
                    signal.await;
                    tracing::debug!("default signal triggered: init graceful shutdown");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["ticket-mock"]).unwrap();
        assert!(args.scenario.is_none());
        assert!(args.seed.is_none());
        assert!(args.settings.failure_rate.is_none());
        assert_eq!(PathBuf::from(".ticket-mock"), args.data);
    }

    #[test]
    fn test_args_scenario_and_overwrites() {
        let args = Args::try_parse_from([
            "ticket-mock",
            "--scenario",
            "servicenow-slow",
            "--response-delay",
            "250",
            "--create-tickets",
            "false",
            "--seed",
            "42",
        ])
        .unwrap();

        assert_eq!(Some(Scenario::ServiceSlow), args.scenario);
        assert_eq!(Some(42), args.seed);

        let settings = config::initial_settings(args.scenario, args.settings);
        assert_eq!(250, settings.response_delay);
        assert!(!settings.create_tickets);
    }

    #[test]
    fn test_args_unknown_scenario() {
        assert!(Args::try_parse_from(["ticket-mock", "--scenario", "unknown-name"]).is_err());
    }
}
