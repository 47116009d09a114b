mod auth;
mod command;
mod config;
mod modem;
mod monitor;
mod transport;

use anyhow::Result;
use auth::AuthorizationGate;
use clap::Parser;
use command::{CommandExecutor, CommandRegistry, DryRunShell, ShellExecutor, SystemShell};
use config::AppConfig;
use modem::CommandChannel;
use monitor::{MessagePoller, MonitorLoop};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use transport::SerialTransport;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(about = "Host administration over SMS through a GSM modem")]
struct Args {
    /// TOML config file; built-in defaults are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Serial device of the modem, overrides the config file
    #[arg(long)]
    port: Option<String>,
    /// Baud rate, overrides the config file
    #[arg(long)]
    baud: Option<u32>,
    /// Log shell commands instead of running them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(port) = args.port {
        config.modem.port = port;
    }
    if let Some(baud) = args.baud {
        config.modem.baud = baud;
    }
    config.validate()?;

    info!("SMS admin starting on {} at {} baud", config.modem.port, config.modem.baud);
    if args.dry_run {
        warn!("  Dry run: shell commands will not be executed");
    }

    let transport = SerialTransport::open(&config.serial())?;
    let channel = CommandChannel::new(transport, config.channel_timings());

    let shell: Arc<dyn ShellExecutor> = if args.dry_run {
        Arc::new(DryRunShell)
    } else {
        Arc::new(SystemShell)
    };
    let registry = CommandRegistry::new(&config.commands);
    info!("  Commands: {}", registry.keywords().collect::<Vec<_>>().join(", "));

    let executor = CommandExecutor::new(registry, shell, config.exec_settings());
    let gate = AuthorizationGate::new(config.auth.senders.iter().map(|s| s.trim().to_string()));
    info!("  Authorized senders: {}", gate.len());
    let poller = MessagePoller::new(gate, executor);

    // Stop on Ctrl-C, observed between polling cycles
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Stop requested");
            let _ = stop_tx.send(true);
        }
    });

    let monitor = MonitorLoop::new(
        channel,
        poller,
        config.timing.poll_interval(),
        config.timing.error_backoff(),
    );
    monitor.run(stop_rx).await?;

    info!("SMS admin stopped");
    Ok(())
}
