//! monome-demo entry point.
//!
//! Finds grids and arcs through serialosc, connects to each one, and runs a
//! small light-up demo on it until Ctrl+C.
//!
//! # Usage
//!
//! ```text
//! monome-demo [OPTIONS]
//!
//! Options:
//!   --config  <PATH>    Config file [default: platform config dir]
//!   --devices <N>       How many discovered devices to drive
//!   --prefix  <PREFIX>  OSC prefix devices are told to use
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable          | Overrides        |
//! |-------------------|------------------|
//! | `MONOME_CONFIG`   | `--config`       |
//! | `MONOME_DEVICES`  | `demo.device_limit` |
//! | `MONOME_PREFIX`   | `session.prefix` |
//! | `RUST_LOG`        | `demo.log_level` |
//!
//! # What happens at startup
//!
//! 1. The config file is loaded (defaults if it does not exist) and the
//!    CLI overrides are applied.
//! 2. `tracing_subscriber` is initialised from `RUST_LOG`, falling back to
//!    the configured level.
//! 3. A [`SerialOscSession`] lists attached devices.  For each of the first
//!    `device_limit` answers a grid or arc session is started together with
//!    its demo task.
//! 4. Discovery is closed; the demos run until Ctrl+C, then every session
//!    is closed and the demo tasks drain.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use monome_client::application::arc_demo::ArcDemo;
use monome_client::application::grid_demo::GridDemo;
use monome_client::infrastructure::network::{ArcSession, GridSession, SerialOscSession, SessionConfig};
use monome_client::infrastructure::storage::config::{load_config, AppConfig};
use monome_core::{ControlEvent, ControlEventKind, DeviceKind};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Light-up demo for monome grids and arcs attached through serialosc.
#[derive(Debug, Parser)]
#[command(name = "monome-demo", version)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, env = "MONOME_CONFIG")]
    config: Option<PathBuf>,

    /// Number of discovered devices to drive.
    #[arg(long, env = "MONOME_DEVICES")]
    devices: Option<usize>,

    /// OSC prefix devices are told to use.
    #[arg(long, env = "MONOME_PREFIX")]
    prefix: Option<String>,
}

impl Cli {
    /// Loads the config file and layers the CLI overrides on top.
    fn into_app_config(self) -> anyhow::Result<AppConfig> {
        let mut config = load_config(self.config.as_deref()).context("failed to load config")?;
        if let Some(devices) = self.devices {
            config.demo.device_limit = devices;
        }
        if let Some(prefix) = self.prefix {
            config.session.prefix = prefix;
        }
        Ok(config)
    }
}

// ── Running devices ───────────────────────────────────────────────────────────

/// A started session plus the task running its demo.
enum Device {
    Grid(Arc<GridSession>, JoinHandle<()>),
    Arc(Arc<ArcSession>, JoinHandle<()>),
}

impl Device {
    async fn start(event: &ControlEvent, config: &SessionConfig, flash: Duration) -> anyhow::Result<Self> {
        match event.device_kind() {
            DeviceKind::Grid => {
                let session = Arc::new(
                    GridSession::start(event.port, config)
                        .await
                        .with_context(|| format!("failed to start grid {}", event.id))?,
                );
                let demo = Arc::new(GridDemo::new(session.clone(), flash));
                let task = tokio::spawn(demo.run(session.clone()));
                Ok(Device::Grid(session, task))
            }
            DeviceKind::Arc => {
                let session = Arc::new(
                    ArcSession::start(event.port, config)
                        .await
                        .with_context(|| format!("failed to start arc {}", event.id))?,
                );
                let demo = Arc::new(ArcDemo::new(session.clone(), flash));
                let task = tokio::spawn(demo.run(session.clone()));
                Ok(Device::Arc(session, task))
            }
        }
    }

    async fn shutdown(self) {
        let task = match self {
            Device::Grid(session, task) => {
                session.close().await;
                task
            }
            Device::Arc(session, task) => {
                session.close().await;
                task
            }
        };
        if let Err(e) = task.await {
            warn!("demo task ended abnormally: {e}");
        }
    }
}

/// Reads discovery answers until `limit` devices are running or the
/// stream ends.  Started devices land in `devices` as they come up, so an
/// interrupted discovery still leaves them there to be shut down.
async fn discover(
    discovery: &SerialOscSession,
    config: &SessionConfig,
    limit: usize,
    flash: Duration,
    devices: &mut Vec<Device>,
) {
    while devices.len() < limit {
        let Some(event) = discovery.read().await else {
            break;
        };
        info!("{event}");
        if event.kind != ControlEventKind::List {
            continue;
        }
        match Device::start(&event, config, flash).await {
            Ok(device) => devices.push(device),
            Err(e) => error!("{e:#}"),
        }
    }
}

async fn shutdown_all(devices: Vec<Device>) {
    for device in devices {
        device.shutdown().await;
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = Cli::parse().into_app_config()?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&app.demo.log_level)),
        )
        .init();

    let config = app.session_config()?;
    let flash = app.demo.flash();
    info!(
        "monome-demo starting: serialosc={}:{}, prefix={}",
        config.host, config.discovery_port, config.prefix
    );

    let discovery = SerialOscSession::start(&config)
        .await
        .context("failed to start serialosc discovery")?;

    let mut devices = Vec::new();
    let interrupted = tokio::select! {
        () = discover(&discovery, &config, app.demo.device_limit, flash, &mut devices) => false,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("failed to listen for Ctrl+C signal: {e}");
            }
            true
        }
    };
    discovery.close().await;

    if interrupted {
        info!(count = devices.len(), "interrupted during discovery");
    } else {
        info!(count = devices.len(), "devices running; press Ctrl+C to stop");
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C signal: {e}");
        }
        info!("received Ctrl+C, shutting down");
    }

    shutdown_all(devices).await;

    info!("monome-demo stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
