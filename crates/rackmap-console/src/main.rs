//! Rackmap console — entry point.
//!
//! Connects to the rack inventory service, keeps an in-memory snapshot of
//! racks, devices, and network connections, and exposes the elevation and
//! topology views through the `ui_bridge` command layer.  A desktop shell
//! would register those commands as its handlers; this binary runs them
//! headless, either as a long-lived console that refreshes periodically or
//! as a one-shot snapshot report for smoke testing.
//!
//! # Usage
//!
//! ```text
//! rackmap-console [OPTIONS]
//!
//! Options:
//!   --config   <PATH>   Config file path [default: platform config dir]
//!   --base-url <URL>    Inventory service base URL (overrides config)
//!   --view     <MODE>   Initial topology view: grid or tree (overrides config)
//!   --refresh-secs <N>  Seconds between inventory refreshes [default: 30]
//!   --snapshot          Print one inventory report as JSON and exit
//! ```
//!
//! # Environment variable overrides
//!
//! The CLI defaults can also be overridden with environment variables.
//! CLI args take precedence when both are present.
//!
//! | Variable               | Default              | Description                    |
//! |------------------------|----------------------|--------------------------------|
//! | `RACKMAP_CONFIG`       | platform config dir  | Config file path               |
//! | `RACKMAP_BASE_URL`     | from config file     | Inventory service base URL     |
//! | `RACKMAP_VIEW`         | from config file     | Initial view: `grid` or `tree` |
//! | `RACKMAP_REFRESH_SECS` | `30`                 | Refresh interval in seconds    |
//!
//! # Architecture overview
//!
//! ```text
//! rackmap-console  ← this process
//!   application/      use cases: sync, place-device, map-topology
//!   infrastructure/
//!     http/           reqwest gateway → inventory service REST API
//!     storage/        config.toml + positions.json
//!     ui_bridge/      command functions + view-model DTOs
//!       ↕
//! inventory service  (HTTP/JSON, /api/racks /api/devices /api/network/...)
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rackmap_core::{PositionCache, ViewMode};

use rackmap_console::application::gateway::InventoryGateway;
use rackmap_console::infrastructure::http::HttpInventoryGateway;
use rackmap_console::infrastructure::storage::config::{config_file_path, load_config, AppConfig};
use rackmap_console::infrastructure::storage::positions::{load_positions, positions_file_path};
use rackmap_console::infrastructure::ui_bridge::{
    self, AppState, CommandResult, RackDto, TopologyViewDto,
};

/// How often the shutdown flag is polled while idling.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Rack inventory console.
///
/// Renders rack elevations and the network topology from a live inventory
/// service, headless.
#[derive(Debug, Parser)]
#[command(
    name = "rackmap-console",
    about = "Rack elevation and network topology console for a rack inventory service",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    ///
    /// When omitted, the platform location is used (Linux
    /// `~/.config/rackmap/config.toml` and equivalents).  A missing file is
    /// not an error; defaults apply.
    #[arg(long, env = "RACKMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the inventory service, e.g. `http://localhost:8080`.
    ///
    /// Overrides the `api.base_url` config value.
    #[arg(long, env = "RACKMAP_BASE_URL")]
    base_url: Option<String>,

    /// Initial topology view mode: `grid` or `tree`.
    ///
    /// Overrides the `topology.default_view` config value.
    #[arg(long, env = "RACKMAP_VIEW")]
    view: Option<String>,

    /// Seconds between inventory refreshes in console mode.
    #[arg(long, default_value_t = 30, env = "RACKMAP_REFRESH_SECS")]
    refresh_secs: u64,

    /// Print one inventory report (racks + topology) as JSON and exit.
    #[arg(long, default_value_t = false)]
    snapshot: bool,
}

impl Cli {
    /// Resolves the config file path and loads the configuration, applying
    /// the CLI overrides on top.
    ///
    /// # Errors
    ///
    /// Fails when no config path can be determined, the file is malformed,
    /// or `--view` is not a known view-mode label.
    fn resolve_config(&self) -> anyhow::Result<(PathBuf, AppConfig)> {
        let path = match &self.config {
            Some(p) => p.clone(),
            None => config_file_path()
                .context("no --config given and the platform config directory is unknown")?,
        };

        let mut config = load_config(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;

        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(view) = &self.view {
            config.topology.default_view = view
                .parse::<ViewMode>()
                .with_context(|| format!("invalid --view value {view:?}"))?;
        }

        Ok((path, config))
    }

    /// Where the position cache is persisted: next to the config file in
    /// use, falling back to the platform location.
    fn positions_path(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => path.parent().map(|dir| dir.join("positions.json")),
            None => positions_file_path().ok(),
        }
    }
}

// ── Snapshot report ───────────────────────────────────────────────────────────

/// One-shot JSON report printed by `--snapshot`.
#[derive(Debug, Serialize)]
struct SnapshotReport {
    racks: Vec<RackDto>,
    topology: TopologyViewDto,
}

/// Unwraps a command envelope in a context where a failure is fatal.
fn expect_command<T: Serialize>(result: CommandResult<T>, what: &str) -> anyhow::Result<T> {
    if result.success {
        result
            .data
            .ok_or_else(|| anyhow::anyhow!("{what} succeeded but returned no data"))
    } else {
        let message = result.error.unwrap_or_else(|| "unknown error".to_string());
        Err(anyhow::anyhow!("{what} failed: {message}"))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let (config_path, config) = cli.resolve_config()?;
    info!(config = %config_path.display(), base_url = %config.api.base_url, "rackmap console starting");

    // Gateway and persisted topology positions.
    let gateway: Arc<dyn InventoryGateway> = Arc::new(
        HttpInventoryGateway::new(config.api.base_url.as_str(), config.api.timeout())
            .context("failed to build the inventory HTTP client")?,
    );
    let positions_path = cli.positions_path();
    let cache = match &positions_path {
        Some(path) => load_positions(path).unwrap_or_else(|e| {
            warn!(error = %e, "could not read saved positions, starting fresh");
            PositionCache::new()
        }),
        None => {
            warn!("no writable config directory, topology positions will not persist");
            PositionCache::new()
        }
    };

    let state = AppState::new(gateway, config, cache, positions_path);

    // First load; the console is useless without one.
    let summary = expect_command(
        ui_bridge::refresh_inventory(Arc::clone(&state)).await,
        "initial inventory refresh",
    )?;
    info!(
        racks = summary.racks,
        devices = summary.devices,
        connections = summary.connections,
        "inventory loaded"
    );

    if cli.snapshot {
        return print_snapshot(state).await;
    }

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    info!("rackmap console ready.  Press Ctrl-C to exit.");
    run_console(state, running, Duration::from_secs(cli.refresh_secs)).await;

    info!("rackmap console stopped");
    Ok(())
}

/// Long-lived console loop: refreshes the inventory on an interval until
/// the shutdown flag is cleared.
///
/// A desktop shell would replace this loop with its event loop and drive
/// the same `ui_bridge` commands from user input.
async fn run_console(state: Arc<AppState>, running: Arc<AtomicBool>, refresh_every: Duration) {
    let mut since_refresh = Duration::ZERO;
    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(SHUTDOWN_POLL).await;
        since_refresh += SHUTDOWN_POLL;
        if since_refresh < refresh_every {
            continue;
        }
        since_refresh = Duration::ZERO;

        // A failed refresh keeps the previous snapshot; the service may be
        // restarting.
        let result = ui_bridge::refresh_inventory(Arc::clone(&state)).await;
        if !result.success {
            warn!(
                error = result.error.as_deref().unwrap_or("unknown error"),
                "inventory refresh failed, keeping previous snapshot"
            );
        }
    }
}

/// Prints the one-shot `--snapshot` report to stdout.
async fn print_snapshot(state: Arc<AppState>) -> anyhow::Result<()> {
    let racks = expect_command(ui_bridge::get_racks(Arc::clone(&state)).await, "rack listing")?;
    let topology = expect_command(ui_bridge::get_topology(state).await, "topology rendering")?;

    let report = SnapshotReport { racks, topology };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
