// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Emergency Sim - headless console for the simulated detection engine
//!
//! Drives the simulation clock, feeds the dashboard model and optionally
//! records every event to disk. The console prints one dashboard tab per
//! tick, or the raw event stream as JSON lines.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use emergency_sim::core::BroadcastSubscriber;
use emergency_sim::dashboard::{render_tab, Tab};
use emergency_sim::{
    Config, Dashboard, EventExporter, ExportFormat, SimulationEngine, SimulationEvent, VERSION,
};

/// Emergency Sim - simulated AI emergency detection backend
#[derive(Parser, Debug)]
#[command(name = "emergency-sim")]
#[command(version = VERSION)]
#[command(about = "Simulated threat, metrics and audio event engine")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Tick period in milliseconds
    #[arg(long)]
    period_ms: Option<u64>,

    /// Chance of a threat per tick
    #[arg(long)]
    threat_probability: Option<f64>,

    /// Minimum confidence that raises an alert
    #[arg(long)]
    alert_threshold: Option<u8>,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Dashboard tab printed after each tick
    #[arg(long, value_enum, default_value_t = TabArg::Monitoring)]
    tab: TabArg,

    /// Print events as JSON lines instead of dashboard panels
    #[arg(long)]
    json: bool,

    /// Record events into this directory
    #[arg(long)]
    export: Option<PathBuf>,

    /// Export file format
    #[arg(long, value_enum)]
    export_format: Option<FormatArg>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TabArg {
    Monitoring,
    Alerts,
    Analytics,
    Admin,
}

impl From<TabArg> for Tab {
    fn from(arg: TabArg) -> Self {
        match arg {
            TabArg::Monitoring => Tab::Monitoring,
            TabArg::Alerts => Tab::Alerts,
            TabArg::Analytics => Tab::Analytics,
            TabArg::Admin => Tab::Admin,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Emergency Sim v{}", VERSION);

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Override with command line args
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
        config.dashboard.seed = Some(seed);
    }
    if let Some(period) = args.period_ms {
        config.simulation.tick_period_ms = period;
    }
    if let Some(p) = args.threat_probability {
        config.simulation.threat_probability = p;
    }
    if let Some(threshold) = args.alert_threshold {
        config.admin.set_alert_threshold(threshold)?;
    }
    if let Some(dir) = args.export.clone() {
        config.export.enabled = true;
        config.export.path = dir;
    }
    if let Some(format) = args.export_format {
        config.export.format = format.into();
    }
    config.validate()?;

    info!("Configuration loaded from {:?}", config_path);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, &args))
}

async fn run(config: Config, args: &Args) -> Result<()> {
    let engine = SimulationEngine::new(&config.simulation)?;

    let dashboard = Arc::new(Dashboard::new(config.dashboard.clone(), config.admin.clone()));
    engine.subscribe(dashboard.clone());

    let exporter = if config.export.enabled {
        let exporter = Arc::new(EventExporter::create(&config.export.path, config.export.format)?);
        engine.subscribe(exporter.clone());
        Some(exporter)
    } else {
        None
    };

    let bridge = Arc::new(BroadcastSubscriber::new(64));
    let mut rx = bridge.subscribe();
    engine.subscribe(bridge);

    engine.start()?;
    info!("Press Ctrl+C to shutdown");

    let tab = Tab::from(args.tab);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Shutdown signal received");
                break;
            }
            event = rx.recv() => match event {
                Ok(event) => {
                    if args.json {
                        println!("{}", serde_json::to_string(&event)?);
                    }
                    // Audio is the last event of every tick
                    if let SimulationEvent::AudioUpdate(_) = event {
                        if !args.json {
                            println!("{}", render_tab(&dashboard, tab));
                        }
                        if tick_limit_reached(&engine, args.ticks) {
                            break;
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Console fell behind, skipped {} events", skipped);
                    if tick_limit_reached(&engine, args.ticks) {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    engine.stop();

    if let Some(exporter) = exporter {
        exporter.close()?;
        info!("Exported {} events", exporter.exported_count());
    }

    let status = engine.status();
    info!(
        "Shutdown complete: {} ticks, {} threats, {} alerts, {} delivery failures",
        status.ticks,
        status.threats_emitted,
        dashboard.metrics().alerts_sent,
        status.delivery_failures
    );

    Ok(())
}

/// Counted by the engine, so events skipped by a lagging console still count
fn tick_limit_reached(engine: &SimulationEngine, limit: Option<u64>) -> bool {
    limit.is_some_and(|limit| engine.status().ticks >= limit)
}
