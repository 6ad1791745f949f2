//! fleet: runs the roadfleet service against the wall clock and prints
//! every pushed event as one JSON line on stdout.
//!
//! ```text
//! cargo run -p fleet -- demos/fleet/config.toml
//! RUST_LOG=debug MAX_SPEED=80 cargo run -p fleet
//! ```
//!
//! Logs go to stderr, so stdout stays a clean event stream.

mod config;
mod network;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use rf_sim::{
    Collaborators, JsonFileRoster, OptionsPatch, RosterSource, SimBuilder, SimService,
    SyntheticRoster, TracingSink,
};
use rf_spatial::{AStarRouter, load_geojson};

use config::AppConfig;
use network::sample_network;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    // 1. Road network.
    let network = match &config.geojson_path {
        Some(path) => load_geojson(path)?,
        None => sample_network()?,
    };
    tracing::info!(nodes = network.node_count(), edges = network.edge_count(), "network ready");

    // 2. Simulation, built empty; the roster comes from the active source.
    let sim = SimBuilder::new(network, AStarRouter::new())
        .options(config.sim.clone())
        .seed(config.seed)
        .build()?;

    let adapter = config
        .roster_file
        .clone()
        .map(|p| Arc::new(JsonFileRoster::new(p)) as Arc<dyn RosterSource>);
    let collaborators = Collaborators {
        adapter,
        synthetic: Arc::new(SyntheticRoster::new(config.agents, config.seed)),
        sink: Arc::new(TracingSink),
    };

    // 3. Drive it.
    let handle = SimService::spawn(sim, collaborators);
    let mut events = handle.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "event not serializable"),
                },
                Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "printer lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    handle.reset().await;
    handle.start(OptionsPatch::default()).await?;

    match config.run_secs {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => tokio::signal::ctrl_c().await?,
    }

    handle.stop().await;
    let status = handle.status().await;
    let travelled: f64 = handle.snapshots().await.iter().map(|a| a.odometer_km).sum();
    tracing::info!(
        agents = status.agents,
        sim_ms = status.time.as_millis(),
        km = %format!("{travelled:.2}"),
        "simulation finished"
    );

    handle.shutdown().await;
    printer.abort();
    Ok(())
}
