//! Reference simulator: load a mesh topology, wire up logging, send a
//! payload across it, and report how long delivery took. The spiritual
//! successor of `examples/original_source/Source/Desktop/Main.cpp`, which
//! just spun up a bare `Reactor` and ran one closure on it.

mod config;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use config::{load_config, ConfigFormat, MeshTopologyConfig};
use hivecom_mesh::topology::build_grid;
use hivecom_telemetry::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "hivecom-sim", version, about = "Drive a simulated HiveCom mesh from a topology file")]
struct Cli {
    /// Path to a topology file (TOML or YAML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Explicit configuration format override.
    #[arg(long, value_enum, default_value_t = ConfigFormat::Auto)]
    config_format: ConfigFormat,
    /// Node to send the demo payload from. Defaults to the first node listed.
    #[arg(long)]
    from: Option<String>,
    /// Node to send the demo payload to. Defaults to the last node listed.
    #[arg(long)]
    to: Option<String>,
    /// Seconds to wait for the payload to be acknowledged before giving up.
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let topology = match &cli.config {
        Some(path) => load_config(path, cli.config_format)?,
        None => MeshTopologyConfig::sample(),
    };
    init_tracing(&topology.logging).ok();

    let connections = topology.connections();
    let from = cli.from.unwrap_or_else(|| connections.first().expect("validated non-empty").source.clone());
    let to = cli.to.unwrap_or_else(|| connections.last().expect("validated non-empty").source.clone());

    let grid = build_grid(&connections, topology.routing_policy());
    let sender = grid.node(&from).ok_or_else(|| eyre!("unknown source node {from:?}"))?.clone();
    let _receiver = grid.node(&to).ok_or_else(|| eyre!("unknown destination node {to:?}"))?;

    println!("Welcome to HiveCom!");
    println!("sending demo payload {from} -> {to}");

    let message = sender.send(&to, b"hello from hivecom-sim".to_vec());
    if message.wait_timeout(Duration::from_secs(cli.timeout_secs)) {
        println!("delivered in {:?}", message.travel_time());
    } else {
        println!("no acknowledgement within {}s", cli.timeout_secs);
    }

    Ok(())
}
