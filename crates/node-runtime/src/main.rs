//! Entry point for a core node: loads configuration, builds the ten
//! subsystems (C1-C10) through [`node_runtime::wiring::build`], starts
//! them, and runs until interrupted.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use node_runtime::{wiring, NodeConfig};

fn load_config() -> Result<NodeConfig> {
    let home = std::env::var("NODE_HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./node-home"));
    let master_secret = std::env::var("NODE_IPC_SECRET")
        .map(|s| s.into_bytes())
        .unwrap_or_else(|_| b"dev-only-insecure-master-secret".to_vec());

    let config = NodeConfig::minimal(home, master_secret);
    config.validate().context("invalid node configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("starting core node");

    let config = load_config()?;
    let node = wiring::build(&config).context("failed to wire subsystems")?;

    info!("node wired; starting subsystems");
    node.run(async {
        let _ = tokio::signal::ctrl_c().await;
        info!("ctrl-c received");
    })
    .await
    .context("node runtime failed")?;

    info!("shutdown complete");
    Ok(())
}
