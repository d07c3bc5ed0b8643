// Power API Server Binary
//
// Entry point for the power control plane.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleet_config::FleetConfig;
use power_api::state::ApiState;
use power_api::ApiServer;
use power_runtime::IpmiCliRuntime;

#[derive(Parser)]
#[command(name = "power-api")]
#[command(version = "0.1.0")]
#[command(about = "HTTP control plane for BMC power management", long_about = None)]
struct Args {
    /// Path to the fleet configuration file
    #[arg(long, default_value = "config.txt", env = "POWER_CONFIG")]
    config: PathBuf,

    /// Port to listen on
    #[arg(long, default_value_t = 8080, env = "PORT")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "power_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let fleet = FleetConfig::load(&args.config).with_context(|| {
        format!("failed to load fleet config from {}", args.config.display())
    })?;
    tracing::info!(
        "loaded {} servers from {}",
        fleet.len(),
        args.config.display()
    );

    let runtime = IpmiCliRuntime::new();
    if let Err(e) = runtime.verify_binary().await {
        tracing::warn!("ipmitool probe failed, power commands will error: {}", e);
    }

    let state = ApiState::new(Arc::new(fleet), Arc::new(runtime));
    let addr = SocketAddr::new(args.bind, args.port);

    ApiServer::new(addr, state).run().await?;

    Ok(())
}
