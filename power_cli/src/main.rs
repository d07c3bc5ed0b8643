// BMC Power CLI Client
//
// Command-line client for the power control plane HTTP API.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;
use serde_json::json;

#[derive(Parser)]
#[command(name = "bmcctl")]
#[command(version = "0.1.0")]
#[command(about = "Remote power management for fleet servers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8080", env = "POWER_API_URL")]
    server: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Power a server on
    On {
        /// Internal management address of the server
        ip: String,
    },

    /// Power a server off
    Off {
        /// Internal management address of the server
        ip: String,
    },

    /// Query chassis power state
    Status {
        /// Internal management address of the server
        ip: String,
    },
}

#[derive(Debug, Deserialize)]
struct PowerActionResponse {
    message: String,
    internal_ip: String,
    bmc_ip: String,
}

#[derive(Debug, Deserialize)]
struct PowerStatusResponse {
    internal_ip: String,
    bmc_ip: String,
    status: String,
    raw_output: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::On { ip } => {
            let response: PowerActionResponse = post(&client, &cli.server, "/on", &ip).await?;
            println!(
                "{} {} ({} via BMC {})",
                "ok:".green().bold(),
                response.message,
                response.internal_ip,
                response.bmc_ip
            );
        }
        Commands::Off { ip } => {
            let response: PowerActionResponse = post(&client, &cli.server, "/off", &ip).await?;
            println!(
                "{} {} ({} via BMC {})",
                "ok:".green().bold(),
                response.message,
                response.internal_ip,
                response.bmc_ip
            );
        }
        Commands::Status { ip } => {
            let response: PowerStatusResponse =
                post(&client, &cli.server, "/status", &ip).await?;

            let state = match response.status.as_str() {
                "on" => "on".green().bold(),
                "off" => "off".red().bold(),
                other => other.yellow().bold(),
            };

            println!(
                "{} ({} via BMC {})",
                state, response.internal_ip, response.bmc_ip
            );
            println!("  {}", response.raw_output);
        }
    }

    Ok(())
}

/// POST `{"ip": ...}` to one of the power endpoints and decode the reply.
///
/// Non-2xx replies carry `{"error": ...}`; that text becomes the failure
/// message.
async fn post<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    server: &str,
    path: &str,
    ip: &str,
) -> Result<T> {
    let url = format!("{}{}", server.trim_end_matches('/'), path);

    let response = client
        .post(&url)
        .json(&json!({ "ip": ip }))
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?;

    let status = response.status();
    if !status.is_success() {
        let error = response
            .json::<ErrorResponse>()
            .await
            .map(|e| e.error)
            .unwrap_or_else(|_| status.to_string());
        bail!("{}", error);
    }

    response
        .json()
        .await
        .with_context(|| format!("failed to decode response from {}", url))
}
