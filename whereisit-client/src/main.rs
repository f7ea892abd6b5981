mod announce;
mod api;
#[cfg(test)]
mod stub_server;

use std::path::PathBuf;
use std::time::Duration;
use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::types::DeviceEntry;
use crate::announce::AnnounceConfig;
use crate::api::{ApiClient, Credentials};

/// Talk to a whereisit directory server
#[derive(Debug, Parser)]
#[command(name = "whereisit-client", version)]
struct Cli {
    /// Server base URL, e.g. http://203.0.113.10:8180
    #[arg(long, global = true, default_value = "http://127.0.0.1:8180")]
    server: String,

    #[command(flatten)]
    credentials: Credentials,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send the local address when it changes or the refresh period passes
    Announce {
        #[arg(long, default_value = "/tmp/whereisit_state.json")]
        state_file: PathBuf,

        /// Seconds between address checks
        #[arg(long, default_value_t = 600)]
        interval_secs: u64,

        /// Seconds after which an unchanged address is sent again
        #[arg(long, default_value_t = 86400)]
        refresh_secs: i64,
    },
    /// List devices registered from this network
    Find {
        /// Only show the device with this identifier
        #[arg(long)]
        identifier: Option<String>,
    },
}

fn matching<'a>(devices: &'a [DeviceEntry], identifier: Option<&'a str>) -> Vec<&'a DeviceEntry> {
    devices
        .iter()
        .filter(|d| identifier.is_none() || d.id.as_deref() == identifier)
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("whereisit_client=info"))
        )
        .init();

    let cli = Cli::parse();
    let client = ApiClient::new(&cli.server, cli.credentials)?;

    match cli.command {
        Command::Announce { state_file, interval_secs, refresh_secs } => {
            announce::run(
                client,
                AnnounceConfig {
                    state_file,
                    interval: Duration::from_secs(interval_secs),
                    refresh: chrono::Duration::seconds(refresh_secs),
                },
            )
            .await;
            Ok(())
        }
        Command::Find { identifier } => {
            let devices = client.devices().await?;
            let found = matching(&devices, identifier.as_deref());
            if found.is_empty() {
                println!("No device found");
            }
            for device in found {
                println!(
                    "{}\t{}\t{}\t{}",
                    device.address,
                    device.id.as_deref().unwrap_or("-"),
                    device.name,
                    device.added.to_rfc3339()
                );
            }
            Ok(())
        }
    }
}
