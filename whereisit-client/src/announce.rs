use std::net::{IpAddr, UdpSocket};
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::RegisterRequest;
use crate::api::ApiClient;

const MACHINE_ID_PATH: &str = "/etc/machine-id";
const UNKNOWN_SERIAL: &str = "UNKNOWN_SERIAL";

/// Last successful announcement, persisted between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnounceState {
    pub ip: IpAddr,
    pub timestamp: DateTime<Utc>,
}

impl AnnounceState {
    pub fn load(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!("Ignoring unreadable state file {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string(self).context("Failed to serialize state")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write state file: {}", path.display()))
    }
}

/// Announce when nothing was sent yet, the address changed, or the last
/// announcement is older than `refresh`.
pub fn should_announce(
    state: Option<&AnnounceState>,
    current: IpAddr,
    now: DateTime<Utc>,
    refresh: chrono::Duration,
) -> bool {
    match state {
        None => true,
        Some(s) => s.ip != current || now.signed_duration_since(s.timestamp) > refresh,
    }
}

/// Address of the interface used for outbound traffic. Connecting a UDP
/// socket only selects a route; nothing is sent.
pub fn local_ip() -> Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to bind probe socket")?;
    socket
        .connect("8.8.8.8:80")
        .context("Failed to route probe socket")?;
    Ok(socket.local_addr().context("Failed to read local address")?.ip())
}

pub fn device_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to get system hostname: {}", e);
            String::new()
        })
}

pub fn device_id(machine_id_path: &Path) -> String {
    std::fs::read_to_string(machine_id_path)
        .ok()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| UNKNOWN_SERIAL.to_string())
}

pub struct AnnounceConfig {
    pub state_file: PathBuf,
    pub interval: Duration,
    pub refresh: chrono::Duration,
}

/// Announce loop; runs until the process is stopped.
pub async fn run(client: ApiClient, config: AnnounceConfig) {
    run_with(client, config, local_ip).await
}

/// Announce loop with a pluggable address source. Every failure is logged
/// and retried on the next interval.
pub async fn run_with<F>(client: ApiClient, config: AnnounceConfig, probe: F)
where
    F: Fn() -> Result<IpAddr>,
{
    let id = device_id(Path::new(MACHINE_ID_PATH));
    tracing::info!("Announcing as {} every {:?} when changed", id, config.interval);

    loop {
        match probe() {
            Ok(ip) => announce_if_needed(&client, &config, &id, ip).await,
            Err(e) => tracing::warn!("Could not determine local IP: {:#}", e),
        }

        tokio::time::sleep(config.interval).await;
    }
}

async fn announce_if_needed(client: &ApiClient, config: &AnnounceConfig, id: &str, ip: IpAddr) {
    let state = AnnounceState::load(&config.state_file);
    let now = Utc::now();

    if !should_announce(state.as_ref(), ip, now, config.refresh) {
        tracing::debug!("No change in address {}", ip);
        return;
    }

    let request = RegisterRequest {
        name: Some(device_name()),
        id: Some(id.to_string()),
        address: ip.to_string(),
        tags: None,
    };
    if let Err(e) = client.register(&request).await {
        tracing::error!("Failed to send address update: {:#}", e);
        return;
    }

    tracing::info!("Sent address update: {}", ip);
    if let Err(e) = (AnnounceState { ip, timestamp: now }).save(&config.state_file) {
        tracing::error!("Failed to save announce state: {:#}", e);
    }
}
