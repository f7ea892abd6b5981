mod api;
mod config;
mod network;
mod registry;
mod sweeper;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use crate::api::routes::{self, AppState};
use crate::config::{Config, FALLBACK_CONFIG_PATH, PRIMARY_CONFIG_PATH};
use crate::registry::DeviceRegistry;

/// Directory of devices behind NAT, grouped by the address they register from
#[derive(Debug, Parser)]
#[command(name = "whereisitd", version)]
struct Cli {
    /// Config file (default: /etc/whereisit.toml, then ./whereisit.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder with the public files
    #[arg(long)]
    public: Option<PathBuf>,

    /// Port for the HTTP server
    #[arg(long)]
    http_port: Option<u16>,

    /// Device entry lifetime in hours
    #[arg(long)]
    lifetime: Option<u32>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(public) = &self.public {
            config.server.public_dir = public.clone();
        }
        if let Some(port) = self.http_port {
            config.server.listen.set_port(port);
        }
        if let Some(hours) = self.lifetime {
            config.server.lifetime_hours = hours;
        }
        config.server.verbose |= self.verbose;
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "whereisitd=debug,tower_http=debug"
    } else {
        "whereisitd=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter))
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::locate(PRIMARY_CONFIG_PATH, FALLBACK_CONFIG_PATH)?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    cli.apply(&mut config);

    init_tracing(config.server.verbose);
    tracing::info!("Starting whereisitd");
    tracing::info!("Loaded config from {}", config_path.display());

    let server = &config.server;
    if !server.public_dir.is_dir() {
        bail!("Public folder {} does not exist", server.public_dir.display());
    }
    tracing::info!("Using public folder {}", server.public_dir.display());
    tracing::info!("Lifetime in hours: {}", server.lifetime_hours);
    if server.verbose {
        tracing::info!("Verbose logging enabled");
    }

    let registry = DeviceRegistry::new();

    // Create cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    // Spawn expiry sweeper
    let sweeper_handle = tokio::spawn(sweeper::run(
        registry.clone(),
        server.lifetime(),
        server.sweep_interval(),
        cancel.clone(),
    ));

    let app_state = AppState {
        registry,
        auth: Arc::new(config.auth.clone()),
        log_requests: server.verbose,
    };
    let app = routes::router(app_state)
        .fallback_service(routes::spa_service(&server.public_dir));

    // Bind HTTP server
    let listener = tokio::net::TcpListener::bind(server.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", server.listen))?;

    tracing::info!("Listening on {}", server.listen);

    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { server_cancel.cancelled().await })
        .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutdown signal received");
    cancel.cancel();

    let _ = tokio::join!(sweeper_handle, server_handle);

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let mut config = Config::parse(
            "[auth]\nusername = \"u\"\npassword = \"p\"\napi_key = \"k\"\n",
        )
        .unwrap();
        let cli = Cli::parse_from([
            "whereisitd",
            "--http-port",
            "9090",
            "--lifetime",
            "3",
            "--public",
            "/srv/www",
            "--verbose",
        ]);
        cli.apply(&mut config);

        assert_eq!(config.server.listen, "0.0.0.0:9090".parse().unwrap());
        assert_eq!(config.server.lifetime_hours, 3);
        assert_eq!(config.server.public_dir, PathBuf::from("/srv/www"));
        assert!(config.server.verbose);
    }

    #[test]
    fn test_cli_keeps_config_without_flags() {
        let mut config = Config::parse(
            "[auth]\nusername = \"u\"\npassword = \"p\"\napi_key = \"k\"\n[server]\nverbose = true\n",
        )
        .unwrap();
        Cli::parse_from(["whereisitd"]).apply(&mut config);

        assert_eq!(config.server.listen.port(), 8180);
        assert!(config.server.verbose);
    }
}
