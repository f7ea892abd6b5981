use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use crate::registry::DeviceRegistry;

/// Period between expiry sweeps
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Expiry loop - evicts devices not re-registered within `lifetime`.
/// The first sweep happens one `period` after start.
pub async fn run(
    registry: DeviceRegistry,
    lifetime: chrono::Duration,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let evicted = registry.evict_older_than(lifetime);
                if evicted > 0 {
                    tracing::debug!(
                        "Evicted {} expired devices, {} remaining",
                        evicted,
                        registry.len()
                    );
                }
            }
            _ = cancel.cancelled() => {
                tracing::info!("Expiry sweeper shutting down");
                break;
            }
        }
    }
}
