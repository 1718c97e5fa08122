//! Startup poller for the REST server.

use std::time::Duration;

use localic_types::{LocalicError, Result};

/// Delay between startup attempts.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Probe `url` once a second for up to `wait_seconds` seconds.
///
/// Any established connection counts as started; the status code is ignored.
pub async fn poll_for_start(client: &reqwest::Client, url: &str, wait_seconds: u32) -> Result<()> {
    poll_for_start_every(client, url, wait_seconds, POLL_INTERVAL).await
}

/// Probe `url` up to `attempts` times, `interval` apart.
pub async fn poll_for_start_every(
    client: &reqwest::Client,
    url: &str,
    attempts: u32,
    interval: Duration,
) -> Result<()> {
    for attempt in 1..=attempts {
        match client.get(url).send().await {
            Ok(_) => {
                tracing::debug!(url, attempt, "server is up");
                return Ok(());
            }
            Err(e) => {
                tracing::trace!(url, attempt, error = %e, "server not reachable yet");
                if attempt % 5 == 0 {
                    tracing::info!(url, attempt, attempts, "waiting for server to start");
                }
            }
        }

        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }

    Err(LocalicError::ServerNotStarted {
        url: url.to_string(),
        attempts,
    })
}
