//! Exponential backoff shared by the Discord and IRC reconnection loops.

use std::time::Duration;

use backon::BackoffBuilder;
use tokio::sync::watch;
use tracing::info;

/// Longest wait between two connection attempts.
pub const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(300);

/// 5s initial, 5min max, factor 1.1, with jitter, unlimited retries.
pub fn reconnect_backoff() -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(5))
        .with_max_delay(MAX_RECONNECT_DELAY)
        .with_factor(1.1)
        .with_jitter()
        .without_max_times()
        .build()
}

/// Whether shutdown has been requested.
pub fn is_shutdown(shutdown_rx: &watch::Receiver<bool>) -> bool {
    *shutdown_rx.borrow()
}

/// Wait out the next backoff delay. Returns `false` if shutdown arrived first.
pub async fn wait_before_reconnect(
    backoff: &mut impl Iterator<Item = Duration>,
    shutdown_rx: &mut watch::Receiver<bool>,
    what: &str,
) -> bool {
    let delay = backoff.next().unwrap_or(MAX_RECONNECT_DELAY);
    info!("Reconnecting to {} in {:.1} seconds...", what, delay.as_secs_f64());

    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        changed = shutdown_rx.changed() => {
            // A dropped sender means nobody can ask us to stop anymore.
            if changed.is_err() {
                tokio::time::sleep(delay).await;
                return true;
            }
            if is_shutdown(shutdown_rx) {
                info!("Shutdown signal received during backoff");
                false
            } else {
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_unbounded_and_capped() {
        let delays: Vec<Duration> = reconnect_backoff().take(200).collect();
        assert_eq!(delays.len(), 200);
        assert!(delays.iter().all(|d| *d <= MAX_RECONNECT_DELAY * 2));
        assert!(delays[0] >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_wait_stops_on_shutdown() {
        let (tx, mut rx) = watch::channel(false);
        let mut backoff = std::iter::repeat(Duration::from_secs(60));

        let waiter = tokio::spawn(async move {
            wait_before_reconnect(&mut backoff, &mut rx, "test").await
        });
        tx.send(true).unwrap();

        assert!(!waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_elapses_without_shutdown() {
        let (_tx, mut rx) = watch::channel(false);
        let mut backoff = std::iter::once(Duration::from_millis(10));
        assert!(wait_before_reconnect(&mut backoff, &mut rx, "test").await);
    }
}
