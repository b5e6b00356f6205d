// Shutdown drain module
// Waits for active connections to finish after the listener closed

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::logger;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Wait until `conn_counter` drops to zero or `timeout` elapses.
///
/// Returns `true` when every connection finished in time. Connections still
/// open at the deadline are abandoned and closed with the runtime.
pub async fn drain_connections(conn_counter: &AtomicUsize, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let active = conn_counter.load(Ordering::SeqCst);
        if active == 0 {
            logger::log_info("all connections closed");
            return true;
        }

        tokio::select! {
            () = tokio::time::sleep(POLL_INTERVAL) => {}
            () = tokio::time::sleep_until(deadline) => {
                logger::log_warning(&format!(
                    "shutdown deadline reached with {active} connections still open"
                ));
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_returns_when_idle() {
        let counter = AtomicUsize::new(0);
        assert!(drain_connections(&counter, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_waits_for_connections() {
        let counter = Arc::new(AtomicUsize::new(2));
        let worker = Arc::clone(&counter);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(80)).await;
            worker.store(0, Ordering::SeqCst);
        });
        assert!(drain_connections(&counter, Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_gives_up_at_deadline() {
        let counter = AtomicUsize::new(1);
        assert!(!drain_connections(&counter, Duration::from_millis(120)).await);
    }
}
