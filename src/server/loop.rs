// Server loop module
// Accepts connections until shutdown, then drains the active ones

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{watch, Notify};

use super::connection::accept_connection;
use super::drain::drain_connections;
use crate::config::AppState;
use crate::logger;

/// How long active connections get to finish after shutdown
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Accept connections on `listener` until `shutdown` is notified
///
/// After the notification the listener is closed, open connections are told
/// to finish their current request, and the loop waits up to
/// `DRAIN_TIMEOUT` for them before returning.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
) {
    let active_connections = Arc::new(AtomicUsize::new(0));
    let (closing_tx, closing_rx) = watch::channel(false);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            &closing_rx,
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => {
                logger::log_info("shutting down, no longer accepting connections");
                break;
            }
        }
    }

    drop(listener);
    let _ = closing_tx.send(true);
    drain_connections(&active_connections, DRAIN_TIMEOUT).await;
}
