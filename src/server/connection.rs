// Connection handling module
// Accepts a single TCP connection and serves it on its own task

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::sync::watch;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing `max_connections`.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
/// * `shutdown` - Flips to `true` when the server stops accepting
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    shutdown: &watch::Receiver<bool>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "max connections reached: {prev_count}/{max_conn}, rejecting {peer_addr}"
            ));
            drop(stream);
            return;
        }
    }

    logger::log_debug(&format!("accepted connection from {peer_addr}"));

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        shutdown.clone(),
    );
}

/// Serve one connection in a spawned task.
///
/// Keep-alive and the header read timeout come from the performance
/// config; without `read_header_timeout` the header read falls back to
/// `read_timeout`. Read and write timeouts for the rest of each request are
/// applied per request by the handler. A shutdown notice lets in-flight
/// requests finish and then closes the connection.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let perf = &state.config.performance;
        let header_timeout = header_read_timeout(perf.read_header_timeout, perf.read_timeout);

        let mut builder = http1::Builder::new();
        builder.keep_alive(perf.keep_alive);
        if let Some(timeout) = header_timeout {
            builder.timer(TokioTimer::new()).header_read_timeout(timeout);
        }

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, peer_addr, Arc::clone(&service_state))
            }),
        );

        let mut conn = std::pin::pin!(conn);
        let result = tokio::select! {
            result = conn.as_mut() => result,
            _ = shutdown.changed() => {
                conn.as_mut().graceful_shutdown();
                conn.as_mut().await
            }
        };

        if let Err(err) = result {
            logger::log_connection_error(&peer_addr, &err);
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Header read timeout in effect, `None` when both settings are 0
fn header_read_timeout(read_header_timeout: u64, read_timeout: u64) -> Option<Duration> {
    [read_header_timeout, read_timeout]
        .into_iter()
        .find(|&secs| secs > 0)
        .map(Duration::from_secs)
}
