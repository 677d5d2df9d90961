// Server loop module
// Accepts connections until a shutdown signal arrives, then drains

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::{accept_connection, connection_timeout};
use crate::config::AppState;
use crate::logger;

/// Poll interval while waiting for in-flight connections after shutdown
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Accept loop for the HTTP transport
///
/// Returns once `shutdown` fires and in-flight connections have finished or the
/// connection timeout has elapsed.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
) -> Result<(), Box<dyn std::error::Error>> {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = shutdown.notified() => {
                drop(listener);
                logger::log_shutdown(active_connections.load(Ordering::SeqCst));
                drain_connections(&active_connections, connection_timeout(&state)).await;
                return Ok(());
            }
        }
    }
}

/// Wait until no connection is active or `limit` has elapsed
async fn drain_connections(active: &AtomicUsize, limit: Duration) {
    let deadline = tokio::time::Instant::now() + limit;
    while active.load(Ordering::SeqCst) > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(DRAIN_POLL).await;
    }
    let remaining = active.load(Ordering::SeqCst);
    if remaining > 0 {
        logger::log_warning(&format!(
            "Shutting down with {remaining} connection(s) still open"
        ));
    }
}
