// Connection handling module
// Serves a single accepted TCP connection

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Serve an accepted connection on a local task.
///
/// The task:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 keep-alive
/// 3. Bounds the wait for each request's headers; body reads are bounded per
///    request by the router
/// 4. Serves every request on the connection through the router
/// 5. Decrements the active connection counter when done
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    active: &Arc<AtomicUsize>,
) {
    active.fetch_add(1, Ordering::SeqCst);
    let state = Arc::clone(state);
    let active = Arc::clone(active);

    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let keep_alive = performance.keep_alive_timeout > 0;
        // Idle keep-alive connections wait for headers too
        let header_timeout = Duration::from_secs(if keep_alive {
            performance.keep_alive_timeout
        } else {
            performance.read_timeout
        });

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .keep_alive(keep_alive)
            .header_read_timeout(header_timeout);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, Arc::clone(&service_state), Some(peer_addr))
            }),
        );

        if let Err(err) = conn.await {
            if err.is_timeout() {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} closed after {}s without request headers",
                    header_timeout.as_secs()
                ));
            } else {
                logger::log_connection_error(&err);
            }
        }

        active.fetch_sub(1, Ordering::SeqCst);
    });
}
