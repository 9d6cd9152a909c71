//! Request logging middleware.

use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};

/// Requests slower than this are logged at warn level. Streams count until
/// their headers go out, not until the body ends.
const SLOW_REQUEST: Duration = Duration::from_secs(5);

/// Log method, path, status, and elapsed time for every request.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();

    let status = response.status().as_u16();
    let elapsed_ms = elapsed.as_millis() as u64;
    if is_slow(elapsed) {
        warn!(%method, %path, status, elapsed_ms, "slow request");
    } else {
        info!(%method, %path, status, elapsed_ms, "request handled");
    }

    response
}

fn is_slow(elapsed: Duration) -> bool {
    elapsed > SLOW_REQUEST
}
