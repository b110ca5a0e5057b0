use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use std::{net::SocketAddr, time::Instant};

/// Request logger wrapped around the whole router.
///
/// Emits one line per request after the inner handler has produced its
/// response: method, path, remote address, status and elapsed time. The
/// response itself is passed through untouched.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_owned());

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed();

    tracing::info!(
        %remote,
        status = response.status().as_u16(),
        ?elapsed,
        "{} {}",
        method,
        path
    );

    response
}
