use axum::{
    extract::Request,
    http::{Method, Uri},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::time::Instant;
use tracing::{info, Level};

use crate::config::LoggingConfig;

/// Install the global fmt subscriber at the configured level.
///
/// Unknown levels fall back to INFO; `AppConfig` validation rejects them
/// before this point when loading from a file.
pub fn init_tracing(config: &LoggingConfig) {
    let level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
}

pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let remote_addr = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            request
                .headers()
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
        })
        .unwrap_or("-")
        .to_string();

    let response = next.run(request).await;

    info!(
        target: "access_log",
        timestamp = %Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        remote_addr = %remote_addr,
        request = %format_request(&method, &uri),
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        user_agent = %user_agent,
        "request completed"
    );

    response
}

fn format_request(method: &Method, uri: &Uri) -> String {
    format!("{} {}", method, uri)
}
