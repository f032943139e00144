//! Request timing and access logging.

use axum::extract::{ConnectInfo, OriginalUri};
use axum::http::request::Parts;
use axum::http::{header, Method};
use axum::response::Response;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::problem::{map_error, HandlerError};

/// Request attributes captured before the request is handed on.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub client_ip: String,
    pub method: Method,
    /// Path and query as received, before any router nesting.
    pub uri: String,
    pub protocol: String,
    pub user_agent: String,
}

impl RequestInfo {
    pub fn from_parts(parts: &Parts) -> Self {
        let client_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map_or_else(|| "-".to_string(), |ConnectInfo(addr)| addr.ip().to_string());
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |OriginalUri(uri)| uri);
        let uri = uri
            .path_and_query()
            .map_or_else(|| uri.to_string(), |pq| pq.as_str().to_string());
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("-")
            .to_string();

        Self {
            client_ip,
            method: parts.method.clone(),
            uri,
            protocol: format!("{:?}", parts.version),
            user_agent,
        }
    }
}

/// Timing of one observed request.
#[derive(Debug, Clone)]
pub struct Observation {
    pub info: RequestInfo,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub status: u16,
}

impl Observation {
    /// Closes the observation of a request started at `started_at`.
    pub fn finish(info: RequestInfo, started_at: DateTime<Utc>, elapsed: Duration, status: u16) -> Self {
        Self {
            info,
            started_at,
            finished_at: Utc::now(),
            elapsed,
            status,
        }
    }
}

/// Runs `work`, renders its error if any, and logs one access line.
pub async fn observe<F>(info: RequestInfo, work: F) -> Response
where
    F: Future<Output = Result<Response, HandlerError>>,
{
    let started_at = Utc::now();
    let start = Instant::now();
    let result = work.await;
    let elapsed = start.elapsed();

    let response = match result {
        Ok(response) => response,
        Err(err) => {
            let (response, message) = map_error(err);
            if let Some(message) = message {
                error!(
                    method = %info.method,
                    uri = %info.uri,
                    error = %message,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "request failed"
                );
            }
            response
        }
    };

    let observation = Observation::finish(info, started_at, elapsed, response.status().as_u16());
    log_access(&observation);
    response
}

fn log_access(o: &Observation) {
    info!(
        client_ip = %o.info.client_ip,
        method = %o.info.method,
        uri = %o.info.uri,
        protocol = %o.info.protocol,
        status = o.status,
        user_agent = %o.info.user_agent,
        started_at = %o.started_at.to_rfc3339(),
        finished_at = %o.finished_at.to_rfc3339(),
        elapsed_ms = o.elapsed.as_millis() as u64,
        "request"
    );
}
