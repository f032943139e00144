use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{NioError, Result};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:50052";
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Connection settings for the check service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// gRPC endpoint URI of the check service
    pub endpoint: String,
    /// Upper bound for a single check, list or write call in milliseconds
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Reads `NIO_CHECK_ENDPOINT` and `NIO_CHECK_TIMEOUT_MS`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let endpoint =
            std::env::var("NIO_CHECK_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let timeout_ms = match std::env::var("NIO_CHECK_TIMEOUT_MS") {
            Ok(raw) => raw.parse().map_err(|_| {
                NioError::Configuration(format!("NIO_CHECK_TIMEOUT_MS is not a number: {raw}"))
            })?,
            Err(_) => DEFAULT_TIMEOUT_MS,
        };
        Ok(Self {
            endpoint,
            timeout_ms,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
