use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings for the authorization middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Path prefix of the application, used to build the sign-in redirect
    pub prefix: String,
    /// Cookie carrying the bearer session token
    pub session_cookie: String,
    /// Cookie carrying an optional consistency timestamp for checks
    pub check_ts_cookie: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            session_cookie: "session".to_string(),
            check_ts_cookie: "check_ts".to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Loads settings from an optional YAML/TOML file overlaid with
    /// `NIO_GATEWAY__*` environment variables.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix("NIO_GATEWAY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Sign-in location that returns the caller to `back` afterwards.
    pub fn signin_uri(&self, back: &str) -> String {
        format!("{}/signin?back={}", self.prefix, urlencoding::encode(back))
    }
}
