use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
