use thiserror::Error;

#[derive(Error, Debug)]
pub enum NioError {
    /// The check service call failed. Carries the operation and its arguments.
    #[error("{op} {args}: {source}")]
    Transport {
        op: &'static str,
        args: String,
        #[source]
        source: tonic::Status,
    },

    /// The backend granted a relation without naming a principal.
    #[error("unexpected empty principal")]
    EmptyPrincipal,

    #[error("Connection error: {0}")]
    Connect(#[from] tonic::transport::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl NioError {
    pub fn transport(op: &'static str, args: impl Into<String>, source: tonic::Status) -> Self {
        Self::Transport {
            op,
            args: args.into(),
            source,
        }
    }

    /// gRPC status code of a transport failure.
    pub fn code(&self) -> Option<tonic::Code> {
        match self {
            NioError::Transport { source, .. } => Some(source.code()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, NioError>;
