use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;

use crate::config::ClientConfig;
use crate::error::{NioError, Result};
use crate::proto::{
    CheckRequest, CheckResponse, CheckServiceClient, ListRequest, ListResponse, WriteRequest,
    WriteResponse,
};

/// Transport interface to the remote check service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckService: Send + Sync {
    async fn check(&self, request: CheckRequest) -> std::result::Result<CheckResponse, Status>;

    async fn list(&self, request: ListRequest) -> std::result::Result<ListResponse, Status>;

    /// Atomic write of every tuple in the request
    async fn write(&self, request: WriteRequest) -> std::result::Result<WriteResponse, Status>;
}

/// gRPC implementation backed by a tonic channel
#[derive(Debug, Clone)]
pub struct GrpcCheckService {
    client: CheckServiceClient<Channel>,
}

impl GrpcCheckService {
    pub fn from_channel(channel: Channel) -> Self {
        Self {
            client: CheckServiceClient::new(channel),
        }
    }

    /// Connects eagerly, failing if the endpoint is unreachable.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let channel = Self::endpoint(config)?.connect().await?;
        Ok(Self::from_channel(channel))
    }

    /// Defers connecting until the first call.
    pub fn connect_lazy(config: &ClientConfig) -> Result<Self> {
        let channel = Self::endpoint(config)?.connect_lazy();
        Ok(Self::from_channel(channel))
    }

    fn endpoint(config: &ClientConfig) -> Result<Endpoint> {
        Endpoint::from_shared(config.endpoint.clone()).map_err(|e| {
            NioError::Configuration(format!("invalid check endpoint {}: {e}", config.endpoint))
        })
    }
}

// The generated client needs `&mut self`; channels are cheap to clone.
#[async_trait]
impl CheckService for GrpcCheckService {
    async fn check(&self, request: CheckRequest) -> std::result::Result<CheckResponse, Status> {
        self.client
            .clone()
            .check(request)
            .await
            .map(tonic::Response::into_inner)
    }

    async fn list(&self, request: ListRequest) -> std::result::Result<ListResponse, Status> {
        self.client
            .clone()
            .list(request)
            .await
            .map(tonic::Response::into_inner)
    }

    async fn write(&self, request: WriteRequest) -> std::result::Result<WriteResponse, Status> {
        self.client
            .clone()
            .write(request)
            .await
            .map(tonic::Response::into_inner)
    }
}
