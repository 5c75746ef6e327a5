//! gRPC server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tracing::{error, info};

use super::proto::turnstile::gateway::v1::gateway_server::GatewayServer;
use super::service::GatewayServiceImpl;
use crate::admission::{AdmissionGuard, CounterStore};
use crate::error::{Result, TurnstileError};
use crate::ops::OperationRegistry;

/// gRPC server for the gateway service.
pub struct GrpcServer<S: CounterStore + 'static> {
    /// Address to bind to
    addr: SocketAddr,
    /// The admission guard shared by all calls
    guard: Arc<AdmissionGuard<S>>,
    /// The operation registry
    registry: Arc<OperationRegistry>,
}

impl<S: CounterStore + 'static> GrpcServer<S> {
    /// Create a new gRPC server.
    pub fn new(
        addr: SocketAddr,
        guard: Arc<AdmissionGuard<S>>,
        registry: Arc<OperationRegistry>,
    ) -> Self {
        Self {
            addr,
            guard,
            registry,
        }
    }

    /// Start the gRPC server.
    ///
    /// This method will block until the server is shut down.
    pub async fn serve(self) -> Result<()> {
        let service = GatewayServiceImpl::new(self.guard, self.registry);

        info!(addr = %self.addr, "Starting gRPC server for Gateway");

        Server::builder()
            .add_service(GatewayServer::new(service))
            .serve(self.addr)
            .await
            .map_err(|e| {
                error!(error = %e, "gRPC server failed");
                TurnstileError::Grpc(e)
            })
    }

    /// Start the gRPC server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send,
    {
        let service = GatewayServiceImpl::new(self.guard, self.registry);

        info!(
            addr = %self.addr,
            "Starting gRPC server for Gateway with graceful shutdown"
        );

        Server::builder()
            .add_service(GatewayServer::new(service))
            .serve_with_shutdown(self.addr, signal)
            .await
            .map_err(|e| {
                error!(error = %e, "gRPC server failed");
                TurnstileError::Grpc(e)
            })
    }
}
