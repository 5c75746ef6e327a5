//! gRPC server module for the multiplexed gateway entry point.

mod server;
mod service;

pub use server::GrpcServer;
pub use service::GatewayServiceImpl;

// Include the generated protobuf code
pub mod proto {
    pub mod turnstile {
        pub mod gateway {
            pub mod v1 {
                tonic::include_proto!("turnstile.gateway.v1");
            }
        }
    }
}

// Re-export commonly used types
pub use proto::turnstile::gateway::v1::{
    gateway_server::GatewayServer, InvokeRequest, InvokeResponse,
};
