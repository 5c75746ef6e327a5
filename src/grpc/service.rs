//! Gateway service implementation.

use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{debug, error, instrument, warn};

use super::proto::turnstile::gateway::v1::{
    gateway_server::Gateway, InvokeRequest, InvokeResponse,
};

use crate::admission::{AdmissionGuard, CallContext, Channel, CounterStore};
use crate::error::TurnstileError;
use crate::ops::OperationRegistry;

/// Implementation of the multiplexed Gateway gRPC interface.
pub struct GatewayServiceImpl<S: CounterStore> {
    /// The admission guard every call passes through
    guard: Arc<AdmissionGuard<S>>,
    /// Routing metadata and handlers for all exposed operations
    registry: Arc<OperationRegistry>,
}

impl<S: CounterStore> GatewayServiceImpl<S> {
    /// Create a new GatewayServiceImpl with the given guard and registry.
    pub fn new(guard: Arc<AdmissionGuard<S>>, registry: Arc<OperationRegistry>) -> Self {
        Self { guard, registry }
    }
}

#[tonic::async_trait]
impl<S: CounterStore + 'static> Gateway for GatewayServiceImpl<S> {
    /// Invoke a named operation.
    ///
    /// The call passes through the admission guard first; its handler runs
    /// only if every applicable tier has remaining quota.
    #[instrument(
        skip(self, request),
        fields(operation = %request.get_ref().operation)
    )]
    async fn invoke(
        &self,
        request: Request<InvokeRequest>,
    ) -> Result<Response<InvokeResponse>, Status> {
        let remote_addr = request.remote_addr();
        let forwarded_for = request
            .metadata()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let req = request.into_inner();

        if req.operation.is_empty() {
            warn!("Received invoke request with empty operation");
            return Err(Status::invalid_argument("operation is required"));
        }

        let operation = self.registry.get(&req.operation).ok_or_else(|| {
            warn!(operation = %req.operation, "Unknown operation");
            Status::not_found(format!("unknown operation '{}'", req.operation))
        })?;

        let call = CallContext {
            channel: Channel::Multiplexed,
            remote_addr,
            forwarded_for,
            operation: operation.name.clone(),
            group: operation.group.clone(),
        };

        match self.guard.admit(&call).await {
            Ok(()) => {}
            Err(TurnstileError::Throttled { tier, retry_after }) => {
                debug!(
                    operation = %call.operation,
                    tier = %tier,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "Call throttled"
                );
                let mut status =
                    Status::resource_exhausted(format!("rate limit exceeded on tier '{tier}'"));
                if let Ok(value) = retry_after.as_millis().to_string().parse() {
                    status.metadata_mut().insert("retry-after-ms", value);
                }
                return Err(status);
            }
            Err(err @ TurnstileError::Store(_)) => {
                error!(operation = %call.operation, error = %err, "Counter store failure");
                return Err(Status::unavailable("admission check unavailable"));
            }
            Err(err) => {
                error!(operation = %call.operation, error = %err, "Admission check failed");
                return Err(Status::internal("admission check failed"));
            }
        }

        let payload = (operation.handler)(req.arguments).await.map_err(|err| {
            error!(operation = %call.operation, error = %err, "Operation handler failed");
            Status::internal("operation failed")
        })?;

        debug!(operation = %call.operation, "Operation completed");

        Ok(Response::new(InvokeResponse {
            payload: payload.to_string(),
        }))
    }
}
