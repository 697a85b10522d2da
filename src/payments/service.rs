//! "Validate transfer payment" pipeline.

use std::sync::Arc;
use tracing::info;

use crate::payments::types::{ProcessingOutcome, TransferReceipt};
use crate::rendezvous::{RendezvousCoordinator, RendezvousResult, RequestId, TransferRequest};
use crate::resilience::GuardedInvoker;

/// Validates a transfer through the rendezvous, then processes it behind the
/// circuit breaker. Rejected transfers are not processed.
pub struct TransferService {
    coordinator: Arc<RendezvousCoordinator>,
    invoker: GuardedInvoker,
}

impl TransferService {
    pub fn new(coordinator: Arc<RendezvousCoordinator>, invoker: GuardedInvoker) -> Self {
        Self {
            coordinator,
            invoker,
        }
    }

    pub fn invoker(&self) -> &GuardedInvoker {
        &self.invoker
    }

    pub async fn transfer(
        &self,
        request_id: RequestId,
        request: &TransferRequest,
    ) -> RendezvousResult<TransferReceipt> {
        let validation = self.coordinator.validate(request_id, request).await?;

        let outcome = if validation.valid {
            self.invoker.invoke(request).await
        } else {
            info!(%request_id, correlation_id = %validation.correlation_id, "Transfer rejected by validator");
            ProcessingOutcome::Rejected
        };

        Ok(TransferReceipt {
            id: request_id,
            correlation_id: validation.correlation_id,
            valid: validation.valid,
            outcome,
        })
    }
}
