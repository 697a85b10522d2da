//! Circuit-broken invocation of the payment processor.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::observability::metrics;
use crate::payments::processor::{Fallback, FallbackCause, PaymentProcessor};
use crate::payments::types::ProcessingOutcome;
use crate::rendezvous::TransferRequest;
use crate::resilience::circuit_breaker::{CallError, CircuitBreaker, CircuitState};

/// Calls downstream through a [`CircuitBreaker`], substituting the fallback on
/// failure or when the circuit is open. `invoke` always yields an outcome.
pub struct GuardedInvoker {
    breaker: CircuitBreaker,
    downstream: Arc<dyn PaymentProcessor>,
    fallback: Arc<dyn Fallback>,
}

impl GuardedInvoker {
    pub fn new(
        breaker: CircuitBreaker,
        downstream: Arc<dyn PaymentProcessor>,
        fallback: Arc<dyn Fallback>,
    ) -> Self {
        Self {
            breaker,
            downstream,
            fallback,
        }
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub async fn invoke(&self, request: &TransferRequest) -> ProcessingOutcome {
        let name = self.breaker.name();
        match self.breaker.call(self.downstream.process(request)).await {
            Ok(reference) => {
                debug!(circuit = %name, %reference, "Guarded call succeeded");
                metrics::record_guarded_call(name, "success");
                ProcessingOutcome::Completed { reference }
            }
            Err(CallError::Rejected { state, .. }) => {
                debug!(circuit = %name, %state, "Guarded call short-circuited");
                metrics::record_guarded_call(name, "rejected");
                self.fallback.fallback(request, &FallbackCause::CircuitOpen)
            }
            Err(CallError::Failed(e)) => {
                warn!(circuit = %name, error = %e, "Guarded call failed");
                metrics::record_guarded_call(name, "failure");
                self.fallback.fallback(request, &FallbackCause::Downstream(e))
            }
        }
    }
}
