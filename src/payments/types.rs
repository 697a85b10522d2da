//! Payment pipeline types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rendezvous::{CorrelationId, RequestId};

/// Failure reported by the downstream payment processor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Payment processing failed: {0}")]
pub struct DownstreamProcessingError(pub String);

/// Result of the processing step; never an error once it leaves the invoker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessingOutcome {
    /// Downstream processed the payment.
    Completed { reference: String },
    /// Fallback result substituted for a failed or short-circuited call.
    Degraded { reason: String },
    /// Validation rejected the transfer, processing was skipped.
    Rejected,
}

impl ProcessingOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ProcessingOutcome::Degraded { .. })
    }
}

/// Returned to the caller of "validate transfer payment".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub id: RequestId,
    pub correlation_id: CorrelationId,
    pub valid: bool,
    pub outcome: ProcessingOutcome,
}
