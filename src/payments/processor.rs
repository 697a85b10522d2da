//! Downstream "process payment" capability and its fallback.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::payments::types::{DownstreamProcessingError, ProcessingOutcome};
use crate::rendezvous::TransferRequest;

/// External collaborator that actually moves the money.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Returns a processor reference on success.
    async fn process(&self, request: &TransferRequest) -> Result<String, DownstreamProcessingError>;
}

/// Why the fallback was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackCause {
    CircuitOpen,
    Downstream(DownstreamProcessingError),
}

impl std::fmt::Display for FallbackCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackCause::CircuitOpen => write!(f, "circuit open"),
            FallbackCause::Downstream(e) => write!(f, "{}", e),
        }
    }
}

/// Produces a degraded result. Must not fail.
pub trait Fallback: Send + Sync {
    fn fallback(&self, request: &TransferRequest, cause: &FallbackCause) -> ProcessingOutcome;
}

/// Default fallback: a sentinel degraded outcome carrying the cause.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentinelFallback;

impl Fallback for SentinelFallback {
    fn fallback(&self, request: &TransferRequest, cause: &FallbackCause) -> ProcessingOutcome {
        warn!(
            from = %request.from_account,
            to = %request.to_account,
            %cause,
            "Payment processing degraded"
        );
        ProcessingOutcome::Degraded {
            reason: cause.to_string(),
        }
    }
}

/// Processor that logs and acknowledges every payment.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingProcessor;

#[async_trait]
impl PaymentProcessor for LoggingProcessor {
    async fn process(&self, request: &TransferRequest) -> Result<String, DownstreamProcessingError> {
        let reference = uuid::Uuid::new_v4().to_string();
        info!(
            from = %request.from_account,
            to = %request.to_account,
            amount = %request.amount,
            %reference,
            "Processing payment"
        );
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> TransferRequest {
        TransferRequest {
            from_account: "acc-1".to_string(),
            to_account: "acc-2".to_string(),
            amount: dec!(12.50),
        }
    }

    #[test]
    fn test_sentinel_fallback() {
        let outcome = SentinelFallback.fallback(&request(), &FallbackCause::CircuitOpen);
        assert_eq!(
            outcome,
            ProcessingOutcome::Degraded {
                reason: "circuit open".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_logging_processor_returns_reference() {
        let reference = LoggingProcessor.process(&request()).await.unwrap();
        assert!(uuid::Uuid::parse_str(&reference).is_ok());
    }
}
