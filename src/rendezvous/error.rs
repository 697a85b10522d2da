use thiserror::Error;

use crate::cache::CacheError;
use crate::messaging::PublishError;
use crate::rendezvous::types::CorrelationId;

/// Errors surfaced by a validation round trip.
#[derive(Debug, Error)]
pub enum RendezvousError {
    /// The command was never sent; nothing to wait for.
    #[error("Failed to publish validation command: {0}")]
    Publish(#[from] PublishError),

    /// No response within the retry budget.
    #[error("No validation response for {correlation_id} after {attempts} attempts")]
    Timeout {
        correlation_id: CorrelationId,
        attempts: u32,
    },

    /// The pending placeholder could not be written.
    #[error("Failed to register rendezvous: {0}")]
    Cache(#[from] CacheError),
}

impl RendezvousError {
    /// Whether the caller may retry the whole operation with a new correlation id.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RendezvousError::Timeout { .. })
    }
}

/// Result type for rendezvous operations.
pub type RendezvousResult<T> = Result<T, RendezvousError>;
