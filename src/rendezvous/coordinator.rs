//! Validation round trip through the shared cache.
//!
//! # Flow
//! ```text
//! mint correlation id → write Pending → publish command
//!     → poll cache (immediate read, then one read per retry after a backoff delay)
//!     → Resolved{valid} | retries exhausted
//!     → delete key (every exit path, including cancellation)
//! ```

use std::sync::Arc;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheClient, StateCache};
use crate::config::ServiceConfig;
use crate::messaging::{CommandPublisher, MessageBus};
use crate::observability::metrics;
use crate::rendezvous::error::{RendezvousError, RendezvousResult};
use crate::rendezvous::types::{
    CacheKey, CorrelationId, InstanceNamespace, RequestId, ResponseState, TransferRequest,
    ValidationCommand, ValidationOutcome,
};
use crate::resilience::PollPolicy;

/// Owns one rendezvous key and deletes it exactly once.
///
/// `release` deletes inline; if the guard is dropped first (the validate
/// future was cancelled) the delete is spawned onto the runtime instead.
struct SlotGuard {
    states: StateCache,
    key: Option<CacheKey>,
}

impl SlotGuard {
    fn new(states: StateCache, key: CacheKey) -> Self {
        Self {
            states,
            key: Some(key),
        }
    }

    /// The key stays owned until the delete completes, so a release cancelled
    /// mid-delete still falls back to the spawned delete in `Drop`.
    async fn release(mut self) {
        if let Some(key) = self.key.as_ref() {
            remove_slot(&self.states, key).await;
        }
        self.key = None;
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let states = self.states.clone();
                handle.spawn(async move {
                    remove_slot(&states, &key).await;
                });
            }
            Err(_) => warn!(cache_key = %key, "No runtime to clean up rendezvous key, leaving it to expire"),
        }
    }
}

async fn remove_slot(states: &StateCache, key: &CacheKey) {
    match states.remove(key).await {
        Ok(removed) => debug!(cache_key = %key, removed, "Deleted rendezvous key"),
        Err(e) => warn!(cache_key = %key, error = %e, "Failed to delete rendezvous key"),
    }
}

pub struct RendezvousCoordinator {
    namespace: InstanceNamespace,
    key_prefix: String,
    states: StateCache,
    publisher: CommandPublisher,
    policy: PollPolicy,
}

impl RendezvousCoordinator {
    pub fn new(
        namespace: InstanceNamespace,
        key_prefix: impl Into<String>,
        states: StateCache,
        publisher: CommandPublisher,
        policy: PollPolicy,
    ) -> Self {
        Self {
            namespace,
            key_prefix: key_prefix.into(),
            states,
            publisher,
            policy,
        }
    }

    /// Build from configuration against the given bus and cache.
    pub fn from_config(
        config: &ServiceConfig,
        namespace: InstanceNamespace,
        bus: Arc<dyn MessageBus>,
        cache: Arc<dyn CacheClient>,
    ) -> Self {
        Self::new(
            namespace,
            config.cache.key_prefix.clone(),
            StateCache::new(cache, config.cache.pending_ttl()),
            CommandPublisher::new(bus, &config.messaging),
            PollPolicy::from(&config.rendezvous),
        )
    }

    pub fn namespace(&self) -> &InstanceNamespace {
        &self.namespace
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn key_for(&self, id: &CorrelationId) -> CacheKey {
        self.namespace.key_for(&self.key_prefix, id)
    }

    /// Validate a transfer with the remote validator.
    ///
    /// Every call mints a fresh correlation id, so concurrent or repeated
    /// calls never share a slot.
    pub async fn validate(
        &self,
        request_id: RequestId,
        request: &TransferRequest,
    ) -> RendezvousResult<ValidationOutcome> {
        let correlation_id = CorrelationId::new();
        let key = self.key_for(&correlation_id);
        info!(
            %request_id,
            %correlation_id,
            cache_key = %key,
            "Validating transfer payment request"
        );

        let guard = SlotGuard::new(self.states.clone(), key.clone());
        let result = self.round_trip(correlation_id, &key, request).await;
        guard.release().await;

        let label = match &result {
            Ok(outcome) if outcome.valid => "valid",
            Ok(_) => "invalid",
            Err(RendezvousError::Timeout { .. }) => "timeout",
            Err(RendezvousError::Publish(_)) => "publish_error",
            Err(RendezvousError::Cache(_)) => "cache_error",
        };
        metrics::record_validation(label);
        result
    }

    async fn round_trip(
        &self,
        correlation_id: CorrelationId,
        key: &CacheKey,
        request: &TransferRequest,
    ) -> RendezvousResult<ValidationOutcome> {
        if let Err(e) = self.states.put_pending(key).await {
            error!(cache_key = %key, error = %e, "Failed to write pending placeholder");
            return Err(e.into());
        }
        debug!(cache_key = %key, "Cached pending placeholder");

        let command = ValidationCommand::for_request(correlation_id, request);
        if let Err(e) = self.publisher.publish(&command).await {
            error!(%correlation_id, error = %e, "Failed to publish validation command");
            return Err(e.into());
        }

        self.await_response(correlation_id, key).await
    }

    async fn await_response(
        &self,
        correlation_id: CorrelationId,
        key: &CacheKey,
    ) -> RendezvousResult<ValidationOutcome> {
        let mut attempt = 0;
        loop {
            match self.states.get(key).await {
                Ok(Some(ResponseState::Resolved { valid })) => {
                    metrics::record_poll_attempts(attempt);
                    info!(cache_key = %key, valid, attempt, "Validation response received");
                    return Ok(ValidationOutcome {
                        correlation_id,
                        valid,
                    });
                }
                Ok(_) => debug!(cache_key = %key, attempt, "Validation response not yet available"),
                Err(e) => warn!(cache_key = %key, attempt, error = %e, "Cache read failed, treating as unresolved"),
            }

            if attempt >= self.policy.max_attempts {
                metrics::record_poll_attempts(attempt);
                warn!(%correlation_id, attempts = attempt, "Validation response wait exhausted");
                return Err(RendezvousError::Timeout {
                    correlation_id,
                    attempts: attempt,
                });
            }

            attempt += 1;
            time::sleep(self.policy.delay_for(attempt)).await;
        }
    }
}
