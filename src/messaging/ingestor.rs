//! Response ingestion.
//!
//! # Responsibilities
//! - Consume validation responses with a group owned by this instance
//! - Resolve the matching pending slot under this instance's namespace
//! - Acknowledge every delivery, matched or not
//!
//! # Design Decisions
//! - One conditional write per message; unknown ids are dropped silently
//! - Cache writes are bounded by a timeout so a slow store cannot stall the stream
//! - Decode and cache failures are logged, never fatal

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use crate::cache::StateCache;
use crate::config::ServiceConfig;
use crate::messaging::bus::{BusError, Delivery, MessageBus, Subscription};
use crate::messaging::codec;
use crate::observability::metrics;
use crate::rendezvous::{InstanceNamespace, ValidationResponse};

/// What happened to one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestResult {
    /// A pending slot moved to resolved.
    Resolved,
    /// No pending slot: foreign instance, expired, or duplicate.
    Unmatched,
    /// Payload could not be decoded.
    Malformed,
    /// The cache write failed or timed out.
    CacheFailed,
}

impl IngestResult {
    fn as_label(self) -> &'static str {
        match self {
            IngestResult::Resolved => "resolved",
            IngestResult::Unmatched => "unmatched",
            IngestResult::Malformed => "malformed",
            IngestResult::CacheFailed => "cache_failed",
        }
    }
}

pub struct ResponseIngestor {
    namespace: InstanceNamespace,
    key_prefix: String,
    states: StateCache,
    topic: String,
    group: String,
    schema_id: u32,
    write_timeout: Duration,
}

impl ResponseIngestor {
    pub fn new(namespace: InstanceNamespace, states: StateCache, config: &ServiceConfig) -> Self {
        let group = format!("{}-{}", config.messaging.response_group_prefix, namespace);
        Self {
            namespace,
            key_prefix: config.cache.key_prefix.clone(),
            states,
            topic: config.messaging.response_topic.clone(),
            group,
            schema_id: config.messaging.response_schema_id,
            write_timeout: config.cache.ingest_write_timeout(),
        }
    }

    /// Consumer group of this instance; unique per namespace so every
    /// instance observes the whole response stream.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Join the response topic, then consume in a background task until shutdown.
    ///
    /// The subscription is registered before this returns, so responses
    /// published afterwards are not missed.
    pub async fn spawn(
        self,
        bus: Arc<dyn MessageBus>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<JoinHandle<()>, BusError> {
        let subscription = bus.subscribe(&self.topic, &self.group).await?;
        info!(
            topic = %self.topic,
            group = %self.group,
            namespace = %self.namespace,
            "Response ingestor subscribed"
        );
        Ok(tokio::spawn(self.run(subscription, shutdown)))
    }

    pub async fn run(
        self,
        mut subscription: Box<dyn Subscription>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                delivery = subscription.recv() => {
                    let Some(delivery) = delivery else {
                        warn!(topic = %self.topic, "Response subscription closed");
                        break;
                    };
                    self.handle(&delivery).await;
                    if let Err(e) = subscription.ack(&delivery).await {
                        warn!(error = %e, offset = delivery.offset, "Failed to acknowledge response");
                    }
                }
                _ = shutdown.recv() => {
                    info!("Response ingestor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Apply one delivery to the cache.
    pub async fn handle(&self, delivery: &Delivery) -> IngestResult {
        let result = self.apply(delivery).await;
        metrics::record_ingested(result.as_label());
        result
    }

    async fn apply(&self, delivery: &Delivery) -> IngestResult {
        let response: ValidationResponse = match codec::decode(self.schema_id, &delivery.payload) {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    error = %e,
                    partition = delivery.partition,
                    offset = delivery.offset,
                    "Dropping undecodable validation response"
                );
                return IngestResult::Malformed;
            }
        };

        let key = self.namespace.key_for(&self.key_prefix, &response.id);
        let write = self.states.resolve_if_pending(&key, response.valid);
        match time::timeout(self.write_timeout, write).await {
            Ok(Ok(true)) => {
                info!(cache_key = %key, valid = response.valid, "Cache updated with validation response");
                IngestResult::Resolved
            }
            Ok(Ok(false)) => {
                debug!(correlation_id = %response.id, "No pending rendezvous for response");
                IngestResult::Unmatched
            }
            Ok(Err(e)) => {
                warn!(cache_key = %key, error = %e, "Cache write failed for validation response");
                IngestResult::CacheFailed
            }
            Err(_) => {
                warn!(cache_key = %key, timeout_ms = self.write_timeout.as_millis() as u64, "Cache write timed out");
                IngestResult::CacheFailed
            }
        }
    }
}
