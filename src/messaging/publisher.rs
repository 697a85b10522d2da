//! Validation command publisher.

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::MessagingConfig;
use crate::messaging::bus::{Ack, BusError, MessageBus};
use crate::messaging::codec::{self, CodecError};
use crate::observability::metrics;
use crate::rendezvous::ValidationCommand;

/// The command never reached the broker.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Record codec error: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Sends commands to the command topic, keyed by source account so commands
/// for the same account stay ordered. Does not retry.
#[derive(Clone)]
pub struct CommandPublisher {
    bus: Arc<dyn MessageBus>,
    topic: String,
    schema_id: u32,
}

impl CommandPublisher {
    pub fn new(bus: Arc<dyn MessageBus>, config: &MessagingConfig) -> Self {
        Self {
            bus,
            topic: config.command_topic.clone(),
            schema_id: config.command_schema_id,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub async fn publish(&self, command: &ValidationCommand) -> Result<Ack, PublishError> {
        let frame = codec::encode(self.schema_id, command)?;
        let ack = self
            .bus
            .publish(&self.topic, &command.from_account, frame)
            .await?;

        metrics::record_published(&self.topic);
        debug!(
            correlation_id = %command.id,
            topic = %ack.topic,
            partition = ack.partition,
            offset = ack.offset,
            "Validation command published"
        );
        Ok(ack)
    }
}
