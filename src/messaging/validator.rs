//! Remote transfer validator worker.
//!
//! Consumes commands in the shared validator group, applies a
//! [`ValidationRule`] and publishes the verdict on the response topic.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::MessagingConfig;
use crate::messaging::bus::{Ack, BusError, Delivery, MessageBus, Subscription};
use crate::messaging::codec;
use crate::messaging::publisher::PublishError;
use crate::observability::metrics;
use crate::rendezvous::{ValidationCommand, ValidationResponse};

/// Decides whether a transfer command is acceptable.
#[async_trait]
pub trait ValidationRule: Send + Sync {
    async fn validate(&self, command: &ValidationCommand) -> bool;
}

/// Accepts positive amounts between two distinct, non-empty accounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicTransferRule;

#[async_trait]
impl ValidationRule for BasicTransferRule {
    async fn validate(&self, command: &ValidationCommand) -> bool {
        command.amount > Decimal::ZERO
            && !command.from_account.trim().is_empty()
            && !command.to_account.trim().is_empty()
            && command.from_account != command.to_account
    }
}

pub struct TransferValidator {
    bus: Arc<dyn MessageBus>,
    rule: Arc<dyn ValidationRule>,
    command_topic: String,
    response_topic: String,
    group: String,
    command_schema_id: u32,
    response_schema_id: u32,
}

impl TransferValidator {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        rule: Arc<dyn ValidationRule>,
        config: &MessagingConfig,
    ) -> Self {
        Self {
            bus,
            rule,
            command_topic: config.command_topic.clone(),
            response_topic: config.response_topic.clone(),
            group: config.validator_group.clone(),
            command_schema_id: config.command_schema_id,
            response_schema_id: config.response_schema_id,
        }
    }

    /// Join the validator group, then serve commands in a background task.
    pub async fn spawn(self, shutdown: broadcast::Receiver<()>) -> Result<JoinHandle<()>, BusError> {
        let subscription = self.bus.subscribe(&self.command_topic, &self.group).await?;
        info!(topic = %self.command_topic, group = %self.group, "Transfer validator subscribed");
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
                        warn!(topic = %self.command_topic, "Command subscription closed");
                        break;
                    };
                    if let Err(e) = self.handle(&delivery).await {
                        warn!(error = %e, offset = delivery.offset, "Failed to answer validation command");
                    }
                    if let Err(e) = subscription.ack(&delivery).await {
                        warn!(error = %e, offset = delivery.offset, "Failed to acknowledge command");
                    }
                }
                _ = shutdown.recv() => {
                    info!("Transfer validator received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Validate one command and publish the response.
    pub async fn handle(&self, delivery: &Delivery) -> Result<Ack, PublishError> {
        let command: ValidationCommand = codec::decode(self.command_schema_id, &delivery.payload)?;
        let response = ValidationResponse {
            id: command.id,
            valid: self.rule.validate(&command).await,
        };

        let frame = codec::encode(self.response_schema_id, &response)?;
        let key = Uuid::new_v4().to_string();
        let ack = self.bus.publish(&self.response_topic, &key, frame).await?;
        metrics::record_published(&self.response_topic);
        info!(
            correlation_id = %response.id,
            valid = response.valid,
            "Published validation response"
        );
        Ok(ack)
    }
}
