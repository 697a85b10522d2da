//! Client contract of the message bus.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by bus operations.
#[derive(Debug, Error)]
pub enum BusError {
    /// Broker unreachable or refused the request.
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    /// The subscription was closed by the broker.
    #[error("Subscription closed for topic {0}")]
    Closed(String),
}

/// Broker-side receipt of a published record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
}

/// A record handed to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
    pub key: String,
    pub payload: Vec<u8>,
}

/// One consumer-group member's stream of records.
#[async_trait]
pub trait Subscription: Send {
    /// Next record, or `None` once the subscription is closed.
    async fn recv(&mut self) -> Option<Delivery>;

    /// Commit the record's offset for the group.
    async fn ack(&mut self, delivery: &Delivery) -> Result<(), BusError>;
}

/// Publish/subscribe with consumer groups and per-key partition ordering.
///
/// Networked brokers redeliver from the committed offset, giving
/// at-least-once delivery; adapters document their own guarantee.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Resolves once the broker has stored the record.
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<Ack, BusError>;

    /// Join `group` on `topic`. Records published after this call are delivered
    /// to exactly one member of each subscribed group.
    async fn subscribe(&self, topic: &str, group: &str) -> Result<Box<dyn Subscription>, BusError>;
}
