//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the rendezvous service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Topics, consumer groups and wire schema ids.
    pub messaging: MessagingConfig,

    /// Shared cache settings.
    pub cache: CacheConfig,

    /// Await loop policy.
    pub rendezvous: RendezvousConfig,

    /// Circuit breaker around payment processing.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Message bus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Topic carrying validation commands (keyed by source account).
    pub command_topic: String,

    /// Topic carrying validation responses.
    pub response_topic: String,

    /// Consumer group shared by all validator workers.
    pub validator_group: String,

    /// Prefix of the per-instance response consumer group.
    /// The instance namespace is appended so every instance sees every response.
    pub response_group_prefix: String,

    /// Schema registry id of the command record.
    pub command_schema_id: u32,

    /// Schema registry id of the response record.
    pub response_schema_id: u32,

    /// Partitions per topic for the in-process bus.
    pub partitions: u32,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            command_topic: "transfer-payment-command".to_string(),
            response_topic: "validate-transfer-payment-response".to_string(),
            validator_group: "validateTransferPaymentRequest".to_string(),
            response_group_prefix: "validateTransferPaymentResponse".to_string(),
            command_schema_id: 1,
            response_schema_id: 2,
            partitions: 3,
        }
    }
}

/// Shared cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Prefix of every rendezvous key.
    pub key_prefix: String,

    /// TTL of a pending placeholder, so leaked keys expire on their own.
    pub pending_ttl_secs: u64,

    /// Upper bound on one ingestor cache write in milliseconds.
    pub ingest_write_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: "transferPaymentRequestId".to_string(),
            pending_ttl_secs: 60,
            ingest_write_timeout_ms: 500,
        }
    }
}

impl CacheConfig {
    pub fn pending_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_ttl_secs)
    }

    pub fn ingest_write_timeout(&self) -> Duration {
        Duration::from_millis(self.ingest_write_timeout_ms)
    }
}

/// Delay growth between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    Fixed,
    Exponential,
}

/// Await loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RendezvousConfig {
    /// Retries after the initial read before giving up.
    pub max_attempts: u32,

    /// Base delay between polls in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay between polls in milliseconds.
    pub max_delay_ms: u64,

    /// Fixed or exponential spacing.
    pub strategy: BackoffStrategy,
}

impl Default for RendezvousConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            base_delay_ms: 10,
            max_delay_ms: 500,
            strategy: BackoffStrategy::Exponential,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Logical operation the breaker guards.
    pub name: String,

    /// Number of most recent calls considered.
    pub sliding_window_size: usize,

    /// Calls recorded before the breaker may trip.
    pub minimum_number_of_calls: usize,

    /// Failures tolerated inside the window; one more opens the circuit.
    pub failure_threshold: usize,

    /// Cool-down before a trial call is let through, in milliseconds.
    pub wait_duration_in_open_state_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            name: "processPayment".to_string(),
            sliding_window_size: 10,
            minimum_number_of_calls: 5,
            failure_threshold: 4,
            wait_duration_in_open_state_ms: 30_000,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn wait_duration_in_open_state(&self) -> Duration {
        Duration::from_millis(self.wait_duration_in_open_state_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
