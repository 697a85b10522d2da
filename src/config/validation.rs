//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! constraints. Every problem is reported, not just the first.

use crate::config::schema::ServiceConfig;
use std::fmt;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let messaging = &config.messaging;
    if messaging.command_topic.is_empty() {
        errors.push(ValidationError::new("messaging.command_topic", "must not be empty"));
    }
    if messaging.response_topic.is_empty() {
        errors.push(ValidationError::new("messaging.response_topic", "must not be empty"));
    }
    if !messaging.command_topic.is_empty() && messaging.command_topic == messaging.response_topic {
        errors.push(ValidationError::new(
            "messaging.response_topic",
            "must differ from command_topic",
        ));
    }
    if messaging.partitions == 0 {
        errors.push(ValidationError::new("messaging.partitions", "must be at least 1"));
    }

    let cache = &config.cache;
    if cache.key_prefix.is_empty() {
        errors.push(ValidationError::new("cache.key_prefix", "must not be empty"));
    }
    if cache.pending_ttl_secs == 0 {
        errors.push(ValidationError::new("cache.pending_ttl_secs", "must be greater than 0"));
    }
    if cache.ingest_write_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "cache.ingest_write_timeout_ms",
            "must be greater than 0",
        ));
    }

    let rendezvous = &config.rendezvous;
    if rendezvous.max_attempts == 0 {
        errors.push(ValidationError::new("rendezvous.max_attempts", "must be at least 1"));
    }
    if rendezvous.base_delay_ms == 0 {
        errors.push(ValidationError::new("rendezvous.base_delay_ms", "must be greater than 0"));
    }
    if rendezvous.max_delay_ms < rendezvous.base_delay_ms {
        errors.push(ValidationError::new(
            "rendezvous.max_delay_ms",
            format!("must be at least base_delay_ms ({})", rendezvous.base_delay_ms),
        ));
    }

    let breaker = &config.circuit_breaker;
    if breaker.sliding_window_size == 0 {
        errors.push(ValidationError::new(
            "circuit_breaker.sliding_window_size",
            "must be at least 1",
        ));
    }
    if breaker.minimum_number_of_calls == 0
        || breaker.minimum_number_of_calls > breaker.sliding_window_size
    {
        errors.push(ValidationError::new(
            "circuit_breaker.minimum_number_of_calls",
            "must be between 1 and sliding_window_size",
        ));
    }
    if breaker.failure_threshold >= breaker.sliding_window_size {
        errors.push(ValidationError::new(
            "circuit_breaker.failure_threshold",
            "must be lower than sliding_window_size",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServiceConfig::default();
        config.messaging.response_topic = config.messaging.command_topic.clone();
        config.rendezvous.max_attempts = 0;
        config.circuit_breaker.failure_threshold = 10;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "messaging.response_topic",
                "rendezvous.max_attempts",
                "circuit_breaker.failure_threshold",
            ]
        );
    }

    #[test]
    fn test_max_delay_below_base() {
        let mut config = ServiceConfig::default();
        config.rendezvous.base_delay_ms = 100;
        config.rendezvous.max_delay_ms = 50;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("base_delay_ms (100)"));
    }
}
