//! Configuration loading from disk.

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [messaging]
            command_topic = "commands"
            response_topic = "responses"

            [circuit_breaker]
            sliding_window_size = 2
            minimum_number_of_calls = 1
            failure_threshold = 0
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.messaging.command_topic, "commands");
        assert_eq!(config.circuit_breaker.sliding_window_size, 2);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/rendezvous.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = parse_config("[rendezvous]\nmax_attempts = 0\n").unwrap_err();
        assert!(err.to_string().starts_with("Validation failed: rendezvous.max_attempts"));
    }

    #[test]
    fn test_malformed_toml() {
        let err = parse_config("[rendezvous\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
