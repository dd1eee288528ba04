use super::types::*;
use crate::config::{expand_env_vars, expand_tilde, unexpanded_env_vars};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const MIN_INTERVAL: Duration = Duration::from_secs(60);
/// Longest accepted poll interval (one week).
pub const MAX_INTERVAL: Duration = Duration::from_secs(7 * 24 * 3600);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string)
}

/// Parse and validate a YAML config after `$env{...}` expansion.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);

    check_unexpanded_vars(&yaml_string)?;

    let mut config: Config = serde_yaml::from_str(&yaml_string)?;

    if let OutputConfig::File { path } = &mut config.output {
        *path = expand_tilde(path);
    }

    validate_config(&config)?;

    Ok(config)
}

/// Checks for unexpanded environment variables and returns a helpful error
fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let unexpanded_vars = unexpanded_env_vars(yaml_string);

    if unexpanded_vars.is_empty() {
        return Ok(());
    }

    let error_msg = if unexpanded_vars.len() == 1 {
        format!(
            "Environment variable $env{{{0}}} is not set.\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variable: export {0}=...\n\
             2. Replace $env{{{0}}} in the config file with the actual value",
            unexpanded_vars[0]
        )
    } else {
        format!(
            "Environment variables are not set: {}\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variables (e.g., export SCW_SECRET_KEY=...)\n\
             2. Replace the variables in the config file with actual values",
            unexpanded_vars.join(", ")
        )
    };

    Err(ConfigError::Validation(error_msg))
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    validate_receiver(&config.receiver, &mut errors);
    validate_scaleway(&config.scaleway, &mut errors);

    if let OutputConfig::File { path } = &config.output {
        if path.as_os_str().is_empty() {
            errors.push("output.path cannot be empty for file output".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

fn validate_receiver(receiver: &ReceiverConfig, errors: &mut Vec<String>) {
    if receiver.interval < MIN_INTERVAL {
        errors.push(
            "receiver.interval has to be set to at least 1 minute (1m)".to_string(),
        );
    } else if receiver.interval > MAX_INTERVAL {
        errors.push("receiver.interval must be at most 1 week (168h)".to_string());
    }

    if receiver.max_events_per_request < 1 {
        errors.push(
            "receiver.max_events_per_request must be greater or equal to 1".to_string(),
        );
    }
}

fn validate_scaleway(scaleway: &ScalewayConfig, errors: &mut Vec<String>) {
    let required = [
        ("api_url", &scaleway.api_url),
        ("secret_key", &scaleway.secret_key),
        ("organization_id", &scaleway.organization_id),
        ("region", &scaleway.region),
    ];

    for (name, value) in required {
        if value.trim().is_empty() {
            errors.push(format!("scaleway.{} cannot be empty", name));
        }
    }

    if scaleway.timeout.is_zero() {
        errors.push("scaleway.timeout must be greater than zero".to_string());
    }
}
