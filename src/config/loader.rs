//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_WRITE_KEY: &str = "TELEMETRY_WRITE_KEY";
pub const ENV_DATASET: &str = "TELEMETRY_DATASET";
pub const ENV_API_HOST: &str = "TELEMETRY_API_HOST";

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

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay credentials and destination from the environment.
///
/// Empty variables are ignored.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let present = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(write_key) = present(ENV_WRITE_KEY) {
        config.telemetry.write_key = Some(write_key);
    }
    if let Some(dataset) = present(ENV_DATASET) {
        config.telemetry.dataset = Some(dataset);
    }
    if let Some(api_host) = present(ENV_API_HOST) {
        config.telemetry.api_host = api_host;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides_file_values() {
        let mut config: AppConfig = toml::from_str(
            r#"
            [telemetry]
            write_key = "from-file"
            dataset = "file-dataset"
            "#,
        )
        .unwrap();
        let env = HashMap::from([
            (ENV_WRITE_KEY, "from-env".to_string()),
            (ENV_DATASET, String::new()),
        ]);

        apply_env_overrides(&mut config, |name| env.get(name).cloned());

        assert_eq!(config.telemetry.write_key.as_deref(), Some("from-env"));
        assert_eq!(config.telemetry.dataset.as_deref(), Some("file-dataset"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/nonexistent/telemetry.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_rejects_file_without_credentials() {
        let path = std::env::temp_dir().join(format!(
            "request-telemetry-{}-no-creds.toml",
            std::process::id()
        ));
        fs::write(&path, "[server]\nbind_address = \"127.0.0.1:0\"\n").unwrap();

        let result = load_config(Some(&path));
        let _ = fs::remove_file(&path);

        // The process environment may carry credentials; only assert when it does not.
        if std::env::var(ENV_WRITE_KEY).is_err() && std::env::var(ENV_DATASET).is_err() {
            match result {
                Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }
}
