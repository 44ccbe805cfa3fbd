//! # pcapwatch Configuration System
//!
//! Layered configuration for the controller:
//! 1. Default values
//! 2. `config/pcapwatch.yaml`, if present
//! 3. `config/<PCAPWATCH_ENV>.yaml`, if present
//! 4. `PCAPWATCH_*` environment variables (`__` separates nesting levels)

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod ingest;
mod telemetry;
mod validation;
mod window;

pub use error::ConfigError;
pub use ingest::IngestConfig;
pub use telemetry::TelemetryConfig;
pub use window::WindowConfig;

const BASE_FILE: &str = "config/pcapwatch.yaml";
const ENV_PREFIX: &str = "PCAPWATCH_";

/// Top‑level configuration container for all pcapwatch components.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct PcapwatchConfig {
    /// Probe stream listener.
    #[validate(nested)]
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Aggregation window.
    #[validate(nested)]
    #[serde(default)]
    pub window: WindowConfig,

    /// Logging and metrics.
    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl PcapwatchConfig {
    /// Load configuration from the default files and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(PcapwatchConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        }

        let env = std::env::var("PCAPWATCH_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::finish(figment)
    }

    /// Load configuration from a specific file, still honouring the environment.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        let figment =
            Figment::from(Serialized::defaults(PcapwatchConfig::default())).merge(Yaml::file(path));
        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn full_config_validation() {
        let config = PcapwatchConfig::default();
        config.validate().expect("Default config should validate");
        assert_eq!(config.ingest.port, 9000);
        assert_eq!(config.window.interval_ms, 1000);
    }

    #[test]
    fn file_then_environment_override() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/pcapwatch.yaml",
                "ingest:\n  port: 9100\nwindow:\n  interval_ms: 500\n",
            )?;
            jail.set_env("PCAPWATCH_INGEST__PORT", "9200");

            let config = PcapwatchConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.ingest.port, 9200);
            assert_eq!(config.window.interval_ms, 500);
            assert_eq!(config.ingest.host, "0.0.0.0");
            Ok(())
        });
    }

    #[test]
    fn environment_specific_file() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file("config/staging.yaml", "telemetry:\n  log_level: debug\n")?;
            jail.set_env("PCAPWATCH_ENV", "staging");

            let config = PcapwatchConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.telemetry.log_level, "debug");
            Ok(())
        });
    }

    #[test]
    fn invalid_interval_fails_validation() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.yaml", "window:\n  interval_ms: 5\n")?;
            let result = PcapwatchConfig::load_from_path("custom.yaml");
            assert!(matches!(result, Err(ConfigError::Validation(_))));
            let message = result.unwrap_err().to_string();
            assert!(message.contains("window.interval_ms"));
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file() {
        let result = PcapwatchConfig::load_from_path("does/not/exist.yaml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
