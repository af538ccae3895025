use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::verification::attachments::{ALLOWED_MIME_TYPES, MAX_ATTACHMENT_BYTES};

/// Main configuration structure for Inventory Verify
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct InventoryVerifyConfig {
    /// Photo-evidence limits
    pub attachments: AttachmentConfig,
    /// Submission sink behaviour
    pub submission: SubmissionConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AttachmentConfig {
    /// Largest accepted file, inclusive
    pub max_size_bytes: u64,
    /// Accepted content types
    pub allowed_mime_types: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Latency of the simulated ERP sink
    pub simulated_delay_ms: u64,
    /// Per-attempt timeout
    pub timeout_ms: u64,
    /// Attempts before giving up on timeouts and transport errors
    pub max_attempts: u32,
    /// First retry delay, doubled on every further attempt
    pub retry_base_delay_ms: u64,
    /// Ceiling for the retry delay
    pub retry_max_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON lines instead of human-readable logs
    pub json_logs: bool,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: MAX_ATTACHMENT_BYTES,
            allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            simulated_delay_ms: 1000,
            timeout_ms: 10_000,
            max_attempts: 3,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 30_000,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: true,
        }
    }
}

impl InventoryVerifyConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (inventory-verify.toml)
    /// 3. Environment variables (prefixed with INVENTORY_VERIFY__, nested keys split on `__`)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("inventory-verify.toml").exists() {
            builder = builder.add_source(File::with_name("inventory-verify"));
        }

        builder = builder.add_source(
            Environment::with_prefix("INVENTORY_VERIFY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let inventory_config: InventoryVerifyConfig = config.try_deserialize()?;
        Ok(inventory_config)
    }

    /// Load from an explicit file, still honouring environment overrides
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("INVENTORY_VERIFY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_form_limits() {
        let config = InventoryVerifyConfig::default();
        assert_eq!(config.attachments.max_size_bytes, 10 * 1024 * 1024);
        assert_eq!(
            config.attachments.allowed_mime_types,
            vec!["image/jpeg", "image/png", "image/gif"]
        );
        assert_eq!(config.submission.simulated_delay_ms, 1000);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory-verify.toml");

        let mut config = InventoryVerifyConfig::default();
        config.submission.max_attempts = 5;
        config.observability.json_logs = false;
        config.save_to_file(&path).unwrap();

        let loaded = InventoryVerifyConfig::load_from(&path).unwrap();
        assert_eq!(loaded.submission.max_attempts, 5);
        assert!(!loaded.observability.json_logs);
        assert_eq!(loaded.attachments.max_size_bytes, config.attachments.max_size_bytes);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[submission]\nmax_attempts = \"many\"\n").unwrap();

        assert!(InventoryVerifyConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[submission]\nsimulated_delay_ms = 5\n").unwrap();

        let loaded = InventoryVerifyConfig::load_from(&path).unwrap();
        assert_eq!(loaded.submission.simulated_delay_ms, 5);
        assert_eq!(loaded.submission.max_attempts, 3);
        assert_eq!(loaded.observability.log_level, "info");
    }
}
