//! Configuration file support
//!
//! Settings are read from `~/.logdigest/config.toml` (or `--config`) and then
//! overridden by command line flags. Credentials never live here; the API key
//! is only read from the environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use logdigest_llm::LlmConfig;
use logdigest_logs::{DEFAULT_BATCH_SIZE, DEFAULT_THRESHOLD, PipelineOptions};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Similarity score in `[0, 100]` needed to join a cluster
    pub threshold: f64,

    /// Entries per classification request
    pub batch_size: usize,

    /// Only process files under this namespace directory
    pub namespace: Option<String>,

    pub llm: LlmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
            namespace: None,
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    /// `~/.logdigest/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        Some(home.join(".logdigest").join("config.toml"))
    }

    /// Load an explicit config file, or the default one if it exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::read(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::read(&path),
            _ => Ok(Self::default()),
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        if !(0.0..=100.0).contains(&config.threshold) {
            anyhow::bail!("threshold must be between 0 and 100, got {}", config.threshold);
        }
        Ok(config)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            threshold: self.threshold,
            batch_size: self.batch_size,
            namespace: self.namespace.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml(
            r#"
threshold = 85
namespace = "azure-iot-operations"

[llm]
endpoint = "https://example.openai.azure.com"
deployment = "gpt-4o"
summary_max_tokens = 2048
"#,
        )
        .unwrap();

        assert_eq!(config.threshold, 85.0);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.namespace.as_deref(), Some("azure-iot-operations"));
        assert_eq!(config.llm.deployment.as_deref(), Some("gpt-4o"));
        assert_eq!(config.llm.summary_max_tokens, 2048);
        assert_eq!(config.llm.filter_max_tokens, 4096);
    }

    #[test]
    fn test_threshold_out_of_range() {
        assert!(Config::from_toml("threshold = 140").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "batch_size = 50\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.pipeline_options().batch_size, 50);
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
