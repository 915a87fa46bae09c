//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use mailtriage_core::{BatchMode, ExtractionPolicy};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> ConfigResult<Self> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&paths.config_file)
    }

    /// Load configuration from a specific path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::default_config_string())?;
        Ok(())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# mailtriage configuration

[source]
# Directory holding the .eml and .msg files to classify (not searched recursively)
directory = "./emails"

[classifier]
# OpenAI-compatible chat completions endpoint
base_url = "https://api.openai.com/v1"
model = "gpt-3.5-turbo"

# Name of the environment variable holding the API key (a .env file works too)
api_key_env = "OPENAI_API_KEY"

temperature = 0.3

# Per-request timeout and retries for transient failures (timeouts, 429, 5xx)
timeout_seconds = 60
max_retries = 2

# Upper bound on requests in flight across all documents
max_in_flight = 4

# Issue the five classification requests of a document concurrently
concurrent_tasks = true

# Longer message text is truncated before classification
max_content_chars = 12000

[pipeline]
# strict: the first failing document fails the batch
# isolated: failures are reported per document
mode = "strict"

max_concurrent_documents = 4
document_timeout_seconds = 300

# reference: failed PDF extraction becomes empty text, office/image failures fail the document
# lenient: every extraction failure becomes empty text
# strict: every extraction failure fails the document
extraction_policy = "reference"
"#
        .to_string()
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.source.directory.trim().is_empty() {
            return Err(ConfigError::Invalid("source.directory is empty".to_string()));
        }
        if self.classifier.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("classifier.base_url is empty".to_string()));
        }
        if self.classifier.model.trim().is_empty() {
            return Err(ConfigError::Invalid("classifier.model is empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.classifier.temperature) {
            return Err(ConfigError::Invalid(format!(
                "classifier.temperature must be within 0.0..=2.0, got {}",
                self.classifier.temperature
            )));
        }
        if self.classifier.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "classifier.timeout_seconds must be positive".to_string(),
            ));
        }
        if self.classifier.max_in_flight == 0 {
            return Err(ConfigError::Invalid(
                "classifier.max_in_flight must be positive".to_string(),
            ));
        }
        if self.classifier.max_content_chars == 0 {
            return Err(ConfigError::Invalid(
                "classifier.max_content_chars must be positive".to_string(),
            ));
        }
        if self.pipeline.max_concurrent_documents == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.max_concurrent_documents must be positive".to_string(),
            ));
        }
        if self.pipeline.document_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.document_timeout_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where message files come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub directory: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            directory: "./emails".to_string(),
        }
    }
}

/// Classification service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub max_in_flight: usize,
    pub concurrent_tasks: bool,
    pub max_content_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.3,
            timeout_seconds: 60,
            max_retries: 2,
            max_in_flight: 4,
            concurrent_tasks: true,
            max_content_chars: 12_000,
        }
    }
}

impl ClassifierConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> ConfigResult<SecretString> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(SecretString::from(key)),
            _ => Err(ConfigError::MissingApiKey {
                var: self.api_key_env.clone(),
            }),
        }
    }
}

/// Batch processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: BatchMode,
    pub max_concurrent_documents: usize,
    pub document_timeout_seconds: u64,
    pub extraction_policy: ExtractionPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: BatchMode::Strict,
            max_concurrent_documents: 4,
            document_timeout_seconds: 300,
            extraction_policy: ExtractionPolicy::Reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source.directory, "./emails");
        assert_eq!(config.classifier.model, "gpt-3.5-turbo");
        assert_eq!(config.pipeline.mode, BatchMode::Strict);
        assert_eq!(config.pipeline.extraction_policy, ExtractionPolicy::Reference);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_string_parses() {
        let config: Config = toml::from_str(&Config::default_config_string()).unwrap();
        assert_eq!(config.classifier.base_url, "https://api.openai.com/v1");
        assert_eq!(config.classifier.max_in_flight, 4);
        assert_eq!(config.pipeline.document_timeout_seconds, 300);
        assert!(config.classifier.concurrent_tasks);
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.pipeline.mode = BatchMode::Isolated;
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(deserialized.pipeline.mode, BatchMode::Isolated);
        assert_eq!(config.classifier.model, deserialized.classifier.model);
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
            [pipeline]
            mode = "isolated"
            extraction_policy = "lenient"
            "#
        )
        .unwrap();

        let config = Config::load_from(temp_file.path()).unwrap();

        assert_eq!(config.pipeline.mode, BatchMode::Isolated);
        assert_eq!(config.pipeline.extraction_policy, ExtractionPolicy::Lenient);
        // Defaults should still work
        assert_eq!(config.classifier.model, "gpt-3.5-turbo");
        assert_eq!(config.pipeline.max_concurrent_documents, 4);
    }

    #[test]
    fn test_load_rejects_zero_concurrency() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[pipeline]\nmax_concurrent_documents = 0").unwrap();

        let err = Config::load_from(temp_file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.source.directory, "./emails");
    }

    #[test]
    fn test_api_key_from_env() {
        let mut classifier = ClassifierConfig::default();
        classifier.api_key_env = "MAILTRIAGE_TEST_KEY_PRESENT".to_string();
        std::env::set_var("MAILTRIAGE_TEST_KEY_PRESENT", "sk-test");
        assert_eq!(classifier.api_key().unwrap().expose_secret(), "sk-test");

        classifier.api_key_env = "MAILTRIAGE_TEST_KEY_ABSENT".to_string();
        std::env::remove_var("MAILTRIAGE_TEST_KEY_ABSENT");
        assert!(matches!(
            classifier.api_key(),
            Err(ConfigError::MissingApiKey { .. })
        ));
    }
}
