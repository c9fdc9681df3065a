// SPDX-License-Identifier: MIT

//! Application configuration
//!
//! One `ExplorerConfig` is built at startup (YAML file and environment),
//! wrapped in an `Arc`, and only read afterwards.

use crate::adk::error::ExplorerError;
use crate::adk::model::GenerationConfig;
use crate::explorer::review::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Criteria used by the resume qualification use case when none is supplied
pub const DEFAULT_JOB_DESCRIPTION: &str = "\
We are looking for a Software Engineer with strong Python skills, experience in building scalable web applications, and familiarity with cloud services (AWS/GCP).
The candidate should have excellent problem-solving skills and the ability to work in a fast-paced agile environment.
Preferred qualifications include knowledge of containerization (Docker, Kubernetes) and CI/CD pipelines.";

pub const CONFIG_PATH_ENV: &str = "EXPLORER_CONFIG";
pub const MODEL_ENV: &str = "EXPLORER_MODEL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub model: ModelSettings,
    pub review: ReviewConfig,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub name: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: "gemini-2.0-flash-exp".to_string(),
            temperature: Some(0.7),
            max_output_tokens: None,
        }
    }
}

impl ModelSettings {
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            ..Default::default()
        }
    }
}

/// What a retry sends to the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RetryMode {
    /// Re-send the identical request; relies on sampling variance
    #[default]
    Stateless,
    /// Append earlier inconclusive replies and ask for a definite answer
    Accumulate,
}

/// How format/parse failures are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedOutputPolicy {
    /// Count against the attempt bound and ask again
    #[default]
    Retry,
    /// Stop on the first malformed reply
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub retry: RetryPolicy,
    pub mode: RetryMode,
    pub malformed_output: MalformedOutputPolicy,
    pub call_timeout_ms: u64,
    /// Overall budget for one evaluation; `None` disables it
    pub deadline_ms: Option<u64>,
    /// Where the last raw response is written; `None` disables it
    pub diagnostic_path: Option<PathBuf>,
    /// Criteria for the resume qualification use case
    pub criteria: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            mode: RetryMode::Stateless,
            malformed_output: MalformedOutputPolicy::Retry,
            call_timeout_ms: 60_000,
            deadline_ms: None,
            diagnostic_path: Some(PathBuf::from("response.txt")),
            criteria: DEFAULT_JOB_DESCRIPTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

impl ExplorerConfig {
    /// Parse a configuration from a YAML string
    pub fn parse_yaml(content: &str) -> Result<Self, ExplorerError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ExplorerError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExplorerError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse_yaml(&content)
    }

    /// Resolve the configuration: explicit path, then `EXPLORER_CONFIG`,
    /// then defaults; environment overrides applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ExplorerError> {
        let env_path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(p) => {
                log::info!("Loading configuration from {}", p.display());
                Self::from_file(p)?
            }
            None => Self::default(),
        };
        if let Ok(model) = std::env::var(MODEL_ENV) {
            config.model.name = model;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ExplorerError> {
        if self.model.name.trim().is_empty() {
            return Err(ExplorerError::config("model.name must not be empty"));
        }
        if self.review.call_timeout_ms == 0 {
            return Err(ExplorerError::config(
                "review.call_timeout_ms must be positive",
            ));
        }
        if self.review.criteria.trim().is_empty() {
            return Err(ExplorerError::config("review.criteria must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExplorerConfig::default();
        assert_eq!(config.review.retry.max_attempts, 5);
        assert_eq!(config.review.mode, RetryMode::Stateless);
        assert_eq!(config.review.malformed_output, MalformedOutputPolicy::Retry);
        assert_eq!(
            config.review.diagnostic_path,
            Some(PathBuf::from("response.txt"))
        );
        assert!(config.review.criteria.contains("Software Engineer"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
model:
  name: gemini-1.5-pro
review:
  mode: accumulate
  malformed_output: fail
  deadline_ms: 30000
  diagnostic_path: null
  retry:
    max_attempts: 3
"#;
        let config = ExplorerConfig::parse_yaml(yaml).unwrap();
        assert_eq!(config.model.name, "gemini-1.5-pro");
        assert_eq!(config.model.temperature, Some(0.7));
        assert_eq!(config.review.mode, RetryMode::Accumulate);
        assert_eq!(config.review.malformed_output, MalformedOutputPolicy::Fail);
        assert_eq!(config.review.deadline_ms, Some(30_000));
        assert_eq!(config.review.diagnostic_path, None);
        assert_eq!(config.review.retry.max_attempts, 3);
        assert_eq!(config.review.retry.service_retries, 3);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            ExplorerConfig::parse_yaml("  \n").unwrap(),
            ExplorerConfig::default()
        );
    }

    #[test]
    fn test_invalid_yaml() {
        let err = ExplorerConfig::parse_yaml("review: [1, 2").unwrap_err();
        assert!(matches!(err, ExplorerError::Yaml(_)));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = ExplorerConfig::default();
        config.review.call_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(ExplorerError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = ExplorerConfig::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }

    #[test]
    fn test_generation_config_from_settings() {
        let gen = ModelSettings::default().generation_config();
        assert_eq!(gen.temperature, Some(0.7));
        assert_eq!(gen.top_k, None);
    }
}
