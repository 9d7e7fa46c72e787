//! Configuration loading.
//!
//! Reads `~/.think/config.toml` (or an explicit path), falling back to
//! defaults for anything not set.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, ThinkError};
use crate::prompt::{DEFAULT_PREFIX, DEFAULT_SYSTEM_PROMPT};
use crate::streaming::DEFAULT_FLUSH_THRESHOLD;

/// Environment variable that replaces the configured model list with one model
pub const MODEL_OVERRIDE_ENV: &str = "THINK_MODEL";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub cot: CotConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Whole-request limit, streaming included
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: 120,
            connect_timeout_secs: 30,
        }
    }
}

/// Chain-of-thought settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CotConfig {
    /// Reasoning-capable model candidates
    pub models: Vec<String>,
    /// Which candidate to use
    pub model_index: usize,
    pub system_prompt: String,
    /// Read the system prompt from this file instead
    pub system_prompt_file: Option<PathBuf>,
    /// Prepended to every successful deliberation
    pub prefix: String,
    pub flush_threshold: usize,
}

impl Default for CotConfig {
    fn default() -> Self {
        Self {
            models: vec![
                "deepseek-r1-distill-llama-70b".to_string(),
                "qwen-qwq-32B".to_string(),
            ],
            model_index: 1,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            system_prompt_file: None,
            prefix: DEFAULT_PREFIX.to_string(),
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }
}

impl CotConfig {
    /// The model chosen from the candidate list
    pub fn selected_model(&self) -> Result<&str> {
        self.models
            .get(self.model_index)
            .map(String::as_str)
            .ok_or_else(|| {
                ThinkError::Config(format!(
                    "model_index {} is out of range for {} configured model(s)",
                    self.model_index,
                    self.models.len()
                ))
            })
    }

    /// Use a single model, ignoring the candidate list
    pub fn override_model(&mut self, model: impl Into<String>) {
        self.models = vec![model.into()];
        self.model_index = 0;
    }

    /// Load `system_prompt_file` into `system_prompt`, if set
    pub fn resolve_system_prompt(&mut self) -> Result<()> {
        if let Some(path) = self.system_prompt_file.take() {
            self.system_prompt = std::fs::read_to_string(&path).map_err(|e| {
                ThinkError::Config(format!("cannot read system prompt {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.selected_model()?;
        if self.models.iter().any(|m| m.trim().is_empty()) {
            return Err(ThinkError::Config("model identifiers must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Config {
    /// Load config from `path`, or from `~/.think/config.toml` if it exists.
    ///
    /// Applies the `THINK_MODEL` override and resolves the system prompt file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(model) = std::env::var(MODEL_OVERRIDE_ENV) {
            config.cot.override_model(model);
        }
        config.cot.resolve_system_prompt()?;
        config.cot.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without applying overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ThinkError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ThinkError::Config(e.to_string()))
    }

    /// Path to the config file.
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".think")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.backend.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.cot.selected_model().unwrap(), "qwen-qwq-32B");
        assert_eq!(config.backend.timeout_secs, 120);
        assert_eq!(config.cot.flush_threshold, 128);
        assert_eq!(config.cot.prefix, "Hmmm, let me think for a second... ");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [cot]
            model_index = 0
            flush_threshold = 64
            "#,
        )
        .unwrap();

        assert_eq!(config.cot.selected_model().unwrap(), "deepseek-r1-distill-llama-70b");
        assert_eq!(config.cot.flush_threshold, 64);
        assert_eq!(config.backend.connect_timeout_secs, 30);
    }

    #[test]
    fn test_backend_timeouts_from_toml() {
        let config =
            Config::from_toml("[backend]\ntimeout_secs = 5\nconnect_timeout_secs = 2").unwrap();

        assert_eq!(config.backend.timeout_secs, 5);
        assert_eq!(config.backend.connect_timeout_secs, 2);
        assert_eq!(config.backend.api_key_env, "GROQ_API_KEY");
    }

    #[test]
    fn test_out_of_range_model_index() {
        let config = CotConfig {
            models: vec!["only-one".to_string()],
            model_index: 3,
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_empty_model_list_rejected() {
        let config = CotConfig {
            models: vec![],
            model_index: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_override_model() {
        let mut config = CotConfig::default();
        config.override_model("llama-reasoner");
        assert_eq!(config.selected_model().unwrap(), "llama-reasoner");
    }

    #[test]
    fn test_load_explicit_file_with_prompt_file() {
        let dir = tempfile::tempdir().unwrap();
        let prompt_path = dir.path().join("prompt.md");
        std::fs::write(&prompt_path, "Reason step by step.").unwrap();

        let config_path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            "[backend]\nbase_url = \"http://localhost:8080/v1\"\n\n[cot]\nmodels = [\"a\", \"b\"]\nmodel_index = 0\nsystem_prompt_file = {:?}",
            prompt_path.display().to_string()
        )
        .unwrap();

        let mut config = Config::from_file(&config_path).unwrap();
        config.cot.resolve_system_prompt().unwrap();

        assert_eq!(config.backend.base_url, "http://localhost:8080/v1");
        assert_eq!(config.cot.system_prompt, "Reason step by step.");
        assert!(config.cot.system_prompt_file.is_none());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ThinkError::Config(_)));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml("[cot\nmodels = 1").unwrap_err();
        assert!(matches!(err, ThinkError::Config(_)));
    }
}
