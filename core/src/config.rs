use crate::errors::{GeminiError, GeminiResult};
use crate::types::DEFAULT_MODEL_NAME;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SUMMARIZATION_THRESHOLD: usize = 8000;
pub const DEFAULT_MESSAGES_TO_RETAIN: usize = 10;
pub const DEFAULT_MAX_ROUNDS: usize = 8;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly scheduling assistant that manages the \
user's calendar. Use the available tools to look up, create, update and delete events. \
Confirm event details with the user before creating or changing anything, and keep replies \
short enough to be read aloud. The current date and time is {current_datetime_str}.";

/// Which tokenizer estimates transcript size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    #[default]
    Cl100k,
    Words,
}

/// Configuration for the scheduling assistant
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SchedulerConfig {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub system_prompt: Option<String>,
    /// File whose contents replace `system_prompt` when present
    pub system_prompt_path: Option<PathBuf>,
    pub summarization_threshold: Option<usize>,
    pub messages_to_retain: Option<usize>,
    pub max_rounds: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub timezone: Option<String>,
    pub tokenizer: Option<TokenizerKind>,
    pub temperature: Option<f32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: Some(DEFAULT_MODEL_NAME.to_string()),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            system_prompt_path: None,
            summarization_threshold: Some(DEFAULT_SUMMARIZATION_THRESHOLD),
            messages_to_retain: Some(DEFAULT_MESSAGES_TO_RETAIN),
            max_rounds: Some(DEFAULT_MAX_ROUNDS),
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            timezone: Some(DEFAULT_TIMEZONE.to_string()),
            tokenizer: Some(TokenizerKind::Cl100k),
            temperature: Some(0.7),
        }
    }
}

impl SchedulerConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> GeminiResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            GeminiError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let from_file: Self = toml::from_str(&content).map_err(|e| {
            GeminiError::ConfigError(format!("Failed to parse config file: {}", e))
        })?;

        // Fields left out of the file keep their defaults
        Ok(Self::default().merge(&from_file))
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> GeminiResult<()> {
        let content = toml::to_string(self).map_err(|e| {
            GeminiError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        // Ensure the directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                GeminiError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content).map_err(|e| {
            GeminiError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            api_key: other.api_key.clone().or_else(|| self.api_key.clone()),
            model_name: other.model_name.clone().or_else(|| self.model_name.clone()),
            system_prompt: other
                .system_prompt
                .clone()
                .or_else(|| self.system_prompt.clone()),
            system_prompt_path: other
                .system_prompt_path
                .clone()
                .or_else(|| self.system_prompt_path.clone()),
            summarization_threshold: other
                .summarization_threshold
                .or(self.summarization_threshold),
            messages_to_retain: other.messages_to_retain.or(self.messages_to_retain),
            max_rounds: other.max_rounds.or(self.max_rounds),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            timezone: other.timezone.clone().or_else(|| self.timezone.clone()),
            tokenizer: other.tokenizer.or(self.tokenizer),
            temperature: other.temperature.or(self.temperature),
        }
    }

    /// Applies `GEMINI_API_KEY` (or `GOOGLE_API_KEY`) and `GEMINI_MODEL` from the environment.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn with_env_overrides(mut self) -> Self {
        let _ = dotenvy::dotenv();

        if let Some(key) = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("GOOGLE_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty())
        {
            self.api_key = Some(key);
        }
        if let Ok(model) = env::var("GEMINI_MODEL") {
            if !model.trim().is_empty() {
                self.model_name = Some(model);
            }
        }
        self
    }

    /// Returns the system prompt, reading `system_prompt_path` if configured
    pub fn resolve_system_prompt(&self) -> GeminiResult<String> {
        if let Some(path) = &self.system_prompt_path {
            return fs::read_to_string(path).map_err(|e| {
                GeminiError::ConfigError(format!(
                    "Failed to read system prompt from {}: {}",
                    path.display(),
                    e
                ))
            });
        }
        Ok(self
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()))
    }

    pub fn summarization_threshold(&self) -> usize {
        self.summarization_threshold
            .unwrap_or(DEFAULT_SUMMARIZATION_THRESHOLD)
    }

    pub fn messages_to_retain(&self) -> usize {
        self.messages_to_retain
            .unwrap_or(DEFAULT_MESSAGES_TO_RETAIN)
            .max(1)
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds.unwrap_or(DEFAULT_MAX_ROUNDS).max(1)
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
            .max(1)
    }

    pub fn timezone(&self) -> &str {
        self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE)
    }

    pub fn tokenizer(&self) -> TokenizerKind {
        self.tokenizer.unwrap_or_default()
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> GeminiResult<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        GeminiError::ConfigError("Could not determine config directory".to_string())
    })?;

    Ok(config_dir.join(app_name))
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> GeminiResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = SchedulerConfig::load_from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, SchedulerConfig::default());
        assert_eq!(config.summarization_threshold(), 8000);
        assert_eq!(config.messages_to_retain(), 10);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "summarization_threshold = 500\ntokenizer = \"words\"\ntimezone = \"Europe/Berlin\"\n",
        )
        .unwrap();

        let config = SchedulerConfig::load_from_file(&path).unwrap();
        assert_eq!(config.summarization_threshold(), 500);
        assert_eq!(config.tokenizer(), TokenizerKind::Words);
        assert_eq!(config.timezone(), "Europe/Berlin");
        assert_eq!(config.messages_to_retain(), DEFAULT_MESSAGES_TO_RETAIN);
        assert_eq!(config.model_name.as_deref(), Some(DEFAULT_MODEL_NAME));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = SchedulerConfig {
            max_rounds: Some(3),
            ..SchedulerConfig::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = SchedulerConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.max_rounds(), 3);
    }

    #[test]
    fn test_zero_limits_are_clamped() {
        let config = SchedulerConfig {
            messages_to_retain: Some(0),
            max_rounds: Some(0),
            request_timeout_secs: Some(0),
            ..SchedulerConfig::default()
        };
        assert_eq!(config.messages_to_retain(), 1);
        assert_eq!(config.max_rounds(), 1);
        assert_eq!(config.request_timeout_secs(), 1);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_rounds = \"many\"").unwrap();

        let err = SchedulerConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, GeminiError::ConfigError(_)));
    }

    #[test]
    fn test_merge_prefers_other() {
        let base = SchedulerConfig::default();
        let other = SchedulerConfig {
            api_key: Some("k".to_string()),
            model_name: None,
            system_prompt: None,
            system_prompt_path: None,
            summarization_threshold: Some(42),
            messages_to_retain: None,
            max_rounds: None,
            request_timeout_secs: None,
            timezone: None,
            tokenizer: None,
            temperature: None,
        };
        let merged = base.merge(&other);
        assert_eq!(merged.api_key.as_deref(), Some("k"));
        assert_eq!(merged.summarization_threshold(), 42);
        assert_eq!(merged.model_name, base.model_name);
    }

    #[test]
    fn test_system_prompt_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        fs::write(&path, "Book meetings. Now: {current_datetime_str}").unwrap();

        let config = SchedulerConfig {
            system_prompt_path: Some(path),
            ..SchedulerConfig::default()
        };
        assert_eq!(
            config.resolve_system_prompt().unwrap(),
            "Book meetings. Now: {current_datetime_str}"
        );
    }
}
