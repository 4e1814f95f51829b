//! Configuration management for csjava

use crate::archive::DEFAULT_TEXT_EXTENSIONS;
use crate::error::{CoreError, Result};
use crate::suffix::SuffixMap;
use crate::types::{Provider, ValidationError, ValidationResult, ValidationWarning};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Configuration file names to search for
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "csjava.config.yaml",
    "csjava.config.yml",
    "csjava.config.json",
];

pub const DEFAULT_API_VERSION: &str = "2024-12-01-preview";
pub const DEFAULT_MODEL: &str = "gpt-4.1";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Completion service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub provider: Provider,
    /// Azure resource endpoint, or the OpenAI-compatible base URL
    pub endpoint: Option<String>,
    /// Azure deployment name
    pub deployment: Option<String>,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_version: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Azure,
            endpoint: None,
            deployment: None,
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            max_tokens: 4000,
            temperature: 0.1,
            request_timeout_secs: 120,
        }
    }
}

impl CompletionConfig {
    /// Endpoint to call, falling back to the public OpenAI URL for that provider
    pub fn resolved_endpoint(&self) -> Option<String> {
        match (&self.endpoint, self.provider) {
            (Some(endpoint), _) => Some(endpoint.trim_end_matches('/').to_string()),
            (None, Provider::OpenAI) => Some(DEFAULT_OPENAI_BASE_URL.to_string()),
            (None, Provider::Azure) => None,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub completion: CompletionConfig,
    /// Source-to-target suffix rules, first match wins
    pub suffixes: SuffixMap,
    /// Archive members with these endings are classified as text
    pub text_extensions: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            completion: CompletionConfig::default(),
            suffixes: SuffixMap::default(),
            text_extensions: DEFAULT_TEXT_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl AppConfig {
    /// Overlay settings from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay settings from `lookup`; empty values are ignored
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let completion = &mut self.completion;

        if let Some(provider) = get("CSJAVA_PROVIDER").and_then(|p| Provider::parse(&p)) {
            completion.provider = provider;
        }
        if let Some(endpoint) = get("AZURE_ENDPOINT") {
            completion.endpoint = Some(endpoint);
        }
        if let Some(deployment) = get("DEPLOYMENT_NAME") {
            completion.deployment = Some(deployment);
        }
        if let Some(api_key) = get("OPENAI_API_KEY") {
            completion.api_key = Some(api_key);
        }
        if let Some(version) = get("OPENAI_API_VERSION") {
            completion.api_version = version;
        }
        if let Some(model) = get("CSJAVA_MODEL") {
            completion.model = model;
        }
    }
}

/// Configuration manager for loading and saving configurations
pub struct ConfigManager {
    cache: HashMap<PathBuf, CachedConfig>,
}

struct CachedConfig {
    config: AppConfig,
    modified_time: SystemTime,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Find configuration file in a directory
    pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    fn is_json(path: &Path) -> bool {
        path.extension().map(|e| e == "json").unwrap_or(false)
    }

    /// Load configuration from a file
    pub fn load(&mut self, config_path: &Path) -> Result<AppConfig> {
        let metadata = std::fs::metadata(config_path)?;
        let modified_time = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        if let Some(cached) = self.cache.get(config_path) {
            if cached.modified_time == modified_time {
                return Ok(cached.config.clone());
            }
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: AppConfig = if Self::is_json(config_path) {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        self.cache.insert(
            config_path.to_path_buf(),
            CachedConfig {
                config: config.clone(),
                modified_time,
            },
        );

        Ok(config)
    }

    /// Load configuration from a directory (searches for config files)
    pub fn load_from_directory(&mut self, dir: &Path) -> Result<(AppConfig, PathBuf)> {
        let config_path = Self::find_config_file(dir)
            .ok_or_else(|| CoreError::ConfigNotFound(dir.display().to_string()))?;

        let config = self.load(&config_path)?;
        Ok((config, config_path))
    }

    /// Load from `dir` when a config file exists, defaults otherwise, then
    /// overlay the environment
    pub fn resolve(&mut self, dir: &Path) -> Result<AppConfig> {
        let mut config = match Self::find_config_file(dir) {
            Some(path) => self.load(&path)?,
            None => AppConfig::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Validate a configuration
    pub fn validate(&self, config: &AppConfig) -> ValidationResult {
        let mut result = ValidationResult::ok();
        let completion = &config.completion;

        match completion.resolved_endpoint() {
            None => {
                result = result.with_error(ValidationError {
                    field: "completion.endpoint".to_string(),
                    message: "No completion endpoint configured".to_string(),
                    code: "MISSING_ENDPOINT".to_string(),
                });
            }
            Some(endpoint) if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") => {
                result = result.with_error(ValidationError {
                    field: "completion.endpoint".to_string(),
                    message: format!("Endpoint must be an http(s) URL: {}", endpoint),
                    code: "INVALID_ENDPOINT".to_string(),
                });
            }
            Some(_) => {}
        }

        if completion.provider == Provider::Azure && completion.deployment.is_none() {
            result = result.with_error(ValidationError {
                field: "completion.deployment".to_string(),
                message: "Azure requires a deployment name".to_string(),
                code: "MISSING_DEPLOYMENT".to_string(),
            });
        }

        if completion.api_key.is_none() {
            result = result.with_error(ValidationError {
                field: "completion.api_key".to_string(),
                message: "No API key configured".to_string(),
                code: "MISSING_API_KEY".to_string(),
            });
        }

        if completion.max_tokens == 0 {
            result = result.with_error(ValidationError {
                field: "completion.max_tokens".to_string(),
                message: "max_tokens must be greater than zero".to_string(),
                code: "INVALID_MAX_TOKENS".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&completion.temperature) {
            result = result.with_warning(ValidationWarning {
                field: "completion.temperature".to_string(),
                message: format!("Unusual temperature {}", completion.temperature),
                suggestion: Some("Use a value between 0.0 and 2.0".to_string()),
            });
        }

        if config.suffixes.is_empty() {
            result = result.with_error(ValidationError {
                field: "suffixes".to_string(),
                message: "At least one suffix rule is required".to_string(),
                code: "NO_SUFFIX_RULES".to_string(),
            });
        }

        for rule in config.suffixes.rules() {
            if rule.from.is_empty() || rule.to.is_empty() {
                result = result.with_error(ValidationError {
                    field: "suffixes".to_string(),
                    message: format!("Suffix rule '{}' -> '{}' is incomplete", rule.from, rule.to),
                    code: "INVALID_SUFFIX_RULE".to_string(),
                });
            } else if !config.text_extensions.iter().any(|ext| ext == &rule.from) {
                result = result.with_warning(ValidationWarning {
                    field: "text_extensions".to_string(),
                    message: format!("Source suffix {} is not listed as text", rule.from),
                    suggestion: Some(format!("Add '{}' to text_extensions", rule.from)),
                });
            }
        }

        result
    }

    /// Save configuration to a file
    pub fn save(&self, config: &AppConfig, config_path: &Path) -> Result<()> {
        let content = if Self::is_json(config_path) {
            serde_json::to_string_pretty(config)?
        } else {
            serde_yaml::to_string(config)?
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, content)?;

        Ok(())
    }

    /// Clear the cache
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
