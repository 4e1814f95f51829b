//! Configuration management

use anyhow::{Context, Result};
use csjava_core::types::Provider;
use csjava_core::{AppConfig, ConfigManager};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// User settings kept in `~/.csjava/settings.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: Option<Provider>,
    pub endpoint: Option<String>,
    pub deployment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_version: Option<String>,
}

impl Settings {
    /// Overlay the settings that are present onto `config`
    pub fn apply_to(&self, config: &mut AppConfig) {
        let completion = &mut config.completion;
        if let Some(provider) = self.provider {
            completion.provider = provider;
        }
        if let Some(endpoint) = &self.endpoint {
            completion.endpoint = Some(endpoint.clone());
        }
        if let Some(deployment) = &self.deployment {
            completion.deployment = Some(deployment.clone());
        }
        if let Some(api_key) = &self.api_key {
            completion.api_key = Some(api_key.clone());
        }
        if let Some(model) = &self.model {
            completion.model = model.clone();
        }
        if let Some(version) = &self.api_version {
            completion.api_version = version.clone();
        }
    }
}

pub struct SettingsManager;

impl SettingsManager {
    /// Get the csjava home directory (~/.csjava)
    pub fn csjava_home() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("CSJAVA_HOME") {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".csjava"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::csjava_home()?.join("settings.json"))
    }

    pub fn load() -> Result<Settings> {
        Self::load_from(&Self::settings_path()?)
    }

    pub fn save(settings: &Settings) -> Result<()> {
        Self::save_to(&Self::settings_path()?, settings)
    }

    /// Load settings from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Settings> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {:?}", path))
    }

    pub fn save_to(path: &Path, settings: &Settings) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;

        // The file holds the API key
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }
}

/// Effective configuration: project config file (if any) in the current
/// directory, then user settings, then environment variables.
pub fn load_app_config() -> Result<AppConfig> {
    let project_dir = std::env::current_dir()?;
    let settings = SettingsManager::load().context("Failed to load settings")?;
    resolve_app_config(&project_dir, &settings)
}

pub fn resolve_app_config(project_dir: &Path, settings: &Settings) -> Result<AppConfig> {
    let mut config = match ConfigManager::find_config_file(project_dir) {
        Some(path) => {
            debug!("Using config file {}", path.display());
            ConfigManager::new()
                .load(&path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => AppConfig::default(),
    };
    settings.apply_to(&mut config);
    config.apply_env();
    Ok(config)
}

/// Show a secret as its last four characters
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(8), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_settings_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsManager::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_load_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            endpoint: Some("https://res.openai.azure.com".to_string()),
            api_key: Some("secret".to_string()),
            ..Settings::default()
        };

        SettingsManager::save_to(&path, &settings).unwrap();
        assert_eq!(SettingsManager::load_from(&path).unwrap(), settings);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_settings_overlay_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("csjava.config.yaml"),
            "completion:\n  deployment: from-file\n  max_tokens: 1234\n",
        )
        .unwrap();

        let settings = Settings {
            model: Some("gpt-4o".to_string()),
            ..Settings::default()
        };
        let config = resolve_app_config(dir.path(), &settings).unwrap();
        assert_eq!(config.completion.max_tokens, 1234);
        assert_eq!(config.completion.model, "gpt-4o");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret("sk-1234567890"), "********7890");
    }
}
