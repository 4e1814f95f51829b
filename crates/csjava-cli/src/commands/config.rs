//! Config command - Manage completion service settings

use crate::config::{load_app_config, mask_secret, Settings, SettingsManager};
use anyhow::{Context, Result};
use colored::Colorize;
use csjava_core::types::Provider;
use csjava_core::ConfigManager;

/// Set the completion endpoint, optionally switching provider
pub async fn set_endpoint(url: &str, provider: Option<&str>) -> Result<()> {
    let mut settings = SettingsManager::load().context("Failed to load settings")?;

    let url = url.trim().trim_end_matches('/');
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!(
            "Invalid URL: {}. URL must start with http:// or https://",
            url
        );
    }
    if let Some(name) = provider {
        let parsed = Provider::parse(name).with_context(|| {
            format!("Unknown provider: {}. Supported: azure, openai", name)
        })?;
        settings.provider = Some(parsed);
    }

    settings.endpoint = Some(url.to_string());
    SettingsManager::save(&settings).context("Failed to save settings")?;

    println!("{} Endpoint set to: {}", "✓".green(), url.cyan());
    if let Some(provider) = settings.provider {
        println!("  Provider: {}", provider.as_str().dimmed());
    }
    Ok(())
}

/// Set the Azure deployment name
pub async fn set_deployment(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Deployment name must not be empty");
    }

    let mut settings = SettingsManager::load().context("Failed to load settings")?;
    settings.deployment = Some(name.to_string());
    SettingsManager::save(&settings).context("Failed to save settings")?;

    println!("{} Deployment set to: {}", "✓".green(), name.cyan());
    Ok(())
}

/// Store the API key, prompting when it is not given
pub async fn set_api_key(key: Option<String>) -> Result<()> {
    let key = match key {
        Some(key) => key,
        None => dialoguer::Password::new()
            .with_prompt("API Key")
            .interact()?,
    };
    let key = key.trim().to_string();
    if key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    let mut settings = SettingsManager::load().context("Failed to load settings")?;
    settings.api_key = Some(key.clone());
    SettingsManager::save(&settings).context("Failed to save settings")?;

    println!("{} API key saved: {}", "✓".green(), mask_secret(&key).dimmed());
    Ok(())
}

/// Show the effective configuration and its validation
pub async fn show() -> Result<()> {
    let config = load_app_config()?;
    let completion = &config.completion;
    let unset = || "(not set)".dimmed().to_string();

    println!("{}", "csjava Configuration".bold().underline());
    println!();

    println!("{}", "Completion Service:".cyan().bold());
    println!("  Provider:    {}", completion.provider);
    println!(
        "  Endpoint:    {}",
        completion.resolved_endpoint().unwrap_or_else(unset)
    );
    println!(
        "  Deployment:  {}",
        completion.deployment.clone().unwrap_or_else(unset)
    );
    println!("  Model:       {}", completion.model);
    println!("  API version: {}", completion.api_version);
    println!(
        "  API key:     {}",
        completion
            .api_key
            .as_deref()
            .map(mask_secret)
            .unwrap_or_else(unset)
    );
    println!(
        "  Max tokens:  {}  Temperature: {}",
        completion.max_tokens, completion.temperature
    );
    println!();

    println!("{}", "Suffix Rules:".cyan().bold());
    for rule in config.suffixes.rules() {
        println!("  {} → {}", rule.from, rule.to);
    }
    println!();

    let validation = ConfigManager::new().validate(&config);
    if validation.valid {
        println!("  {} Configuration is valid", "✅".green());
    } else {
        println!("  {} Configuration is incomplete", "❌".red());
        for error in &validation.errors {
            println!("      {} {}: {}", "•".red(), error.field.red(), error.message);
        }
    }
    for warning in &validation.warnings {
        println!("  {} {}: {}", "⚠️".yellow(), warning.field.yellow(), warning.message);
        if let Some(ref suggestion) = warning.suggestion {
            println!("      💡 {}", suggestion.dimmed());
        }
    }
    println!();

    println!("{}", "Config Files:".cyan().bold());
    println!(
        "  Settings: {}",
        SettingsManager::settings_path()?.display().to_string().dimmed()
    );
    let project = std::env::current_dir()
        .ok()
        .and_then(|dir| ConfigManager::find_config_file(&dir));
    match project {
        Some(path) => println!("  Project:  {}", path.display().to_string().dimmed()),
        None => println!("  Project:  {}", unset()),
    }

    Ok(())
}

/// Reset settings to defaults
pub async fn reset(yes: bool) -> Result<()> {
    if !yes {
        let confirm = dialoguer::Confirm::new()
            .with_prompt("Reset all csjava settings, including the saved API key?")
            .default(false)
            .interact()?;
        if !confirm {
            println!("{}", "Reset cancelled.".yellow());
            return Ok(());
        }
    }

    SettingsManager::save(&Settings::default()).context("Failed to save default settings")?;
    println!("{} Configuration reset to defaults.", "✓".green());
    Ok(())
}
