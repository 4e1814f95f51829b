//! Test command - Check the completion service connection

use crate::config::load_app_config;
use anyhow::{Context, Result};
use colored::Colorize;
use csjava_core::{test_connection, HttpCompletionClient};

pub async fn run() -> Result<()> {
    let config = load_app_config()?;
    let endpoint = config.completion.resolved_endpoint().unwrap_or_default();
    println!(
        "{} {}",
        "🔌 Testing connection to".cyan().bold(),
        endpoint.dimmed()
    );

    let client =
        HttpCompletionClient::new(config.completion).context("Failed to create HTTP client")?;
    let reply = test_connection(&client)
        .await
        .context("Connection test failed")?;

    println!("{}", "✅ Connection successful!".green().bold());
    println!("  Reply: {}", reply.dimmed());
    Ok(())
}
