//! Config command - Show and validate configuration

use crate::config::SettingsManager;
use ag3ntum_core::types::is_valid_session_id;
use ag3ntum_core::{ConfigManager, ConsoleConfig};
use anyhow::{Context, Result};
use colored::Colorize;

/// Show the effective configuration
pub async fn show() -> Result<()> {
    let (config, path) = SettingsManager::load().context("Failed to load configuration")?;

    println!("{}", "Ag3ntum Console Configuration".bold().underline());
    println!();
    match path {
        Some(path) => println!("  📁 Config file: {}", path.display().to_string().dimmed()),
        None => println!("  📁 Config file: {}", "(none, using defaults)".dimmed()),
    }
    println!();

    println!("{}", "Server:".cyan().bold());
    println!("  API URL:         {}", config.server_url);
    println!(
        "  Auth token:      {}",
        if config.auth_token.is_some() {
            "configured".green()
        } else {
            "not set".yellow()
        }
    );
    println!(
        "  Default session: {}",
        config.default_session.as_deref().unwrap_or("-")
    );
    println!();

    println!("{}", "Explorer:".cyan().bold());
    println!("  List limit:      {}", config.list_limit);
    println!("  Include hidden:  {}", config.include_hidden);
    println!("  Highlight:       {} ms", config.highlight_ms);
    println!();

    println!("{}", "Rendering:".cyan().bold());
    println!("  Class prefix:    {}", config.render.class_prefix);
    println!("  Preview lines:   {}", config.widgets.preview_lines);
    println!("  Max lines:       {}", config.widgets.max_lines);
    println!();

    println!("{}", "Caches:".cyan().bold());
    for (name, policy) in [
        ("frequent", config.cache.frequent),
        ("reference", config.cache.reference),
    ] {
        println!(
            "  {:<16} {}s{}",
            format!("{}:", name),
            policy.ttl_secs,
            if policy.stale_while_revalidate {
                " + stale-while-revalidate"
            } else {
                ""
            }
        );
    }

    Ok(())
}

/// Validate the effective configuration
pub async fn validate() -> Result<()> {
    println!("{}", "🔍 Validating Ag3ntum console configuration...".cyan().bold());

    let (config, path) = SettingsManager::load().context("Failed to load configuration")?;
    if let Some(path) = path {
        println!("  📁 Config file: {}", path.display().to_string().dimmed());
    }
    println!();

    let result = ConfigManager::new().validate(&config);

    if result.valid {
        println!("  {} Configuration is valid", "✅".green());
    } else {
        println!("  {} Configuration validation failed", "❌".red());
        for error in &result.errors {
            println!(
                "      {} {}: {} {}",
                "•".red(),
                error.field.red(),
                error.message,
                format!("[{}]", error.code).dimmed()
            );
        }
    }

    for warning in &result.warnings {
        println!("  {} {}: {}", "⚠️".yellow(), warning.field.yellow(), warning.message);
        if let Some(ref suggestion) = warning.suggestion {
            println!("      💡 {}", suggestion.dimmed());
        }
    }

    println!();
    if !result.valid {
        println!("{}", "❌ Validation failed - please fix the errors above".red().bold());
        anyhow::bail!("Validation failed");
    }
    Ok(())
}

/// Set the API base URL in the user-level config
pub async fn set_server(url: &str) -> Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("Server URL must start with http:// or https://");
    }
    let mut config = SettingsManager::load_user()?;
    config.server_url = url.trim_end_matches('/').to_string();
    let path = SettingsManager::save(&config)?;
    println!("{} Server set to {}", "✅".green(), config.server_url.cyan());
    println!("  📁 {}", path.display().to_string().dimmed());
    Ok(())
}

/// Set the session used when `--session` is not given
pub async fn set_session(session_id: &str) -> Result<()> {
    if !is_valid_session_id(session_id) {
        anyhow::bail!("Invalid session id: {}", session_id);
    }
    let mut config = SettingsManager::load_user()?;
    config.default_session = Some(session_id.to_string());
    SettingsManager::save(&config)?;
    println!("{} Default session set to {}", "✅".green(), session_id.cyan());
    Ok(())
}

/// Reset the user-level config to defaults
pub async fn reset() -> Result<()> {
    let confirm = dialoguer::Confirm::new()
        .with_prompt("Reset configuration to defaults?")
        .default(false)
        .interact()?;
    if !confirm {
        println!("{}", "Cancelled".dimmed());
        return Ok(());
    }

    let path = SettingsManager::save(&ConsoleConfig::default())?;
    println!("{} Configuration reset ({})", "✅".green(), path.display());
    Ok(())
}
