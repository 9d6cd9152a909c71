//! `llmrelay status`: show configuration and probe every provider.

use anyhow::Result;
use colored::Colorize;

use llmrelay_core::config::{get_config_path, load_config};
use llmrelay_core::utils::truncate_string;
use llmrelay_providers::LocalLlmAdapter;

use crate::helpers::{describe_health, health_marker};

/// Run the status command.
pub async fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "llmrelay Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );
    println!(
        "  {:<18} {}:{}",
        "Gateway:".bold(),
        config.gateway.host,
        config.gateway.port
    );
    println!(
        "  {:<18} {}",
        "Sessions:".bold(),
        format!("{} token(s)", config.gateway.session_tokens.len()).dimmed()
    );
    println!(
        "  {:<18} {}",
        "Model delete:".bold(),
        if config.local_llm.enable_model_delete {
            "enabled".yellow().to_string()
        } else {
            "disabled".dimmed().to_string()
        }
    );

    let adapter = LocalLlmAdapter::new(config.local_llm);
    let providers = adapter.providers().await;

    println!();
    println!("  {}", "Providers:".bold());
    if providers.is_empty() {
        println!("    {}", "· none configured".dimmed());
    }
    for info in &providers {
        let key = if info.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
            " (key set)".dimmed().to_string()
        } else {
            String::new()
        };
        println!(
            "    {} {:<20} {}{}",
            health_marker(info.health.status),
            info.provider,
            truncate_string(&describe_health(&info.health), 60),
            key
        );
        if let Some(base) = &info.base_url {
            println!("      {}", base.dimmed());
        }
    }
    println!();

    Ok(())
}
