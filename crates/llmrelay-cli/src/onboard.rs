//! `llmrelay onboard`: create `~/.llmrelay/config.json` with defaults.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use llmrelay_core::config::{get_config_path, save_config, Config};

/// Run the onboard command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "llmrelay Setup".cyan().bold());
    println!();

    let config_path = get_config_path();
    if write_default_config(&config_path)? {
        println!("  {} created config at {}", "✓".green(), config_path.display());
    } else {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    }

    println!();
    println!(
        "  Add providers under {} and tokens under {},",
        "localLlm.openaiCompatibleData".bold(),
        "gateway.sessionTokens".bold()
    );
    println!("  then run {}.", "`llmrelay serve`".green());
    println!();

    Ok(())
}

/// Write a default config at `path` unless one exists. Returns whether a file was written.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("failed to write config: {}", path.display()))?;
    Ok(true)
}
