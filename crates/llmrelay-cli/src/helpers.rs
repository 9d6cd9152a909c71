//! Shared CLI helpers: banner and status markers.

use colored::Colorize;

use llmrelay_providers::{Health, HealthStatus};

/// Print the startup banner.
pub fn print_banner() {
    println!(
        "{} {}",
        "llmrelay".cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

/// One-line, uncolored summary of a probe result.
pub fn describe_health(health: &Health) -> String {
    match health.status {
        HealthStatus::Ok => match health.latency_ms {
            Some(ms) => format!("ok ({ms} ms)"),
            None => "ok".to_string(),
        },
        HealthStatus::Unreachable => {
            let reason = health.error.as_deref().unwrap_or("unknown error");
            format!("unreachable: {reason}")
        }
        HealthStatus::Unknown => "unknown (no base URL)".to_string(),
    }
}

/// Colored marker for a probe result.
pub fn health_marker(status: HealthStatus) -> String {
    match status {
        HealthStatus::Ok => "✓".green().to_string(),
        HealthStatus::Unreachable => "✗".red().to_string(),
        HealthStatus::Unknown => "·".dimmed().to_string(),
    }
}
