use secrecy::ExposeSecret;

use mercabot_core::config::{AppConfig, LlmProvider, LoadOptions, LogFormat};

use super::CommandResult;

/// Renders the effective configuration after defaults, file, and
/// `MERCABOT_*` env overrides, with the api key redacted.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(format!("config validation failed: {error}"), 2)
        }
    };

    let provider = match config.llm.provider {
        LlmProvider::OpenAi => "openai",
        LlmProvider::Anthropic => "anthropic",
        LlmProvider::Ollama => "ollama",
    };
    let format = match config.logging.format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    };
    let api_key = match &config.llm.api_key {
        Some(secret) if !secret.expose_secret().is_empty() => "***redacted***",
        _ => "(unset)",
    };

    let lines = vec![
        "effective config (source precedence: env > file > default):".to_string(),
        format!("  llm.provider = {provider}"),
        format!("  llm.model = {}", config.llm.model),
        format!("  llm.base_url = {}", config.llm.base_url.as_deref().unwrap_or("(default)")),
        format!("  llm.api_key = {api_key}"),
        format!("  llm.timeout_secs = {}", config.llm.timeout_secs),
        format!("  llm.max_retries = {}", config.llm.max_retries),
        format!("  session.ttl_secs = {}", config.session.ttl_secs),
        format!("  session.sweep_interval_secs = {}", config.session.sweep_interval_secs),
        format!("  routing.high_confidence = {}", config.routing.high_confidence),
        format!("  routing.trivial_confidence = {}", config.routing.trivial_confidence),
        format!("  routing.availability_ceiling = {}", config.routing.availability_ceiling),
        format!("  routing.category_similarity = {}", config.routing.category_similarity),
        format!(
            "  routing.availability_triggers = [{}]",
            config.routing.availability_triggers.join(", ")
        ),
        format!("  logging.level = {}", config.logging.level),
        format!("  logging.format = {format}"),
    ];

    CommandResult::success(lines.join("\n"))
}
