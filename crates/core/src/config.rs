use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub session: SessionConfig,
    pub routing: RoutingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Inactivity TTL for state and context entries, sliding on every write.
    pub ttl_secs: u64,
    /// Interval of the background eviction sweep.
    pub sweep_interval_secs: u64,
}

/// Arbitration thresholds and word lists for the decision router.
///
/// The availability trigger and placeholder lists, the 0.60 trivial bar, and
/// the 0.92 fast-path bar are hand-tuned values carried over as data. Changing
/// them is a product decision, not a refactor.
#[derive(Clone, Debug)]
pub struct RoutingConfig {
    /// Above this the guardrail result is trusted regardless of intent.
    pub high_confidence: f64,
    /// Lower bar for intents in the trivial allow-list.
    pub trivial_confidence: f64,
    /// The availability override only fires below this confidence.
    pub availability_ceiling: f64,
    /// Minimum score for the semantic category fallback in product search.
    pub category_similarity: f64,
    /// Verbs that open an implicit availability question ("tienen mochilas").
    pub availability_triggers: Vec<String>,
    /// Generic tails that must not become a search term ("tienen algo").
    pub availability_placeholders: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_base_url: Option<String>,
    pub session_ttl_secs: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub fn default_availability_triggers() -> Vec<String> {
    [
        "tienen", "tienes", "tendran", "venden", "vendes", "hay", "manejan", "manejas",
        "trabajan con", "do you have", "do you sell", "do you carry",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

pub fn default_availability_placeholders() -> Vec<String> {
    [
        "algo", "algun", "alguno", "alguna", "cosas", "cosa", "producto", "productos",
        "articulos", "articulo", "stock", "eso", "esto", "mas", "anything", "something",
        "stuff", "items",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 30,
                max_retries: 2,
            },
            session: SessionConfig { ttl_secs: 1800, sweep_interval_secs: 300 },
            routing: RoutingConfig {
                high_confidence: 0.92,
                trivial_confidence: 0.60,
                availability_ceiling: 0.85,
                category_similarity: 0.3,
                availability_triggers: default_availability_triggers(),
                availability_placeholders: default_availability_placeholders(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|anthropic|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("mercabot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(session) = patch.session {
            if let Some(ttl_secs) = session.ttl_secs {
                self.session.ttl_secs = ttl_secs;
            }
            if let Some(sweep_interval_secs) = session.sweep_interval_secs {
                self.session.sweep_interval_secs = sweep_interval_secs;
            }
        }

        if let Some(routing) = patch.routing {
            if let Some(high_confidence) = routing.high_confidence {
                self.routing.high_confidence = high_confidence;
            }
            if let Some(trivial_confidence) = routing.trivial_confidence {
                self.routing.trivial_confidence = trivial_confidence;
            }
            if let Some(availability_ceiling) = routing.availability_ceiling {
                self.routing.availability_ceiling = availability_ceiling;
            }
            if let Some(category_similarity) = routing.category_similarity {
                self.routing.category_similarity = category_similarity;
            }
            if let Some(availability_triggers) = routing.availability_triggers {
                self.routing.availability_triggers = availability_triggers;
            }
            if let Some(availability_placeholders) = routing.availability_placeholders {
                self.routing.availability_placeholders = availability_placeholders;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("MERCABOT_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("MERCABOT_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("MERCABOT_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("MERCABOT_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("MERCABOT_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("MERCABOT_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("MERCABOT_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("MERCABOT_LLM_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("MERCABOT_SESSION_TTL_SECS") {
            self.session.ttl_secs = parse_u64("MERCABOT_SESSION_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("MERCABOT_SESSION_SWEEP_INTERVAL_SECS") {
            self.session.sweep_interval_secs =
                parse_u64("MERCABOT_SESSION_SWEEP_INTERVAL_SECS", &value)?;
        }

        if let Some(value) = read_env("MERCABOT_ROUTING_HIGH_CONFIDENCE") {
            self.routing.high_confidence = parse_f64("MERCABOT_ROUTING_HIGH_CONFIDENCE", &value)?;
        }
        if let Some(value) = read_env("MERCABOT_ROUTING_TRIVIAL_CONFIDENCE") {
            self.routing.trivial_confidence =
                parse_f64("MERCABOT_ROUTING_TRIVIAL_CONFIDENCE", &value)?;
        }
        if let Some(value) = read_env("MERCABOT_ROUTING_AVAILABILITY_CEILING") {
            self.routing.availability_ceiling =
                parse_f64("MERCABOT_ROUTING_AVAILABILITY_CEILING", &value)?;
        }
        if let Some(value) = read_env("MERCABOT_ROUTING_CATEGORY_SIMILARITY") {
            self.routing.category_similarity =
                parse_f64("MERCABOT_ROUTING_CATEGORY_SIMILARITY", &value)?;
        }

        let log_level =
            read_env("MERCABOT_LOGGING_LEVEL").or_else(|| read_env("MERCABOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("MERCABOT_LOGGING_FORMAT").or_else(|| read_env("MERCABOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = Some(llm_base_url);
        }
        if let Some(session_ttl_secs) = overrides.session_ttl_secs {
            self.session.ttl_secs = session_ttl_secs;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_session(&self.session)?;
        validate_routing(&self.routing)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("mercabot.toml"), PathBuf::from("config/mercabot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    match llm.provider {
        LlmProvider::OpenAi | LlmProvider::Anthropic => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for openai/anthropic providers".to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            let missing =
                llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for ollama provider".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_session(session: &SessionConfig) -> Result<(), ConfigError> {
    if session.ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "session.ttl_secs must be greater than zero".to_string(),
        ));
    }

    if session.sweep_interval_secs == 0 || session.sweep_interval_secs > session.ttl_secs {
        return Err(ConfigError::Validation(
            "session.sweep_interval_secs must be in range 1..=session.ttl_secs".to_string(),
        ));
    }

    Ok(())
}

fn validate_routing(routing: &RoutingConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("routing.high_confidence", routing.high_confidence),
        ("routing.trivial_confidence", routing.trivial_confidence),
        ("routing.availability_ceiling", routing.availability_ceiling),
        ("routing.category_similarity", routing.category_similarity),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::Validation(format!("{name} must be in range 0.0..=1.0")));
        }
    }

    if routing.trivial_confidence > routing.high_confidence {
        return Err(ConfigError::Validation(
            "routing.trivial_confidence must not exceed routing.high_confidence".to_string(),
        ));
    }

    if routing.availability_triggers.is_empty() {
        return Err(ConfigError::Validation(
            "routing.availability_triggers must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    session: Option<SessionPatch>,
    routing: Option<RoutingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    ttl_secs: Option<u64>,
    sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RoutingPatch {
    high_confidence: Option<f64>,
    trivial_confidence: Option<f64>,
    availability_ceiling: Option<f64>,
    category_similarity: Option<f64>,
    availability_triggers: Option<Vec<String>>,
    availability_placeholders: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    #[test]
    fn defaults_pass_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.routing.high_confidence, 0.92);
        assert_eq!(config.routing.trivial_confidence, 0.60);
        assert_eq!(config.session.ttl_secs, 1800);
        assert_eq!(config.session.sweep_interval_secs, 300);
    }

    #[test]
    fn file_patch_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[llm]\nmodel = \"qwen2.5\"\ntimeout_secs = 20\n\n[session]\nttl_secs = 600\n\n[logging]\nlevel = \"debug\"\nformat = \"json\"\n"
        )
        .expect("write");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect("load");

        assert_eq!(config.llm.model, "qwen2.5");
        assert_eq!(config.llm.timeout_secs, 20);
        assert_eq!(config.session.ttl_secs, 600);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some("does/not/exist.toml".into()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        });
        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn programmatic_overrides_win() {
        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                log_level: Some("warn".to_string()),
                session_ttl_secs: Some(900),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("load");

        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.session.ttl_secs, 900);
    }

    #[test]
    fn out_of_range_thresholds_fail_validation() {
        let mut config = AppConfig::default();
        config.routing.high_confidence = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = AppConfig::default();
        config.routing.trivial_confidence = 0.95;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn zero_sweep_interval_fails_validation() {
        let mut config = AppConfig::default();
        config.session.sweep_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn empty_trigger_list_fails_validation() {
        let mut config = AppConfig::default();
        config.routing.availability_triggers.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }
}
