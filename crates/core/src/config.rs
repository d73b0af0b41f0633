use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub llm: LlmConfig,
    pub history: HistoryConfig,
    pub network: NetworkConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Columnar store (ClickHouse HTTP interface) settings.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub url: String,
    pub database: Option<String>,
    pub table: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    /// Model for the analyst and summary participants.
    pub model: String,
    /// Cheaper model for routing decisions.
    pub supervisor_model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct HistoryConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// Defensive upper bound on agent turns per run, independent of router
    /// logic.
    pub max_turns: u32,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
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

/// Programmatic overrides, applied last (above env and file).
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub store_url: Option<String>,
    pub store_table: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub history_url: Option<String>,
    pub max_turns: Option<u32>,
    pub log_level: Option<String>,
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
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                url: "http://localhost:8123".to_string(),
                database: None,
                table: "powerlifting-records".to_string(),
                timeout_secs: 30,
            },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.anthropic.com".to_string(),
                model: "claude-sonnet-4-20250514".to_string(),
                supervisor_model: "claude-3-5-haiku-latest".to_string(),
                max_tokens: 5000,
                timeout_secs: 60,
            },
            history: HistoryConfig {
                url: "sqlite://liftline-history.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            network: NetworkConfig { max_turns: 12 },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8090,
                health_check_port: 8091,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

// File representation: every field optional so a partial file patches the
// defaults rather than replacing them.
#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    store: Option<StorePatch>,
    llm: Option<LlmPatch>,
    history: Option<HistoryPatch>,
    network: Option<NetworkPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    url: Option<String>,
    database: Option<String>,
    table: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    supervisor_model: Option<String>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct HistoryPatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct NetworkPatch {
    max_turns: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    /// Load configuration: defaults, then `liftline.toml` (or an explicit
    /// path), then `LIFTLINE_*` environment variables, then programmatic
    /// overrides, then validation.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("liftline.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(store) = patch.store {
            if let Some(url) = store.url {
                self.store.url = url;
            }
            if let Some(database) = store.database {
                self.store.database = Some(database);
            }
            if let Some(table) = store.table {
                self.store.table = table;
            }
            if let Some(timeout_secs) = store.timeout_secs {
                self.store.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(api_key_value) = llm.api_key {
                self.llm.api_key = Some(api_key_value.into());
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(supervisor_model) = llm.supervisor_model {
                self.llm.supervisor_model = supervisor_model;
            }
            if let Some(max_tokens) = llm.max_tokens {
                self.llm.max_tokens = max_tokens;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(history) = patch.history {
            if let Some(url) = history.url {
                self.history.url = url;
            }
            if let Some(max_connections) = history.max_connections {
                self.history.max_connections = max_connections;
            }
            if let Some(timeout_secs) = history.timeout_secs {
                self.history.timeout_secs = timeout_secs;
            }
        }

        if let Some(network) = patch.network {
            if let Some(max_turns) = network.max_turns {
                self.network.max_turns = max_turns;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
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
        if let Ok(url) = env::var("LIFTLINE_STORE_URL") {
            self.store.url = url;
        }
        if let Ok(database) = env::var("LIFTLINE_STORE_DATABASE") {
            self.store.database = Some(database);
        }
        if let Ok(table) = env::var("LIFTLINE_STORE_TABLE") {
            self.store.table = table;
        }
        if let Ok(api_key) = env::var("LIFTLINE_LLM_API_KEY") {
            self.llm.api_key = Some(api_key.into());
        }
        if let Ok(model) = env::var("LIFTLINE_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(url) = env::var("LIFTLINE_HISTORY_URL") {
            self.history.url = url;
        }
        if let Ok(raw) = env::var("LIFTLINE_NETWORK_MAX_TURNS") {
            self.network.max_turns = raw.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "LIFTLINE_NETWORK_MAX_TURNS".to_string(),
                value: raw,
            })?;
        }
        if let Ok(level) = env::var("LIFTLINE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(raw) = env::var("LIFTLINE_LOG_FORMAT") {
            self.logging.format = raw.parse()?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.store_url {
            self.store.url = url;
        }
        if let Some(table) = overrides.store_table {
            self.store.table = table;
        }
        if let Some(api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(api_key.into());
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(url) = overrides.history_url {
            self.history.url = url;
        }
        if let Some(max_turns) = overrides.max_turns {
            self.network.max_turns = max_turns;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.url.trim().is_empty() {
            return Err(ConfigError::Validation("store.url must not be empty".to_string()));
        }
        if self.store.table.trim().is_empty() {
            return Err(ConfigError::Validation("store.table must not be empty".to_string()));
        }
        if self.store.table.contains('\'') {
            return Err(ConfigError::Validation(
                "store.table must not contain quote characters".to_string(),
            ));
        }
        if self.network.max_turns == 0 {
            return Err(ConfigError::Validation(
                "network.max_turns must be at least 1".to_string(),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::Validation("llm.max_tokens must be at least 1".to_string()));
        }
        if self.history.url.trim().is_empty() {
            return Err(ConfigError::Validation("history.url must not be empty".to_string()));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    let default = PathBuf::from("liftline.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

    #[test]
    fn defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network.max_turns, 12);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn file_patch_overrides_defaults_partially() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[store]\nurl = \"http://warehouse:8123\"\ntable = \"meets\"\n\n[network]\nmax_turns = 6\n"
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect("load");

        assert_eq!(config.store.url, "http://warehouse:8123");
        assert_eq!(config.store.table, "meets");
        assert_eq!(config.network.max_turns, 6);
        // Untouched sections keep their defaults.
        assert_eq!(config.server.port, 8090);
    }

    #[test]
    fn missing_required_file_fails() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some("/nonexistent/liftline.toml".into()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn programmatic_overrides_win() {
        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                store_table: Some("sandbox-records".to_string()),
                max_turns: Some(3),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("load");

        assert_eq!(config.store.table, "sandbox-records");
        assert_eq!(config.network.max_turns, 3);
    }

    #[test]
    fn zero_turn_budget_is_rejected() {
        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides { max_turns: Some(0), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn quoted_table_name_is_rejected() {
        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                store_table: Some("x'; DROP TABLE y".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn log_format_parses_known_values_only() {
        assert_eq!("json".parse::<LogFormat>().expect("parse"), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
