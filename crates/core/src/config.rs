use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Process-wide configuration, constructed once at startup and passed into
/// the orchestrator and clients. Deep components never read the environment.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub hubspot: HubspotConfig,
    pub llm: LlmConfig,
    pub slack: SlackConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct HubspotConfig {
    pub access_token: SecretString,
    pub portal_id: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: SecretString,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub signing_secret: SecretString,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
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

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub hubspot_access_token: Option<String>,
    pub hubspot_portal_id: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub slack_signing_secret: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hubspot: HubspotConfig {
                access_token: String::new().into(),
                portal_id: String::new(),
                timeout_secs: 30,
            },
            llm: LlmConfig {
                api_key: String::new().into(),
                model: "claude-sonnet-4-20250514".to_string(),
                timeout_secs: 120,
            },
            slack: SlackConfig { signing_secret: String::new().into() },
            server: ServerConfig { bind_address: "0.0.0.0".to_string(), port: 5000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    hubspot: Option<HubspotPatch>,
    llm: Option<LlmPatch>,
    slack: Option<SlackPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Deserialize)]
struct HubspotPatch {
    access_token: Option<String>,
    portal_id: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SlackPatch {
    signing_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<String>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = resolve_config_path(options.config_path.as_deref()) {
            config.apply_patch(read_patch(&path)?)?;
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(hubspot) = patch.hubspot {
            if let Some(access_token) = hubspot.access_token {
                self.hubspot.access_token = access_token.into();
            }
            if let Some(portal_id) = hubspot.portal_id {
                self.hubspot.portal_id = portal_id;
            }
            if let Some(timeout_secs) = hubspot.timeout_secs {
                self.hubspot.timeout_secs = timeout_secs;
            }
        }
        if let Some(llm) = patch.llm {
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = api_key.into();
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }
        if let Some(slack) = patch.slack {
            if let Some(signing_secret) = slack.signing_secret {
                self.slack.signing_secret = signing_secret.into();
            }
        }
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }
        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format.parse()?;
            }
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PROPFLOW_HUBSPOT_ACCESS_TOKEN") {
            self.hubspot.access_token = value.into();
        }
        if let Some(value) = read_env("PROPFLOW_HUBSPOT_PORTAL_ID") {
            self.hubspot.portal_id = value;
        }
        if let Some(value) = read_env("PROPFLOW_HUBSPOT_TIMEOUT_SECS") {
            self.hubspot.timeout_secs = parse_u64("PROPFLOW_HUBSPOT_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("PROPFLOW_ANTHROPIC_API_KEY") {
            self.llm.api_key = value.into();
        }
        if let Some(value) = read_env("PROPFLOW_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("PROPFLOW_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("PROPFLOW_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("PROPFLOW_SLACK_SIGNING_SECRET") {
            self.slack.signing_secret = value.into();
        }
        if let Some(value) = read_env("PROPFLOW_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("PROPFLOW_SERVER_PORT") {
            self.server.port = parse_u16("PROPFLOW_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("PROPFLOW_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("PROPFLOW_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(access_token) = overrides.hubspot_access_token {
            self.hubspot.access_token = access_token.into();
        }
        if let Some(portal_id) = overrides.hubspot_portal_id {
            self.hubspot.portal_id = portal_id;
        }
        if let Some(api_key) = overrides.llm_api_key {
            self.llm.api_key = api_key.into();
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(signing_secret) = overrides.slack_signing_secret {
            self.slack.signing_secret = signing_secret.into();
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hubspot.access_token.expose_secret().is_empty() {
            return Err(ConfigError::Validation(
                "hubspot.access_token is required (PROPFLOW_HUBSPOT_ACCESS_TOKEN)".to_string(),
            ));
        }
        let portal_id = self.hubspot.portal_id.trim();
        if portal_id.is_empty() || !portal_id.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(ConfigError::Validation(
                "hubspot.portal_id must be a numeric portal id (PROPFLOW_HUBSPOT_PORTAL_ID)"
                    .to_string(),
            ));
        }
        if self.hubspot.timeout_secs == 0 || self.hubspot.timeout_secs > 300 {
            return Err(ConfigError::Validation(
                "hubspot.timeout_secs must be in range 1..=300".to_string(),
            ));
        }
        if self.llm.api_key.expose_secret().is_empty() {
            return Err(ConfigError::Validation(
                "llm.api_key is required (PROPFLOW_ANTHROPIC_API_KEY)".to_string(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
        }
        if self.llm.timeout_secs == 0 || self.llm.timeout_secs > 600 {
            return Err(ConfigError::Validation(
                "llm.timeout_secs must be in range 1..=600".to_string(),
            ));
        }
        if self.slack.signing_secret.expose_secret().is_empty() {
            return Err(ConfigError::Validation(
                "slack.signing_secret is required (PROPFLOW_SLACK_SIGNING_SECRET)".to_string(),
            ));
        }
        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }
    [PathBuf::from("propflow.toml"), PathBuf::from("config/propflow.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

    fn valid_overrides() -> ConfigOverrides {
        ConfigOverrides {
            hubspot_access_token: Some("pat-na1-test".to_string()),
            hubspot_portal_id: Some("21656838".to_string()),
            llm_api_key: Some("sk-ant-test".to_string()),
            slack_signing_secret: Some("8f742231b10e8888abcd99yyyzzz85a5".to_string()),
            ..ConfigOverrides::default()
        }
    }

    #[test]
    fn load_with_overrides_produces_a_valid_config() {
        let config = AppConfig::load(LoadOptions {
            config_path: Some("/nonexistent/propflow.toml".into()),
            overrides: valid_overrides(),
        })
        .expect("config should load");

        assert_eq!(config.hubspot.portal_id, "21656838");
        assert_eq!(config.llm.timeout_secs, 120);
        assert_eq!(config.hubspot.timeout_secs, 30);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn missing_hubspot_token_fails_validation() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some("/nonexistent/propflow.toml".into()),
            overrides: ConfigOverrides {
                hubspot_access_token: None,
                ..valid_overrides()
            },
        });
        let message = result.expect_err("load should fail").to_string();
        assert!(message.contains("hubspot.access_token"));
    }

    #[test]
    fn non_numeric_portal_id_fails_validation() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some("/nonexistent/propflow.toml".into()),
            overrides: ConfigOverrides {
                hubspot_portal_id: Some("acme-portal".to_string()),
                ..valid_overrides()
            },
        });
        let message = result.expect_err("load should fail").to_string();
        assert!(message.contains("portal_id"));
    }

    #[test]
    fn file_patch_applies_and_overrides_win_over_it() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[hubspot]\naccess_token = \"pat-from-file\"\nportal_id = \"111\"\n\n\
             [llm]\napi_key = \"sk-from-file\"\nmodel = \"claude-3-5-haiku-latest\"\n\n\
             [slack]\nsigning_secret = \"secret-from-file\"\n\n\
             [logging]\nlevel = \"debug\"\nformat = \"json\""
        )
        .expect("write patch");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            overrides: ConfigOverrides {
                hubspot_portal_id: Some("222".to_string()),
                ..ConfigOverrides::default()
            },
        })
        .expect("config should load");

        assert_eq!(config.hubspot.access_token.expose_secret(), "pat-from-file");
        assert_eq!(config.hubspot.portal_id, "222");
        assert_eq!(config.llm.model, "claude-3-5-haiku-latest");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn env_override_beats_file_patch() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[hubspot]\naccess_token = \"pat-from-file\"\nportal_id = \"111\"\n\n\
             [llm]\napi_key = \"sk-from-file\"\n\n\
             [slack]\nsigning_secret = \"secret-from-file\""
        )
        .expect("write patch");

        // Overrides apply after env, so the portal id must come from the
        // variable, not the patch. Removed before asserting to keep the
        // process environment clean for the other tests.
        std::env::set_var("PROPFLOW_HUBSPOT_PORTAL_ID", "333");
        let result = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            overrides: ConfigOverrides::default(),
        });
        std::env::remove_var("PROPFLOW_HUBSPOT_PORTAL_ID");

        let config = result.expect("config should load");
        assert_eq!(config.hubspot.portal_id, "333");
        assert_eq!(config.hubspot.access_token.expose_secret(), "pat-from-file");
    }

    #[test]
    fn unknown_log_format_in_patch_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[logging]\nformat = \"xml\"").expect("write patch");

        let result = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            overrides: valid_overrides(),
        });
        let message = result.expect_err("load should fail").to_string();
        assert!(message.contains("unsupported log format"));
    }
}
