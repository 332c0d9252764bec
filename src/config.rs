use serde::{Deserialize, Serialize};

pub const DEFAULT_UPSTREAM_URL: &str = "https://duckduckgo.com";
pub const STATUS_PATH: &str = "/duckchat/v1/status";
pub const CHAT_PATH: &str = "/duckchat/v1/chat";

pub const DEFAULT_MODELS: &[&str] = &[
    "gpt-4o-mini",
    "o3-mini",
    "claude-3-haiku-20240307",
    "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo",
    "mistralai/Mixtral-8x7B-Instruct-v0.1",
];
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required field: {field}")]
    MissingRequired { field: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Process-wide relay configuration, built once at startup and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Base URL of the upstream chat service, without trailing slash
    pub upstream_url: String,
    /// Model identifiers advertised in the 404 payload
    pub models: Vec<String>,
    /// Model used when the caller does not name one
    pub default_model: String,
    pub user_agent: String,
    pub referer: String,
    /// Timeout in seconds for each outbound call
    pub request_timeout_secs: u64,
    /// Maximum inbound body size in bytes
    pub max_payload_size: usize,
    /// Log level (None = info)
    pub log_level: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            default_model: DEFAULT_MODEL.to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            referer: "https://duckduckgo.com/".to_string(),
            request_timeout_secs: 30,
            max_payload_size: 1024 * 1024,
            log_level: None,
        }
    }
}

impl RelayConfig {
    pub fn status_url(&self) -> String {
        format!("{}{}", self.upstream_url, STATUS_PATH)
    }

    pub fn chat_url(&self) -> String {
        format!("{}{}", self.upstream_url, CHAT_PATH)
    }

    /// Check field constraints and normalise the upstream URL.
    pub fn validate(mut self) -> ConfigResult<Self> {
        if !(self.upstream_url.starts_with("http://") || self.upstream_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                field: "upstream_url".to_string(),
                value: self.upstream_url,
                reason: "must start with http:// or https://".to_string(),
            });
        }
        self.upstream_url = self.upstream_url.trim_end_matches('/').to_string();

        if self.models.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "models".to_string(),
            });
        }
        if !self.models.contains(&self.default_model) {
            return Err(ConfigError::InvalidValue {
                field: "default_model".to_string(),
                value: self.default_model,
                reason: "must be one of the configured models".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if let Some(level) = &self.log_level {
            if level.parse::<log::LevelFilter>().is_err() {
                return Err(ConfigError::InvalidValue {
                    field: "log_level".to_string(),
                    value: level.clone(),
                    reason: "expected one of off, error, warn, info, debug, trace".to_string(),
                });
            }
        }
        if self.max_payload_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_payload_size".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(self)
    }
}
