use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tutor_core::{
    history::DEFAULT_HISTORY_LIMIT,
    prompt::{DEFAULT_SUBJECT, DEFAULT_SYSTEM_PROMPT, render_system_prompt},
    tutor::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_TTL, StoreLimits},
};

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
    #[error("Could not read prompt file {}: {}", .0.display(), .1)]
    PromptFile(PathBuf, std::io::Error),
}

/// Defines the supported model providers. Both are reached through an
/// OpenAI-compatible chat-completions endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Gemini,
}

impl Provider {
    pub fn api_base(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAI => "gpt-4o-mini",
            Provider::Gemini => "gemini-2.5-flash-lite",
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub provider: Provider,
    pub api_key: String,
    pub chat_model: String,
    pub log_level: Level,
    pub history_limit: usize,
    pub max_sessions: usize,
    pub session_idle_ttl: Duration,
    pub subject: String,
    pub prompts_path: Option<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("chat_model", &self.chat_model)
            .field("log_level", &self.log_level)
            .field("history_limit", &self.history_limit)
            .field("max_sessions", &self.max_sessions)
            .field("session_idle_ttl", &self.session_idle_ttl)
            .field("subject", &self.subject)
            .field("prompts_path", &self.prompts_path)
            .finish()
    }
}

/// Reads `name`, treating an unset, empty or blank value as absent.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Reads a positive integer from `name`, falling back to `default` when unset.
fn positive_var(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(0) => Err(ConfigError::InvalidValue(
                name.to_string(),
                "must be at least 1".to_string(),
            )),
            Ok(value) => Ok(value),
            Err(e) => Err(ConfigError::InvalidValue(name.to_string(), e.to_string())),
        },
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let provider_str = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "gemini".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            "openai" => Provider::OpenAI,
            other => {
                return Err(ConfigError::InvalidValue(
                    "LLM_PROVIDER".to_string(),
                    format!("'{}' is not one of 'gemini' or 'openai'", other),
                ));
            }
        };

        let api_key = match provider {
            Provider::OpenAI => non_empty_var("OPENAI_API_KEY").ok_or_else(|| {
                ConfigError::MissingVar("OPENAI_API_KEY must be set for 'openai' provider".to_string())
            })?,
            // A blank GEMINI_API_KEY (as left by a copied .env.example) must not
            // hide a real GOOGLE_API_KEY.
            Provider::Gemini => non_empty_var("GEMINI_API_KEY")
                .or_else(|| non_empty_var("GOOGLE_API_KEY"))
                .ok_or_else(|| {
                    ConfigError::MissingVar(
                        "GEMINI_API_KEY (or GOOGLE_API_KEY) must be set for 'gemini' provider"
                            .to_string(),
                    )
                })?,
        };

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| provider.default_model().to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let history_limit = match std::env::var("HISTORY_LIMIT") {
            Ok(raw) => {
                let limit = raw.parse::<usize>().map_err(|e| {
                    ConfigError::InvalidValue("HISTORY_LIMIT".to_string(), e.to_string())
                })?;
                if limit < 2 || limit % 2 != 0 {
                    return Err(ConfigError::InvalidValue(
                        "HISTORY_LIMIT".to_string(),
                        format!("{} must be an even number of at least 2", limit),
                    ));
                }
                limit
            }
            Err(_) => DEFAULT_HISTORY_LIMIT,
        };

        let max_sessions = positive_var("MAX_SESSIONS", DEFAULT_MAX_SESSIONS as u64)? as usize;
        let session_idle_ttl = Duration::from_secs(positive_var(
            "SESSION_IDLE_TTL_SECS",
            DEFAULT_SESSION_IDLE_TTL.as_secs(),
        )?);

        let subject = std::env::var("TUTOR_SUBJECT").unwrap_or_else(|_| DEFAULT_SUBJECT.to_string());

        let prompts_path = std::env::var("PROMPTS_PATH").ok().map(PathBuf::from);

        Ok(Self {
            bind_address,
            provider,
            api_key,
            chat_model,
            log_level,
            history_limit,
            max_sessions,
            session_idle_ttl,
            subject,
            prompts_path,
        })
    }

    /// Bounds for the conversation store.
    pub fn store_limits(&self) -> StoreLimits {
        StoreLimits {
            history_limit: self.history_limit,
            max_sessions: self.max_sessions,
            idle_ttl: self.session_idle_ttl,
        }
    }

    /// The system prompt with the subject filled in. Reads
    /// `system_prompt.md` from `prompts_path` when one is configured.
    pub fn system_prompt(&self) -> Result<String, ConfigError> {
        let template = match &self.prompts_path {
            Some(dir) => {
                let path = dir.join("system_prompt.md");
                std::fs::read_to_string(&path).map_err(|e| ConfigError::PromptFile(path, e))?
            }
            None => DEFAULT_SYSTEM_PROMPT.to_string(),
        };
        Ok(render_system_prompt(&template, &self.subject))
    }
}
