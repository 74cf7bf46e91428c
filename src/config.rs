use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::pipeline::triage::TicketPolicy;

/// Application-level constants
pub const APP_NAME: &str = "Polyheal";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONTENT_LIMIT: usize = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid keyword tables in {path}: {reason}")]
    InvalidKeywordTables { path: PathBuf, reason: String },

    #[error("Invalid content catalogue in {path}: {reason}")]
    InvalidContentCatalogue { path: PathBuf, reason: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} is required when {context}")]
    Missing { key: &'static str, context: &'static str },
}

/// Get the application data directory.
/// `~/Polyheal/`, or `./Polyheal` when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the SQLite database
pub fn database_path() -> PathBuf {
    app_data_dir().join("polyheal.db")
}

/// Default tracing filter.
/// Debug builds: verbose for our crate, quiet for dependencies.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "polyheal=debug,polyheal_lib=debug,tower_http=info,warn"
    } else {
        "polyheal=info,polyheal_lib=info,warn"
    }
}

/// Which language-model backend answers turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    /// Local Ollama instance (`/api/chat`)
    Ollama,
    /// OpenAI-compatible gateway (`/v1/chat/completions`)
    Gateway,
}

impl FromStr for LlmBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "gateway" | "openai" => Ok(Self::Gateway),
            other => Err(ConfigError::InvalidValue {
                key: "POLYHEAL_LLM_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub backend: LlmBackend,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// Runtime configuration of the service, read from `POLYHEAL_*` variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub llm: LlmSettings,
    pub keywords_file: Option<PathBuf>,
    /// Starter catalogue seeded into an empty database; built-in when unset.
    pub content_file: Option<PathBuf>,
    pub content_limit: usize,
    pub ticket_policy: TicketPolicy,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = get("POLYHEAL_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(database_path);

        let bind_addr = parse_var(
            "POLYHEAL_BIND_ADDR",
            get("POLYHEAL_BIND_ADDR").as_deref().unwrap_or(DEFAULT_BIND_ADDR),
        )?;

        let backend = match get("POLYHEAL_LLM_BACKEND") {
            Some(raw) => raw.parse()?,
            None => LlmBackend::Ollama,
        };
        let api_key = get("POLYHEAL_LLM_API_KEY");
        let base_url = match (get("POLYHEAL_LLM_URL"), backend) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, LlmBackend::Ollama) => DEFAULT_OLLAMA_URL.to_string(),
            (None, LlmBackend::Gateway) => {
                return Err(ConfigError::Missing {
                    key: "POLYHEAL_LLM_URL",
                    context: "POLYHEAL_LLM_BACKEND=gateway",
                })
            }
        };
        if backend == LlmBackend::Gateway && api_key.is_none() {
            return Err(ConfigError::Missing {
                key: "POLYHEAL_LLM_API_KEY",
                context: "POLYHEAL_LLM_BACKEND=gateway",
            });
        }
        let model = get("POLYHEAL_LLM_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string());
        let timeout_secs = match get("POLYHEAL_LLM_TIMEOUT_SECS") {
            Some(raw) => parse_var("POLYHEAL_LLM_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_LLM_TIMEOUT_SECS,
        };

        let content_limit = match get("POLYHEAL_CONTENT_LIMIT") {
            Some(raw) => parse_var("POLYHEAL_CONTENT_LIMIT", &raw)?,
            None => DEFAULT_CONTENT_LIMIT,
        };
        let ticket_policy = match get("POLYHEAL_TICKET_POLICY") {
            Some(raw) => raw.parse()?,
            None => TicketPolicy::default(),
        };

        Ok(Self {
            db_path,
            bind_addr,
            llm: LlmSettings {
                backend,
                base_url,
                model,
                api_key,
                timeout_secs,
            },
            keywords_file: get("POLYHEAL_KEYWORDS_FILE").map(PathBuf::from),
            content_file: get("POLYHEAL_CONTENT_FILE").map(PathBuf::from),
            content_limit,
            ticket_policy,
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}
