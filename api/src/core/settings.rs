//! Application settings snapshot.
//!
//! Built once at process start and shared through [`crate::core::app_state::AppState`].

use ai_llm_service::{LlmModelConfig, config::default_config::config_chat_from};
use chat_log_store::LogStoreConfig;
use rag_chain::RagChainConfig;
use thiserror::Error;

pub const DEFAULT_APP_NAME: &str = "Azure AI Chatbot";
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_LOG_LEVEL: &str = "INFO";
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:5173"];
pub const DEFAULT_BLOB_CONTAINER: &str = "documents";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Blob container holding the knowledge-base sources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobSettings {
    pub connection_string: Option<String>,
    pub container_name: String,
}

#[derive(Clone, Debug)]
pub struct AppSettings {
    pub app_name: String,
    pub version: &'static str,
    pub environment: String,
    pub host: String,
    pub port: u16,
    /// Level used when `RUST_LOG` is not set.
    pub log_level: String,
    pub cors_origins: Vec<String>,
    pub llm: LlmModelConfig,
    pub rag: RagChainConfig,
    pub store: LogStoreConfig,
    pub blob: BlobSettings,
}

impl AppSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(&|k| std::env::var(k).ok())
    }

    /// Reads every setting through `lookup`.
    ///
    /// All missing required variables are reported together before any
    /// value is parsed.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut missing = Vec::new();
        for key in [
            "AZURE_OPENAI_ENDPOINT",
            "AZURE_OPENAI_API_KEY",
            "AZURE_SEARCH_API_KEY",
        ] {
            if get(key).is_none() {
                missing.push(key);
            }
        }
        if get("AZURE_SEARCH_ENDPOINT").is_none() && get("AZURE_SEARCH_NAME").is_none() {
            missing.push("AZURE_SEARCH_ENDPOINT (or AZURE_SEARCH_NAME)");
        }
        if !missing.is_empty() {
            return Err(SettingsError::Missing(missing));
        }

        let port = match get("PORT") {
            Some(v) => v
                .parse()
                .map_err(|_| SettingsError::Invalid(format!("PORT: `{v}` is not a valid port")))?,
            None => DEFAULT_PORT,
        };
        let cors_origins = match get("CORS_ORIGINS") {
            Some(v) => v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            app_name: get("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.into()),
            version: env!("CARGO_PKG_VERSION"),
            environment: get("ENVIRONMENT").unwrap_or_else(|| DEFAULT_ENVIRONMENT.into()),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.into()),
            cors_origins,
            llm: config_chat_from(lookup).map_err(|e| SettingsError::Invalid(e.to_string()))?,
            rag: RagChainConfig::from_lookup(lookup)
                .map_err(|e| SettingsError::Invalid(e.to_string()))?,
            store: LogStoreConfig::from_lookup(lookup)
                .map_err(|e| SettingsError::Invalid(e.to_string()))?,
            blob: BlobSettings {
                connection_string: get("AZURE_STORAGE_CONNECTION_STRING"),
                container_name: get("AZURE_STORAGE_CONTAINER_NAME")
                    .unwrap_or_else(|| DEFAULT_BLOB_CONTAINER.into()),
            },
        })
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
