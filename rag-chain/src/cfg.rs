//! Runtime configuration loaded from environment variables.

use crate::error::RagChainError;

pub const DEFAULT_INDEX: &str = "knowledge-base";
pub const DEFAULT_SEARCH_API_VERSION: &str = "2023-11-01";
pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_CONTENT_KEY: &str = "content";
pub const DEFAULT_MEMORY_MAX_TURNS: usize = 20;

/// Retrieval and memory knobs for [`crate::RagChain`].
#[derive(Clone, Debug, PartialEq)]
pub struct RagChainConfig {
    /// Search service base URL, e.g. `https://my-search.search.windows.net`.
    pub search_endpoint: String,
    pub search_api_key: String,
    pub index_name: String,
    pub search_api_version: String,
    /// Documents retrieved per question.
    pub top_k: usize,
    /// Field of each search hit that holds the document text.
    pub content_key: String,
    /// Turns kept per session; `0` keeps everything.
    pub memory_max_turns: usize,
}

impl RagChainConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self, RagChainError> {
        Self::from_lookup(&|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary lookup.
    ///
    /// `AZURE_SEARCH_ENDPOINT` wins; otherwise the endpoint is derived from
    /// `AZURE_SEARCH_NAME` as `https://{name}.search.windows.net`.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, RagChainError> {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let search_endpoint = get("AZURE_SEARCH_ENDPOINT")
            .or_else(|| get("AZURE_SEARCH_NAME").map(|n| format!("https://{n}.search.windows.net")))
            .ok_or_else(|| {
                RagChainError::Config("AZURE_SEARCH_ENDPOINT or AZURE_SEARCH_NAME is required".into())
            })?;
        if !(search_endpoint.starts_with("http://") || search_endpoint.starts_with("https://")) {
            return Err(RagChainError::Config(format!(
                "AZURE_SEARCH_ENDPOINT `{search_endpoint}` must start with http:// or https://"
            )));
        }
        let search_api_key = get("AZURE_SEARCH_API_KEY")
            .ok_or_else(|| RagChainError::Config("AZURE_SEARCH_API_KEY is required".into()))?;

        Ok(Self {
            search_endpoint,
            search_api_key,
            index_name: get("AZURE_SEARCH_INDEX_NAME").unwrap_or_else(|| DEFAULT_INDEX.into()),
            search_api_version: get("AZURE_SEARCH_API_VERSION")
                .unwrap_or_else(|| DEFAULT_SEARCH_API_VERSION.into()),
            top_k: parse(&get, "RAG_TOP_K", DEFAULT_TOP_K)?,
            content_key: get("RAG_CONTENT_KEY").unwrap_or_else(|| DEFAULT_CONTENT_KEY.into()),
            memory_max_turns: parse(&get, "RAG_MEMORY_MAX_TURNS", DEFAULT_MEMORY_MAX_TURNS)?,
        })
    }
}

fn parse<T: std::str::FromStr>(
    get: &dyn Fn(&str) -> Option<String>,
    key: &str,
    dflt: T,
) -> Result<T, RagChainError> {
    match get(key) {
        Some(v) => v
            .parse()
            .map_err(|_| RagChainError::Config(format!("{key}: `{v}` is not a valid number"))),
        None => Ok(dflt),
    }
}
