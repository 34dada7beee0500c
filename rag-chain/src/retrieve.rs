//! Azure AI Search retriever (full-text `docs/search` endpoint).

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::{cfg::RagChainConfig, error::RagChainError};

/// A retrieved document chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct RetrievedDoc {
    pub content: String,
    pub score: Option<f64>,
}

/// Client for `POST {endpoint}/indexes/{index}/docs/search`.
#[derive(Debug)]
pub struct SearchRetriever {
    http: reqwest::Client,
    url: String,
    top_k: usize,
    content_key: String,
}

impl SearchRetriever {
    pub fn new(cfg: &RagChainConfig) -> Result<Self, RagChainError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::HeaderName::from_static("api-key"),
            header::HeaderValue::from_str(&cfg.search_api_key)
                .map_err(|e| RagChainError::Config(format!("invalid search api key: {e}")))?,
        );
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            url: format!(
                "{}/indexes/{}/docs/search?api-version={}",
                cfg.search_endpoint.trim_end_matches('/'),
                cfg.index_name,
                cfg.search_api_version
            ),
            top_k: cfg.top_k,
            content_key: cfg.content_key.clone(),
        })
    }

    /// Returns up to `top_k` documents for `query`, best first.
    ///
    /// Hits without a string `content_key` field are skipped.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDoc>, RagChainError> {
        #[derive(Serialize)]
        struct Req<'a> {
            search: &'a str,
            top: usize,
        }
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            value: Vec<Map<String, Value>>,
        }

        let started = Instant::now();
        let resp = self
            .http
            .post(&self.url)
            .json(&Req {
                search: query,
                top: self.top_k,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let snippet: String = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(300)
                .collect();
            error!(status, %snippet, "search returned non-success status");
            return Err(RagChainError::SearchStatus { status, snippet });
        }

        let data: Resp = resp
            .json()
            .await
            .map_err(|e| RagChainError::SearchDecode(e.to_string()))?;

        let docs: Vec<RetrievedDoc> = data
            .value
            .into_iter()
            .filter_map(|hit| {
                let content = hit.get(&self.content_key)?.as_str()?.to_string();
                let score = hit.get("@search.score").and_then(Value::as_f64);
                Some(RetrievedDoc { content, score })
            })
            .collect();

        debug!(
            hits = docs.len(),
            latency_ms = started.elapsed().as_millis(),
            "search completed"
        );
        Ok(docs)
    }
}
