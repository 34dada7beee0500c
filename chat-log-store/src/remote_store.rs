//! Remote libSQL (Turso) backend over the HTTP pipeline protocol.
//!
//! Each operation is one `POST {base_url}/v2/pipeline` carrying an `execute`
//! request followed by `close`, so the server-side stream never outlives the
//! call and every statement is autocommitted.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    LogStore,
    errors::{Result, StorageError},
    record::{InteractionLog, NewInteractionLog, decode_timestamp, encode_timestamp, new_id},
    sql::Statements,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Log store backed by a remote libSQL database.
#[derive(Clone, Debug)]
pub struct RemoteLogStore {
    client: reqwest::Client,
    pipeline_url: String,
    stmts: Arc<Statements>,
}

impl RemoteLogStore {
    /// Builds a client for `base_url` (`https://<db>.turso.io`).
    ///
    /// # Errors
    /// [`StorageError::Config`] if the token cannot be used as a header value,
    /// [`StorageError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, auth_token: &str, table: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {auth_token}"))
                .map_err(|e| StorageError::Config(format!("invalid auth token: {e}")))?,
        );
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        let pipeline_url = format!("{}/v2/pipeline", base_url.trim_end_matches('/'));
        info!(url = %pipeline_url, "remote log store configured");

        Ok(Self {
            client,
            pipeline_url,
            stmts: Arc::new(Statements::for_table(table)),
        })
    }

    async fn execute(&self, sql: &str, args: Vec<Value>) -> Result<ExecuteResult> {
        let body = PipelineRequest {
            baton: None,
            requests: vec![
                StreamRequest::Execute {
                    stmt: Stmt {
                        sql,
                        args,
                        want_rows: true,
                    },
                },
                StreamRequest::Close,
            ],
        };

        debug!(url = %self.pipeline_url, sql, "POST pipeline");
        let resp = self.client.post(&self.pipeline_url).json(&body).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!(%status, body = %text, "remote database returned non-success status");
            return Err(StorageError::Remote {
                status: status.as_u16(),
                message: text.trim().chars().take(300).collect(),
            });
        }

        let out: PipelineResponse = resp
            .json()
            .await
            .map_err(|e| StorageError::Decode(format!("pipeline response: {e}")))?;

        match out.results.into_iter().next() {
            Some(StreamResult::Ok {
                response: StreamResponse::Execute { result },
            }) => Ok(result),
            Some(StreamResult::Error { error }) => {
                error!(message = %error.message, "remote statement failed");
                Err(StorageError::Remote {
                    status: status.as_u16(),
                    message: error.message,
                })
            }
            _ => Err(StorageError::Decode(
                "pipeline response has no execute result".into(),
            )),
        }
    }
}

#[async_trait]
impl LogStore for RemoteLogStore {
    async fn initialize(&self) -> Result<()> {
        self.execute(&self.stmts.create_table, Vec::new()).await?;
        info!(url = %self.pipeline_url, "remote log table ready");
        Ok(())
    }

    async fn insert(&self, record: NewInteractionLog) -> Result<InteractionLog> {
        let stored = record.with_id(new_id());
        let args = vec![
            Value::text(&stored.id),
            Value::text(&stored.session_id),
            Value::integer(stored.total_tokens),
            Value::integer(stored.prompt_tokens),
            Value::integer(stored.completion_tokens),
            Value::Float {
                value: stored.total_cost_usd,
            },
            Value::text(&stored.user_question),
            Value::text(&stored.llm_answer),
            Value::text(&encode_timestamp(&stored.date_processed)),
        ];
        self.execute(&self.stmts.insert, args).await?;
        debug!(id = %stored.id, session_id = %stored.session_id, "log row inserted");
        Ok(stored)
    }

    async fn query_by_session(&self, session_id: &str) -> Result<Vec<InteractionLog>> {
        let result = self
            .execute(&self.stmts.select_by_session, vec![Value::text(session_id)])
            .await?;
        result.rows.iter().map(|row| row_to_record(row)).collect()
    }

    async fn delete_by_session(&self, session_id: &str) -> Result<u64> {
        let result = self
            .execute(&self.stmts.delete_by_session, vec![Value::text(session_id)])
            .await?;
        Ok(result.affected_row_count)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = self
            .execute(
                &self.stmts.delete_older_than,
                vec![Value::text(&encode_timestamp(&cutoff))],
            )
            .await?;
        Ok(result.affected_row_count)
    }

    async fn count_distinct_sessions(&self) -> Result<u64> {
        let result = self.execute(&self.stmts.count_sessions, Vec::new()).await?;
        let n = result
            .rows
            .first()
            .and_then(|r| r.first())
            .map(Value::as_i64)
            .transpose()?
            .unwrap_or(0);
        u64::try_from(n).map_err(|_| StorageError::Decode(format!("negative count {n}")))
    }

    fn backend_name(&self) -> &'static str {
        "libsql-remote"
    }
}

fn row_to_record(row: &[Value]) -> Result<InteractionLog> {
    let col = |i: usize| {
        row.get(i)
            .ok_or_else(|| StorageError::Decode(format!("row has {} columns, need 9", row.len())))
    };
    Ok(InteractionLog {
        id: col(0)?.as_text()?,
        session_id: col(1)?.as_text()?,
        total_tokens: col(2)?.as_i64()?,
        prompt_tokens: col(3)?.as_i64()?,
        completion_tokens: col(4)?.as_i64()?,
        total_cost_usd: col(5)?.as_f64()?,
        user_question: col(6)?.as_text()?,
        llm_answer: col(7)?.as_text()?,
        date_processed: decode_timestamp(&col(8)?.as_text()?)?,
    })
}

/* ===========================================================================
Wire types
======================================================================== */

/// Column value; integers travel as decimal strings to keep 64-bit precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Value {
    Null,
    Integer { value: String },
    Float { value: f64 },
    Text { value: String },
    Blob { base64: String },
}

impl Value {
    fn text(s: &str) -> Self {
        Self::Text { value: s.into() }
    }

    fn integer(n: i64) -> Self {
        Self::Integer {
            value: n.to_string(),
        }
    }

    fn as_text(&self) -> Result<String> {
        match self {
            Self::Text { value } => Ok(value.clone()),
            Self::Null => Ok(String::new()),
            other => Err(StorageError::Decode(format!("expected text, got {other:?}"))),
        }
    }

    fn as_i64(&self) -> Result<i64> {
        match self {
            Self::Integer { value } => value
                .parse()
                .map_err(|e| StorageError::Decode(format!("integer `{value}`: {e}"))),
            Self::Null => Ok(0),
            other => Err(StorageError::Decode(format!("expected integer, got {other:?}"))),
        }
    }

    fn as_f64(&self) -> Result<f64> {
        match self {
            Self::Float { value } => Ok(*value),
            Self::Integer { .. } => self.as_i64().map(|n| n as f64),
            Self::Null => Ok(0.0),
            other => Err(StorageError::Decode(format!("expected float, got {other:?}"))),
        }
    }
}

#[derive(Debug, Serialize)]
struct PipelineRequest<'a> {
    baton: Option<String>,
    requests: Vec<StreamRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamRequest<'a> {
    Execute { stmt: Stmt<'a> },
    Close,
}

#[derive(Debug, Serialize)]
struct Stmt<'a> {
    sql: &'a str,
    args: Vec<Value>,
    want_rows: bool,
}

#[derive(Debug, Deserialize)]
struct PipelineResponse {
    #[serde(default)]
    results: Vec<StreamResult>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamResult {
    Ok { response: StreamResponse },
    Error { error: RemoteError },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamResponse {
    Execute {
        result: ExecuteResult,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ExecuteResult {
    #[serde(default)]
    rows: Vec<Vec<Value>>,
    #[serde(default)]
    affected_row_count: u64,
}

#[derive(Debug, Deserialize)]
struct RemoteError {
    message: String,
}
