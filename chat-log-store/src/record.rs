//! Interaction log record and timestamp encoding.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;

/// One persisted chat interaction.
///
/// Rows are inserted once and never updated; they leave the table only by
/// per-session deletion or by the retention sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionLog {
    pub id: String,
    pub session_id: String,
    pub total_tokens: i64,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_cost_usd: f64,
    pub user_question: String,
    pub llm_answer: String,
    pub date_processed: DateTime<Utc>,
}

/// Insert payload; the store assigns `id` and keeps microsecond precision.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInteractionLog {
    pub session_id: String,
    pub total_tokens: i64,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_cost_usd: f64,
    pub user_question: String,
    pub llm_answer: String,
    pub date_processed: DateTime<Utc>,
}

impl NewInteractionLog {
    pub(crate) fn with_id(self, id: String) -> InteractionLog {
        InteractionLog {
            id,
            session_id: self.session_id,
            total_tokens: self.total_tokens,
            prompt_tokens: self.prompt_tokens,
            completion_tokens: self.completion_tokens,
            total_cost_usd: self.total_cost_usd,
            user_question: self.user_question,
            llm_answer: self.llm_answer,
            date_processed: self.date_processed.trunc_subsecs(6),
        }
    }
}

/// Generates a fresh primary key.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Encodes a timestamp as fixed-width RFC3339 UTC (`2025-01-02T03:04:05.000006Z`).
///
/// Every stored value has the same width and zone, so SQL text comparison
/// orders them chronologically.
pub fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.trunc_subsecs(6).to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored `date_processed` value.
///
/// Accepts any RFC3339 offset so rows written by other tools still load.
pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Decode(format!("date_processed `{raw}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn encoding_is_fixed_width_and_ordered() {
        let a = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let b = a + Duration::microseconds(1);
        let c = a + Duration::hours(30);

        let (ea, eb, ec) = (encode_timestamp(&a), encode_timestamp(&b), encode_timestamp(&c));
        assert_eq!(ea, "2025-01-02T03:04:05.000000Z");
        assert_eq!(ea.len(), eb.len());
        assert!(ea < eb && eb < ec);
    }

    #[test]
    fn decode_accepts_offsets() {
        let ts = decode_timestamp("2025-01-02T05:04:05+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap());
        assert!(decode_timestamp("yesterday").is_err());
    }
}
