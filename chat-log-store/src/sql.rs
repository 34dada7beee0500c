//! SQL text shared by both backends.
//!
//! Column order in [`Statements::select_by_session`] is the order the row
//! mappers read.

pub(crate) const COLUMNS: &str = "ID, session_id, total_tokens, prompt_tokens, completion_tokens, \
     total_cost_usd, user_question, llm_answer, date_processed";

#[derive(Clone, Debug)]
pub(crate) struct Statements {
    pub create_table: String,
    pub insert: String,
    pub select_by_session: String,
    pub delete_by_session: String,
    pub delete_older_than: String,
    pub count_sessions: String,
}

impl Statements {
    /// `table` must already be validated as a plain identifier.
    pub fn for_table(table: &str) -> Self {
        Self {
            create_table: format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    ID TEXT PRIMARY KEY,
                    session_id TEXT,
                    total_tokens INTEGER,
                    prompt_tokens INTEGER,
                    completion_tokens INTEGER,
                    total_cost_usd REAL,
                    user_question TEXT,
                    llm_answer TEXT,
                    date_processed TEXT
                )"
            ),
            insert: format!(
                "INSERT INTO {table} ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            select_by_session: format!("SELECT {COLUMNS} FROM {table} WHERE session_id = ?"),
            delete_by_session: format!("DELETE FROM {table} WHERE session_id = ?"),
            delete_older_than: format!("DELETE FROM {table} WHERE date_processed < ?"),
            count_sessions: format!("SELECT COUNT(DISTINCT session_id) FROM {table}"),
        }
    }
}
