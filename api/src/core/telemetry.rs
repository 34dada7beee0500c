use std::io::{self, IsTerminal};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Workspace crates that follow the configured level.
const WORKSPACE_TARGETS: &[&str] = &[
    "ai_chatbot_backend",
    "api",
    "rag_chain",
    "ai_llm_service",
    "chat_log_store",
];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let s = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Filter directives for `log_level` (`INFO`, `debug`, ...).
///
/// Workspace crates log at `log_level`; dependencies stay at `warn`, or at
/// `log_level` when that is quieter. Unknown levels fall back to `info`.
pub fn default_directives(log_level: &str) -> String {
    let level = match log_level.trim().to_ascii_lowercase().as_str() {
        l @ ("trace" | "debug" | "info" | "warn" | "error" | "off") => l.to_string(),
        "warning" => "warn".to_string(),
        "critical" => "error".to_string(),
        _ => "info".to_string(),
    };
    let deps = match level.as_str() {
        "error" | "off" => level.as_str(),
        _ => "warn",
    };
    let mut out = deps.to_string();
    for target in WORKSPACE_TARGETS {
        out.push_str(&format!(",{target}={level}"));
    }
    out.push_str(&format!(",tower_http={level}"));
    out
}

/// Installs the global subscriber. `RUST_LOG` wins over `log_level`.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format with `file:line` and target
/// - ANSI colors only when stdout is a terminal
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    let format = fmt::format()
        .compact()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_source_location(true);
    let layer = fmt::layer()
        .with_ansi(io::stdout().is_terminal())
        .event_format(format);

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_are_normalized() {
        let d = default_directives("INFO");
        assert!(d.starts_with("warn,"));
        assert!(d.contains("api=info"));
        assert!(d.contains("chat_log_store=info"));

        assert!(default_directives("Warning").contains("rag_chain=warn"));
        assert!(default_directives("nonsense").contains("api=info"));
        assert!(default_directives("error").starts_with("error,"));
    }

    #[test]
    fn directives_parse() {
        for lvl in ["DEBUG", "info", "critical"] {
            assert!(EnvFilter::try_new(default_directives(lvl)).is_ok());
        }
    }
}
