//! Cooperative session presence.
//!
//! Each live session upserts one row into the `## Active Sessions` table of
//! the shared brain file. The table is advisory: it lets sessions see each
//! other and warn about double-claimed intents, but it locks nothing. The
//! engine's optimistic hash check is the actual guard.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::DateTime;
use tracing::{debug, warn};

use ward_core::caps::Clock;

const SESSIONS_HEADER: &str = "## Active Sessions";
const TABLE_HEADER: &str = "| Session | Intent | Last Seen |";
const TABLE_SEPARATOR: &str = "|---|---|---|";

/// Rows older than this are swept by [`SessionCoordinator::cleanup_stale_sessions`].
pub const STALE_AFTER_SECS: i64 = 300;

/// One row of the presence table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Session identifier.
    pub session_id: String,
    /// Intent the session holds, if any.
    pub intent_id: Option<String>,
    /// ISO-8601 timestamp of the last heartbeat.
    pub last_seen: String,
}

/// Maintains the presence table in the shared brain file.
#[derive(Clone)]
pub struct SessionCoordinator {
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl SessionCoordinator {
    /// Coordinator over the given brain file.
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    /// Upsert this session's row. Does nothing when the brain file is
    /// missing; cooperation requires the brain to exist.
    pub async fn heartbeat(&self, session_id: &str, intent_id: Option<&str>) {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no brain file, skipping heartbeat");
                return;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "brain file unreadable, skipping heartbeat");
                return;
            }
        };

        let mut rows = parse_rows(&text);
        let row = SessionInfo {
            session_id: session_id.to_string(),
            intent_id: intent_id.map(str::to_string),
            last_seen: self.clock.now(),
        };
        match rows.iter_mut().find(|r| r.session_id == session_id) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }

        self.write(&rebuild(&text, &rows)).await;
    }

    /// All rows currently in the table.
    pub async fn list_sessions(&self) -> Vec<SessionInfo> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => parse_rows(&text),
            Err(_) => Vec::new(),
        }
    }

    /// Whether another session's row claims the intent.
    pub async fn is_intent_claimed_by_other(&self, session_id: &str, intent_id: &str) -> bool {
        self.list_sessions()
            .await
            .iter()
            .any(|s| s.session_id != session_id && s.intent_id.as_deref() == Some(intent_id))
    }

    /// Remove rows whose heartbeat is older than five minutes. Returns how
    /// many were removed; writes back only when something was.
    pub async fn cleanup_stale_sessions(&self) -> usize {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(_) => return 0,
        };

        let now = match DateTime::parse_from_rfc3339(&self.clock.now()) {
            Ok(now) => now,
            Err(e) => {
                warn!(error = %e, "clock produced an unparseable timestamp, skipping cleanup");
                return 0;
            }
        };

        let rows = parse_rows(&text);
        let fresh: Vec<SessionInfo> = rows
            .iter()
            .filter(|row| match DateTime::parse_from_rfc3339(&row.last_seen) {
                Ok(seen) => (now - seen).num_seconds() <= STALE_AFTER_SECS,
                // An unreadable timestamp counts as stale.
                Err(_) => false,
            })
            .cloned()
            .collect();

        let removed = rows.len() - fresh.len();
        if removed > 0 {
            self.write(&rebuild(&text, &fresh)).await;
        }
        removed
    }

    async fn write(&self, text: &str) {
        if let Err(e) = tokio::fs::write(&self.path, text).await {
            warn!(path = %self.path.display(), error = %e, "session table write failed");
        }
    }
}

/// `[start, end)` line range of the sessions section.
fn section_bounds(lines: &[String]) -> Option<(usize, usize)> {
    let start = lines.iter().position(|l| l.trim_end() == SESSIONS_HEADER)?;
    let end = lines[start + 1..]
        .iter()
        .position(|l| l.starts_with("## "))
        .map_or(lines.len(), |offset| start + 1 + offset);
    Some((start, end))
}

fn is_separator_row(cells: &[&str]) -> bool {
    cells.iter().all(|c| c.chars().all(|ch| ch == '-') && !c.is_empty())
}

fn parse_rows(text: &str) -> Vec<SessionInfo> {
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    let Some((start, end)) = section_bounds(&lines) else {
        return Vec::new();
    };

    lines[start + 1..end]
        .iter()
        .filter_map(|line| {
            let trimmed = line.trim();
            if !trimmed.starts_with('|') {
                return None;
            }
            let cells: Vec<&str> = trimmed
                .trim_matches('|')
                .split('|')
                .map(str::trim)
                .collect();
            if cells.len() != 3 || cells[0] == "Session" || is_separator_row(&cells) {
                return None;
            }
            Some(SessionInfo {
                session_id: cells[0].to_string(),
                intent_id: match cells[1] {
                    "none" | "" => None,
                    intent => Some(intent.to_string()),
                },
                last_seen: cells[2].to_string(),
            })
        })
        .collect()
}

/// Rewrite the sessions section with the given rows, creating the section at
/// end of file when absent. Content outside the section is untouched.
fn rebuild(text: &str, rows: &[SessionInfo]) -> String {
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();

    let mut section = vec![
        SESSIONS_HEADER.to_string(),
        String::new(),
        TABLE_HEADER.to_string(),
        TABLE_SEPARATOR.to_string(),
    ];
    for row in rows {
        section.push(format!(
            "| {} | {} | {} |",
            row.session_id,
            row.intent_id.as_deref().unwrap_or("none"),
            row.last_seen
        ));
    }

    match section_bounds(&lines) {
        Some((start, end)) => {
            let tail: Vec<String> = lines.drain(end..).collect();
            lines.truncate(start);
            lines.extend(section);
            lines.extend(tail);
        }
        None => {
            if lines.last().is_some_and(|l| !l.trim().is_empty()) {
                lines.push(String::new());
            }
            lines.extend(section);
        }
    }

    let mut result = lines.join("\n");
    result.push('\n');
    result
}
