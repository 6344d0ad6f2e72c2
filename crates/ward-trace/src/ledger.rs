//! The append-only ledger writer and its legacy-tolerant reader.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

use ward_core::caps::VcsProbe;
use ward_core::trace::TraceEntry;

use crate::schema::{parse_line, LedgerRecord, LedgerView};

/// Default number of entries [`TraceLedger::recent_entries`] returns.
pub const DEFAULT_RECENT_LIMIT: usize = 20;

/// Delay before the single append retry.
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Per-record options supplied by the post-hook.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Model identifier for attribution; `"unknown"` when absent.
    pub model_identifier: Option<String>,
    /// First touched line (default 1).
    pub start_line: Option<u32>,
    /// Last touched line (default 1).
    pub end_line: Option<u32>,
    /// Specification references, appended as `specification` relations.
    pub related_specs: Vec<String>,
}

/// Append-only JSONL writer over `agent_trace.jsonl`.
pub struct TraceLedger {
    path: PathBuf,
    vcs: Arc<dyn VcsProbe>,
}

impl TraceLedger {
    /// Ledger at the given path, probing the given VCS for revision ids.
    pub fn new(path: impl Into<PathBuf>, vcs: Arc<dyn VcsProbe>) -> Self {
        Self {
            path: path.into(),
            vcs,
        }
    }

    /// The ledger file path.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Convert and append one entry.
    ///
    /// Fail-open: an append failure is retried once after 100 ms; a second
    /// failure is logged and swallowed. The caller never sees an error.
    pub async fn log(&self, entry: &TraceEntry, options: &LogOptions) {
        let revision_id = self.vcs.current_revision_id().await;
        let record = LedgerRecord::from_entry(
            entry,
            revision_id,
            options.model_identifier.as_deref(),
            options.start_line.unwrap_or(1),
            options.end_line.unwrap_or(1),
            &options.related_specs,
        );

        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, record_id = %record.id, "ledger record failed to serialize, dropping");
                return;
            }
        };

        if let Err(first) = self.append(&line).await {
            tokio::time::sleep(RETRY_DELAY).await;
            if let Err(second) = self.append(&line).await {
                warn!(
                    path = %self.path.display(),
                    first_error = %first,
                    error = %second,
                    "ledger append failed twice, dropping record"
                );
            }
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }

    /// The last `limit` entries related to an intent, in file order.
    ///
    /// Streams the file line by line; malformed lines and records for other
    /// intents are skipped silently. Both the current and legacy shapes are
    /// accepted.
    pub async fn recent_entries(&self, intent_id: &str, limit: usize) -> Vec<LedgerView> {
        let file = match tokio::fs::File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ledger unreadable");
                return Vec::new();
            }
        };

        let mut lines = BufReader::new(file).lines();
        let mut matched = Vec::new();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(view) = parse_line(&line) {
                        if view.intent_id == intent_id {
                            matched.push(view);
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "ledger read interrupted");
                    break;
                }
            }
        }

        let start = matched.len().saturating_sub(limit);
        matched.split_off(start)
    }
}
