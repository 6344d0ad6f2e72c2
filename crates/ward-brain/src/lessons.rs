//! Lessons learned — append-only notes on governance failures.
//!
//! Entries land at the end of the `## Lessons Learned` section of the shared
//! brain file so future sessions (and humans) can see what went wrong.
//! Recording is fire-and-forget: failures are logged, never returned.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use ward_core::caps::Clock;

const BRAIN_HEADER: &str = "# Project Brain\n\nShared working memory for agent sessions.\n";
const LESSONS_HEADER: &str = "## Lessons Learned";

/// A single governance failure worth remembering.
#[derive(Debug, Clone)]
pub struct Lesson {
    /// Intent involved.
    pub intent_id: String,
    /// Tool that triggered the failure.
    pub tool_name: String,
    /// What happened.
    pub description: String,
    /// Category headline; defaults to `Governance`.
    pub category: Option<String>,
}

/// Appends lessons to the shared brain file.
#[derive(Clone)]
pub struct LessonRecorder {
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl LessonRecorder {
    /// Recorder over the given brain file.
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    /// Append one dated lesson entry. Creates the brain file and the
    /// `## Lessons Learned` section when absent.
    pub async fn record_lesson(&self, lesson: &Lesson) {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BRAIN_HEADER.to_string(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "brain file unreadable, lesson dropped");
                return;
            }
        };

        let updated = append_lesson(&text, lesson, &self.clock.today());

        if let Some(parent) = self.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!(path = %self.path.display(), error = %e, "brain directory unavailable, lesson dropped");
                return;
            }
        }
        if let Err(e) = tokio::fs::write(&self.path, updated).await {
            warn!(path = %self.path.display(), error = %e, "brain write failed, lesson dropped");
        }
    }

    /// Record a write that landed outside the intent's owned scope.
    pub async fn record_scope_violation(
        &self,
        intent_id: &str,
        tool_name: &str,
        rel_path: &str,
        owned_scope: &[String],
    ) {
        self.record_lesson(&Lesson {
            intent_id: intent_id.to_string(),
            tool_name: tool_name.to_string(),
            description: format!(
                "Attempted to write {rel_path} outside the owned scope [{}]",
                owned_scope.join(", ")
            ),
            category: Some("Scope Violation".to_string()),
        })
        .await;
    }

    /// Record a stale-read rejection.
    pub async fn record_hash_mismatch(&self, intent_id: &str, tool_name: &str, rel_path: &str) {
        self.record_lesson(&Lesson {
            intent_id: intent_id.to_string(),
            tool_name: tool_name.to_string(),
            description: format!(
                "File {rel_path} changed on disk since this session last observed it"
            ),
            category: Some("Hash Mismatch".to_string()),
        })
        .await;
    }
}

/// Insert a lesson at the end of the Lessons Learned section: just before
/// the next `## ` header when one follows, otherwise at end of file.
fn append_lesson(text: &str, lesson: &Lesson, today: &str) -> String {
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();

    let header_at = match lines.iter().position(|l| l.trim_end() == LESSONS_HEADER) {
        Some(at) => at,
        None => {
            if lines.last().is_some_and(|l| !l.trim().is_empty()) {
                lines.push(String::new());
            }
            lines.push(LESSONS_HEADER.to_string());
            lines.len() - 1
        }
    };

    let insert_at = lines[header_at + 1..]
        .iter()
        .position(|l| l.starts_with("## "))
        .map_or(lines.len(), |offset| header_at + 1 + offset);

    let category = lesson.category.as_deref().unwrap_or("Governance");
    let entry = [
        String::new(),
        format!("### {today}: {category} ({})", lesson.intent_id),
        format!("- Tool: {}", lesson.tool_name),
        format!("- Issue: {}", lesson.description),
        format!("- Intent: {}", lesson.intent_id),
    ];
    for (offset, line) in entry.into_iter().enumerate() {
        lines.insert(insert_at + offset, line);
    }

    let mut result = lines.join("\n");
    result.push('\n');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use ward_core::caps::SystemClock;

    fn recorder(dir: &tempfile::TempDir) -> LessonRecorder {
        LessonRecorder::new(dir.path().join("CLAUDE.md"), Arc::new(SystemClock))
    }

    fn lesson() -> Lesson {
        Lesson {
            intent_id: "INT-001".into(),
            tool_name: "write_to_file".into(),
            description: "something went sideways".into(),
            category: None,
        }
    }

    #[tokio::test]
    async fn creates_brain_and_section() {
        let dir = tempfile::tempdir().unwrap();
        recorder(&dir).record_lesson(&lesson()).await;

        let text = tokio::fs::read_to_string(dir.path().join("CLAUDE.md"))
            .await
            .unwrap();
        assert!(text.starts_with("# Project Brain"));
        assert!(text.contains("## Lessons Learned"));
        assert!(text.contains(": Governance (INT-001)"));
        assert!(text.contains("- Tool: write_to_file"));
        assert!(text.contains("- Issue: something went sideways"));
    }

    #[tokio::test]
    async fn entry_lands_before_the_next_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CLAUDE.md");
        tokio::fs::write(
            &path,
            "# Project Brain\n\n## Lessons Learned\n\n### 2026-01-01: Old (INT-000)\n- Tool: edit\n\n## Active Sessions\n\n| Session | Intent | Last Seen |\n|---|---|---|\n",
        )
        .await
        .unwrap();

        recorder(&dir).record_lesson(&lesson()).await;

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        let new_pos = text.find("(INT-001)").unwrap();
        let old_pos = text.find("(INT-000)").unwrap();
        let sessions_pos = text.find("## Active Sessions").unwrap();
        assert!(old_pos < new_pos && new_pos < sessions_pos, "{text}");
    }

    #[tokio::test]
    async fn scope_violation_wrapper_fills_category() {
        let dir = tempfile::tempdir().unwrap();
        recorder(&dir)
            .record_scope_violation(
                "INT-001",
                "write_to_file",
                "src/api/client.ts",
                &["src/core/hooks/**".to_string()],
            )
            .await;

        let text = tokio::fs::read_to_string(dir.path().join("CLAUDE.md"))
            .await
            .unwrap();
        assert!(text.contains("Scope Violation (INT-001)"));
        assert!(text.contains("src/api/client.ts"));
        assert!(text.contains("src/core/hooks/**"));
    }

    #[tokio::test]
    async fn hash_mismatch_wrapper_fills_category() {
        let dir = tempfile::tempdir().unwrap();
        recorder(&dir)
            .record_hash_mismatch("INT-001", "apply_diff", "src/a.rs")
            .await;

        let text = tokio::fs::read_to_string(dir.path().join("CLAUDE.md"))
            .await
            .unwrap();
        assert!(text.contains("Hash Mismatch (INT-001)"));
        assert!(text.contains("changed on disk"));
    }
}
