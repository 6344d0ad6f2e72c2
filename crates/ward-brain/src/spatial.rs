//! The spatial map: `intent_map.md`, sectioned by intent id.
//!
//! Each `## <id>` section holds a deduplicated file list and, for intents
//! that evolved, an `### Evolution Log` of dated entries. The map is
//! human-editable and best-effort; its absence is not a fault.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use ward_core::caps::Clock;
use ward_core::trace::MutationClass;

const MAP_HEADER: &str = "# Intent Map\n\nFiles touched per intent. Maintained by the governance hooks; safe to edit by hand.\n";

/// Maintains `intent_map.md`.
#[derive(Clone)]
pub struct SpatialIndex {
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl SpatialIndex {
    /// Index over the given map file.
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    /// Record that an intent touched a file.
    ///
    /// Idempotent for the file list; `INTENT_EVOLUTION` mutations also append
    /// a dated evolution-log entry. Failures are logged, never returned.
    pub async fn add_file_to_intent(
        &self,
        intent_id: &str,
        rel_path: &str,
        intent_name: Option<&str>,
        mutation_class: Option<MutationClass>,
    ) {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => MAP_HEADER.to_string(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "spatial map unreadable, skipping update");
                return;
            }
        };

        let evolution = mutation_class == Some(MutationClass::IntentEvolution);
        let updated = upsert_entry(
            &text,
            intent_id,
            rel_path,
            intent_name,
            evolution,
            &self.clock.today(),
        );
        if updated != text {
            self.write(&updated).await;
        }
    }

    /// Remove every reference to a file from an intent's section. No-op when
    /// the map or the section is absent.
    pub async fn remove_file_from_intent(&self, intent_id: &str, rel_path: &str) {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(_) => return,
        };
        let updated = remove_entry(&text, intent_id, rel_path);
        if updated != text {
            self.write(&updated).await;
        }
    }

    /// The file paths currently listed for an intent.
    pub async fn files_for_intent(&self, intent_id: &str) -> Vec<String> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(_) => return Vec::new(),
        };
        list_files(&text, intent_id)
    }

    async fn write(&self, text: &str) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!(path = %self.path.display(), error = %e, "spatial map directory unavailable");
                return;
            }
        }
        if let Err(e) = tokio::fs::write(&self.path, text).await {
            warn!(path = %self.path.display(), error = %e, "spatial map write failed");
        }
    }
}

/// `[start, end)` line range of the `## <id>` section, by prefix match.
fn section_bounds(lines: &[String], intent_id: &str) -> Option<(usize, usize)> {
    let start = lines.iter().position(|line| {
        line.strip_prefix("## ")
            .is_some_and(|rest| rest.trim().starts_with(intent_id))
    })?;
    let end = lines[start + 1..]
        .iter()
        .position(|line| line.starts_with("## "))
        .map_or(lines.len(), |offset| start + 1 + offset);
    Some((start, end))
}

fn is_footer_line(line: &str) -> bool {
    let t = line.trim();
    t == "---"
        || t == "***"
        || t == "___"
        || (t.len() > 1 && t.starts_with('_') && t.ends_with('_'))
        || (t.len() > 1 && t.starts_with('*') && t.ends_with('*'))
}

fn last_content_line(lines: &[String], start: usize, end: usize) -> usize {
    (start..end)
        .rev()
        .find(|&i| !lines[i].trim().is_empty())
        .unwrap_or(start)
}

fn upsert_entry(
    text: &str,
    intent_id: &str,
    rel_path: &str,
    intent_name: Option<&str>,
    evolution: bool,
    today: &str,
) -> String {
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();

    match section_bounds(&lines, intent_id) {
        Some((start, end)) => {
            let listed = lines[start + 1..end].iter().any(|l| l.contains(rel_path));
            if !listed {
                let anchor = last_content_line(&lines, start, end);
                lines.insert(anchor + 1, format!("- {rel_path}"));
            }
        }
        None => {
            // Insert the new section before any trailing footer.
            let mut insert_at = lines.len();
            while insert_at > 0 {
                let line = lines[insert_at - 1].trim();
                if line.is_empty() || is_footer_line(line) {
                    insert_at -= 1;
                } else {
                    break;
                }
            }
            let header = match intent_name {
                Some(name) => format!("## {intent_id}: {name}"),
                None => format!("## {intent_id}"),
            };
            let section = [
                String::new(),
                header,
                String::new(),
                "### Files".to_string(),
                String::new(),
                format!("- {rel_path}"),
            ];
            for (offset, line) in section.into_iter().enumerate() {
                lines.insert(insert_at + offset, line);
            }
        }
    }

    if evolution {
        // The section exists by now.
        if let Some((start, end)) = section_bounds(&lines, intent_id) {
            let mut end = end;
            let has_log = lines[start + 1..end]
                .iter()
                .any(|l| l.trim_start().starts_with("### Evolution Log"));
            if !has_log {
                let anchor = last_content_line(&lines, start, end);
                lines.insert(anchor + 1, String::new());
                lines.insert(anchor + 2, "### Evolution Log".to_string());
                end += 2;
            }
            let anchor = last_content_line(&lines, start, end);
            lines.insert(
                anchor + 1,
                format!("- _[EVOLUTION {today}]_ {rel_path} — new behavior added"),
            );
        }
    }

    let mut result = lines.join("\n");
    result.push('\n');
    result
}

fn remove_entry(text: &str, intent_id: &str, rel_path: &str) -> String {
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    let Some((start, end)) = section_bounds(&lines, intent_id) else {
        return text.to_string();
    };

    let kept: Vec<String> = lines
        .iter()
        .enumerate()
        .filter(|(i, line)| !(*i > start && *i < end && line.contains(rel_path)))
        .map(|(_, line)| line.clone())
        .collect();

    let mut result = kept.join("\n");
    result.push('\n');
    result
}

fn list_files(text: &str, intent_id: &str) -> Vec<String> {
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    let Some((start, end)) = section_bounds(&lines, intent_id) else {
        return Vec::new();
    };

    lines[start + 1..end]
        .iter()
        .filter_map(|line| {
            let trimmed = line.trim();
            let entry = trimmed.strip_prefix("- ")?;
            if entry.starts_with("_[EVOLUTION") {
                return None;
            }
            Some(entry.trim_matches('`').to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ward_core::caps::SystemClock;

    fn index(dir: &tempfile::TempDir) -> SpatialIndex {
        SpatialIndex::new(dir.path().join("intent_map.md"), Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn creates_map_and_section() {
        let dir = tempfile::tempdir().unwrap();
        let idx = index(&dir);
        idx.add_file_to_intent("INT-001", "src/a.rs", Some("First intent"), None)
            .await;

        let text = tokio::fs::read_to_string(dir.path().join("intent_map.md"))
            .await
            .unwrap();
        assert!(text.starts_with("# Intent Map"));
        assert!(text.contains("## INT-001: First intent"));
        assert!(text.contains("### Files"));
        assert!(text.contains("- src/a.rs"));
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let idx = index(&dir);
        idx.add_file_to_intent("INT-001", "src/a.rs", None, None).await;
        let first = tokio::fs::read_to_string(dir.path().join("intent_map.md"))
            .await
            .unwrap();
        idx.add_file_to_intent("INT-001", "src/a.rs", None, None).await;
        let second = tokio::fs::read_to_string(dir.path().join("intent_map.md"))
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn appends_within_existing_section() {
        let dir = tempfile::tempdir().unwrap();
        let idx = index(&dir);
        idx.add_file_to_intent("INT-001", "src/a.rs", None, None).await;
        idx.add_file_to_intent("INT-001", "src/b.rs", None, None).await;
        idx.add_file_to_intent("INT-002", "docs/x.md", None, None).await;

        let files_1 = idx.files_for_intent("INT-001").await;
        assert_eq!(files_1, vec!["src/a.rs", "src/b.rs"]);
        let files_2 = idx.files_for_intent("INT-002").await;
        assert_eq!(files_2, vec!["docs/x.md"]);
    }

    #[tokio::test]
    async fn new_section_lands_before_footer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intent_map.md");
        tokio::fs::write(
            &path,
            "# Intent Map\n\n## INT-001\n\n- src/a.rs\n\n---\n_Generated by ward._\n",
        )
        .await
        .unwrap();

        let idx = index(&dir);
        idx.add_file_to_intent("INT-002", "docs/x.md", None, None).await;

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        let section_pos = text.find("## INT-002").unwrap();
        let footer_pos = text.find("---").unwrap();
        assert!(section_pos < footer_pos, "{text}");
    }

    #[tokio::test]
    async fn evolution_mutations_get_a_log_entry() {
        let dir = tempfile::tempdir().unwrap();
        let idx = index(&dir);
        idx.add_file_to_intent(
            "INT-001",
            "src/a.rs",
            None,
            Some(MutationClass::IntentEvolution),
        )
        .await;

        let text = tokio::fs::read_to_string(dir.path().join("intent_map.md"))
            .await
            .unwrap();
        assert!(text.contains("### Evolution Log"));
        assert!(text.contains("]_ src/a.rs"));

        // A second evolution appends another dated line but no second header.
        idx.add_file_to_intent(
            "INT-001",
            "src/a.rs",
            None,
            Some(MutationClass::IntentEvolution),
        )
        .await;
        let text = tokio::fs::read_to_string(dir.path().join("intent_map.md"))
            .await
            .unwrap();
        assert_eq!(text.matches("### Evolution Log").count(), 1);
        assert_eq!(text.matches("]_ src/a.rs").count(), 2);
    }

    #[tokio::test]
    async fn remove_deletes_references_in_section_only() {
        let dir = tempfile::tempdir().unwrap();
        let idx = index(&dir);
        idx.add_file_to_intent("INT-001", "src/a.rs", None, None).await;
        idx.add_file_to_intent("INT-002", "src/a.rs", None, None).await;

        idx.remove_file_from_intent("INT-001", "src/a.rs").await;

        assert!(idx.files_for_intent("INT-001").await.is_empty());
        assert_eq!(idx.files_for_intent("INT-002").await, vec!["src/a.rs"]);
    }

    #[tokio::test]
    async fn remove_on_missing_map_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let idx = index(&dir);
        idx.remove_file_from_intent("INT-001", "src/a.rs").await;
        assert!(!dir.path().join("intent_map.md").exists());
    }
}
