//! Intent lifecycle operations.
//!
//! Both operations re-read the catalog file, rewrite only the scalar lines
//! they change inside the target intent's block, and write the whole file
//! back. Everything the human put in the file (comments, key order, the
//! quoting of untouched lines) survives. The write is not atomic with
//! respect to concurrent writers; writers are rare and human-mediated.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use ward_core::caps::Clock;
use ward_core::errors::WardError;
use ward_core::intent::{can_transition, IntentStatus};

use crate::loader::CatalogLoader;

/// The two mutating operations on the catalog file.
pub struct IntentLifecycle {
    path: PathBuf,
    loader: Arc<CatalogLoader>,
    clock: Arc<dyn Clock>,
}

impl IntentLifecycle {
    /// Lifecycle manager over the same file the loader reads.
    pub fn new(path: impl Into<PathBuf>, loader: Arc<CatalogLoader>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            loader,
            clock,
        }
    }

    /// Transition an intent to a new status.
    ///
    /// Fails with [`WardError::IllegalTransition`] when `(current, new)` is
    /// not in the allowed table; the file is left untouched in that case.
    pub async fn transition_intent(
        &self,
        intent_id: &str,
        new_status: IntentStatus,
    ) -> Result<(), WardError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let current = current_status(&text, intent_id)?;

        if !can_transition(current, new_status) {
            return Err(WardError::IllegalTransition {
                intent_id: intent_id.to_string(),
                from: current,
                to: new_status,
            });
        }

        let text = rewrite_scalar(&text, intent_id, "status", new_status.as_str())?;
        let text = rewrite_scalar(&text, intent_id, "updated_at", &self.clock.now())?;
        tokio::fs::write(&self.path, text).await?;
        self.loader.invalidate();

        debug!(intent_id, from = %current, to = %new_status, "intent transitioned");
        Ok(())
    }

    /// Overwrite one scalar field of an intent and bump `updated_at`.
    pub async fn update_intent_field(
        &self,
        intent_id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), WardError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        ensure_intent_exists(&text, intent_id)?;

        let text = rewrite_scalar(&text, intent_id, field, value)?;
        let text = if field == "updated_at" {
            text
        } else {
            rewrite_scalar(&text, intent_id, "updated_at", &self.clock.now())?
        };
        tokio::fs::write(&self.path, text).await?;
        self.loader.invalidate();

        debug!(intent_id, field, "intent field updated");
        Ok(())
    }
}

fn parse_root(text: &str) -> Result<serde_yaml::Value, WardError> {
    serde_yaml::from_str(text).map_err(|e| WardError::CatalogParse(e.to_string()))
}

fn intent_item<'a>(
    root: &'a serde_yaml::Value,
    intent_id: &str,
) -> Result<&'a serde_yaml::Value, WardError> {
    let seq = root
        .get("active_intents")
        .or_else(|| root.get("intents"))
        .and_then(serde_yaml::Value::as_sequence)
        .ok_or_else(|| {
            WardError::CatalogParse("catalog root has no 'active_intents' sequence".to_string())
        })?;
    seq.iter()
        .find(|item| item.get("id").and_then(serde_yaml::Value::as_str) == Some(intent_id))
        .ok_or_else(|| WardError::IntentNotFound(intent_id.to_string()))
}

fn current_status(text: &str, intent_id: &str) -> Result<IntentStatus, WardError> {
    let root = parse_root(text)?;
    let item = intent_item(&root, intent_id)?;
    let status = item
        .get("status")
        .and_then(serde_yaml::Value::as_str)
        .ok_or_else(|| WardError::CatalogParse(format!("intent '{intent_id}' has no status")))?;
    status
        .parse()
        .map_err(|()| WardError::CatalogParse(format!("intent '{intent_id}' has unknown status '{status}'")))
}

fn ensure_intent_exists(text: &str, intent_id: &str) -> Result<(), WardError> {
    let root = parse_root(text)?;
    let _ = intent_item(&root, intent_id)?;
    Ok(())
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Split a trimmed line into an optional `- ` item prefix and the rest.
fn strip_dash(trimmed: &str) -> (bool, &str) {
    match trimmed.strip_prefix("- ") {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    }
}

/// Whether a key-value line carries the given key for the given id value.
fn is_id_line(trimmed: &str, intent_id: &str) -> bool {
    let (_, rest) = strip_dash(trimmed);
    let Some(value) = rest.strip_prefix("id:") else {
        return false;
    };
    let value = value.trim();
    let value = value.split(" #").next().unwrap_or(value).trim();
    let value = value.trim_matches(|c| c == '"' || c == '\'');
    value == intent_id
}

/// Locate the line range `[start, end)` of the sequence item holding the id.
fn item_block(lines: &[&str], intent_id: &str) -> Option<(usize, usize)> {
    let id_line = lines
        .iter()
        .position(|line| is_id_line(line.trim_start(), intent_id))?;

    // The item starts at the id line when it carries the dash, else at the
    // nearest dash line above it.
    let start = if lines[id_line].trim_start().starts_with('-') {
        id_line
    } else {
        (0..id_line).rev().find(|&i| {
            let t = lines[i].trim_start();
            t.starts_with("- ") || t == "-"
        })?
    };

    let dash_indent = indent_of(lines[start]);
    let mut end = lines.len();
    for (offset, line) in lines.iter().enumerate().skip(start + 1) {
        let trimmed = line.trim();
        if !trimmed.is_empty() && indent_of(line) <= dash_indent {
            end = offset;
            break;
        }
    }
    Some((start, end))
}

/// Quote a scalar for YAML output when it needs it.
fn yaml_scalar(value: &str) -> String {
    let simple = !value.is_empty()
        && !value.contains(": ")
        && !value.ends_with(':')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-.:+/@TZ".contains(c));
    if simple {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

/// Rewrite (or insert) one `key: value` line inside the intent's block,
/// leaving every other byte of the file alone.
fn rewrite_scalar(
    text: &str,
    intent_id: &str,
    key: &str,
    value: &str,
) -> Result<String, WardError> {
    let lines: Vec<&str> = text.lines().collect();
    let (start, end) = item_block(&lines, intent_id).ok_or_else(|| WardError::CatalogEdit {
        intent_id: intent_id.to_string(),
        message: format!("could not locate the intent's block to set '{key}'"),
    })?;

    let rendered = yaml_scalar(value);
    let mut out: Vec<String> = lines.iter().map(|l| (*l).to_string()).collect();

    let key_prefix = format!("{key}:");
    let mut replaced = false;
    for i in start..end {
        let trimmed = lines[i].trim_start();
        let (dashed, rest) = strip_dash(trimmed);
        if !rest.starts_with(&key_prefix) {
            continue;
        }
        // Preserve a trailing comment on the rewritten line.
        let after_key = &rest[key_prefix.len()..];
        let comment = after_key.find(" #").map(|pos| after_key[pos..].to_string());
        let indent = " ".repeat(indent_of(lines[i]));
        let dash = if dashed { "- " } else { "" };
        out[i] = match comment {
            Some(c) => format!("{indent}{dash}{key}: {rendered}{c}"),
            None => format!("{indent}{dash}{key}: {rendered}"),
        };
        replaced = true;
        break;
    }

    if !replaced {
        // Insert after the id line, at the same key indentation.
        let id_line = (start..end)
            .find(|&i| is_id_line(lines[i].trim_start(), intent_id))
            .ok_or_else(|| WardError::CatalogEdit {
                intent_id: intent_id.to_string(),
                message: "intent block lost its id line".to_string(),
            })?;
        let (dashed, _) = strip_dash(lines[id_line].trim_start());
        let key_indent = if dashed {
            indent_of(lines[id_line]) + 2
        } else {
            indent_of(lines[id_line])
        };
        out.insert(id_line + 1, format!("{}{key}: {rendered}", " ".repeat(key_indent)));
    }

    let mut result = out.join("\n");
    if text.ends_with('\n') {
        result.push('\n');
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"# Active intents for the workspace.
# Humans edit this file; ward only touches single scalar lines.
active_intents:
  - id: INT-001
    name: Stabilize the hook engine  # the flaky one
    status: PENDING
    owned_scope:
      - "src/core/hooks/**"
    created_at: 2026-01-01T00:00:00Z
    updated_at: 2026-01-01T00:00:00Z

  # Documentation work, parked for now.
  - id: INT-002
    name: Document the ledger format
    status: COMPLETE
    owned_scope:
      - "docs/**"
    created_at: 2026-01-01T00:00:00Z
    updated_at: 2026-01-01T00:00:00Z
"#;

    struct FixedClock;
    impl Clock for FixedClock {
        fn now(&self) -> String {
            "2026-08-02T12:00:00+00:00".into()
        }
    }

    async fn fixture() -> (tempfile::TempDir, IntentLifecycle, Arc<CatalogLoader>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("active_intents.yaml");
        tokio::fs::write(&path, CATALOG).await.unwrap();
        let loader = Arc::new(CatalogLoader::new(&path));
        let lifecycle = IntentLifecycle::new(&path, Arc::clone(&loader), Arc::new(FixedClock));
        (dir, lifecycle, loader)
    }

    #[tokio::test]
    async fn transition_updates_status_and_timestamp() {
        let (dir, lifecycle, loader) = fixture().await;
        lifecycle
            .transition_intent("INT-001", IntentStatus::InProgress)
            .await
            .unwrap();

        let text = tokio::fs::read_to_string(dir.path().join("active_intents.yaml"))
            .await
            .unwrap();
        assert!(text.contains("status: IN_PROGRESS"));
        assert!(text.contains("updated_at: 2026-08-02T12:00:00+00:00"));

        // Loader cache was invalidated.
        let intent = loader.find("INT-001").await.unwrap();
        assert_eq!(intent.status, IntentStatus::InProgress);
    }

    #[tokio::test]
    async fn comments_and_order_survive() {
        let (dir, lifecycle, _) = fixture().await;
        lifecycle
            .transition_intent("INT-001", IntentStatus::InProgress)
            .await
            .unwrap();

        let text = tokio::fs::read_to_string(dir.path().join("active_intents.yaml"))
            .await
            .unwrap();
        assert!(text.starts_with("# Active intents for the workspace."));
        assert!(text.contains("# the flaky one"));
        assert!(text.contains("# Documentation work, parked for now."));
        // Other intent untouched byte-for-byte.
        assert!(text.contains("status: COMPLETE"));

        // Key order inside the block is unchanged.
        let name_pos = text.find("name: Stabilize").unwrap();
        let status_pos = text.find("status: IN_PROGRESS").unwrap();
        let scope_pos = text.find("owned_scope:").unwrap();
        assert!(name_pos < status_pos && status_pos < scope_pos);
    }

    #[tokio::test]
    async fn illegal_transition_leaves_file_untouched() {
        let (dir, lifecycle, _) = fixture().await;
        let err = lifecycle
            .transition_intent("INT-002", IntentStatus::InProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, WardError::IllegalTransition { .. }));

        let text = tokio::fs::read_to_string(dir.path().join("active_intents.yaml"))
            .await
            .unwrap();
        assert_eq!(text, CATALOG);
    }

    #[tokio::test]
    async fn unknown_intent_errors() {
        let (_dir, lifecycle, _) = fixture().await;
        let err = lifecycle
            .transition_intent("INT-404", IntentStatus::Archived)
            .await
            .unwrap_err();
        assert!(matches!(err, WardError::IntentNotFound(_)));
    }

    #[tokio::test]
    async fn update_field_rewrites_one_line() {
        let (dir, lifecycle, _) = fixture().await;
        lifecycle
            .update_intent_field("INT-002", "name", "Document the trace ledger")
            .await
            .unwrap();

        let text = tokio::fs::read_to_string(dir.path().join("active_intents.yaml"))
            .await
            .unwrap();
        assert!(text.contains("name: \"Document the trace ledger\""));
        assert!(!text.contains("Document the ledger format"));
        // INT-001 untouched.
        assert!(text.contains("name: Stabilize the hook engine  # the flaky one"));
    }

    #[tokio::test]
    async fn missing_field_is_inserted_into_the_block() {
        let (dir, lifecycle, loader) = fixture().await;
        lifecycle
            .update_intent_field("INT-001", "version", "2")
            .await
            .unwrap();

        let text = tokio::fs::read_to_string(dir.path().join("active_intents.yaml"))
            .await
            .unwrap();
        assert!(text.contains("    version: 2"));
        let intent = loader.find("INT-001").await.unwrap();
        assert_eq!(intent.version, 2);
    }

    #[test]
    fn scalar_quoting() {
        assert_eq!(yaml_scalar("IN_PROGRESS"), "IN_PROGRESS");
        assert_eq!(yaml_scalar("2026-08-02T12:00:00+00:00"), "2026-08-02T12:00:00+00:00");
        assert_eq!(yaml_scalar("free text with spaces"), "\"free text with spaces\"");
        assert_eq!(yaml_scalar("tricky: value"), "\"tricky: value\"");
    }
}
