//! The Agent Trace record schema and the normalized read view.

use serde::{Deserialize, Serialize};

use ward_core::trace::TraceEntry;

/// Who produced a conversation's contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    /// A model acting through the host.
    #[serde(rename = "AI")]
    Ai,
    /// A person.
    Human,
}

/// Kind of cross-reference a conversation carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// The authorizing intent.
    Intent,
    /// A specification artifact the intent references.
    Specification,
    /// A prior trace this one continues.
    ParentTrace,
}

/// A cross-reference entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// What the value refers to.
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    /// The referenced identifier.
    pub value: String,
}

/// The contributing entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    /// AI or Human.
    pub entity_type: EntityType,
    /// Model identifier, `"unknown"` when the host did not say.
    pub model_identifier: String,
}

/// A line range with the hash of the content it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    /// First line touched (1-based).
    pub start_line: u32,
    /// Last line touched (1-based).
    pub end_line: u32,
    /// Hash of the resulting content: the post-hash when present, else the
    /// pre-hash.
    pub content_hash: Option<String>,
}

/// One conversation's contribution to a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Session identifier, carried in the schema's `url` slot.
    pub url: String,
    /// Who contributed.
    pub contributor: Contributor,
    /// Line ranges touched.
    pub ranges: Vec<LineRange>,
    /// Cross-references; always led by the authorizing intent.
    pub related: Vec<Relation>,
}

/// A file touched by the traced invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTrace {
    /// Workspace-relative path.
    pub relative_path: String,
    /// Contributions to this file.
    pub conversations: Vec<Conversation>,
}

/// Version-control context at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsInfo {
    /// Current revision, `None` when the probe failed.
    pub revision_id: Option<String>,
}

/// One externally visible ledger line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Unique record id (UUID v4).
    pub id: String,
    /// ISO-8601 timestamp.
    pub timestamp: String,
    /// Version-control context.
    pub vcs: VcsInfo,
    /// Files touched; empty when the invocation named no file.
    pub files: Vec<FileTrace>,
}

impl LedgerRecord {
    /// Build a record from an internal trace entry.
    ///
    /// `related_specs` become `specification` relations after the leading
    /// `intent` relation.
    #[must_use]
    pub fn from_entry(
        entry: &TraceEntry,
        revision_id: Option<String>,
        model_identifier: Option<&str>,
        start_line: u32,
        end_line: u32,
        related_specs: &[String],
    ) -> Self {
        let mut related = vec![Relation {
            relation_type: RelationType::Intent,
            value: entry.intent_id.clone(),
        }];
        related.extend(related_specs.iter().map(|spec| Relation {
            relation_type: RelationType::Specification,
            value: spec.clone(),
        }));

        let files = match &entry.file {
            None => Vec::new(),
            Some(file) => vec![FileTrace {
                relative_path: file.relative_path.clone(),
                conversations: vec![Conversation {
                    url: entry.session_id.clone(),
                    contributor: Contributor {
                        entity_type: EntityType::Ai,
                        model_identifier: model_identifier.unwrap_or("unknown").to_string(),
                    },
                    ranges: vec![LineRange {
                        start_line,
                        end_line,
                        content_hash: entry.content_hash().map(str::to_string),
                    }],
                    related,
                }],
            }],
        };

        Self {
            id: entry.id.clone(),
            timestamp: entry.timestamp.clone(),
            vcs: VcsInfo { revision_id },
            files,
        }
    }

    /// The intent id this record is related to, when recoverable.
    #[must_use]
    pub fn intent_id(&self) -> Option<&str> {
        self.files
            .iter()
            .flat_map(|f| &f.conversations)
            .flat_map(|c| &c.related)
            .find(|r| r.relation_type == RelationType::Intent)
            .map(|r| r.value.as_str())
    }
}

/// Normalized view over both ledger line shapes, as returned by the reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerView {
    /// Record id.
    pub id: String,
    /// ISO-8601 timestamp.
    pub timestamp: String,
    /// The authorizing intent.
    pub intent_id: String,
    /// Session, when the shape carried one.
    pub session_id: Option<String>,
    /// Tool name, only present in the legacy shape.
    pub tool_name: Option<String>,
    /// Path touched, if any.
    pub relative_path: Option<String>,
    /// Resulting content hash, if any.
    pub content_hash: Option<String>,
}

/// Parse one ledger line into the normalized view.
///
/// Accepts the current [`LedgerRecord`] shape and the legacy flat
/// [`TraceEntry`] shape. Returns `None` for malformed lines and for current
/// records whose intent relation is unrecoverable (file-less records).
#[must_use]
pub fn parse_line(line: &str) -> Option<LedgerView> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;

    if value.get("files").is_some() {
        let record: LedgerRecord = serde_json::from_value(value).ok()?;
        let intent_id = record.intent_id()?.to_string();
        let file = record.files.first();
        let conversation = file.and_then(|f| f.conversations.first());
        Some(LedgerView {
            id: record.id.clone(),
            timestamp: record.timestamp.clone(),
            intent_id,
            session_id: conversation.map(|c| c.url.clone()),
            tool_name: None,
            relative_path: file.map(|f| f.relative_path.clone()),
            content_hash: conversation
                .and_then(|c| c.ranges.first())
                .and_then(|r| r.content_hash.clone()),
        })
    } else if value.get("intent_id").is_some() {
        let entry: TraceEntry = serde_json::from_value(value).ok()?;
        let content_hash = entry.content_hash().map(str::to_string);
        Some(LedgerView {
            id: entry.id,
            timestamp: entry.timestamp,
            intent_id: entry.intent_id,
            session_id: Some(entry.session_id),
            tool_name: Some(entry.tool_name),
            relative_path: entry.file.map(|f| f.relative_path),
            content_hash,
        })
    } else {
        None
    }
}
