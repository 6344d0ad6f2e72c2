//! Internal trace types — one [`TraceEntry`] per gated tool invocation.
//!
//! The entry is the engine's in-memory view of what happened. The externally
//! visible ledger record lives in `ward-trace`; its serialized form of this
//! struct (snake_case fields) is also the legacy flat ledger line shape that
//! readers must keep accepting.

use serde::{Deserialize, Serialize};

/// Coarse categorical label for the nature of a change. Heuristic, not
/// semantic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationClass {
    /// Localized edit to existing code.
    AstRefactor,
    /// The intent's behavior grew (whole-file writes, unknown tools).
    IntentEvolution,
    /// A corrective change.
    BugFix,
    /// Documentation-only change.
    Documentation,
    /// Configuration or shell-driven change.
    Configuration,
    /// The file did not exist before.
    FileCreation,
    /// The file no longer exists after.
    FileDeletion,
}

impl MutationClass {
    /// All variants.
    #[must_use]
    pub fn all() -> &'static [MutationClass] {
        &[
            Self::AstRefactor,
            Self::IntentEvolution,
            Self::BugFix,
            Self::Documentation,
            Self::Configuration,
            Self::FileCreation,
            Self::FileDeletion,
        ]
    }

    /// The wire representation (`AST_REFACTOR`, ...).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AstRefactor => "AST_REFACTOR",
            Self::IntentEvolution => "INTENT_EVOLUTION",
            Self::BugFix => "BUG_FIX",
            Self::Documentation => "DOCUMENTATION",
            Self::Configuration => "CONFIGURATION",
            Self::FileCreation => "FILE_CREATION",
            Self::FileDeletion => "FILE_DELETION",
        }
    }

    /// Parse the wire form. Returns `None` for anything else.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|m| m.as_str() == s)
    }
}

impl std::fmt::Display for MutationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the scope check for a gated invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeValidation {
    /// The path was inside the intent's owned scope.
    Pass,
    /// The path was outside the owned scope.
    Fail,
    /// The tool was not subject to scope checking.
    Exempt,
}

/// The file a mutation touched, with the content hashes observed around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Workspace-relative path, forward slashes.
    pub relative_path: String,
    /// Hash observed before the tool ran. `None` means the file did not exist.
    pub pre_hash: Option<String>,
    /// Hash observed after the tool ran. `None` means the file does not exist.
    pub post_hash: Option<String>,
}

/// One gated tool invocation, as the engine saw it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// UUID v4.
    pub id: String,
    /// ISO-8601 timestamp.
    pub timestamp: String,
    /// Intent that authorized (or was charged for) the invocation.
    pub intent_id: String,
    /// Session the invocation ran in.
    pub session_id: String,
    /// Tool that ran.
    pub tool_name: String,
    /// Heuristic classification of the change.
    pub mutation_class: MutationClass,
    /// File touched, if the tool named one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileRef>,
    /// Scope check outcome.
    pub scope_validation: ScopeValidation,
    /// Whether the tool reported success.
    pub success: bool,
    /// Error text when the tool failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TraceEntry {
    /// The hash that identifies the content this entry produced: the
    /// post-hash when present, else the pre-hash.
    #[must_use]
    pub fn content_hash(&self) -> Option<&str> {
        let file = self.file.as_ref()?;
        file.post_hash.as_deref().or(file.pre_hash.as_deref())
    }
}
