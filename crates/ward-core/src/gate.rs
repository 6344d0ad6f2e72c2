//! Gate contracts — what the host hands the engine and what it gets back.
//!
//! The pre-hook result is a discriminated union, not a bool with optional
//! fields: a caller holding a [`GateDecision`] must match on it and cannot
//! accidentally ignore a denial.

use serde::{Deserialize, Serialize};

/// Context for the pre-tool gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreToolContext {
    /// Tool the host is about to invoke.
    pub tool_name: String,
    /// Path the tool targets, if it names one. Absolute or workspace-relative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Intent the invocation claims. `None` falls back to the engine's
    /// active intent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_id: Option<String>,
    /// Raw tool parameters.
    #[serde(default)]
    pub params: serde_json::Value,
    /// Session the invocation runs in.
    pub session_id: String,
}

/// Context for the post-tool logger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostToolContext {
    /// Tool that ran.
    pub tool_name: String,
    /// Path the tool targeted, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Intent the invocation claimed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_id: Option<String>,
    /// Raw tool parameters.
    #[serde(default)]
    pub params: serde_json::Value,
    /// Session the invocation ran in.
    pub session_id: String,
    /// Hash the pre-hook observed, threaded back by the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_hash: Option<String>,
    /// Whether the tool reported success.
    pub success: bool,
    /// Error text when the tool failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Model identifier for ledger attribution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_identifier: Option<String>,
    /// First line the mutation touched, for the ledger range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    /// Last line the mutation touched, for the ledger range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
}

impl PostToolContext {
    /// A minimal successful post context for the given tool and session.
    #[must_use]
    pub fn success(tool_name: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            file_path: None,
            intent_id: None,
            params: serde_json::Value::Null,
            session_id: session_id.into(),
            pre_hash: None,
            success: true,
            error: None,
            model_identifier: None,
            start_line: None,
            end_line: None,
        }
    }
}

/// Why a gated invocation was denied. Wire form matches the error taxonomy
/// (`ERR_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DenialKind {
    /// Write or destructive tool with no intent selected.
    #[serde(rename = "ERR_NO_ACTIVE_INTENT")]
    NoActiveIntent,
    /// The claimed intent is not in the catalog.
    #[serde(rename = "ERR_INTENT_NOT_FOUND")]
    IntentNotFound,
    /// The intent exists but is not IN_PROGRESS.
    #[serde(rename = "ERR_INTENT_NOT_ACTIONABLE")]
    IntentNotActionable,
    /// The target path is outside the intent's owned scope.
    #[serde(rename = "ERR_SCOPE_VIOLATION")]
    ScopeViolation,
    /// The on-disk hash differs from the hash this session last observed.
    #[serde(rename = "ERR_STALE_FILE")]
    StaleFile,
    /// The human rejected a destructive operation.
    #[serde(rename = "ERR_HITL_REJECTED")]
    HitlRejected,
}

impl std::fmt::Display for DenialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoActiveIntent => "ERR_NO_ACTIVE_INTENT",
            Self::IntentNotFound => "ERR_INTENT_NOT_FOUND",
            Self::IntentNotActionable => "ERR_INTENT_NOT_ACTIONABLE",
            Self::ScopeViolation => "ERR_SCOPE_VIOLATION",
            Self::StaleFile => "ERR_STALE_FILE",
            Self::HitlRejected => "ERR_HITL_REJECTED",
        };
        f.write_str(s)
    }
}

/// Why an invocation was allowed without the full write pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateMetadata {
    /// Read-only or meta tool; bypassed all gating.
    #[serde(default)]
    pub exempt: bool,
    /// Destructive tool approved by the human gate.
    #[serde(default)]
    pub destructive: bool,
    /// Tool in no classification set; allowed and logged.
    #[serde(default)]
    pub unclassified: bool,
    /// Path matched the `.intentignore` set; scope and hashing skipped.
    #[serde(default)]
    pub intent_ignored: bool,
}

impl GateMetadata {
    /// Metadata for an exempt tool.
    #[must_use]
    pub fn exempt() -> Self {
        Self {
            exempt: true,
            ..Self::default()
        }
    }

    /// Metadata for an approved destructive tool.
    #[must_use]
    pub fn destructive() -> Self {
        Self {
            destructive: true,
            ..Self::default()
        }
    }

    /// Metadata for an unclassified tool.
    #[must_use]
    pub fn unclassified() -> Self {
        Self {
            unclassified: true,
            ..Self::default()
        }
    }

    /// Metadata for an ignore-listed path.
    #[must_use]
    pub fn intent_ignored() -> Self {
        Self {
            intent_ignored: true,
            ..Self::default()
        }
    }
}

/// Outcome of the pre-tool gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GateDecision {
    /// The tool may run.
    Allowed {
        /// Hash observed before the tool runs; the host threads this into
        /// the post context. `None` when the file does not exist or the
        /// tool names no path.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pre_hash: Option<String>,
        /// Why the invocation skipped parts of the pipeline, if it did.
        #[serde(default)]
        metadata: GateMetadata,
    },
    /// The tool must not run.
    Denied {
        /// Machine-readable denial discriminant.
        kind: DenialKind,
        /// Agent-actionable reason: what failed, why, and how to fix it.
        reason: String,
    },
}

impl GateDecision {
    /// Allow with a pre-hash and default metadata.
    #[must_use]
    pub fn allowed(pre_hash: Option<String>) -> Self {
        Self::Allowed {
            pre_hash,
            metadata: GateMetadata::default(),
        }
    }

    /// Allow with explicit metadata and no pre-hash.
    #[must_use]
    pub fn allowed_with(metadata: GateMetadata) -> Self {
        Self::Allowed {
            pre_hash: None,
            metadata,
        }
    }

    /// Deny with a kind and reason.
    #[must_use]
    pub fn denied(kind: DenialKind, reason: impl Into<String>) -> Self {
        Self::Denied {
            kind,
            reason: reason.into(),
        }
    }

    /// Whether the tool may run.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// The denial reason, if denied.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Denied { reason, .. } => Some(reason),
            Self::Allowed { .. } => None,
        }
    }

    /// The pre-hash, if allowed with one.
    #[must_use]
    pub fn pre_hash(&self) -> Option<&str> {
        match self {
            Self::Allowed { pre_hash, .. } => pre_hash.as_deref(),
            Self::Denied { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_kind_wire_form() {
        let json = serde_json::to_string(&DenialKind::ScopeViolation).unwrap();
        assert_eq!(json, "\"ERR_SCOPE_VIOLATION\"");
        let parsed: DenialKind = serde_json::from_str("\"ERR_STALE_FILE\"").unwrap();
        assert_eq!(parsed, DenialKind::StaleFile);
    }

    #[test]
    fn decision_accessors() {
        let allowed = GateDecision::allowed(Some("sha256:abc".into()));
        assert!(allowed.is_allowed());
        assert_eq!(allowed.pre_hash(), Some("sha256:abc"));
        assert_eq!(allowed.reason(), None);

        let denied = GateDecision::denied(DenialKind::NoActiveIntent, "select an intent first");
        assert!(!denied.is_allowed());
        assert_eq!(denied.pre_hash(), None);
        assert_eq!(denied.reason(), Some("select an intent first"));
    }

    #[test]
    fn decision_serde_is_tagged() {
        let denied = GateDecision::denied(DenialKind::StaleFile, "re-read the file");
        let json = serde_json::to_value(&denied).unwrap();
        assert_eq!(json["outcome"], "denied");
        assert_eq!(json["kind"], "ERR_STALE_FILE");

        let allowed = GateDecision::allowed_with(GateMetadata::exempt());
        let json = serde_json::to_value(&allowed).unwrap();
        assert_eq!(json["outcome"], "allowed");
        assert_eq!(json["metadata"]["exempt"], true);
    }
}
