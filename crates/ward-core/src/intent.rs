//! Intents — the unit of authorization.
//!
//! An [`Intent`] declares a unit of work: what it is allowed to touch
//! (`owned_scope`), the rules the assistant must follow (`constraints`), and
//! how completion is judged (`acceptance_criteria`). Its [`IntentStatus`]
//! moves through a closed state machine; only `IN_PROGRESS` intents authorize
//! mutations.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::WardError;

/// Lifecycle status of an intent. Wire form is SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentStatus {
    /// Declared but not yet selected.
    Pending,
    /// Actively authorizing mutations.
    InProgress,
    /// Acceptance criteria verified.
    Complete,
    /// Work paused on an external blocker.
    Blocked,
    /// Terminal. Archived intents never authorize anything again.
    Archived,
}

impl IntentStatus {
    /// All status variants.
    #[must_use]
    pub fn all() -> &'static [IntentStatus] {
        &[
            Self::Pending,
            Self::InProgress,
            Self::Complete,
            Self::Blocked,
            Self::Archived,
        ]
    }

    /// The wire representation (`PENDING`, `IN_PROGRESS`, ...).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Complete => "COMPLETE",
            Self::Blocked => "BLOCKED",
            Self::Archived => "ARCHIVED",
        }
    }

    /// Whether no transition leaves this status.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Archived)
    }

    /// Check a transition against the allowed table and produce the new
    /// status, or [`WardError::IllegalTransition`] naming the intent.
    pub fn transition(self, to: IntentStatus, intent_id: &str) -> Result<IntentStatus, WardError> {
        if can_transition(self, to) {
            Ok(to)
        } else {
            Err(WardError::IllegalTransition {
                intent_id: intent_id.to_string(),
                from: self,
                to,
            })
        }
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETE" => Ok(Self::Complete),
            "BLOCKED" => Ok(Self::Blocked),
            "ARCHIVED" => Ok(Self::Archived),
            _ => Err(()),
        }
    }
}

/// The exhaustive set of legal lifecycle transitions.
const ALLOWED_TRANSITIONS: &[(IntentStatus, IntentStatus)] = &[
    (IntentStatus::Pending, IntentStatus::InProgress),
    (IntentStatus::Pending, IntentStatus::Archived),
    (IntentStatus::InProgress, IntentStatus::Complete),
    (IntentStatus::InProgress, IntentStatus::Blocked),
    (IntentStatus::InProgress, IntentStatus::Archived),
    (IntentStatus::Blocked, IntentStatus::InProgress),
    (IntentStatus::Blocked, IntentStatus::Archived),
    (IntentStatus::Complete, IntentStatus::Archived),
];

/// Whether `(from, to)` is in the allowed transition table.
#[must_use]
pub fn can_transition(from: IntentStatus, to: IntentStatus) -> bool {
    ALLOWED_TRANSITIONS.contains(&(from, to))
}

/// Kind of external artifact an intent can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelatedSpecType {
    /// A speckit specification file in the workspace.
    Speckit,
    /// A GitHub issue reference.
    GithubIssue,
    /// A GitHub pull request reference.
    GithubPr,
    /// A project constitution document.
    Constitution,
    /// Anything else.
    External,
}

impl RelatedSpecType {
    /// Parse the wire form (`speckit`, `github_issue`, ...).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "speckit" => Some(Self::Speckit),
            "github_issue" => Some(Self::GithubIssue),
            "github_pr" => Some(Self::GithubPr),
            "constitution" => Some(Self::Constitution),
            "external" => Some(Self::External),
            _ => None,
        }
    }

    /// Whether this reference points at a readable workspace file.
    #[must_use]
    pub fn is_file_backed(self) -> bool {
        matches!(self, Self::Speckit | Self::Constitution)
    }
}

/// A reference from an intent to an external specification artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedSpec {
    /// What kind of artifact this points at.
    #[serde(rename = "type")]
    pub spec_type: RelatedSpecType,
    /// The reference itself: a workspace-relative path, an issue number, a URL.
    #[serde(rename = "ref")]
    pub reference: String,
}

/// The unit of authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Unique id matching `^[A-Z]+-\d{3,}$`, e.g. `INT-001`.
    pub id: String,
    /// Human-readable name, 3-200 chars.
    pub name: String,
    /// Lifecycle status.
    pub status: IntentStatus,
    /// Semantic version of the intent, bumped by the human on evolution.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Non-empty glob patterns (workspace-relative) this intent may mutate.
    pub owned_scope: Vec<String>,
    /// Free-text rules surfaced to the assistant.
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Free-text verifiable completion items.
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    /// References to external specification artifacts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_specs: Vec<RelatedSpec>,
    /// Parent intent id for hierarchical decomposition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_intent: Option<String>,
    /// Free-form labels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// ISO-8601 creation timestamp.
    pub created_at: String,
    /// ISO-8601 last-update timestamp.
    pub updated_at: String,
}

fn default_version() -> u32 {
    1
}

impl Intent {
    /// Whether this intent currently authorizes mutations.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.status == IntentStatus::InProgress
    }

    /// The file-backed spec references (speckit and constitution types).
    #[must_use]
    pub fn file_backed_specs(&self) -> Vec<&RelatedSpec> {
        self.related_specs
            .iter()
            .filter(|s| s.spec_type.is_file_backed())
            .collect()
    }
}

/// Whether a string is a well-formed intent id (`^[A-Z]+-\d{3,}$`).
#[must_use]
pub fn is_valid_intent_id(id: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^[A-Z]+-\d{3,}$").unwrap());
    re.is_match(id)
}
