//! Capability interfaces the core consumes from its host.
//!
//! Clock, UUID generation, version-control probing, and human approval are
//! injected at construction so tests can pin them and hosts can substitute
//! their own. Defaults for the clock and UUID source live here; the default
//! git probe and approval gate live in `ward-engine`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source of ISO-8601 timestamps.
pub trait Clock: Send + Sync {
    /// The current instant as an ISO-8601 / RFC 3339 string.
    fn now(&self) -> String;

    /// The current date as `YYYY-MM-DD`, derived from [`Clock::now`].
    fn today(&self) -> String {
        self.now().chars().take(10).collect()
    }
}

/// Wall-clock UTC time via `chrono`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

/// Source of unique record identifiers.
pub trait UuidSource: Send + Sync {
    /// A fresh UUID v4 string.
    fn uuid_v4(&self) -> String;
}

/// Random UUID v4 via the `uuid` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomUuid;

impl UuidSource for RandomUuid {
    fn uuid_v4(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Probe for the current version-control revision.
#[async_trait]
pub trait VcsProbe: Send + Sync {
    /// The current revision identifier, or `None` on any failure.
    async fn current_revision_id(&self) -> Option<String>;
}

/// What the human is asked to approve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Tool awaiting approval.
    pub tool_name: String,
    /// Intent under which the tool would run.
    pub intent_id: String,
    /// Path the tool targets, if it names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Free-text description of the operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The human's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    /// Whether the operation may proceed.
    pub approved: bool,
    /// Optional explanation, surfaced verbatim on rejection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ApprovalDecision {
    /// An approval with no commentary.
    #[must_use]
    pub fn approve() -> Self {
        Self {
            approved: true,
            reason: None,
        }
    }

    /// A rejection with a reason.
    #[must_use]
    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: Some(reason.into()),
        }
    }
}

/// Abstract "ask a human" capability. Blocks until the human answers or the
/// host cancels; the core imposes no timeout.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    /// Ask the human to approve the described operation.
    async fn request_approval(&self, request: &ApprovalRequest) -> ApprovalDecision;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_emits_rfc3339() {
        let now = SystemClock.now();
        assert!(chrono::DateTime::parse_from_rfc3339(&now).is_ok(), "{now}");
    }

    #[test]
    fn today_is_date_prefix() {
        struct Fixed;
        impl Clock for Fixed {
            fn now(&self) -> String {
                "2026-08-02T10:11:12+00:00".into()
            }
        }
        assert_eq!(Fixed.today(), "2026-08-02");
    }

    #[test]
    fn random_uuid_is_v4() {
        let id = RandomUuid.uuid_v4();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn approval_decision_constructors() {
        assert!(ApprovalDecision::approve().approved);
        let rejected = ApprovalDecision::reject("not during a release freeze");
        assert!(!rejected.approved);
        assert_eq!(rejected.reason.as_deref(), Some("not during a release freeze"));
    }
}
