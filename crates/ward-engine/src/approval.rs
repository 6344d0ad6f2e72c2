//! The human-in-the-loop gate.
//!
//! [`HitlGate`] wraps whatever [`ApprovalGate`] the host supplies (typically
//! a modal confirmation dialog) and adds a kill switch for deterministic
//! tests: a disabled gate auto-approves without consulting the inner
//! capability.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use ward_core::caps::{ApprovalDecision, ApprovalGate, ApprovalRequest};

/// Default gate: approves everything. Hosts that want real confirmation
/// inject their own [`ApprovalGate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl ApprovalGate for AutoApprove {
    async fn request_approval(&self, _request: &ApprovalRequest) -> ApprovalDecision {
        ApprovalDecision::approve()
    }
}

/// Wrapper around the host's approval capability with an enable switch.
pub struct HitlGate {
    inner: Arc<dyn ApprovalGate>,
    enabled: AtomicBool,
}

impl HitlGate {
    /// Gate over the given capability, enabled.
    pub fn new(inner: Arc<dyn ApprovalGate>) -> Self {
        Self {
            inner,
            enabled: AtomicBool::new(true),
        }
    }

    /// Toggle the gate. A disabled gate auto-approves.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether the gate currently consults the inner capability.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Ask for approval, or auto-approve when disabled.
    pub async fn request_approval(&self, request: &ApprovalRequest) -> ApprovalDecision {
        if !self.is_enabled() {
            debug!(tool = %request.tool_name, "HITL gate disabled, auto-approving");
            return ApprovalDecision::approve();
        }
        self.inner.request_approval(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysReject;

    #[async_trait]
    impl ApprovalGate for AlwaysReject {
        async fn request_approval(&self, _request: &ApprovalRequest) -> ApprovalDecision {
            ApprovalDecision::reject("nope")
        }
    }

    fn request() -> ApprovalRequest {
        ApprovalRequest {
            tool_name: "execute_command".into(),
            intent_id: "INT-001".into(),
            file_path: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn enabled_gate_delegates() {
        let gate = HitlGate::new(Arc::new(AlwaysReject));
        let decision = gate.request_approval(&request()).await;
        assert!(!decision.approved);
        assert_eq!(decision.reason.as_deref(), Some("nope"));
    }

    #[tokio::test]
    async fn disabled_gate_auto_approves() {
        let gate = HitlGate::new(Arc::new(AlwaysReject));
        gate.set_enabled(false);
        assert!(!gate.is_enabled());
        assert!(gate.request_approval(&request()).await.approved);
    }

    #[tokio::test]
    async fn auto_approve_default() {
        let decision = AutoApprove.request_approval(&request()).await;
        assert!(decision.approved);
        assert!(decision.reason.is_none());
    }
}
