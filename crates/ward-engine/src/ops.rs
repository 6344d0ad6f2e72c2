//! Agent-facing operations.
//!
//! The host exposes these as tools; both are members of the exempt set, so
//! they never gate themselves.

use tracing::{debug, warn};

use ward_core::errors::WardError;
use ward_core::intent::IntentStatus;

use crate::context::format_context_for_prompt;
use crate::engine::HookEngine;

impl HookEngine {
    /// Select an intent as the session's active one.
    ///
    /// A `PENDING` intent transitions to `IN_PROGRESS`. The session row is
    /// heartbeated, and the formatted activation context is returned for the
    /// host to inject into the prompt.
    pub async fn select_active_intent(
        &self,
        intent_id: &str,
        reasoning: Option<&str>,
    ) -> Result<String, WardError> {
        let intent = self
            .catalog()
            .find(intent_id)
            .await
            .ok_or_else(|| WardError::IntentNotFound(intent_id.to_string()))?;

        if let Some(reasoning) = reasoning {
            debug!(intent_id, reasoning, "intent selected");
        }

        if intent.status == IntentStatus::Pending {
            self.lifecycle
                .transition_intent(intent_id, IntentStatus::InProgress)
                .await?;
        }

        self.set_active_intent(intent_id);

        if self
            .sessions
            .is_intent_claimed_by_other(self.session_id(), intent_id)
            .await
        {
            warn!(intent_id, "another live session already claims this intent");
        }
        self.sessions
            .heartbeat(self.session_id(), Some(intent_id))
            .await;

        let context = self.context.build_intent_context(intent_id).await;
        Ok(format_context_for_prompt(context.as_ref()))
    }

    /// Mark an intent's acceptance criteria as verified.
    ///
    /// Requires `IN_PROGRESS` (anything else fails the transition check) and
    /// moves the intent to `COMPLETE`. Clears the active intent when it was
    /// the one completed.
    pub async fn verify_acceptance_criteria(
        &self,
        intent_id: &str,
        summary: Option<&str>,
    ) -> Result<(), WardError> {
        let _ = self
            .catalog()
            .find(intent_id)
            .await
            .ok_or_else(|| WardError::IntentNotFound(intent_id.to_string()))?;

        self.lifecycle
            .transition_intent(intent_id, IntentStatus::Complete)
            .await?;

        if self.active_intent().as_deref() == Some(intent_id) {
            self.clear_active_intent();
            self.sessions.heartbeat(self.session_id(), None).await;
        }

        if let Some(summary) = summary {
            debug!(intent_id, summary, "acceptance criteria verified");
        }
        Ok(())
    }
}
