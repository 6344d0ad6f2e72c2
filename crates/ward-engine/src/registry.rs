//! The engine registry.
//!
//! Engines are keyed by (workspace root, session id): the same key always
//! yields the same instance, different sessions get independent hash caches
//! and active-intent state. The registry is a value the host owns and
//! injects where tool dispatch is constructed; there is no process-wide
//! singleton.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::engine::{Capabilities, HookEngine};

/// Owns the per-(workspace, session) engine instances.
#[derive(Default)]
pub struct EngineRegistry {
    engines: Mutex<HashMap<(PathBuf, String), Arc<HookEngine>>>,
}

impl EngineRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine for a (workspace, session) key, created with production
    /// capabilities on first use.
    pub fn engine_for(&self, workspace_root: impl AsRef<Path>, session_id: &str) -> Arc<HookEngine> {
        let root = workspace_root.as_ref().to_path_buf();
        let key = (root.clone(), session_id.to_string());
        Arc::clone(
            self.engines
                .lock()
                .entry(key)
                .or_insert_with(|| {
                    debug!(workspace = %root.display(), session_id, "creating hook engine");
                    Arc::new(HookEngine::new(root.clone(), session_id))
                }),
        )
    }

    /// The engine for a key, created with explicit capabilities on first use.
    pub fn engine_for_with(
        &self,
        workspace_root: impl AsRef<Path>,
        session_id: &str,
        caps: Capabilities,
    ) -> Arc<HookEngine> {
        let root = workspace_root.as_ref().to_path_buf();
        let key = (root.clone(), session_id.to_string());
        Arc::clone(
            self.engines
                .lock()
                .entry(key)
                .or_insert_with(|| Arc::new(HookEngine::with_capabilities(root.clone(), session_id, caps))),
        )
    }

    /// Drop the engine for a key (the session ended). Returns whether one
    /// existed.
    pub fn remove(&self, workspace_root: impl AsRef<Path>, session_id: &str) -> bool {
        self.engines
            .lock()
            .remove(&(workspace_root.as_ref().to_path_buf(), session_id.to_string()))
            .is_some()
    }

    /// How many engines are live.
    #[must_use]
    pub fn len(&self) -> usize {
        self.engines.lock().len()
    }

    /// Whether no engines are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.engines.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_same_instance() {
        let registry = EngineRegistry::new();
        let a = registry.engine_for("/ws", "sess-1");
        let b = registry.engine_for("/ws", "sess-1");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn different_sessions_are_independent() {
        let registry = EngineRegistry::new();
        let a = registry.engine_for("/ws", "sess-1");
        let b = registry.engine_for("/ws", "sess-2");
        assert!(!Arc::ptr_eq(&a, &b));

        a.set_active_intent("INT-001");
        assert_eq!(a.active_intent().as_deref(), Some("INT-001"));
        assert_eq!(b.active_intent(), None);
    }

    #[test]
    fn different_workspaces_are_independent() {
        let registry = EngineRegistry::new();
        let a = registry.engine_for("/ws-a", "sess-1");
        let b = registry.engine_for("/ws-b", "sess-1");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn remove_forgets_the_engine() {
        let registry = EngineRegistry::new();
        let a = registry.engine_for("/ws", "sess-1");
        a.set_active_intent("INT-001");

        assert!(registry.remove("/ws", "sess-1"));
        assert!(!registry.remove("/ws", "sess-1"));

        let b = registry.engine_for("/ws", "sess-1");
        assert_eq!(b.active_intent(), None);
    }
}
