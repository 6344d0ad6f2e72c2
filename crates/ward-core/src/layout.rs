//! Workspace layout — where the governance files live.
//!
//! Everything sits under a hidden `.orchestration` directory at the
//! workspace root:
//!
//! ```text
//! .orchestration/active_intents.yaml   catalog; its presence enables ward
//! .orchestration/agent_trace.jsonl     append-only ledger
//! .orchestration/intent_map.md         spatial map
//! .orchestration/CLAUDE.md             shared brain (lessons + sessions)
//! .orchestration/.intentignore         gating exemptions
//! ```

use std::path::{Path, PathBuf};

use crate::scope::normalize_path;

/// Name of the hidden orchestration directory.
pub const ORCH_DIR: &str = ".orchestration";

/// Catalog file name.
pub const CATALOG_FILE: &str = "active_intents.yaml";

/// Ledger file name.
pub const LEDGER_FILE: &str = "agent_trace.jsonl";

/// Spatial map file name.
pub const SPATIAL_MAP_FILE: &str = "intent_map.md";

/// Shared brain file name.
pub const BRAIN_FILE: &str = "CLAUDE.md";

/// Ignore file name.
pub const IGNORE_FILE: &str = ".intentignore";

/// Resolves governance file paths from a workspace root.
#[derive(Debug, Clone)]
pub struct OrchLayout {
    root: PathBuf,
}

impl OrchLayout {
    /// Layout rooted at the given workspace directory.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            root: workspace_root.into(),
        }
    }

    /// The workspace root.
    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        &self.root
    }

    /// The `.orchestration` directory.
    #[must_use]
    pub fn orch_dir(&self) -> PathBuf {
        self.root.join(ORCH_DIR)
    }

    /// `active_intents.yaml`.
    #[must_use]
    pub fn catalog_file(&self) -> PathBuf {
        self.orch_dir().join(CATALOG_FILE)
    }

    /// `agent_trace.jsonl`.
    #[must_use]
    pub fn ledger_file(&self) -> PathBuf {
        self.orch_dir().join(LEDGER_FILE)
    }

    /// `intent_map.md`.
    #[must_use]
    pub fn spatial_map_file(&self) -> PathBuf {
        self.orch_dir().join(SPATIAL_MAP_FILE)
    }

    /// `CLAUDE.md`.
    #[must_use]
    pub fn brain_file(&self) -> PathBuf {
        self.orch_dir().join(BRAIN_FILE)
    }

    /// `.intentignore`.
    #[must_use]
    pub fn ignore_file(&self) -> PathBuf {
        self.orch_dir().join(IGNORE_FILE)
    }

    /// Resolve a tool-supplied path to an absolute one.
    #[must_use]
    pub fn absolute(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }

    /// Normalize a tool-supplied path to workspace-relative, forward-slash
    /// form. Absolute paths outside the workspace come back normalized but
    /// unrelativized.
    #[must_use]
    pub fn relative(&self, path: &str) -> String {
        let candidate = normalize_path(path);
        let root = normalize_path(&self.root.to_string_lossy());
        if let Some(stripped) = candidate.strip_prefix(&format!("{root}/")) {
            stripped.to_string()
        } else {
            candidate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_under_orch_dir() {
        let layout = OrchLayout::new("/ws");
        assert_eq!(layout.catalog_file(), PathBuf::from("/ws/.orchestration/active_intents.yaml"));
        assert_eq!(layout.ledger_file(), PathBuf::from("/ws/.orchestration/agent_trace.jsonl"));
        assert_eq!(layout.spatial_map_file(), PathBuf::from("/ws/.orchestration/intent_map.md"));
        assert_eq!(layout.brain_file(), PathBuf::from("/ws/.orchestration/CLAUDE.md"));
        assert_eq!(layout.ignore_file(), PathBuf::from("/ws/.orchestration/.intentignore"));
    }

    #[test]
    fn absolute_resolution() {
        let layout = OrchLayout::new("/ws");
        assert_eq!(layout.absolute("src/a.rs"), PathBuf::from("/ws/src/a.rs"));
        assert_eq!(layout.absolute("/etc/hosts"), PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn relative_strips_root_prefix() {
        let layout = OrchLayout::new("/ws");
        assert_eq!(layout.relative("/ws/src/a.rs"), "src/a.rs");
        assert_eq!(layout.relative("src/a.rs"), "src/a.rs");
        assert_eq!(layout.relative("./src/a.rs"), "src/a.rs");
        assert_eq!(layout.relative("src\\win.rs"), "src/win.rs");
        // Outside the workspace: normalized but kept absolute.
        assert_eq!(layout.relative("/elsewhere/b.rs"), "/elsewhere/b.rs");
    }
}
