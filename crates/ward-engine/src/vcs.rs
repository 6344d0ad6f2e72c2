//! Default VCS probe: `git rev-parse HEAD` behind a short timeout.
//!
//! Every failure mode (git missing, not a repository, timeout, non-zero
//! exit) yields `None`. Ledger records then carry a null revision, which is
//! exactly what the schema allows.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use ward_core::caps::VcsProbe;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Probes the workspace's git repository for the current revision.
pub struct GitRevisionProbe {
    workspace_root: PathBuf,
    timeout: Duration,
}

impl GitRevisionProbe {
    /// Probe rooted at the given workspace with the default 5 s timeout.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Probe with an explicit timeout (tests shrink it).
    pub fn with_timeout(workspace_root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            timeout,
        }
    }
}

#[async_trait]
impl VcsProbe for GitRevisionProbe {
    async fn current_revision_id(&self) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(&self.workspace_root)
            .output();

        match tokio::time::timeout(self.timeout, output).await {
            Ok(Ok(out)) if out.status.success() => {
                let revision = String::from_utf8_lossy(&out.stdout).trim().to_string();
                if revision.is_empty() {
                    None
                } else {
                    Some(revision)
                }
            }
            Ok(Ok(out)) => {
                debug!(status = ?out.status.code(), "git rev-parse failed");
                None
            }
            Ok(Err(e)) => {
                debug!(error = %e, "git unavailable");
                None
            }
            Err(_) => {
                debug!(timeout = ?self.timeout, "git rev-parse timed out");
                None
            }
        }
    }
}
