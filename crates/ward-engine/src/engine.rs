//! The hook engine: the pre-tool gate and the post-tool logger.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};

use ward_brain::{Lesson, LessonRecorder, SessionCoordinator, SpatialIndex};
use ward_catalog::{CatalogLoader, IntentLifecycle};
use ward_core::caps::{
    ApprovalGate, ApprovalRequest, Clock, RandomUuid, SystemClock, UuidSource, VcsProbe,
};
use ward_core::classify::classify_mutation;
use ward_core::gate::{DenialKind, GateDecision, GateMetadata, PostToolContext, PreToolContext};
use ward_core::hash::{abbrev_hash, file_hash};
use ward_core::ignore::IgnoreSet;
use ward_core::intent::{Intent, IntentStatus, RelatedSpecType};
use ward_core::layout::OrchLayout;
use ward_core::scope::is_in_scope;
use ward_core::trace::{FileRef, MutationClass, ScopeValidation, TraceEntry};
use ward_trace::{LogOptions, TraceLedger};

use crate::approval::{AutoApprove, HitlGate};
use crate::context::ContextBuilder;
use crate::tools::{classify_tool, ToolClass};
use crate::vcs::GitRevisionProbe;

/// How long an `is_enabled` probe stays cached.
pub const ENABLED_CACHE_TTL: Duration = Duration::from_secs(5);

/// The injectable capabilities an engine runs on.
pub struct Capabilities {
    /// Timestamp source.
    pub clock: Arc<dyn Clock>,
    /// Record-id source.
    pub uuid: Arc<dyn UuidSource>,
    /// Version-control probe for ledger records.
    pub vcs: Arc<dyn VcsProbe>,
    /// Human approval for destructive tools.
    pub approval: Arc<dyn ApprovalGate>,
}

impl Capabilities {
    /// Production defaults: system clock, random UUIDs, a git probe rooted
    /// at the workspace, and an auto-approving gate the host replaces when
    /// it has a real dialog.
    #[must_use]
    pub fn standard(workspace_root: &std::path::Path) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            uuid: Arc::new(RandomUuid),
            vcs: Arc::new(GitRevisionProbe::new(workspace_root)),
            approval: Arc::new(AutoApprove),
        }
    }
}

#[derive(Default)]
struct EngineState {
    active_intent: Option<String>,
    /// Last post-mutation hash this session observed, per relative path.
    hash_cache: HashMap<String, String>,
    ignore: Option<Arc<IgnoreSet>>,
    enabled_probe: Option<(Instant, bool)>,
}

/// One engine per (workspace root, session id). Sessions have independent
/// hash caches and active-intent state; see [`crate::EngineRegistry`].
pub struct HookEngine {
    layout: OrchLayout,
    session_id: String,
    catalog: Arc<CatalogLoader>,
    pub(crate) lifecycle: IntentLifecycle,
    ledger: Arc<TraceLedger>,
    spatial: SpatialIndex,
    lessons: LessonRecorder,
    pub(crate) sessions: SessionCoordinator,
    pub(crate) context: ContextBuilder,
    hitl: HitlGate,
    clock: Arc<dyn Clock>,
    uuid: Arc<dyn UuidSource>,
    state: Mutex<EngineState>,
}

impl HookEngine {
    /// Engine with production capabilities.
    pub fn new(workspace_root: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        let root = workspace_root.into();
        let caps = Capabilities::standard(&root);
        Self::with_capabilities(root, session_id, caps)
    }

    /// Engine with explicit capabilities (tests pin these).
    pub fn with_capabilities(
        workspace_root: impl Into<PathBuf>,
        session_id: impl Into<String>,
        caps: Capabilities,
    ) -> Self {
        let layout = OrchLayout::new(workspace_root);
        let catalog = Arc::new(CatalogLoader::new(layout.catalog_file()));
        let lifecycle = IntentLifecycle::new(
            layout.catalog_file(),
            Arc::clone(&catalog),
            Arc::clone(&caps.clock),
        );
        let ledger = Arc::new(TraceLedger::new(layout.ledger_file(), Arc::clone(&caps.vcs)));
        let spatial = SpatialIndex::new(layout.spatial_map_file(), Arc::clone(&caps.clock));
        let lessons = LessonRecorder::new(layout.brain_file(), Arc::clone(&caps.clock));
        let sessions = SessionCoordinator::new(layout.brain_file(), Arc::clone(&caps.clock));
        let context = ContextBuilder::new(
            layout.clone(),
            Arc::clone(&catalog),
            Arc::clone(&ledger),
            spatial.clone(),
        );

        Self {
            layout,
            session_id: session_id.into(),
            catalog,
            lifecycle,
            ledger,
            spatial,
            lessons,
            sessions,
            context,
            hitl: HitlGate::new(caps.approval),
            clock: caps.clock,
            uuid: caps.uuid,
            state: Mutex::new(EngineState::default()),
        }
    }

    /// The workspace root this engine governs.
    #[must_use]
    pub fn workspace_root(&self) -> &std::path::Path {
        self.layout.workspace_root()
    }

    /// The session this engine belongs to.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The catalog loader (shared with the context builder).
    #[must_use]
    pub fn catalog(&self) -> &Arc<CatalogLoader> {
        &self.catalog
    }

    /// The HITL gate, for hosts that toggle it.
    #[must_use]
    pub fn hitl(&self) -> &HitlGate {
        &self.hitl
    }

    /// Whether ward is active for this workspace: the orchestration
    /// directory exists and holds a catalog file. Cached for five seconds.
    /// The ignore list is loaded on first enable.
    pub async fn is_enabled(&self) -> bool {
        {
            let state = self.state.lock();
            if let Some((probed_at, enabled)) = state.enabled_probe {
                if probed_at.elapsed() < ENABLED_CACHE_TTL {
                    return enabled;
                }
            }
        }

        let dir_present = tokio::fs::try_exists(self.layout.orch_dir())
            .await
            .unwrap_or(false);
        let catalog_present = tokio::fs::try_exists(self.layout.catalog_file())
            .await
            .unwrap_or(false);
        let enabled = dir_present && catalog_present;

        if enabled {
            let _ = self.ignore_set().await;
        }
        self.state.lock().enabled_probe = Some((Instant::now(), enabled));
        enabled
    }

    /// Set the session's active intent.
    pub fn set_active_intent(&self, intent_id: &str) {
        self.state.lock().active_intent = Some(intent_id.to_string());
    }

    /// Clear the session's active intent.
    pub fn clear_active_intent(&self) {
        self.state.lock().active_intent = None;
    }

    /// The session's active intent, if any.
    #[must_use]
    pub fn active_intent(&self) -> Option<String> {
        self.state.lock().active_intent.clone()
    }

    async fn ignore_set(&self) -> Arc<IgnoreSet> {
        if let Some(set) = self.state.lock().ignore.clone() {
            return set;
        }
        let set = Arc::new(IgnoreSet::load(&self.layout.ignore_file()).await);
        let mut state = self.state.lock();
        Arc::clone(state.ignore.get_or_insert(set))
    }

    /// The gate. Short-circuits on the first failure; every reason states
    /// what failed, why, and how to fix it.
    pub async fn pre_tool_use(&self, ctx: &PreToolContext) -> GateDecision {
        match classify_tool(&ctx.tool_name) {
            ToolClass::Exempt => GateDecision::allowed_with(GateMetadata::exempt()),
            ToolClass::Destructive => self.gate_destructive(ctx).await,
            ToolClass::Write => self.gate_write(ctx).await,
            ToolClass::Unclassified => GateDecision::allowed_with(GateMetadata::unclassified()),
        }
    }

    async fn gate_destructive(&self, ctx: &PreToolContext) -> GateDecision {
        let Some(intent_id) = self.claimed_intent(ctx) else {
            return GateDecision::denied(
                DenialKind::NoActiveIntent,
                format!(
                    "Destructive tool '{}' requires an active intent. Call select_active_intent \
                     with an id from .orchestration/active_intents.yaml before running it.",
                    ctx.tool_name
                ),
            );
        };
        let Some(intent) = self.catalog.find(&intent_id).await else {
            return GateDecision::denied(DenialKind::IntentNotFound, unknown_intent_reason(&intent_id));
        };
        if !intent.is_actionable() {
            return GateDecision::denied(
                DenialKind::IntentNotActionable,
                not_actionable_reason(&intent),
            );
        }

        let decision = self
            .hitl
            .request_approval(&ApprovalRequest {
                tool_name: ctx.tool_name.clone(),
                intent_id: intent_id.clone(),
                file_path: ctx.file_path.clone(),
                description: Some(format!(
                    "Destructive operation requested under intent {intent_id}"
                )),
            })
            .await;

        if decision.approved {
            GateDecision::allowed_with(GateMetadata::destructive())
        } else {
            GateDecision::denied(
                DenialKind::HitlRejected,
                decision.reason.unwrap_or_else(|| {
                    format!(
                        "The human rejected '{}' under intent {intent_id}.",
                        ctx.tool_name
                    )
                }),
            )
        }
    }

    async fn gate_write(&self, ctx: &PreToolContext) -> GateDecision {
        let Some(intent_id) = self.claimed_intent(ctx) else {
            return GateDecision::denied(
                DenialKind::NoActiveIntent,
                format!(
                    "No active intent: '{}' mutates files and every mutation must be authorized \
                     by one. Call select_active_intent with an id from \
                     .orchestration/active_intents.yaml, then retry.",
                    ctx.tool_name
                ),
            );
        };

        let Some(intent) = self.catalog.find(&intent_id).await else {
            return GateDecision::denied(DenialKind::IntentNotFound, unknown_intent_reason(&intent_id));
        };

        if !intent.is_actionable() {
            return GateDecision::denied(
                DenialKind::IntentNotActionable,
                not_actionable_reason(&intent),
            );
        }

        let Some(path) = ctx.file_path.as_deref() else {
            // A write tool with no target path has nothing to scope or hash.
            return GateDecision::allowed(None);
        };
        let rel = self.layout.relative(path);

        if self.ignore_set().await.is_ignored(&rel) {
            debug!(path = %rel, "path is intent-ignored, skipping scope and hashing");
            return GateDecision::allowed_with(GateMetadata::intent_ignored());
        }

        if !is_in_scope(&rel, &intent.owned_scope) {
            self.lessons
                .record_scope_violation(&intent.id, &ctx.tool_name, &rel, &intent.owned_scope)
                .await;
            return GateDecision::denied(
                DenialKind::ScopeViolation,
                format!(
                    "Scope violation: '{rel}' is not covered by the scope owned by {} \
                     [{}]. Write inside the owned scope or select an intent that owns this path.",
                    intent.id,
                    intent.owned_scope.join(", ")
                ),
            );
        }

        let pre_hash = file_hash(&self.layout.absolute(path)).await;
        let cached = self.state.lock().hash_cache.get(&rel).cloned();
        if let Some(cached) = cached {
            if pre_hash.as_deref() != Some(cached.as_str()) {
                self.lessons
                    .record_hash_mismatch(&intent.id, &ctx.tool_name, &rel)
                    .await;
                let observed = pre_hash
                    .as_deref()
                    .map_or_else(|| "missing".to_string(), abbrev_hash);
                return GateDecision::denied(
                    DenialKind::StaleFile,
                    format!(
                        "Stale file: '{rel}' changed outside this session (last observed \
                         {}, now {observed}). Re-read the file to refresh your view, then \
                         retry the write.",
                        abbrev_hash(&cached)
                    ),
                );
            }
        }

        if let Some(hash) = &pre_hash {
            let _ = self
                .state
                .lock()
                .hash_cache
                .insert(rel, hash.clone());
        }
        GateDecision::allowed(pre_hash)
    }

    /// The logger. Never rejects; every side effect is best-effort.
    pub async fn post_tool_use(&self, ctx: &PostToolContext) {
        let class = classify_tool(&ctx.tool_name);
        if class == ToolClass::Exempt {
            return;
        }

        let rel = ctx.file_path.as_deref().map(|p| self.layout.relative(p));
        let post_hash = match ctx.file_path.as_deref() {
            Some(path) => file_hash(&self.layout.absolute(path)).await,
            None => None,
        };

        let intent_id = self
            .claimed_intent_post(ctx)
            .unwrap_or_else(|| "none".to_string());
        let intent = self.catalog.find(&intent_id).await;

        let mutation_class = ctx
            .params
            .get("mutation_class")
            .and_then(|v| v.as_str())
            .and_then(MutationClass::parse)
            .unwrap_or_else(|| classify_mutation(&ctx.tool_name, ctx.pre_hash.as_deref()));

        let scope_validation = if class == ToolClass::Write {
            ScopeValidation::Pass
        } else {
            ScopeValidation::Exempt
        };

        let related_specs: Vec<String> = intent
            .as_ref()
            .map(|i| {
                i.related_specs
                    .iter()
                    .filter(|s| s.spec_type == RelatedSpecType::Speckit)
                    .map(|s| s.reference.clone())
                    .collect()
            })
            .unwrap_or_default();

        let entry = TraceEntry {
            id: self.uuid.uuid_v4(),
            timestamp: self.clock.now(),
            intent_id: intent_id.clone(),
            session_id: ctx.session_id.clone(),
            tool_name: ctx.tool_name.clone(),
            mutation_class,
            file: rel.clone().map(|relative_path| FileRef {
                relative_path,
                pre_hash: ctx.pre_hash.clone(),
                post_hash: post_hash.clone(),
            }),
            scope_validation,
            success: ctx.success,
            error: ctx.error.clone(),
        };
        self.ledger
            .log(
                &entry,
                &LogOptions {
                    model_identifier: ctx.model_identifier.clone(),
                    start_line: ctx.start_line,
                    end_line: ctx.end_line,
                    related_specs,
                },
            )
            .await;

        if ctx.success && post_hash.is_some() && ctx.pre_hash == post_hash {
            warn!(
                tool = %ctx.tool_name,
                path = rel.as_deref().unwrap_or(""),
                "write reported success but the content hash is unchanged (suspicious no-op)"
            );
        }

        if ctx.success && class == ToolClass::Write {
            if let Some(rel) = &rel {
                self.spatial
                    .add_file_to_intent(
                        &intent_id,
                        rel,
                        intent.as_ref().map(|i| i.name.as_str()),
                        Some(mutation_class),
                    )
                    .await;
            }
        }

        if let Some(rel) = &rel {
            let mut state = self.state.lock();
            match &post_hash {
                Some(hash) => {
                    let _ = state.hash_cache.insert(rel.clone(), hash.clone());
                }
                // A successful call that leaves no file behind deleted it;
                // dropping the entry avoids a false stale read on recreation.
                None if ctx.success => {
                    let _ = state.hash_cache.remove(rel);
                }
                None => {}
            }
        }

        if !ctx.success {
            if let (Some(rel), Some(error)) = (&rel, &ctx.error) {
                self.lessons
                    .record_lesson(&Lesson {
                        intent_id,
                        tool_name: ctx.tool_name.clone(),
                        description: format!("Tool failed on {rel}: {error}"),
                        category: Some("Tool Failure".to_string()),
                    })
                    .await;
            }
        }
    }

    fn claimed_intent(&self, ctx: &PreToolContext) -> Option<String> {
        ctx.intent_id.clone().or_else(|| self.active_intent())
    }

    fn claimed_intent_post(&self, ctx: &PostToolContext) -> Option<String> {
        ctx.intent_id.clone().or_else(|| self.active_intent())
    }
}

fn unknown_intent_reason(intent_id: &str) -> String {
    format!(
        "Intent '{intent_id}' is not in the catalog \
         (.orchestration/active_intents.yaml). Check the id, or call \
         select_active_intent with an intent that exists."
    )
}

fn not_actionable_reason(intent: &Intent) -> String {
    let hint = match intent.status {
        IntentStatus::Pending => {
            "select it with select_active_intent to move it to IN_PROGRESS first"
        }
        IntentStatus::Blocked => {
            "it is blocked; resolve the blocker and resume it to IN_PROGRESS before writing"
        }
        IntentStatus::Complete => {
            "it is complete and no longer authorizes writes; select another intent"
        }
        IntentStatus::Archived => "it is archived and can never authorize writes again",
        IntentStatus::InProgress => "it is already in progress",
    };
    format!(
        "Intent '{}' has status {} and cannot authorize this mutation: {hint}.",
        intent.id, intent.status
    )
}
