//! The activation payload: what the assistant is told when it selects an
//! intent.
//!
//! [`ContextBuilder`] gathers the intent itself, the files the spatial map
//! attributes to it, excerpts of its file-backed specs, and its recent
//! ledger entries, then trims to a byte budget. The intent's own scope,
//! constraints, and acceptance criteria are never dropped.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use ward_brain::SpatialIndex;
use ward_catalog::CatalogLoader;
use ward_core::intent::Intent;
use ward_core::layout::OrchLayout;
use ward_trace::{LedgerView, TraceLedger};

/// Budget for the serialized payload, measured on its JSON form.
pub const CONTEXT_BYTE_BUDGET: usize = 16_384;

/// Per-excerpt byte cap for referenced spec files.
pub const SPEC_EXCERPT_LIMIT: usize = 2048;

/// How many ledger entries the payload starts with.
pub const RECENT_TRACE_LIMIT: usize = 20;

/// An excerpt of a file-backed spec reference.
#[derive(Debug, Clone, Serialize)]
pub struct SpecExcerpt {
    /// The reference as written in the catalog.
    pub reference: String,
    /// Up to [`SPEC_EXCERPT_LIMIT`] bytes of the file.
    pub excerpt: String,
    /// Whether the file was cut at the limit.
    pub truncated: bool,
}

/// The curated payload for one intent.
#[derive(Debug, Clone, Serialize)]
pub struct IntentContext {
    /// The intent itself. Never trimmed.
    pub intent: Intent,
    /// Files the spatial map attributes to the intent.
    pub related_files: Vec<String>,
    /// Excerpts of speckit/constitution references.
    pub spec_excerpts: Vec<SpecExcerpt>,
    /// Recent ledger entries, oldest first.
    pub recent_traces: Vec<LedgerView>,
}

/// Builds [`IntentContext`] payloads.
pub struct ContextBuilder {
    layout: OrchLayout,
    catalog: Arc<CatalogLoader>,
    ledger: Arc<TraceLedger>,
    spatial: SpatialIndex,
}

impl ContextBuilder {
    /// Builder over the catalog, ledger, and spatial map of one workspace.
    pub fn new(
        layout: OrchLayout,
        catalog: Arc<CatalogLoader>,
        ledger: Arc<TraceLedger>,
        spatial: SpatialIndex,
    ) -> Self {
        Self {
            layout,
            catalog,
            ledger,
            spatial,
        }
    }

    /// Build the payload for an intent. `None` when the intent is absent.
    pub async fn build_intent_context(&self, intent_id: &str) -> Option<IntentContext> {
        let intent = self.catalog.find(intent_id).await?;

        let related_files = self.spatial.files_for_intent(intent_id).await;

        let mut spec_excerpts = Vec::new();
        for spec in intent.file_backed_specs() {
            let path = self.layout.absolute(&spec.reference);
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => spec_excerpts.push(excerpt_of(&spec.reference, &text)),
                Err(e) => {
                    debug!(reference = %spec.reference, error = %e, "spec reference unreadable, skipping");
                }
            }
        }

        let recent_traces = self.ledger.recent_entries(intent_id, RECENT_TRACE_LIMIT).await;

        let mut context = IntentContext {
            intent,
            related_files,
            spec_excerpts,
            recent_traces,
        };
        trim_to_budget(&mut context);
        Some(context)
    }
}

fn excerpt_of(reference: &str, text: &str) -> SpecExcerpt {
    if text.len() <= SPEC_EXCERPT_LIMIT {
        return SpecExcerpt {
            reference: reference.to_string(),
            excerpt: text.to_string(),
            truncated: false,
        };
    }
    let mut cut = SPEC_EXCERPT_LIMIT;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    SpecExcerpt {
        reference: reference.to_string(),
        excerpt: format!("{}\n[excerpt truncated at {SPEC_EXCERPT_LIMIT} bytes]", &text[..cut]),
        truncated: true,
    }
}

fn serialized_len(context: &IntentContext) -> usize {
    serde_json::to_vec(context).map_or(0, |bytes| bytes.len())
}

/// Drop, in order: oldest traces, spec excerpts, oldest related files. The
/// intent itself is never dropped.
fn trim_to_budget(context: &mut IntentContext) {
    while serialized_len(context) > CONTEXT_BYTE_BUDGET {
        if !context.recent_traces.is_empty() {
            let _ = context.recent_traces.remove(0);
        } else if !context.spec_excerpts.is_empty() {
            let _ = context.spec_excerpts.remove(0);
        } else if !context.related_files.is_empty() {
            let _ = context.related_files.remove(0);
        } else {
            break;
        }
    }
}

/// Escape text for the XML-ish prompt block.
#[must_use]
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Render the payload as the prompt block the host injects on activation.
///
/// A `None` context yields an empty string.
#[must_use]
pub fn format_context_for_prompt(context: Option<&IntentContext>) -> String {
    let Some(context) = context else {
        return String::new();
    };
    let intent = &context.intent;

    let mut out = String::new();
    out.push_str(&format!(
        "<intent_context id=\"{}\" name=\"{}\" status=\"{}\"",
        xml_escape(&intent.id),
        xml_escape(&intent.name),
        intent.status
    ));
    if intent.version != 1 {
        out.push_str(&format!(" version=\"{}\"", intent.version));
    }
    out.push_str(">\n");

    out.push_str("  <scope>\n");
    for pattern in &intent.owned_scope {
        out.push_str(&format!("    <pattern>{}</pattern>\n", xml_escape(pattern)));
    }
    out.push_str("  </scope>\n");

    out.push_str("  <constraints>\n");
    for constraint in &intent.constraints {
        out.push_str(&format!(
            "    <constraint>{}</constraint>\n",
            xml_escape(constraint)
        ));
    }
    out.push_str("  </constraints>\n");

    out.push_str("  <acceptance_criteria>\n");
    for criterion in &intent.acceptance_criteria {
        out.push_str(&format!(
            "    <criterion>{}</criterion>\n",
            xml_escape(criterion)
        ));
    }
    out.push_str("  </acceptance_criteria>\n");

    if !context.related_files.is_empty() {
        out.push_str("  <related_files>\n");
        for file in &context.related_files {
            out.push_str(&format!("    <file path=\"{}\"/>\n", xml_escape(file)));
        }
        out.push_str("  </related_files>\n");
    }

    if !context.spec_excerpts.is_empty() {
        out.push_str("  <related_specs>\n");
        for excerpt in &context.spec_excerpts {
            out.push_str(&format!(
                "    <spec_excerpt>{}</spec_excerpt>\n",
                xml_escape(&excerpt.excerpt)
            ));
        }
        out.push_str("  </related_specs>\n");
    }

    out.push_str("</intent_context>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use ward_core::caps::SystemClock;
    use ward_core::intent::{IntentStatus, RelatedSpecType};

    fn intent() -> Intent {
        Intent {
            id: "INT-001".into(),
            name: "Stabilize the <hook> engine".into(),
            status: IntentStatus::InProgress,
            version: 1,
            owned_scope: vec!["src/core/hooks/**".into()],
            constraints: vec!["No new dependencies".into()],
            acceptance_criteria: vec!["All gate tests pass".into()],
            related_specs: vec![],
            parent_intent: None,
            tags: vec![],
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-02T00:00:00Z".into(),
        }
    }

    fn context_of(intent: Intent) -> IntentContext {
        IntentContext {
            intent,
            related_files: vec![],
            spec_excerpts: vec![],
            recent_traces: vec![],
        }
    }

    #[test]
    fn none_formats_to_empty() {
        assert_eq!(format_context_for_prompt(None), "");
    }

    #[test]
    fn block_is_escaped_and_shaped() {
        let rendered = format_context_for_prompt(Some(&context_of(intent())));
        assert!(rendered.starts_with("<intent_context id=\"INT-001\""));
        assert!(rendered.contains("name=\"Stabilize the &lt;hook&gt; engine\""));
        assert!(rendered.contains("status=\"IN_PROGRESS\""));
        assert!(!rendered.contains("version="));
        assert!(rendered.contains("<pattern>src/core/hooks/**</pattern>"));
        assert!(rendered.contains("<constraint>No new dependencies</constraint>"));
        assert!(rendered.contains("<criterion>All gate tests pass</criterion>"));
        assert!(!rendered.contains("<related_files>"));
        assert!(!rendered.contains("<related_specs>"));
        assert!(rendered.ends_with("</intent_context>"));
    }

    #[test]
    fn version_attribute_appears_when_bumped() {
        let mut i = intent();
        i.version = 3;
        let rendered = format_context_for_prompt(Some(&context_of(i)));
        assert!(rendered.contains("version=\"3\""));
    }

    #[test]
    fn xml_escaping_covers_the_five() {
        assert_eq!(xml_escape("a&b<c>d\"e'f"), "a&amp;b&lt;c&gt;d&quot;e&apos;f");
    }

    #[test]
    fn long_excerpts_are_cut_with_a_marker() {
        let text = "x".repeat(SPEC_EXCERPT_LIMIT * 2);
        let excerpt = excerpt_of("specs/core.md", &text);
        assert!(excerpt.truncated);
        assert!(excerpt.excerpt.contains("[excerpt truncated"));
        assert!(excerpt.excerpt.len() < text.len());

        let short = excerpt_of("specs/core.md", "short");
        assert!(!short.truncated);
        assert_eq!(short.excerpt, "short");
    }

    #[test]
    fn trim_drops_traces_then_excerpts_then_files() {
        let mut context = context_of(intent());
        context.related_files = vec!["src/a.rs".into(); 10];
        context.spec_excerpts = (0..4)
            .map(|i| SpecExcerpt {
                reference: format!("specs/{i}.md"),
                excerpt: "y".repeat(4000),
                truncated: false,
            })
            .collect();
        context.recent_traces = (0..20)
            .map(|i| LedgerView {
                id: format!("trace-{i}"),
                timestamp: "2026-01-01T00:00:00Z".into(),
                intent_id: "INT-001".into(),
                session_id: Some("sess".into()),
                tool_name: Some("write_to_file".into()),
                relative_path: Some("src/a.rs".into()),
                content_hash: Some(format!("sha256:{}", "a".repeat(64))),
            })
            .collect();

        trim_to_budget(&mut context);
        assert!(serialized_len(&context) <= CONTEXT_BYTE_BUDGET);
        // Traces go before excerpts, excerpts before files.
        assert!(context.recent_traces.is_empty());
        assert!(!context.related_files.is_empty());
        // The intent itself is intact.
        assert_eq!(context.intent.owned_scope.len(), 1);
    }

    #[tokio::test]
    async fn builder_returns_none_for_unknown_intent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OrchLayout::new(dir.path());
        let catalog = Arc::new(CatalogLoader::new(layout.catalog_file()));
        let ledger = Arc::new(TraceLedger::new(
            layout.ledger_file(),
            Arc::new(NoVcs),
        ));
        let spatial = SpatialIndex::new(layout.spatial_map_file(), Arc::new(SystemClock));
        let builder = ContextBuilder::new(layout, catalog, ledger, spatial);
        assert!(builder.build_intent_context("INT-404").await.is_none());
    }

    #[tokio::test]
    async fn builder_reads_spec_excerpts() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OrchLayout::new(dir.path());
        tokio::fs::create_dir_all(layout.orch_dir()).await.unwrap();
        tokio::fs::write(
            layout.catalog_file(),
            "active_intents:\n  - id: INT-001\n    name: With a spec reference\n    status: IN_PROGRESS\n    owned_scope: [\"src/**\"]\n    related_specs:\n      - type: speckit\n        ref: specs/core.md\n      - type: github_issue\n        ref: \"42\"\n    created_at: 2026-01-01T00:00:00Z\n    updated_at: 2026-01-01T00:00:00Z\n",
        )
        .await
        .unwrap();
        tokio::fs::create_dir_all(dir.path().join("specs")).await.unwrap();
        tokio::fs::write(dir.path().join("specs/core.md"), "# Core spec\n")
            .await
            .unwrap();

        let catalog = Arc::new(CatalogLoader::new(layout.catalog_file()));
        let ledger = Arc::new(TraceLedger::new(layout.ledger_file(), Arc::new(NoVcs)));
        let spatial = SpatialIndex::new(layout.spatial_map_file(), Arc::new(SystemClock));
        let builder = ContextBuilder::new(layout, catalog, ledger, spatial);

        let context = builder.build_intent_context("INT-001").await.unwrap();
        // Only the file-backed reference is excerpted.
        assert_eq!(context.spec_excerpts.len(), 1);
        assert_eq!(context.spec_excerpts[0].excerpt, "# Core spec\n");
        assert_eq!(
            context.intent.related_specs[1].spec_type,
            RelatedSpecType::GithubIssue
        );

        let rendered = format_context_for_prompt(Some(&context));
        assert!(rendered.contains("<spec_excerpt># Core spec\n</spec_excerpt>"));
    }

    struct NoVcs;

    #[async_trait::async_trait]
    impl ward_core::caps::VcsProbe for NoVcs {
        async fn current_revision_id(&self) -> Option<String> {
            None
        }
    }
}
