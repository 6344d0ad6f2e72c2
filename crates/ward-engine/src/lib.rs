//! # ward-engine
//!
//! The hook engine — the gate and the logger that interpose between a
//! code-generating assistant and its file-mutating tools.
//!
//! The host wraps every tool invocation:
//!
//! ```text
//! pre = engine.pre_tool_use(ctx)
//! if denied: report the reason and stop
//! run the tool
//! engine.post_tool_use(ctx + pre_hash + outcome)
//! ```
//!
//! [`HookEngine::pre_tool_use`] authorizes: exempt tools pass, destructive
//! tools need an `IN_PROGRESS` intent plus human approval, write tools need
//! an intent, a scope match, and a clean optimistic-lock check against the
//! session's hash cache. [`HookEngine::post_tool_use`] never rejects: it
//! hashes the result, appends to the trace ledger, updates the spatial map
//! and the hash cache, and records lessons on failures.
//!
//! Engines are per (workspace root, session id) and come from an
//! [`EngineRegistry`] owned by the host; there are no process-wide
//! singletons.

#![deny(unsafe_code)]

pub mod approval;
pub mod context;
pub mod engine;
pub mod registry;
pub mod telemetry;
pub mod tools;
pub mod vcs;

mod ops;

pub use approval::{AutoApprove, HitlGate};
pub use context::{
    format_context_for_prompt, ContextBuilder, IntentContext, SpecExcerpt, CONTEXT_BYTE_BUDGET,
    RECENT_TRACE_LIMIT, SPEC_EXCERPT_LIMIT,
};
pub use engine::{Capabilities, HookEngine, ENABLED_CACHE_TTL};
pub use registry::EngineRegistry;
pub use tools::{classify_tool, ToolClass, DESTRUCTIVE_TOOLS, EXEMPT_TOOLS, WRITE_TOOLS};
pub use vcs::GitRevisionProbe;
