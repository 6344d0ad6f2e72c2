//! # ward-core
//!
//! Foundation types for the ward governance middleware.
//!
//! This crate provides the shared vocabulary that all other ward crates
//! depend on:
//!
//! - **Intents**: [`Intent`], [`IntentStatus`] and the lifecycle transition table
//! - **Trace types**: [`TraceEntry`], [`MutationClass`], [`ScopeValidation`]
//! - **Gate contracts**: [`PreToolContext`], [`PostToolContext`], [`GateDecision`]
//! - **Capabilities**: [`Clock`], [`UuidSource`], [`VcsProbe`], [`ApprovalGate`]
//! - **Hashing**: SHA-256 content hashes in the `sha256:<hex>` form
//! - **Scope matching**: a glob-to-regex compiler and the `.intentignore` parser
//! - **Errors**: the [`WardError`] hierarchy via `thiserror`
//!
//! No crate here performs gating itself; the hook engine in `ward-engine`
//! composes these pieces.

#![deny(unsafe_code)]

pub mod caps;
pub mod classify;
pub mod errors;
pub mod gate;
pub mod hash;
pub mod ignore;
pub mod intent;
pub mod layout;
pub mod scope;
pub mod trace;

pub use caps::{
    ApprovalDecision, ApprovalGate, ApprovalRequest, Clock, RandomUuid, SystemClock, UuidSource,
    VcsProbe,
};
pub use classify::classify_mutation;
pub use errors::WardError;
pub use gate::{DenialKind, GateDecision, GateMetadata, PostToolContext, PreToolContext};
pub use hash::{abbrev_hash, content_hash, file_hash};
pub use ignore::IgnoreSet;
pub use intent::{can_transition, Intent, IntentStatus, RelatedSpec, RelatedSpecType};
pub use layout::OrchLayout;
pub use scope::{compile_glob, is_in_scope};
pub use trace::{FileRef, MutationClass, ScopeValidation, TraceEntry};
