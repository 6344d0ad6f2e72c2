//! # ward-trace
//!
//! The append-only audit ledger: one JSON object per line of
//! `.orchestration/agent_trace.jsonl`, in the externally documented Agent
//! Trace schema.
//!
//! Writes are **fail-open**: an append that fails is retried once after
//! 100 ms and then dropped with a warning. The ledger never blocks the tool
//! it is recording.
//!
//! Reads tolerate both the current record shape and the legacy flat
//! `TraceEntry` shape, and skip malformed lines silently.

#![deny(unsafe_code)]

pub mod ledger;
pub mod schema;

pub use ledger::{LogOptions, TraceLedger, DEFAULT_RECENT_LIMIT};
pub use schema::{
    Contributor, Conversation, EntityType, FileTrace, LedgerRecord, LedgerView, LineRange,
    Relation, RelationType, VcsInfo,
};
