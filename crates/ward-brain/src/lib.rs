//! # ward-brain
//!
//! The human-readable side channels ward maintains next to the ledger:
//!
//! - [`SpatialIndex`] — `intent_map.md`, a best-effort map from intent to the
//!   files it has touched
//! - [`LessonRecorder`] — dated notes on governance failures in the shared
//!   brain file
//! - [`SessionCoordinator`] — a cooperative presence table for concurrent
//!   sessions
//!
//! Everything here is informational. Every write is best-effort: failures are
//! logged and swallowed, never returned. The optimistic lock in the engine is
//! the actual concurrency guard; these files only help humans and agents
//! orient.

#![deny(unsafe_code)]

pub mod lessons;
pub mod sessions;
pub mod spatial;

pub use lessons::{Lesson, LessonRecorder};
pub use sessions::{SessionCoordinator, SessionInfo, STALE_AFTER_SECS};
pub use spatial::SpatialIndex;
