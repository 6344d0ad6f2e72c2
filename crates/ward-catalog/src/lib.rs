//! # ward-catalog
//!
//! The intent catalog: a single human-edited YAML file
//! (`.orchestration/active_intents.yaml`) holding the intents that authorize
//! mutations.
//!
//! Three pieces:
//!
//! - [`CatalogLoader`] — reads the file into memory behind a 5-second TTL
//!   cache. Parsing failures **fail open** to an empty catalog: governance
//!   gaps are preferable to blocked developers.
//! - The validator — lenient per-intent validation. Hard problems drop the
//!   intent with a logged warning; soft problems keep it.
//! - [`IntentLifecycle`] — the two mutating operations. Both re-read the
//!   file, rewrite only the affected scalar lines so human comments and key
//!   order survive, and invalidate the loader cache.

#![deny(unsafe_code)]

pub mod lifecycle;
pub mod loader;
pub mod validator;

pub use lifecycle::IntentLifecycle;
pub use loader::{CatalogLoader, CATALOG_CACHE_TTL};
pub use validator::validate_intents;
