//! Catalog loading with a TTL cache.
//!
//! The catalog file is read frequently (every gated write consults it) and
//! edited rarely, so reads go through a short-lived cache. Any failure to
//! read or parse the file **fails open** to an empty catalog with a logged
//! warning; the gate then denies writes for missing intents, which is a
//! clearer failure than a crash in the hook path.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_yaml::Value;
use tracing::{debug, warn};

use ward_core::intent::Intent;

use crate::validator::validate_intents;

/// How long a loaded catalog stays fresh.
pub const CATALOG_CACHE_TTL: Duration = Duration::from_secs(5);

struct CacheSlot {
    loaded_at: Instant,
    intents: Arc<Vec<Intent>>,
}

/// Cached reader for `active_intents.yaml`.
pub struct CatalogLoader {
    path: PathBuf,
    ttl: Duration,
    cache: Mutex<Option<CacheSlot>>,
}

impl CatalogLoader {
    /// Loader for the given catalog file with the default TTL.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_ttl(path, CATALOG_CACHE_TTL)
    }

    /// Loader with an explicit TTL (tests shrink it).
    pub fn with_ttl(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            cache: Mutex::new(None),
        }
    }

    /// The catalog file path.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Load the catalog, serving from cache while fresh.
    pub async fn load(&self) -> Arc<Vec<Intent>> {
        {
            let cache = self.cache.lock();
            if let Some(slot) = cache.as_ref() {
                if slot.loaded_at.elapsed() < self.ttl {
                    return Arc::clone(&slot.intents);
                }
            }
        }

        let intents = Arc::new(self.read_from_disk().await);
        *self.cache.lock() = Some(CacheSlot {
            loaded_at: Instant::now(),
            intents: Arc::clone(&intents),
        });
        intents
    }

    /// Drop the cache so the next [`CatalogLoader::load`] hits the disk.
    pub fn invalidate(&self) {
        *self.cache.lock() = None;
    }

    /// Invalidate and reload.
    pub async fn reload(&self) -> Arc<Vec<Intent>> {
        self.invalidate();
        self.load().await
    }

    /// Find an intent by id.
    pub async fn find(&self, intent_id: &str) -> Option<Intent> {
        self.load()
            .await
            .iter()
            .find(|i| i.id == intent_id)
            .cloned()
    }

    async fn read_from_disk(&self) -> Vec<Intent> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "catalog unreadable, failing open to an empty catalog"
                );
                return Vec::new();
            }
        };
        let intents = parse_catalog(&text);
        debug!(path = %self.path.display(), count = intents.len(), "catalog loaded");
        intents
    }
}

/// Parse catalog text into validated intents.
///
/// The root must be a mapping whose `active_intents` key (legacy alias
/// `intents`) holds a sequence. Anything else fails open to empty.
#[must_use]
pub fn parse_catalog(text: &str) -> Vec<Intent> {
    let root: Value = match serde_yaml::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "catalog YAML malformed, failing open to an empty catalog");
            return Vec::new();
        }
    };

    let items = root
        .get("active_intents")
        .or_else(|| root.get("intents"))
        .and_then(Value::as_sequence);

    match items {
        Some(seq) => validate_intents(seq),
        None => {
            warn!("catalog root has no 'active_intents' sequence, failing open");
            Vec::new()
        }
    }
}
