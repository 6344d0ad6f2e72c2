//! `.intentignore` — paths exempt from intent gating.
//!
//! A gitignore subset: blank lines and `#` comments are skipped, a trailing
//! `/` marks a directory prefix (the pattern gains `**`), and a leading `!`
//! is accepted but contributes nothing in v1. Patterns use the same glob
//! semantics as owned scopes.

use std::path::Path;

use regex::Regex;
use tracing::{debug, warn};

use crate::scope::{compile_glob, normalize_path};

/// Compiled ignore patterns, loaded once per session.
#[derive(Debug, Default)]
pub struct IgnoreSet {
    patterns: Vec<Regex>,
}

impl IgnoreSet {
    /// An ignore set that matches nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse ignore file content.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut patterns = Vec::new();
        for raw in content.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('!') {
                // Negation is parsed but inert in v1.
                debug!(pattern = line, "negated ignore pattern has no effect");
                continue;
            }
            let pattern = match line.strip_suffix('/') {
                Some(dir) => format!("{dir}/**"),
                None => line.to_string(),
            };
            match compile_glob(&pattern) {
                Ok(re) => patterns.push(re),
                Err(e) => warn!(pattern = line, error = %e, "unparseable ignore pattern, skipping"),
            }
        }
        Self { patterns }
    }

    /// Load and parse the ignore file. A missing or unreadable file yields an
    /// empty set.
    pub async fn load(path: &Path) -> Self {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::empty(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read ignore file");
                Self::empty()
            }
        }
    }

    /// Whether any pattern matches the path.
    #[must_use]
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        let candidate = normalize_path(rel_path);
        self.patterns.iter().any(|re| re.is_match(&candidate))
    }

    /// Number of active patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the set matches nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_blanks_are_skipped() {
        let set = IgnoreSet::parse("# generated files\n\nbuild/**\n  \n# another\n*.lock\n");
        assert_eq!(set.len(), 2);
        assert!(set.is_ignored("build/out.js"));
        assert!(set.is_ignored("Cargo.lock"));
        assert!(!set.is_ignored("src/main.rs"));
    }

    #[test]
    fn trailing_slash_is_directory_prefix() {
        let set = IgnoreSet::parse("node_modules/\n");
        assert!(set.is_ignored("node_modules/left-pad/index.js"));
        assert!(!set.is_ignored("node_modules"));
        assert!(!set.is_ignored("src/node_modules.rs"));
    }

    #[test]
    fn negation_is_inert() {
        let set = IgnoreSet::parse("!important.txt\n*.txt\n");
        // The negation neither errors nor un-ignores.
        assert!(set.is_ignored("important.txt"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn empty_set_ignores_nothing() {
        assert!(!IgnoreSet::empty().is_ignored("anything"));
        assert!(IgnoreSet::empty().is_empty());
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = IgnoreSet::load(&dir.path().join(".intentignore")).await;
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn load_parses_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".intentignore");
        tokio::fs::write(&path, "dist/\n*.generated.ts\n").await.unwrap();
        let set = IgnoreSet::load(&path).await;
        assert!(set.is_ignored("dist/bundle.js"));
        assert!(set.is_ignored("api.generated.ts"));
        assert!(!set.is_ignored("src/api.ts"));
    }
}
