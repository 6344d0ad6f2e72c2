//! SHA-256 content hashing in the `sha256:<hex>` form.
//!
//! Hashing is over raw bytes with no line-ending normalization, so the same
//! content yields the same hash wherever it sits in a file.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::warn;

/// Hash bytes as `sha256:` + 64 lowercase hex chars. Empty input hashes fine.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

/// Hash a file's bytes.
///
/// Returns `None` when the path does not exist. Any other I/O error is
/// logged and also yields `None`; hashing never fails the caller.
pub async fn file_hash(path: &Path) -> Option<String> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(content_hash(&bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read file for hashing");
            None
        }
    }
}

/// Abbreviate a hash for error messages: prefix + first 12 hex chars.
#[must_use]
pub fn abbrev_hash(hash: &str) -> String {
    const KEEP: usize = "sha256:".len() + 12;
    if hash.len() <= KEEP {
        hash.to_string()
    } else {
        format!("{}…", &hash[..KEEP])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_prefixed_lowercase_hex() {
        let h = content_hash(b"hello");
        assert!(h.starts_with("sha256:"));
        assert_eq!(h.len(), 7 + 64);
        assert!(h[7..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_is_deterministic_and_content_sensitive() {
        assert_eq!(content_hash(b"abc"), content_hash(b"abc"));
        assert_ne!(content_hash(b"abc"), content_hash(b"abd"));
        // No line-ending normalization.
        assert_ne!(content_hash(b"a\nb"), content_hash(b"a\r\nb"));
    }

    #[test]
    fn empty_input_hashes() {
        let h = content_hash(b"");
        assert_eq!(
            h,
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn file_hash_matches_content_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        tokio::fs::write(&path, b"content").await.unwrap();
        assert_eq!(file_hash(&path).await, Some(content_hash(b"content")));
    }

    #[tokio::test]
    async fn missing_file_hashes_to_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(file_hash(&dir.path().join("absent")).await, None);
    }

    #[test]
    fn abbrev_truncates() {
        let h = content_hash(b"x");
        let short = abbrev_hash(&h);
        assert!(short.len() < h.len());
        assert!(short.starts_with("sha256:"));
        assert_eq!(abbrev_hash("sha256:ab"), "sha256:ab");
    }
}
