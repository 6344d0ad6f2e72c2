//! Owned-scope matching: a small glob compiler lowering to anchored regexes.
//!
//! Patterns are workspace-relative. Semantics:
//!
//! - `**` matches any number of path segments, including zero; `**/` is
//!   transparent across separators
//! - `*` matches any run of characters except `/`
//! - `?` matches exactly one character except `/`
//! - everything else matches literally (regex metacharacters are escaped)
//! - input paths are normalized by replacing backslashes with forward slashes
//! - dotfiles are matched like any other name
//!
//! No external glob library; the compiler produces a `regex::Regex` anchored
//! at both ends, the way the path rules elsewhere in the stack build theirs.

use regex::Regex;
use tracing::warn;

/// Compile a glob pattern into an anchored regex.
pub fn compile_glob(pattern: &str) -> Result<Regex, regex::Error> {
    let normalized = pattern.replace('\\', "/");
    let mut re = String::with_capacity(normalized.len() * 2 + 2);
    re.push('^');

    let mut chars = normalized.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    let _ = chars.next();
                    if chars.peek() == Some(&'/') {
                        // `**/` crosses zero or more whole segments.
                        let _ = chars.next();
                        re.push_str("(?:.*/)?");
                    } else {
                        re.push_str(".*");
                    }
                } else {
                    re.push_str("[^/]*");
                }
            }
            '?' => re.push_str("[^/]"),
            other => {
                let mut buf = [0u8; 4];
                re.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }

    re.push('$');
    Regex::new(&re)
}

/// Normalize a candidate path: backslashes to forward slashes, no leading
/// `./`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    normalized
        .strip_prefix("./")
        .unwrap_or(&normalized)
        .to_string()
}

/// Whether at least one pattern matches the path.
///
/// Patterns that fail to compile are logged and skipped; they never match.
#[must_use]
pub fn is_in_scope(rel_path: &str, patterns: &[String]) -> bool {
    let candidate = normalize_path(rel_path);
    patterns.iter().any(|pattern| match compile_glob(pattern) {
        Ok(re) => re.is_match(&candidate),
        Err(e) => {
            warn!(pattern, error = %e, "unparseable scope pattern, skipping");
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, path: &str) -> bool {
        compile_glob(pattern).unwrap().is_match(&normalize_path(path))
    }

    #[test]
    fn double_star_crosses_segments() {
        assert!(matches("src/**", "src/a.rs"));
        assert!(matches("src/**", "src/deep/nested/a.rs"));
        assert!(!matches("src/**", "other/a.rs"));
    }

    #[test]
    fn double_star_slash_matches_zero_segments() {
        assert!(matches("**/*.rs", "a.rs"));
        assert!(matches("**/*.rs", "x/y/a.rs"));
        assert!(matches("src/**/hooks/*.ts", "src/hooks/gate.ts"));
        assert!(matches("src/**/hooks/*.ts", "src/core/deep/hooks/gate.ts"));
        assert!(!matches("src/**/hooks/*.ts", "src/hooks/sub/gate.ts"));
    }

    #[test]
    fn single_star_stops_at_separator() {
        assert!(matches("src/*.rs", "src/main.rs"));
        assert!(!matches("src/*.rs", "src/sub/main.rs"));
    }

    #[test]
    fn question_mark_is_one_char() {
        assert!(matches("file?.txt", "file1.txt"));
        assert!(!matches("file?.txt", "file10.txt"));
        assert!(!matches("file?.txt", "file/.txt"));
    }

    #[test]
    fn literals_are_escaped() {
        assert!(matches("src/a+b.rs", "src/a+b.rs"));
        assert!(!matches("src/a+b.rs", "src/aab.rs"));
        assert!(matches("docs/(draft).md", "docs/(draft).md"));
    }

    #[test]
    fn anchored_at_both_ends() {
        assert!(!matches("src/*.rs", "prefix/src/main.rs"));
        assert!(!matches("src/*.rs", "src/main.rs.bak"));
    }

    #[test]
    fn backslashes_normalize() {
        assert!(matches("src/**", "src\\win\\style.rs"));
        assert!(matches("src\\**", "src/posix.rs"));
    }

    #[test]
    fn dotfiles_match_by_default() {
        assert!(matches("**/*", ".env"));
        assert!(matches("config/*", "config/.hidden"));
    }

    #[test]
    fn scope_check_any_pattern() {
        let patterns = vec!["src/core/hooks/**".to_string(), "docs/*.md".to_string()];
        assert!(is_in_scope("src/core/hooks/engine.ts", &patterns));
        assert!(is_in_scope("docs/readme.md", &patterns));
        assert!(!is_in_scope("src/api/client.ts", &patterns));
        assert!(!is_in_scope("x", &[]));
    }

    #[test]
    fn leading_dot_slash_is_stripped() {
        assert!(is_in_scope("./src/a.rs", &["src/*.rs".to_string()]));
    }
}
