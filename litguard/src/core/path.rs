//! Helpers for moving paths between a source's working directory and the
//! repository root.
//!
//! All paths are `/`-separated strings, as reported by git and the generator.

use crate::core::types::DryRunResult;

/// Join a working-directory prefix and a relative key with exactly one `/`.
///
/// An empty prefix leaves the key unchanged.
pub fn prefix_key(prefix: &str, key: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let key = key.strip_prefix("./").unwrap_or(key).trim_start_matches('/');
    if prefix.is_empty() {
        return key.to_string();
    }
    format!("{prefix}/{key}")
}

/// Rewrite every key of a per-source dry-run result to be repository-relative.
pub fn remap_keys(prefix: &str, result: DryRunResult) -> DryRunResult {
    result
        .into_iter()
        .map(|(key, value)| (prefix_key(prefix, &key), value))
        .collect()
}

/// Express a repository-relative `path` relative to `workdir`.
///
/// Paths outside `workdir` are returned unchanged.
pub fn relative_to_workdir<'a>(path: &'a str, workdir: &str) -> &'a str {
    let workdir = workdir.trim_end_matches('/');
    if workdir.is_empty() {
        return path;
    }
    match path.strip_prefix(workdir) {
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefix_key_inserts_single_separator() {
        assert_eq!(prefix_key("lisi", "src/lib.rs"), "lisi/src/lib.rs");
        assert_eq!(prefix_key("lisi/", "src/lib.rs"), "lisi/src/lib.rs");
        assert_eq!(prefix_key("lisi/", "/src/lib.rs"), "lisi/src/lib.rs");
        assert_eq!(prefix_key("lisi", "./src/lib.rs"), "lisi/src/lib.rs");
    }

    #[test]
    fn prefix_key_with_empty_prefix_keeps_key() {
        assert_eq!(prefix_key("", "README.md"), "README.md");
    }

    #[test]
    fn remap_keys_drops_bare_keys() {
        let mut result = DryRunResult::new();
        result.insert("f".to_string(), json!("contents"));

        let remapped = remap_keys("p", result);

        assert!(remapped.contains_key("p/f"));
        assert!(!remapped.contains_key("f"));
        assert_eq!(remapped["p/f"], json!("contents"));
    }

    #[test]
    fn relative_to_workdir_strips_prefix() {
        assert_eq!(relative_to_workdir("lisi/lisi.adoc", "lisi"), "lisi.adoc");
        assert_eq!(relative_to_workdir("lisi/lisi.adoc", "lisi/"), "lisi.adoc");
    }

    #[test]
    fn relative_to_workdir_leaves_foreign_paths() {
        assert_eq!(relative_to_workdir("lisibility.adoc", "lisi"), "lisibility.adoc");
        assert_eq!(relative_to_workdir("README.adoc", "lisi"), "README.adoc");
        assert_eq!(relative_to_workdir("README.adoc", ""), "README.adoc");
    }
}
