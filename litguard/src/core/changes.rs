//! Parsing of the diff provider's name-only listing.

use crate::core::types::ModifiedFileSet;

/// Parse a name-only listing into a set.
///
/// NUL-separated output (`git diff -z`) is taken verbatim. Otherwise the
/// output is split on line breaks and each line is trimmed. Blank entries are
/// skipped, so an empty listing yields an empty set.
pub fn parse_name_only(output: &str) -> ModifiedFileSet {
    if output.contains('\0') {
        return output
            .split('\0')
            .filter(|path| !path.is_empty())
            .map(str::to_string)
            .collect();
    }
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_output_is_empty_set() {
        assert!(parse_name_only("").is_empty());
        assert!(parse_name_only("\n  \n").is_empty());
    }

    #[test]
    fn lines_are_trimmed() {
        let set = parse_name_only("src/lib.rs\r\n  README.adoc \n");
        let paths: Vec<&str> = set.iter().map(String::as_str).collect();
        assert_eq!(paths, vec!["README.adoc", "src/lib.rs"]);
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(parse_name_only("a\na\n").len(), 1);
    }

    #[test]
    fn nul_separated_paths_are_kept_verbatim() {
        let set = parse_name_only("docs/größe.rs\0with space .md\0");
        let paths: Vec<&str> = set.iter().map(String::as_str).collect();
        assert_eq!(paths, vec!["docs/größe.rs", "with space .md"]);
    }

    #[test]
    fn nul_separated_listing_allows_newlines_in_names() {
        let set = parse_name_only("odd\nname.rs\0plain.rs\0");
        assert!(set.contains("odd\nname.rs"));
        assert!(set.contains("plain.rs"));
    }
}
