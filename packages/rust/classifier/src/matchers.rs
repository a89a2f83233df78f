//! The ordered matching cascade.
//!
//! Each strategy is a pure function of `(token, table)`; the classifier
//! composes them first-match-wins. Early phases are exact lookups after
//! progressively heavier normalization; late phases scan the whole table
//! with containment and subsequence tests, gated by minimum lengths to
//! keep the false-positive rate down.

use crate::table::MappingTable;

/// Minimum token length for the token-in-key containment test.
pub const SUBSTRING_MIN_LEN: usize = 4;
/// Minimum key length for the key-in-token containment test.
pub const REVERSE_SUBSTRING_MIN_LEN: usize = 3;
/// Minimum token length for the token-in-key subsequence test.
pub const SUBSEQUENCE_MIN_LEN: usize = 8;
/// Minimum key length for the key-in-token subsequence test.
pub const REVERSE_SUBSEQUENCE_MIN_LEN: usize = 7;

/// Result of one strategy against one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Token resolved to a canonical name.
    Mapped(String),
    /// Token is on the ignore list: intentionally unmapped, not unknown.
    Ignored,
    /// This strategy has no opinion; try the next one.
    Miss,
}

/// One phase of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Case-sensitive lookup of the token as-is.
    Exact,
    /// Lookup after lowercasing.
    Lowercased,
    /// Lookup after replacing whitespace/underscores with dashes.
    Dashed,
    /// Lookup after stripping a trailing version number ("css3", "java-11").
    VersionStripped,
    /// Lookup after stripping a file-extension-like suffix (".js"), then a
    /// trailing version number again.
    ExtensionStripped,
    /// Lookup after removing separators altogether.
    Collapsed,
    /// Token contained in a key.
    Substring,
    /// Key contained in the token.
    SubstringReverse,
    /// Token is a subsequence of a key.
    Subsequence,
    /// Key is a subsequence of the token.
    SubsequenceReverse,
}

/// The full cascade, in resolution order.
pub const CASCADE: &[Strategy] = &[
    Strategy::Exact,
    Strategy::Lowercased,
    Strategy::Dashed,
    Strategy::VersionStripped,
    Strategy::ExtensionStripped,
    Strategy::Collapsed,
    Strategy::Substring,
    Strategy::SubstringReverse,
    Strategy::Subsequence,
    Strategy::SubsequenceReverse,
];

impl Strategy {
    /// Run this strategy for `token` against `table`.
    pub fn apply(self, token: &str, table: &MappingTable) -> MatchOutcome {
        match self {
            Self::Exact => lookup(token, table),
            Self::Lowercased => lookup(&token.to_lowercase(), table),
            Self::Dashed => lookup(&dashed(token), table),
            Self::VersionStripped => lookup(&version_stripped(token), table),
            Self::ExtensionStripped => lookup(&extension_stripped(token), table),
            Self::Collapsed => lookup(&collapsed(token), table),
            Self::Substring => {
                let token = collapsed(token);
                if char_len(&token) < SUBSTRING_MIN_LEN {
                    return MatchOutcome::Miss;
                }
                scan(table, |key| key.contains(&token))
            }
            Self::SubstringReverse => {
                let token = collapsed(token);
                scan(table, |key| {
                    char_len(key) >= REVERSE_SUBSTRING_MIN_LEN && token.contains(key)
                })
            }
            Self::Subsequence => {
                let token = collapsed(token);
                if char_len(&token) < SUBSEQUENCE_MIN_LEN {
                    return MatchOutcome::Miss;
                }
                scan(table, |key| is_subsequence(&token, key))
            }
            Self::SubsequenceReverse => {
                let token = collapsed(token);
                scan(table, |key| {
                    char_len(key) >= REVERSE_SUBSEQUENCE_MIN_LEN && is_subsequence(key, &token)
                })
            }
        }
    }
}

/// The heaviest normalization, also used to name unknown tokens in reports.
pub fn normalize_fully(token: &str) -> String {
    collapsed(token)
}

// ---------------------------------------------------------------------------
// Normalization steps (each builds on the previous one)
// ---------------------------------------------------------------------------

fn dashed(token: &str) -> String {
    token
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '_' { '-' } else { c })
        .collect()
}

fn strip_trailing_version(token: &str) -> &str {
    let stripped = token.trim_end_matches(|c: char| c.is_ascii_digit());
    if stripped.len() == token.len() {
        return token;
    }
    stripped.strip_suffix('-').unwrap_or(stripped)
}

fn version_stripped(token: &str) -> String {
    strip_trailing_version(&dashed(token)).to_string()
}

fn strip_extension(token: &str) -> &str {
    match token.rsplit_once('.') {
        Some((rest, ext))
            if !ext.is_empty()
                && ext
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) =>
        {
            rest
        }
        _ => token,
    }
}

fn extension_stripped(token: &str) -> String {
    let base = version_stripped(token);
    strip_trailing_version(strip_extension(&base)).to_string()
}

fn collapsed(token: &str) -> String {
    extension_stripped(token)
        .chars()
        .filter(|c| *c != '-' && *c != '/')
        .collect()
}

// ---------------------------------------------------------------------------
// Lookup and scan helpers
// ---------------------------------------------------------------------------

fn lookup(token: &str, table: &MappingTable) -> MatchOutcome {
    if let Some(canonical) = table.lookup(token) {
        return MatchOutcome::Mapped(canonical.to_string());
    }
    if table.is_ignored(token) {
        return MatchOutcome::Ignored;
    }
    MatchOutcome::Miss
}

fn scan(table: &MappingTable, hit: impl Fn(&str) -> bool) -> MatchOutcome {
    for (key, canonical) in table.scan() {
        if hit(key) {
            return MatchOutcome::Mapped(canonical.to_string());
        }
    }
    MatchOutcome::Miss
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Do the characters of `needle` appear, in order, within `hay`?
fn is_subsequence(needle: &str, hay: &str) -> bool {
    let mut chars = needle.chars();
    let mut current = match chars.next() {
        Some(c) => c,
        None => return true,
    };
    for c in hay.chars() {
        if c == current {
            match chars.next() {
                Some(next) => current = next,
                None => return true,
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MappingTable {
        MappingTable::parse(
            "React = react reactredux redux\n\
             CSS = css sass\n\
             JavaScript = javascript ecmascript\n\
             PostgreSQL = postgres postgresql\n\
             Kubernetes = kubernetes\n\
             IGNORE = agile scrum frontend\n",
        )
    }

    #[test]
    fn normalization_chain() {
        assert_eq!(dashed("Foo Bar_baz"), "foo-bar-baz");
        assert_eq!(version_stripped("css3"), "css");
        assert_eq!(version_stripped("java-11"), "java");
        assert_eq!(version_stripped("c++11"), "c++");
        assert_eq!(extension_stripped("vue.js"), "vue");
        assert_eq!(extension_stripped("node8.js"), "node");
        assert_eq!(collapsed("asp-dot/net"), "aspdotnet");
    }

    #[test]
    fn exact_is_case_sensitive() {
        let t = table();
        assert_eq!(
            Strategy::Exact.apply("react", &t),
            MatchOutcome::Mapped("React".into())
        );
        assert_eq!(Strategy::Exact.apply("React", &t), MatchOutcome::Miss);
        assert_eq!(
            Strategy::Lowercased.apply("React", &t),
            MatchOutcome::Mapped("React".into())
        );
    }

    #[test]
    fn ignored_tokens_short_circuit() {
        let t = table();
        assert_eq!(Strategy::Exact.apply("agile", &t), MatchOutcome::Ignored);
        assert_eq!(Strategy::Lowercased.apply("Agile", &t), MatchOutcome::Ignored);
    }

    #[test]
    fn substring_gated_by_token_length() {
        let t = table();
        // "act" is a substring of "react" but too short to qualify.
        assert_eq!(Strategy::Substring.apply("act", &t), MatchOutcome::Miss);
        assert_eq!(
            Strategy::Substring.apply("avascrip", &t),
            MatchOutcome::Mapped("JavaScript".into())
        );
    }

    #[test]
    fn reverse_substring_gated_by_key_length() {
        let t = table();
        assert_eq!(
            Strategy::SubstringReverse.apply("postgres-flavoured", &t),
            MatchOutcome::Mapped("PostgreSQL".into())
        );
    }

    #[test]
    fn subsequence_in_both_directions() {
        let t = table();
        // "kbrnts" is a subsequence of "kubernetes" but shorter than the gate.
        assert_eq!(Strategy::Subsequence.apply("kbrnts", &t), MatchOutcome::Miss);
        // "kuberneties" (9+ chars) is not a subsequence of any key; reverse
        // direction finds "kubernetes" ⊆ "kuberneteys".
        assert_eq!(
            Strategy::SubsequenceReverse.apply("kuberneteyes", &t),
            MatchOutcome::Mapped("Kubernetes".into())
        );
    }

    #[test]
    fn is_subsequence_basics() {
        assert!(is_subsequence("ace", "abcde"));
        assert!(is_subsequence("", "abc"));
        assert!(!is_subsequence("aec", "abcde"));
        assert!(!is_subsequence("abc", ""));
    }
}
