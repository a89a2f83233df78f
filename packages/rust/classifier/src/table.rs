//! Plain-text mapping tables.
//!
//! Format, one rule per line:
//!
//! ```text
//! # comment
//! CanonicalName = token1 token2 token3
//! IGNORE = noise1 noise2
//! ```
//!
//! Tables are loaded once at process start and are immutable for the run.
//! Token iteration order is the file order; the fuzzy matching phases scan
//! the whole table, so a stable order is what makes them reproducible.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use jobharvest_shared::{JobharvestError, Result};

/// The reserved left-hand name marking tokens as intentionally unmapped.
const IGNORE_NAME: &str = "IGNORE";

/// token → canonical name mapping with insertion-order scanning.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    /// (token, canonical) pairs in file order.
    entries: Vec<(String, String)>,
    /// token → position in `entries` for exact lookups.
    index: HashMap<String, usize>,
    /// Tokens that resolve to "intentionally unmapped".
    ignored: HashSet<String>,
}

impl MappingTable {
    pub fn parse(text: &str) -> Self {
        let mut table = Self::default();

        for line in text.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((name, tokens)) = line.split_once('=') else {
                continue;
            };
            let name = name.trim_end_matches(':').trim();
            if name.is_empty() {
                continue;
            }

            for token in tokens.split_whitespace() {
                if name == IGNORE_NAME {
                    table.ignored.insert(token.to_string());
                } else {
                    table.push(token, name);
                }
            }
        }

        table
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| JobharvestError::io(path, e))?;
        let table = Self::parse(&text);
        if table.is_empty() {
            return Err(JobharvestError::config(format!(
                "mapping table {} has no entries",
                path.display()
            )));
        }
        Ok(table)
    }

    fn push(&mut self, token: &str, canonical: &str) {
        if self.index.contains_key(token) {
            return;
        }
        self.index.insert(token.to_string(), self.entries.len());
        self.entries.push((token.to_string(), canonical.to_string()));
    }

    /// Exact (case-sensitive) token lookup.
    pub fn lookup(&self, token: &str) -> Option<&str> {
        self.index
            .get(token)
            .map(|&i| self.entries[i].1.as_str())
    }

    pub fn is_ignored(&self, token: &str) -> bool {
        self.ignored.contains(token)
    }

    /// All (token, canonical) pairs, in insertion order.
    pub fn scan(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, c)| (t.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// canonical name → keyword list, for the field guess pass.
///
/// Same line format as [`MappingTable`] read the other way around, with
/// underscores in keywords standing for spaces.
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    entries: Vec<(String, Vec<String>)>,
}

impl KeywordTable {
    pub fn parse(text: &str) -> Self {
        let mut table = Self::default();

        for line in text.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((name, keywords)) = line.split_once('=') else {
                continue;
            };
            let name = name.trim_end_matches(':').trim();
            let keywords: Vec<String> = keywords
                .split_whitespace()
                .map(|k| k.replace('_', " "))
                .collect();
            if name.is_empty() || keywords.is_empty() {
                continue;
            }

            match table.entries.iter_mut().find(|(n, _)| n == name) {
                Some((_, existing)) => existing.extend(keywords),
                None => table.entries.push((name.to_string(), keywords)),
            }
        }

        table
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| JobharvestError::io(path, e))?;
        Ok(Self::parse(&text))
    }

    /// First canonical name whose keyword occurs in any of `texts`,
    /// checked text by text in the given order.
    pub fn guess(&self, texts: &[&str]) -> Option<&str> {
        for text in texts {
            let text = normalize_for_guess(text);
            if text.is_empty() {
                continue;
            }
            for (name, keywords) in &self.entries {
                if keywords.iter().any(|k| text.contains(k.as_str())) {
                    return Some(name);
                }
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowercase, collapse whitespace, keep only `[0-9a-z ]`.
fn normalize_for_guess(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let filtered: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}
