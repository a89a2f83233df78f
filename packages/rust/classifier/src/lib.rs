//! Fuzzy taxonomy classification.
//!
//! Free-text tokens scraped off job pages ("reactredux", "css3", "Vue.JS")
//! are resolved to the destination's fixed enumerations through an ordered
//! cascade of matching strategies — exact lookup first, then progressively
//! fuzzier normalization, containment and subsequence tests. Two instances
//! share the algorithm: one for technology tags, one for developer roles.
//!
//! Canonical names are only ever produced from the loaded mapping table,
//! never fabricated, so the output vocabulary is closed by construction.

pub mod matchers;
pub mod table;
pub mod tracker;

use std::path::Path;

use jobharvest_shared::Result;

use matchers::{CASCADE, MatchOutcome, normalize_fully};
pub use matchers::{
    REVERSE_SUBSEQUENCE_MIN_LEN, REVERSE_SUBSTRING_MIN_LEN, SUBSEQUENCE_MIN_LEN, SUBSTRING_MIN_LEN,
    Strategy,
};
pub use table::{KeywordTable, MappingTable};
pub use tracker::TokenTracker;

/// Maps free-text tokens to one fixed canonical enumeration.
#[derive(Debug, Clone)]
pub struct Classifier {
    table: MappingTable,
}

impl Classifier {
    pub fn new(table: MappingTable) -> Self {
        Self { table }
    }

    /// Load a classifier from a plain-text mapping table file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(MappingTable::from_file(path)?))
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// Resolve one token. Returns the canonical name, or `None` for tokens
    /// that are ignore-listed or unresolvable; unresolvable tokens are
    /// recorded in the tracker and the caller drops them without failing
    /// the record.
    pub fn classify(&self, token: &str, tracker: &mut TokenTracker) -> Option<String> {
        tracker.saw_raw();

        for (phase, strategy) in CASCADE.iter().enumerate() {
            match strategy.apply(token, &self.table) {
                MatchOutcome::Mapped(canonical) => {
                    if phase > 0 {
                        tracker.saw_normalized();
                    }
                    tracker.record_mapped(&canonical);
                    return Some(canonical);
                }
                MatchOutcome::Ignored => {
                    tracker.record_ignored();
                    return None;
                }
                MatchOutcome::Miss => {}
            }
        }

        tracker.record_unknown(normalize_fully(token));
        None
    }

    /// Resolve a batch of tokens; the result is deduplicated and sorted.
    pub fn classify_all(&self, tokens: &[String], tracker: &mut TokenTracker) -> Vec<String> {
        let mut out: Vec<String> = tokens
            .iter()
            .filter_map(|token| self.classify(token, tracker))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}
