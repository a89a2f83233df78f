//! Per-run token accounting.
//!
//! A [`TokenTracker`] is created at run start, threaded explicitly through
//! every classification call, and written to a diagnostic report at run end.
//! Nothing here is process-global, so parallel or repeated runs never
//! cross-contaminate.

use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use jobharvest_shared::{JobharvestError, Result};

/// Counters for one taxonomy (technology tags or developer roles).
#[derive(Debug, Clone, Default)]
pub struct TokenTracker {
    raw: u64,
    normalized: u64,
    ignored: u64,
    mapped: HashMap<String, u64>,
    unknown: HashMap<String, u64>,
}

impl TokenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn saw_raw(&mut self) {
        self.raw += 1;
    }

    pub(crate) fn saw_normalized(&mut self) {
        self.normalized += 1;
    }

    pub(crate) fn record_mapped(&mut self, canonical: &str) {
        *self.mapped.entry(canonical.to_string()).or_insert(0) += 1;
    }

    pub(crate) fn record_ignored(&mut self) {
        self.ignored += 1;
    }

    pub(crate) fn record_unknown(&mut self, token: String) {
        let count = self.unknown.entry(token.clone()).or_insert(0);
        if *count == 0 {
            warn!(token = %token, "could not map token");
        }
        *count += 1;
    }

    /// Total raw tokens classified.
    pub fn raw_count(&self) -> u64 {
        self.raw
    }

    /// Tokens that only resolved after normalization (any phase past the
    /// exact lookup).
    pub fn normalized_count(&self) -> u64 {
        self.normalized
    }

    /// Tokens resolved as intentionally unmapped.
    pub fn ignored_count(&self) -> u64 {
        self.ignored
    }

    /// Distinct canonical names produced.
    pub fn mapped_distinct(&self) -> usize {
        self.mapped.len()
    }

    /// Distinct tokens that fell through the whole cascade.
    pub fn unknown_distinct(&self) -> usize {
        self.unknown.len()
    }

    /// How often one unknown token was seen.
    pub fn unknown_count(&self, token: &str) -> u64 {
        self.unknown.get(token).copied().unwrap_or(0)
    }

    /// `<count> <value>` report of mapped canonical names, ascending by count.
    pub fn mapped_report(&self) -> String {
        uniq_report(&self.mapped)
    }

    /// `<count> <value>` report of unknown tokens, ascending by count.
    pub fn unknown_report(&self) -> String {
        uniq_report(&self.unknown)
    }

    /// Write both reports under `dir` as `<prefix>_found` / `<prefix>_unknown`.
    pub fn write_reports(&self, dir: &Path, prefix: &str) -> Result<()> {
        std::fs::create_dir_all(dir).map_err(|e| JobharvestError::io(dir, e))?;

        let found = dir.join(format!("{prefix}_found"));
        std::fs::write(&found, self.mapped_report()).map_err(|e| JobharvestError::io(&found, e))?;

        let unknown = dir.join(format!("{prefix}_unknown"));
        std::fs::write(&unknown, self.unknown_report())
            .map_err(|e| JobharvestError::io(&unknown, e))?;

        Ok(())
    }
}

/// Output shaped like `sort | uniq -c`: count right-aligned, then the value,
/// sorted ascending by count with the value as tie-breaker.
fn uniq_report(map: &HashMap<String, u64>) -> String {
    let mut pairs: Vec<(&str, u64)> = map.iter().map(|(v, c)| (v.as_str(), *c)).collect();
    pairs.sort_by(|(v1, c1), (v2, c2)| c1.cmp(c2).then_with(|| v1.cmp(v2)));
    pairs
        .into_iter()
        .map(|(value, count)| format!("{count:>7} {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_sorted_by_count_then_value() {
        let mut tracker = TokenTracker::new();
        tracker.record_mapped("React");
        tracker.record_mapped("React");
        tracker.record_mapped("CSS");
        tracker.record_mapped("Ada");

        let report = tracker.mapped_report();
        let lines: Vec<&str> = report.lines().map(str::trim_start).collect();
        assert_eq!(lines, vec!["1 Ada", "1 CSS", "2 React"]);
    }

    #[test]
    fn unknown_counted_per_distinct_token() {
        let mut tracker = TokenTracker::new();
        tracker.record_unknown("quantumfoo".into());
        tracker.record_unknown("quantumfoo".into());
        tracker.record_unknown("blorp".into());

        assert_eq!(tracker.unknown_distinct(), 2);
        assert_eq!(tracker.unknown_count("quantumfoo"), 2);
        assert_eq!(tracker.unknown_count("blorp"), 1);
    }

    #[test]
    fn reports_written_to_disk() {
        let dir = std::env::temp_dir().join(format!(
            "jobharvest-tracker-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = std::fs::remove_dir_all(&dir);

        let mut tracker = TokenTracker::new();
        tracker.record_mapped("Rust");
        tracker.record_unknown("blorp".into());
        tracker.write_reports(&dir, "tags").unwrap();

        let found = std::fs::read_to_string(dir.join("tags_found")).unwrap();
        assert!(found.contains("1 Rust"));
        let unknown = std::fs::read_to_string(dir.join("tags_unknown")).unwrap();
        assert!(unknown.contains("1 blorp"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
