//! The classification stage: raw free-text tokens → canonical names.
//!
//! Runs between extraction and linking. Raw blobs keep the free-text
//! tokens as scraped; the in-memory records flowing into the linker carry
//! canonical names only. Trackers are per-run values owned by the caller,
//! never process globals.

use std::collections::BTreeMap;
use std::path::Path;

use jobharvest_classifier::{Classifier, KeywordTable, TokenTracker};
use jobharvest_shared::{RawCompany, RawJob, Result};

/// The mapping tables loaded once at process start.
pub struct Taxonomies {
    /// Free-text technology tags → the destination technology enumeration.
    pub technologies: Classifier,
    /// Role labels → the destination field enumeration.
    pub roles: Classifier,
    /// Keyword table for guessing fields when the role label resolves to
    /// nothing.
    pub field_guesses: KeywordTable,
}

impl Taxonomies {
    /// Load `technologies.map`, `roles.map` and `fields.map` from a directory.
    pub fn load(dir: &Path) -> Result<Self> {
        Ok(Self {
            technologies: Classifier::from_file(dir.join("technologies.map"))?,
            roles: Classifier::from_file(dir.join("roles.map"))?,
            field_guesses: KeywordTable::from_file(dir.join("fields.map"))?,
        })
    }
}

/// Per-run token accounting, one tracker per taxonomy.
#[derive(Default)]
pub struct RunTrackers {
    pub tags: TokenTracker,
    pub roles: TokenTracker,
}

impl RunTrackers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the diagnostic reports for this run.
    pub fn write_reports(&self, dir: &Path) -> Result<()> {
        self.tags.write_reports(dir, "tags")?;
        self.roles.write_reports(dir, "roles")?;
        Ok(())
    }
}

/// Classify job tags and role labels in place.
///
/// Unresolvable tokens are dropped (and tracked); the record itself is
/// never failed here — an offer that ends up with no technologies is
/// discarded later at conversion.
pub fn classify_jobs(
    jobs: &mut BTreeMap<String, RawJob>,
    taxonomies: &Taxonomies,
    trackers: &mut RunTrackers,
) {
    for job in jobs.values_mut() {
        job.tags = taxonomies
            .technologies
            .classify_all(&job.tags, &mut trackers.tags);
        if !job.role.is_empty() {
            job.role = taxonomies
                .roles
                .classify(&job.role, &mut trackers.roles)
                .unwrap_or_default();
        }
    }
}

/// Classify company tags in place.
pub fn classify_companies(
    companies: &mut BTreeMap<String, RawCompany>,
    taxonomies: &Taxonomies,
    trackers: &mut RunTrackers,
) {
    for company in companies.values_mut() {
        company.tags = taxonomies
            .technologies
            .classify_all(&company.tags, &mut trackers.tags);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use jobharvest_shared::CompanyRef;

    fn raw_job(id: &str, tags: &[&str], role: &str) -> RawJob {
        RawJob {
            id: id.into(),
            title: "Engineer".into(),
            location: String::new(),
            ago: "7d ago".into(),
            job_type: String::new(),
            role: role.into(),
            experience: String::new(),
            industry: String::new(),
            company_size: String::new(),
            company_type: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            description: "desc".into(),
            company: CompanyRef {
                id: "acme".into(),
                path: "/jobs/companies/acme".into(),
                name: "Acme".into(),
                logo: String::new(),
            },
        }
    }

    #[test]
    fn job_tags_and_roles_become_canonical() {
        let taxonomies = test_support::taxonomies();
        let mut trackers = RunTrackers::new();
        let mut jobs = BTreeMap::new();
        jobs.insert(
            "1".to_string(),
            raw_job("1", &["reactredux", "css3", "quantumfoo"], "BackendDeveloper"),
        );

        classify_jobs(&mut jobs, &taxonomies, &mut trackers);

        let job = &jobs["1"];
        assert_eq!(job.tags, vec!["CSS", "React"]);
        assert_eq!(job.role, "BACKEND_DEVELOPER");
        assert_eq!(trackers.tags.unknown_count("quantumfoo"), 1);
    }

    #[test]
    fn unresolvable_role_dropped_not_fatal() {
        let taxonomies = test_support::taxonomies();
        let mut trackers = RunTrackers::new();
        let mut jobs = BTreeMap::new();
        jobs.insert("1".to_string(), raw_job("1", &["rust"], "ChiefVibesOfficer"));

        classify_jobs(&mut jobs, &taxonomies, &mut trackers);

        assert_eq!(jobs["1"].role, "");
        assert_eq!(trackers.roles.unknown_distinct(), 1);
    }
}
