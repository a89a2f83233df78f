//! Entity linking: partition jobs into linked vs. orphan.

use std::collections::BTreeMap;

use tracing::info;

use jobharvest_shared::{CompanyCard, JobSummary, LinkedCompany, LinkedJob, OrphanJob, RawJob};

/// The total, disjoint partition produced by [`link`].
#[derive(Debug, Default)]
pub struct Partition {
    pub linked: BTreeMap<String, LinkedJob>,
    pub orphans: BTreeMap<String, OrphanJob>,
}

/// Link each job to its company by exact company-id lookup.
///
/// A hit produces a [`LinkedJob`] carrying the minimal company projection
/// and records the job on the company's offer list; a miss produces an
/// orphan. Every input job lands in exactly one of the two outputs. Pure
/// with respect to its inputs — no I/O here.
pub fn link(
    jobs: BTreeMap<String, RawJob>,
    companies: &mut BTreeMap<String, LinkedCompany>,
) -> Partition {
    let total = jobs.len();
    info!(jobs = total, companies = companies.len(), "linking jobs");

    let mut partition = Partition::default();
    for (id, job) in jobs {
        match companies.get_mut(&job.company.id) {
            Some(company) => {
                company
                    .offers
                    .insert(job.id.clone(), JobSummary::from_job(&job));
                let card = CompanyCard::from_company(&company.company);
                partition.linked.insert(id, LinkedJob::from_raw(job, card));
            }
            None => {
                partition.orphans.insert(id, job);
            }
        }
    }

    if !partition.orphans.is_empty() {
        info!(
            orphans = partition.orphans.len(),
            total, "found orphan jobs"
        );
    }
    partition
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobharvest_shared::{CompanyRef, RawCompany};

    fn job(id: &str, company_id: &str) -> RawJob {
        RawJob {
            id: id.into(),
            title: format!("Job {id}"),
            location: "Porto".into(),
            ago: "2d ago".into(),
            job_type: String::new(),
            role: String::new(),
            experience: String::new(),
            industry: String::new(),
            company_size: String::new(),
            company_type: String::new(),
            tags: vec!["Rust".into()],
            description: "desc".into(),
            company: CompanyRef {
                id: company_id.into(),
                path: format!("/jobs/companies/{company_id}"),
                name: company_id.to_uppercase(),
                logo: String::new(),
            },
        }
    }

    fn company(id: &str) -> LinkedCompany {
        LinkedCompany::new(RawCompany {
            id: id.into(),
            name: format!("{id} inc"),
            tagline: String::new(),
            path: format!("/jobs/companies/{id}"),
            logo: format!("https://cdn.test/{id}.png"),
            website_name: String::new(),
            website: format!("https://{id}.test"),
            industry: String::new(),
            size: String::new(),
            founded: String::new(),
            status: String::new(),
            tags: vec!["Rust".into()],
            description: "about".into(),
            benefits: vec![],
            social: vec![],
        })
    }

    fn jobs_and_companies() -> (BTreeMap<String, RawJob>, BTreeMap<String, LinkedCompany>) {
        let mut jobs = BTreeMap::new();
        for (id, owner) in [("1", "acme"), ("2", "acme"), ("3", "globex"), ("4", "ghost")] {
            jobs.insert(id.to_string(), job(id, owner));
        }
        let mut companies = BTreeMap::new();
        for id in ["acme", "globex"] {
            companies.insert(id.to_string(), company(id));
        }
        (jobs, companies)
    }

    #[test]
    fn partition_is_total_and_disjoint() {
        let (jobs, mut companies) = jobs_and_companies();
        let input_ids: Vec<String> = jobs.keys().cloned().collect();

        let partition = link(jobs, &mut companies);

        let mut output_ids: Vec<String> = partition
            .linked
            .keys()
            .chain(partition.orphans.keys())
            .cloned()
            .collect();
        output_ids.sort();
        assert_eq!(output_ids, input_ids);
        for id in partition.linked.keys() {
            assert!(!partition.orphans.contains_key(id));
        }
    }

    #[test]
    fn hit_installs_company_projection() {
        let (jobs, mut companies) = jobs_and_companies();
        let partition = link(jobs, &mut companies);

        let linked = &partition.linked["1"];
        assert_eq!(linked.company.id, "acme");
        assert_eq!(linked.company.name, "acme inc");
        assert_eq!(linked.company.website, "https://acme.test");
    }

    #[test]
    fn hit_appends_offer_backreference() {
        let (jobs, mut companies) = jobs_and_companies();
        link(jobs, &mut companies);

        let acme = &companies["acme"];
        assert_eq!(acme.offers.len(), 2);
        assert_eq!(acme.offers["1"].title, "Job 1");
        assert_eq!(companies["globex"].offers.len(), 1);
    }

    #[test]
    fn miss_produces_orphan_per_job() {
        let (jobs, mut companies) = jobs_and_companies();
        let partition = link(jobs, &mut companies);

        assert_eq!(partition.orphans.len(), 1);
        assert_eq!(partition.orphans["4"].company.id, "ghost");
    }

    #[test]
    fn empty_inputs_partition_cleanly() {
        let mut companies = BTreeMap::new();
        let partition = link(BTreeMap::new(), &mut companies);
        assert!(partition.linked.is_empty());
        assert!(partition.orphans.is_empty());
    }
}
