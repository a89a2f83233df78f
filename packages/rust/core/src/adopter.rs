//! Orphan adoption: fetch the missing companies and re-link.
//!
//! For every orphan the linker set aside, this pass fetches just the
//! companies still unknown, extracts and classifies them, then re-runs the
//! linker restricted to the orphan set. Newly resolved jobs move from
//! orphan storage to linked storage; unresolved orphans stay untouched, so
//! re-running with no new companies changes nothing.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, instrument};

use jobharvest_blobs::{BlobStore, collections};
use jobharvest_extractor::parse_company;
use jobharvest_fetcher::{DetailKind, Fetcher};
use jobharvest_shared::{LinkedCompany, LinkedJob, OrphanJob, RawCompany, Result};

use crate::classify::{RunTrackers, Taxonomies, classify_companies};
use crate::linker::link;

/// Adopt whatever orphans can now be resolved.
///
/// Returns the jobs moved into linked storage, keyed by id. Adoption
/// matches only by exact company reference id; a company whose id drifted
/// between runs stays orphaned.
#[instrument(skip_all, fields(orphans = orphans.len()))]
pub async fn adopt(
    fetcher: &Fetcher,
    store: &BlobStore,
    taxonomies: &Taxonomies,
    trackers: &mut RunTrackers,
    orphans: BTreeMap<String, OrphanJob>,
) -> Result<BTreeMap<String, LinkedJob>> {
    if orphans.is_empty() {
        info!("no orphans to adopt");
        return Ok(BTreeMap::new());
    }
    let num_orphans = orphans.len();

    // The distinct set of company references still needed.
    let paths: Vec<String> = orphans
        .values()
        .map(|orphan| orphan.company.path.clone())
        .filter(|path| !path.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    info!(
        companies = paths.len(),
        orphans = num_orphans,
        "fetching companies for orphans"
    );
    let ids = fetcher
        .fetch_details(DetailKind::Company, &paths, store)
        .await?;
    info!(fetched = ids.len(), requested = paths.len(), "fetched companies");

    // Extract and classify the new companies; persist their raw records.
    let mut new_companies: BTreeMap<String, RawCompany> = BTreeMap::new();
    for id in &ids {
        let html = store.read_html(collections::COMPANY_HTML, id)?;
        if let Some(company) = parse_company(&html, id) {
            store.write(collections::RAW_COMPANIES, &company)?;
            new_companies.insert(id.clone(), company);
        }
    }
    classify_companies(&mut new_companies, taxonomies, trackers);
    info!(
        accepted = new_companies.len(),
        fetched = ids.len(),
        "accepted new parent companies"
    );

    // Merge with the companies already linked; known companies keep their
    // accumulated offer lists.
    let mut companies: BTreeMap<String, LinkedCompany> =
        store.read_all(collections::LINKED_COMPANIES)?;
    for (id, company) in new_companies {
        companies
            .entry(id)
            .or_insert_with(|| LinkedCompany::new(company));
    }

    // Re-link restricted to the orphan set.
    let partition = link(orphans, &mut companies);
    info!(
        adopted = partition.linked.len(),
        orphans = num_orphans,
        "adopted offers"
    );

    // Move each adopted job: written to linked storage, removed from
    // orphan storage, never left in both places.
    for (id, job) in &partition.linked {
        store.write(collections::LINKED_OFFERS, job)?;
        store.remove(collections::ORPHANS, id)?;
    }

    // Persist the companies that own the adopted jobs.
    let owner_ids: BTreeSet<&str> = partition
        .linked
        .values()
        .map(|job| job.company.id.as_str())
        .collect();
    for id in owner_ids {
        if let Some(company) = companies.get(id) {
            store.write(collections::LINKED_COMPANIES, company)?;
        }
    }

    Ok(partition.linked)
}

/// Adopt against the orphans currently in storage.
pub async fn adopt_all(
    fetcher: &Fetcher,
    store: &BlobStore,
    taxonomies: &Taxonomies,
    trackers: &mut RunTrackers,
) -> Result<BTreeMap<String, LinkedJob>> {
    let orphans = store.read_all(collections::ORPHANS)?;
    adopt(fetcher, store, taxonomies, trackers, orphans).await
}
