//! Stage orchestration: fetch → extract → classify → link → adopt →
//! convert → project → merge.
//!
//! Stages are strictly sequenced; each one reads its input from the blob
//! store and persists its output before the next begins, so any stage can
//! be re-run on its own against the same inputs. Concurrency lives inside
//! the fetcher only.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use jobharvest_blobs::{BlobStore, collections};
use jobharvest_extractor::{parse_company, parse_company_listing, parse_job, parse_job_listing};
use jobharvest_fetcher::{DetailKind, Fetcher, ListingKind};
use jobharvest_shared::{
    AppConfig, LinkedCompany, LinkedJob, RawCompany, RawJob, Result, SchemaBounds, parse_pages,
};

use crate::adopter;
use crate::classify::{RunTrackers, Taxonomies, classify_companies, classify_jobs};
use crate::convert::{convert_company, convert_offer};
use crate::linker::link;
use crate::projector::project;

/// What a scrape run produced.
#[derive(Debug, Clone, Default)]
pub struct ScrapeSummary {
    pub listing_pages: usize,
    pub jobs: usize,
    pub companies: usize,
    pub linked: usize,
    pub orphans: usize,
}

/// What a convert run produced.
#[derive(Debug, Clone, Default)]
pub struct ConvertSummary {
    pub offers: usize,
    pub companies: usize,
}

/// Fetch listings and details, extract raw records, then link them.
#[instrument(skip_all)]
pub async fn run_scrape(
    config: &AppConfig,
    store: &BlobStore,
    taxonomies: &Taxonomies,
    trackers: &mut RunTrackers,
) -> Result<ScrapeSummary> {
    let pages = parse_pages(&config.fetch.pages)?;
    let fetcher = Fetcher::new(&config.fetch)?;

    let job_pages = fetcher
        .fetch_listings(ListingKind::Jobs, &pages, store)
        .await?;
    let company_pages = fetcher
        .fetch_listings(ListingKind::Companies, &pages, store)
        .await?;

    let job_ids = listing_ids(store, collections::JOB_LISTING_HTML, &job_pages, parse_job_listing)?;
    let company_ids = listing_ids(
        store,
        collections::COMPANY_LISTING_HTML,
        &company_pages,
        parse_company_listing,
    )?;

    let job_ids = fetcher.fetch_details(DetailKind::Job, &job_ids, store).await?;
    let company_ids = fetcher
        .fetch_details(DetailKind::Company, &company_ids, store)
        .await?;

    let jobs = extract_jobs(store, &job_ids)?;
    let companies = extract_companies(store, &company_ids)?;

    store.merge(collections::RAW_JOBS)?;
    store.merge(collections::RAW_COMPANIES)?;

    let mut summary = ScrapeSummary {
        listing_pages: job_pages.len(),
        jobs: jobs.len(),
        companies: companies.len(),
        ..Default::default()
    };
    let (linked, orphans) = link_stage(store, taxonomies, trackers, jobs, companies)?;
    summary.linked = linked;
    summary.orphans = orphans;

    info!(?summary, "scrape complete");
    Ok(summary)
}

/// Re-link the raw records currently in storage.
#[instrument(skip_all)]
pub fn run_link(
    store: &BlobStore,
    taxonomies: &Taxonomies,
    trackers: &mut RunTrackers,
) -> Result<(usize, usize)> {
    let jobs = store.read_all(collections::RAW_JOBS)?;
    let companies = store.read_all(collections::RAW_COMPANIES)?;
    link_stage(store, taxonomies, trackers, jobs, companies)
}

/// Try to resolve the orphans currently in storage.
#[instrument(skip_all)]
pub async fn run_adopt(
    config: &AppConfig,
    store: &BlobStore,
    taxonomies: &Taxonomies,
    trackers: &mut RunTrackers,
) -> Result<usize> {
    let fetcher = Fetcher::new(&config.fetch)?;
    let adopted = adopter::adopt_all(&fetcher, store, taxonomies, trackers).await?;

    store.merge(collections::LINKED_OFFERS)?;
    store.merge(collections::LINKED_COMPANIES)?;
    store.merge(collections::ORPHANS)?;
    Ok(adopted.len())
}

/// Convert linked records to the destination shape and project them.
#[instrument(skip_all)]
pub fn run_convert(
    store: &BlobStore,
    taxonomies: &Taxonomies,
    bounds: &SchemaBounds,
) -> Result<ConvertSummary> {
    let linked_offers: BTreeMap<String, LinkedJob> = store.read_all(collections::LINKED_OFFERS)?;
    let linked_companies: BTreeMap<String, LinkedCompany> =
        store.read_all(collections::LINKED_COMPANIES)?;

    let mut offers = BTreeMap::new();
    for job in linked_offers.values() {
        if let Some(offer) = convert_offer(job, taxonomies) {
            offers.insert(offer.id.clone(), offer);
        }
    }
    let mut companies = BTreeMap::new();
    for company in linked_companies.values() {
        let board = convert_company(company);
        companies.insert(board.id.clone(), board);
    }

    let counters = project(&mut offers, &mut companies, bounds);
    counters.report();

    for offer in offers.values() {
        store.write(collections::BOARD_OFFERS, offer)?;
    }
    for company in companies.values() {
        store.write(collections::BOARD_COMPANIES, company)?;
    }
    store.merge(collections::BOARD_OFFERS)?;
    store.merge(collections::BOARD_COMPANIES)?;

    let summary = ConvertSummary {
        offers: offers.len(),
        companies: companies.len(),
    };
    info!(?summary, "convert complete");
    Ok(summary)
}

/// Copy the merged board artifacts to the consumer hand-off directory.
pub fn run_accept(store: &BlobStore, deploy_dir: &Path) -> Result<()> {
    store.deploy(
        &[
            (collections::BOARD_OFFERS, "offers.json"),
            (collections::BOARD_COMPANIES, "companies.json"),
        ],
        deploy_dir,
    )?;
    info!(path = %deploy_dir.display(), "merged artifacts deployed");
    Ok(())
}

/// The whole pipeline: scrape, convert, accept.
pub async fn run_all(
    config: &AppConfig,
    store: &BlobStore,
    taxonomies: &Taxonomies,
    trackers: &mut RunTrackers,
) -> Result<(ScrapeSummary, ConvertSummary)> {
    let scrape = run_scrape(config, store, taxonomies, trackers).await?;
    let convert = run_convert(store, taxonomies, &config.bounds)?;
    run_accept(store, &PathBuf::from(&config.output.deploy_dir))?;
    Ok((scrape, convert))
}

/// Where this run's diagnostic reports go.
pub fn stats_dir(store: &BlobStore) -> PathBuf {
    store.root().join("stats")
}

// ---------------------------------------------------------------------------
// Stage internals
// ---------------------------------------------------------------------------

fn listing_ids(
    store: &BlobStore,
    collection: &str,
    pages: &[u32],
    parse: fn(&str) -> Vec<String>,
) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    for page in pages {
        let html = store.read_html(collection, &page.to_string())?;
        let page_ids = parse(&html);
        if page_ids.is_empty() {
            warn!(page = *page, collection, "listing page yielded no ids");
        }
        ids.extend(page_ids);
    }
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

fn extract_jobs(store: &BlobStore, ids: &[String]) -> Result<BTreeMap<String, RawJob>> {
    let mut jobs = BTreeMap::new();
    for id in ids {
        let html = store.read_html(collections::JOB_HTML, id)?;
        if let Some(job) = parse_job(&html, id) {
            store.write(collections::RAW_JOBS, &job)?;
            jobs.insert(job.id.clone(), job);
        }
    }
    info!(extracted = jobs.len(), requested = ids.len(), "extracted jobs");
    Ok(jobs)
}

fn extract_companies(store: &BlobStore, ids: &[String]) -> Result<BTreeMap<String, RawCompany>> {
    let mut companies = BTreeMap::new();
    for id in ids {
        let html = store.read_html(collections::COMPANY_HTML, id)?;
        if let Some(company) = parse_company(&html, id) {
            store.write(collections::RAW_COMPANIES, &company)?;
            companies.insert(company.id.clone(), company);
        }
    }
    info!(
        extracted = companies.len(),
        requested = ids.len(),
        "extracted companies"
    );
    Ok(companies)
}

/// Classify, link, persist the partition, and merge the linked collections.
fn link_stage(
    store: &BlobStore,
    taxonomies: &Taxonomies,
    trackers: &mut RunTrackers,
    mut jobs: BTreeMap<String, RawJob>,
    mut companies: BTreeMap<String, RawCompany>,
) -> Result<(usize, usize)> {
    classify_jobs(&mut jobs, taxonomies, trackers);
    classify_companies(&mut companies, taxonomies, trackers);

    let mut linked_companies: BTreeMap<String, LinkedCompany> = companies
        .into_iter()
        .map(|(id, company)| (id, LinkedCompany::new(company)))
        .collect();

    let partition = link(jobs, &mut linked_companies);

    for job in partition.linked.values() {
        store.write(collections::LINKED_OFFERS, job)?;
    }
    for orphan in partition.orphans.values() {
        store.write(collections::ORPHANS, orphan)?;
    }
    for company in linked_companies.values() {
        store.write(collections::LINKED_COMPANIES, company)?;
    }

    store.merge(collections::LINKED_OFFERS)?;
    store.merge(collections::LINKED_COMPANIES)?;
    store.merge(collections::ORPHANS)?;

    Ok((partition.linked.len(), partition.orphans.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::test_support;
    use jobharvest_shared::{FetchConfig, Offer, OutputConfig};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_store(tag: &str) -> BlobStore {
        let dir = std::env::temp_dir().join(format!(
            "jobharvest-pipeline-{tag}-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        BlobStore::new(dir)
    }

    fn test_config(base_url: String) -> AppConfig {
        AppConfig {
            fetch: FetchConfig {
                base_url,
                listing_concurrency: 2,
                detail_concurrency: 4,
                timeout_ms: 2_000,
                retries: 1,
                pages: "1".into(),
            },
            output: OutputConfig::default(),
            bounds: SchemaBounds::default(),
        }
    }

    fn job_listing_page() -> &'static str {
        r#"<div class="listing">
             <div class="-job" data-jobid="100"></div>
             <div class="-job" data-jobid="200"></div>
           </div>"#
    }

    fn company_listing_page() -> &'static str {
        r#"<div class="company-list">
             <div class="-company"><h2><a href="/jobs/companies/acme">Acme</a></h2></div>
           </div>"#
    }

    fn job_page(title: &str, company: &str) -> String {
        format!(
            r#"<div id="mainbar">
              <header class="job-details--header">
                <h1>{title}</h1>
                <div><a href="/jobs/companies/{company}">{company}</a><span>- Lisbon</span></div>
              </header>
              <div id="overview-items"><div><svg class="svg-icon iconClock"></svg> 3d ago</div></div>
              <section><h2>About this job</h2><div>
                <div class="mb8"><span>Role: </span><span>BackendDeveloper</span></div>
              </div></section>
              <section><h2>Technologies</h2><div>
                <a class="post-tag">rust</a><a class="post-tag">postgresql</a>
              </div></section>
              <section><h2>Job description</h2><div><p>Do good work.</p></div></section>
            </div>"#
        )
    }

    fn company_page(name: &str) -> String {
        format!(
            r#"<div id="header-content">
              <div id="company-name-tagline"><h1>{name}</h1><p>Great stuff</p></div>
            </div>
            <div id="about-items"><p>A fine employer.</p></div>
            <div id="tech-stack-items"><h2>Technologies</h2>
              <div><a class="post-tag">rust</a></div>
            </div>"#
        )
    }

    #[tokio::test]
    async fn scrape_links_jobs_and_sets_aside_orphans() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .and(query_param("pg", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(job_listing_page()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs/companies"))
            .and(query_param("pg", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(company_listing_page()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs/100"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(job_page("Backend Engineer", "acme")),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs/200"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(job_page("Data Engineer", "ghost")),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs/companies/acme"))
            .respond_with(ResponseTemplate::new(200).set_body_string(company_page("Acme Corp")))
            .mount(&server)
            .await;

        let store = temp_store("scrape");
        let taxonomies = test_support::taxonomies();
        let mut trackers = RunTrackers::new();
        let config = test_config(server.uri());

        let summary = run_scrape(&config, &store, &taxonomies, &mut trackers)
            .await
            .unwrap();

        assert_eq!(summary.jobs, 2);
        assert_eq!(summary.companies, 1);
        assert_eq!(summary.linked, 1);
        assert_eq!(summary.orphans, 1);

        // Raw blobs keep free-text tags; linked blobs carry canonical ones.
        let raw: RawJob = store.read(collections::RAW_JOBS, "100").unwrap();
        assert_eq!(raw.tags, vec!["postgresql", "rust"]);
        let linked: LinkedJob = store.read(collections::LINKED_OFFERS, "100").unwrap();
        assert_eq!(linked.tags, vec!["PostgreSQL", "Rust"]);
        assert_eq!(linked.company.name, "Acme Corp");

        let orphan: RawJob = store.read(collections::ORPHANS, "200").unwrap();
        assert_eq!(orphan.company.id, "ghost");

        // Merged artifacts exist and carry one key per record.
        let merged = std::fs::read_to_string(store.merge_artifact_path(collections::RAW_JOBS))
            .unwrap();
        let parsed: BTreeMap<String, serde_json::Value> = serde_json::from_str(&merged).unwrap();
        assert_eq!(parsed.len(), 2);

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn convert_projects_and_persists_board_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_string(job_listing_page()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jobs/companies"))
            .respond_with(ResponseTemplate::new(200).set_body_string(company_listing_page()))
            .mount(&server)
            .await;
        for id in ["100", "200"] {
            Mock::given(method("GET"))
                .and(path(format!("/jobs/{id}")))
                .respond_with(
                    ResponseTemplate::new(200).set_body_string(job_page("Engineer", "acme")),
                )
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/jobs/companies/acme"))
            .respond_with(ResponseTemplate::new(200).set_body_string(company_page("Acme Corp")))
            .mount(&server)
            .await;

        let store = temp_store("convert");
        let taxonomies = test_support::taxonomies();
        let mut trackers = RunTrackers::new();
        let config = test_config(server.uri());

        run_scrape(&config, &store, &taxonomies, &mut trackers)
            .await
            .unwrap();
        let summary = run_convert(&store, &taxonomies, &config.bounds).unwrap();

        assert_eq!(summary.offers, 2);
        assert_eq!(summary.companies, 1);

        let offer: Offer = store.read(collections::BOARD_OFFERS, "100").unwrap();
        assert!(!offer.technologies.is_empty());
        assert!(offer.technologies.len() <= config.bounds.max_technologies);
        assert_eq!(offer.fields, vec!["BACKEND_DEVELOPER"]);
        assert_eq!(offer.company, "acme");

        // Accept copies the merged artifacts to the hand-off directory.
        let deploy = store.root().join("handoff");
        run_accept(&store, &deploy).unwrap();
        assert!(deploy.join("offers.json").exists());
        assert!(deploy.join("companies.json").exists());

        let _ = std::fs::remove_dir_all(store.root());
    }
}
