//! Bounded-concurrency page fetching with retry and rate-limit abort.
//!
//! Two independently sized pools gate in-flight requests: one for listing
//! pages, one for detail pages. Each request carries the configured timeout
//! and a bounded retry count on timeout/connection errors; a request that
//! exhausts its retries fails only that item. A 429 from the upstream flips
//! the abort flag and fails the whole run — no further requests are issued.
//!
//! Fetched pages are persisted as HTML blobs so extraction can re-run
//! offline against the same inputs.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::future::join_all;
use reqwest::{Client, StatusCode};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use url::Url;

use jobharvest_blobs::{BlobStore, collections};
use jobharvest_shared::text::endofpath;
use jobharvest_shared::{FetchConfig, JobharvestError, Result};

/// User-Agent string for all requests.
const USER_AGENT: &str = concat!("jobharvest/", env!("CARGO_PKG_VERSION"));

/// Which listing index to page through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Jobs,
    Companies,
}

impl ListingKind {
    fn path(self) -> &'static str {
        match self {
            Self::Jobs => "/jobs",
            Self::Companies => "/jobs/companies",
        }
    }

    fn html_collection(self) -> &'static str {
        match self {
            Self::Jobs => collections::JOB_LISTING_HTML,
            Self::Companies => collections::COMPANY_LISTING_HTML,
        }
    }
}

/// Which detail page a record id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailKind {
    Job,
    Company,
}

impl DetailKind {
    fn path_prefix(self) -> &'static str {
        match self {
            Self::Job => "/jobs",
            Self::Company => "/jobs/companies",
        }
    }

    fn html_collection(self) -> &'static str {
        match self {
            Self::Job => collections::JOB_HTML,
            Self::Company => collections::COMPANY_HTML,
        }
    }
}

/// Outcome of one detail fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailFetch {
    /// Page fetched this call.
    Fetched { id: String, html: String },
    /// Id was already fetched earlier in this run; nothing was requested.
    Seen { id: String },
    /// The item failed (timeout retries exhausted, HTTP error); the run
    /// continues without it.
    Failed { id: String },
}

/// HTTP fetcher with per-kind concurrency pools and a run-wide abort flag.
pub struct Fetcher {
    client: Client,
    base: Url,
    listing_pool: Semaphore,
    detail_pool: Semaphore,
    retries: u32,
    seen_jobs: Mutex<HashSet<String>>,
    seen_companies: Mutex<HashSet<String>>,
    aborted: AtomicBool,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| JobharvestError::config(format!("bad base_url: {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| JobharvestError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base,
            listing_pool: Semaphore::new(config.listing_concurrency.max(1)),
            detail_pool: Semaphore::new(config.detail_concurrency.max(1)),
            retries: config.retries,
            seen_jobs: Mutex::new(HashSet::new()),
            seen_companies: Mutex::new(HashSet::new()),
            aborted: AtomicBool::new(false),
        })
    }

    /// Whether a rate-limit response has aborted this run.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    // -----------------------------------------------------------------------
    // Single fetches
    // -----------------------------------------------------------------------

    /// Fetch one listing page. `Ok(None)` means the single page failed and
    /// the run goes on without it.
    pub async fn fetch_listing(&self, kind: ListingKind, page: u32) -> Result<Option<String>> {
        let mut url = self.url_for(kind.path())?;
        url.query_pairs_mut().append_pair("pg", &page.to_string());

        let _permit = self.acquire(&self.listing_pool).await?;
        self.fetch_html(&url).await
    }

    /// Fetch one detail page by id or reference path. Ids already seen this
    /// run are skipped without a request.
    pub async fn fetch_detail(&self, kind: DetailKind, id_or_path: &str) -> Result<DetailFetch> {
        let (id, url) = self.detail_url(kind, id_or_path)?;

        {
            let seen = match kind {
                DetailKind::Job => &self.seen_jobs,
                DetailKind::Company => &self.seen_companies,
            };
            let mut seen = seen.lock().unwrap_or_else(|e| e.into_inner());
            if !seen.insert(id.clone()) {
                debug!(id = %id, "detail already fetched this run, skipping");
                return Ok(DetailFetch::Seen { id });
            }
        }

        let _permit = self.acquire(&self.detail_pool).await?;
        match self.fetch_html(&url).await? {
            Some(html) => Ok(DetailFetch::Fetched { id, html }),
            None => Ok(DetailFetch::Failed { id }),
        }
    }

    // -----------------------------------------------------------------------
    // Batch fetches (join the pool at the stage boundary)
    // -----------------------------------------------------------------------

    /// Fetch a set of listing pages, persisting each as an HTML blob.
    /// Returns the pages actually fetched, sorted.
    pub async fn fetch_listings(
        &self,
        kind: ListingKind,
        pages: &[u32],
        store: &BlobStore,
    ) -> Result<Vec<u32>> {
        let results = join_all(pages.iter().map(|&page| async move {
            let html = self.fetch_listing(kind, page).await?;
            Ok::<_, JobharvestError>((page, html))
        }))
        .await;

        let mut fetched = Vec::new();
        for result in results {
            let (page, html) = result?;
            if let Some(html) = html {
                store.write_html(kind.html_collection(), &page.to_string(), &html)?;
                fetched.push(page);
            }
        }
        fetched.sort_unstable();

        info!(
            kind = ?kind,
            fetched = fetched.len(),
            requested = pages.len(),
            "listing fetch complete"
        );
        Ok(fetched)
    }

    /// Fetch a set of detail pages, persisting each as an HTML blob.
    /// Returns the ids available after the pass (fetched now or earlier in
    /// this run), sorted and deduplicated.
    pub async fn fetch_details(
        &self,
        kind: DetailKind,
        ids: &[String],
        store: &BlobStore,
    ) -> Result<Vec<String>> {
        let results = join_all(
            ids.iter()
                .map(|id| async move { self.fetch_detail(kind, id).await }),
        )
        .await;

        let mut available = Vec::new();
        let mut failed = 0usize;
        for result in results {
            match result? {
                DetailFetch::Fetched { id, html } => {
                    store.write_html(kind.html_collection(), &id, &html)?;
                    available.push(id);
                }
                DetailFetch::Seen { id } => available.push(id),
                DetailFetch::Failed { .. } => failed += 1,
            }
        }
        available.sort_unstable();
        available.dedup();

        info!(
            kind = ?kind,
            fetched = available.len(),
            failed,
            requested = ids.len(),
            "detail fetch complete"
        );
        Ok(available)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn acquire<'a>(
        &self,
        pool: &'a Semaphore,
    ) -> Result<tokio::sync::SemaphorePermit<'a>> {
        pool.acquire()
            .await
            .map_err(|e| JobharvestError::Network(format!("fetch pool closed: {e}")))
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| JobharvestError::Network(format!("bad url {path}: {e}")))
    }

    /// Resolve a bare id or a reference path to `(id, detail URL)`.
    fn detail_url(&self, kind: DetailKind, id_or_path: &str) -> Result<(String, Url)> {
        if let Some(path) = id_or_path.strip_prefix('/') {
            let id = endofpath(path).to_string();
            let url = self.url_for(&format!("/{path}"))?;
            return Ok((id, url));
        }
        let url = self.url_for(&format!("{}/{}", kind.path_prefix(), id_or_path))?;
        Ok((id_or_path.to_string(), url))
    }

    /// One HTTP GET with bounded retries on timeout/connection errors.
    ///
    /// `Ok(None)` is the per-item failure; `Err(RateLimited)` is the fatal
    /// whole-run abort.
    async fn fetch_html(&self, url: &Url) -> Result<Option<String>> {
        let mut attempt = 0u32;

        loop {
            if self.is_aborted() {
                return Err(JobharvestError::RateLimited { retry_after: None });
            }

            let response = match self.client.get(url.as_str()).send().await {
                Ok(response) => response,
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.retries => {
                    attempt += 1;
                    warn!(%url, attempt, max = self.retries, error = %e, "retrying fetch");
                    continue;
                }
                Err(e) => {
                    warn!(%url, error = %e, "fetch failed, dropping item");
                    return Ok(None);
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                self.aborted.store(true, Ordering::SeqCst);
                error!(%url, ?retry_after, "received 429 Too Many Requests, aborting run");
                return Err(JobharvestError::RateLimited { retry_after });
            }
            if !status.is_success() {
                warn!(%url, %status, "fetch failed, dropping item");
                return Ok(None);
            }

            return match response.text().await {
                Ok(body) => Ok(Some(body)),
                Err(e) => {
                    warn!(%url, error = %e, "body read failed, dropping item");
                    Ok(None)
                }
            };
        }
    }
}
