//! Job detail page → [`RawJob`].

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::info;

use jobharvest_shared::text::{english, endofpath, multiline, oneline, rmquery};
use jobharvest_shared::{CompanyRef, RawJob};

use crate::locator::{
    FieldLocator, Locator, block_text, collapsed_text, locate_fields, section_with_heading, sel,
    texts_of,
};

/// The only company reference shape we accept: one path segment, no query.
static COMPANY_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/jobs/companies/[^/?]+$").expect("company path regex"));

const ABOUT_HEADING: &str = "About this job";

/// Where the "about" facts live on a job page.
const JOB_ABOUT: &[FieldLocator] = &[
    FieldLocator {
        field: "job_type",
        locator: Locator::HeadingLabeled {
            heading: ABOUT_HEADING,
            label: "Job type",
        },
    },
    FieldLocator {
        field: "role",
        locator: Locator::HeadingLabeled {
            heading: ABOUT_HEADING,
            label: "Role",
        },
    },
    FieldLocator {
        field: "experience",
        locator: Locator::HeadingLabeled {
            heading: ABOUT_HEADING,
            label: "Experience level",
        },
    },
    FieldLocator {
        field: "industry",
        locator: Locator::HeadingLabeled {
            heading: ABOUT_HEADING,
            label: "Industry",
        },
    },
    FieldLocator {
        field: "company_size",
        locator: Locator::HeadingLabeled {
            heading: ABOUT_HEADING,
            label: "Company size",
        },
    },
    FieldLocator {
        field: "company_type",
        locator: Locator::HeadingLabeled {
            heading: ABOUT_HEADING,
            label: "Company type",
        },
    },
];

/// Extract one job record from its detail page.
///
/// Returns `None` when the page has no acceptable company reference or the
/// built record fails required-field validation; either way the reason is
/// logged for this id and the run continues.
pub fn parse_job(html: &str, id: &str) -> Option<RawJob> {
    let doc = Html::parse_document(html);

    let header = doc
        .select(&sel("#mainbar header.job-details--header"))
        .next();

    // No company, no record: bail before doing any more work.
    let Some(path) = header.and_then(select_company_path) else {
        info!(id, "discarding job: no company reference found");
        return None;
    };

    let title = header
        .and_then(|h| h.select(&sel("h1")).next())
        .map(collapsed_text)
        .unwrap_or_default();
    let company_name = header
        .and_then(|h| h.select(&sel("h1 + div > a")).next())
        .map(collapsed_text)
        .unwrap_or_default();
    let location = header
        .and_then(|h| h.select(&sel("h1 + div > a + span")).next())
        .map(|el| parse_location(&collapsed_text(el)))
        .unwrap_or_default();
    let logo = header
        .and_then(|h| h.select(&sel("img.s-avatar[src]")).next())
        .and_then(|el| el.value().attr("src"))
        .map(|src| rmquery(src).to_string())
        .unwrap_or_default();

    let ago = clock_text(&doc);

    let mut about: BTreeMap<&str, String> = locate_fields(&doc, JOB_ABOUT).into_iter().collect();
    let mut about_field = |field: &str| english(&about.remove(field).unwrap_or_default());

    let tags = section_with_heading(&doc, "Technologies")
        .map(|section| normalize_tokens(texts_of(section, "a.post-tag")))
        .unwrap_or_default();

    let description = section_with_heading(&doc, "Job description")
        .and_then(|section| section.select(&sel("h2 + div")).next())
        .map(|el| english(&multiline(&block_text(el))))
        .unwrap_or_default();

    let job = RawJob {
        id: id.to_string(),
        title: english(&title),
        location,
        ago,
        job_type: about_field("job_type"),
        role: about_field("role"),
        experience: about_field("experience"),
        industry: about_field("industry"),
        company_size: about_field("company_size"),
        company_type: about_field("company_type"),
        tags,
        description,
        company: CompanyRef {
            id: endofpath(&path).to_string(),
            path,
            name: company_name,
            logo,
        },
    };

    validate(job)
}

/// The first header anchor whose href matches the known reference shape.
fn select_company_path(header: ElementRef<'_>) -> Option<String> {
    let anchors = sel(r#"a[href^="/jobs/companies/"]"#);
    header
        .select(&anchors)
        .filter_map(|el| el.value().attr("href"))
        .find(|href| COMPANY_PATH_RE.is_match(href))
        .map(str::to_string)
}

/// Posting age, read from the element next to the clock icon.
fn clock_text(doc: &Html) -> String {
    doc.select(&sel("#overview-items svg.iconClock"))
        .next()
        .and_then(|el| el.parent().and_then(ElementRef::wrap))
        .map(collapsed_text)
        .unwrap_or_default()
}

/// The location span starts with a separator dash on the source site.
fn parse_location(text: &str) -> String {
    oneline(text.trim_start_matches(['-', '–']))
}

/// Trim, drop empties, sort, dedup.
pub(crate) fn normalize_tokens(tokens: Vec<String>) -> Vec<String> {
    let mut tokens: Vec<String> = tokens
        .into_iter()
        .map(|t| oneline(&t))
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort_unstable();
    tokens.dedup();
    tokens
}

fn validate(job: RawJob) -> Option<RawJob> {
    if job.title.is_empty() {
        info!(id = %job.id, "discarding job: no title");
        return None;
    }
    if job.tags.is_empty() {
        info!(id = %job.id, "discarding job: no tags");
        return None;
    }
    if job.description.is_empty() {
        info!(id = %job.id, "discarding job: no description");
        return None;
    }
    Some(job)
}
