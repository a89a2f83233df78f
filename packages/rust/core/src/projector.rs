//! Conformance projection: make converted records satisfy the destination
//! schema's length and array-size bounds.
//!
//! Over-long text truncates at the latest sentence/paragraph boundary that
//! fits. Short lists pad from a fixed default pool; long lists trim by
//! corpus-wide popularity — frequency over the whole batch, not a
//! per-record decision. Every adjustment bumps an aggregate counter that
//! is reported once at the end of the run.

use std::collections::{BTreeMap, HashMap};

use tracing::{info, warn};

use jobharvest_shared::text::{char_len, truncate_text};
use jobharvest_shared::{BoardCompany, Offer, SchemaBounds};

/// Appended to company names that fall short of the minimum length.
const NAME_SUFFIX: &str = " Company";

/// Aggregate adjustment counters for one projection pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TweakCounters {
    pub offer_titles_trimmed: u64,
    pub offer_descriptions_trimmed: u64,
    pub offer_technologies_padded: u64,
    pub offer_technologies_trimmed: u64,
    pub offer_fields_padded: u64,
    pub offer_fields_trimmed: u64,
    pub company_names_extended: u64,
    pub company_names_trimmed: u64,
    pub company_bios_trimmed: u64,
}

impl TweakCounters {
    /// Log the whole pass once; zero counters stay silent.
    pub fn report(&self) {
        let log = |count: u64, padded: bool, message: &str| {
            if count == 0 {
                return;
            }
            if padded {
                warn!(count, "{message}");
            } else {
                info!(count, "{message}");
            }
        };
        log(self.offer_titles_trimmed, false, "trimmed offer titles");
        log(self.offer_descriptions_trimmed, false, "trimmed offer descriptions");
        log(self.offer_technologies_padded, true, "added common tech to offers");
        log(self.offer_technologies_trimmed, false, "spliced offer tech lists");
        log(self.offer_fields_padded, true, "added common fields to offers");
        log(self.offer_fields_trimmed, false, "spliced offer field lists");
        log(self.company_names_extended, true, "extended company names");
        log(self.company_names_trimmed, false, "trimmed company names");
        log(self.company_bios_trimmed, false, "trimmed company bios");
    }
}

/// Corpus-wide value frequencies, computed once per batch.
struct Popularity {
    technologies: HashMap<String, u64>,
    fields: HashMap<String, u64>,
}

impl Popularity {
    fn of(offers: &BTreeMap<String, Offer>) -> Self {
        let mut technologies: HashMap<String, u64> = HashMap::new();
        let mut fields: HashMap<String, u64> = HashMap::new();
        for offer in offers.values() {
            for tech in &offer.technologies {
                *technologies.entry(tech.clone()).or_insert(0) += 1;
            }
            for field in &offer.fields {
                *fields.entry(field.clone()).or_insert(0) += 1;
            }
        }
        Self {
            technologies,
            fields,
        }
    }
}

/// Enforce the destination bounds on a converted batch.
pub fn project(
    offers: &mut BTreeMap<String, Offer>,
    companies: &mut BTreeMap<String, BoardCompany>,
    bounds: &SchemaBounds,
) -> TweakCounters {
    let popularity = Popularity::of(offers);
    let mut counters = TweakCounters::default();

    info!(offers = offers.len(), "projecting offers");
    for offer in offers.values_mut() {
        project_offer(offer, bounds, &popularity, &mut counters);
    }

    info!(companies = companies.len(), "projecting companies");
    for company in companies.values_mut() {
        project_company(company, bounds, &mut counters);
    }

    counters
}

fn project_offer(
    offer: &mut Offer,
    bounds: &SchemaBounds,
    popularity: &Popularity,
    counters: &mut TweakCounters,
) {
    if char_len(&offer.title) > bounds.offer_title_max {
        counters.offer_titles_trimmed += 1;
        offer.title = truncate_text(&offer.title, bounds.offer_title_max);
    }
    if char_len(&offer.description) > bounds.offer_description_max {
        counters.offer_descriptions_trimmed += 1;
        offer.description = truncate_text(&offer.description, bounds.offer_description_max);
    }

    if offer.technologies.len() < bounds.min_technologies {
        counters.offer_technologies_padded += 1;
        pad_from_pool(
            &mut offer.technologies,
            &bounds.default_technologies,
            bounds.min_technologies,
        );
    }
    if offer.technologies.len() > bounds.max_technologies {
        counters.offer_technologies_trimmed += 1;
        trim_by_popularity(
            &mut offer.technologies,
            &popularity.technologies,
            bounds.max_technologies,
        );
    }

    if offer.fields.len() < bounds.min_fields {
        counters.offer_fields_padded += 1;
        pad_from_pool(&mut offer.fields, &bounds.default_fields, bounds.min_fields);
    }
    if offer.fields.len() > bounds.max_fields {
        counters.offer_fields_trimmed += 1;
        trim_by_popularity(&mut offer.fields, &popularity.fields, bounds.max_fields);
    }
}

fn project_company(company: &mut BoardCompany, bounds: &SchemaBounds, counters: &mut TweakCounters) {
    if char_len(&company.name) < bounds.company_name_min {
        counters.company_names_extended += 1;
        // Extend only when the fixed suffix actually satisfies the minimum;
        // otherwise the name stays short rather than inventing one.
        if char_len(&company.name) + char_len(NAME_SUFFIX) >= bounds.company_name_min {
            company.name.push_str(NAME_SUFFIX);
        }
    }
    if char_len(&company.name) > bounds.company_name_max {
        counters.company_names_trimmed += 1;
        company.name = truncate_text(&company.name, bounds.company_name_max);
    }
    if char_len(&company.bio) > bounds.company_bio_max {
        counters.company_bios_trimmed += 1;
        company.bio = truncate_text(&company.bio, bounds.company_bio_max);
    }
}

/// Top up `values` to `min` distinct entries drawn from `pool`,
/// skipping values already present, without repetition.
fn pad_from_pool(values: &mut Vec<String>, pool: &[String], min: usize) {
    let mut candidates: Vec<&String> = pool.iter().filter(|v| !values.contains(v)).collect();
    fastrand::shuffle(&mut candidates);
    for candidate in candidates {
        if values.len() >= min {
            break;
        }
        values.push(candidate.clone());
    }
}

/// Keep the `max` most frequent values in the batch, dropping the rest.
/// The sort is stable, so equally popular values keep their order.
fn trim_by_popularity(values: &mut Vec<String>, counts: &HashMap<String, u64>, max: usize) {
    values.sort_by(|a, b| {
        let ca = counts.get(a).copied().unwrap_or(0);
        let cb = counts.get(b).copied().unwrap_or(0);
        cb.cmp(&ca)
    });
    values.truncate(max);
}
