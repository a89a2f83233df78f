//! Domain types for the scrape → link → convert pipeline.
//!
//! Raw records mirror what the job board pages expose; linked records carry
//! the resolved company projection; board records are the destination shape
//! consumed downstream. Serialized key order is the declaration order here,
//! so persisted blobs are byte-stable across runs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record that knows its own blob id.
pub trait Identified {
    /// The id used as the blob file name within a collection.
    fn id(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Raw records (as extracted from HTML)
// ---------------------------------------------------------------------------

/// The company reference found on a job's detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRef {
    /// Company id, the last segment of `path`.
    pub id: String,
    /// Source-site reference path (`/jobs/companies/<id>`).
    pub path: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub logo: String,
}

/// A job posting as extracted from its detail page, before linking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawJob {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub location: String,
    /// Relative date text as shown on the page ("7d ago"). Resolved to a
    /// timestamp only at conversion time.
    #[serde(default)]
    pub ago: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub company_size: String,
    #[serde(default)]
    pub company_type: String,
    pub tags: Vec<String>,
    pub description: String,
    pub company: CompanyRef,
}

impl Identified for RawJob {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A social profile link on a company page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// A company as extracted from its detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCompany {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    /// Source-site reference path (`/jobs/companies/<id>`).
    pub path: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub website_name: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub founded: String,
    #[serde(default)]
    pub status: String,
    pub tags: Vec<String>,
    pub description: String,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub social: Vec<SocialLink>,
}

impl Identified for RawCompany {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A job whose company could not be resolved at link time. Kept verbatim so
/// a later adoption pass can retry the link.
pub type OrphanJob = RawJob;

// ---------------------------------------------------------------------------
// Linked records (company resolved)
// ---------------------------------------------------------------------------

/// Minimal company projection installed on a linked job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCard {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub website: String,
}

impl CompanyCard {
    pub fn from_company(company: &RawCompany) -> Self {
        Self {
            id: company.id.clone(),
            name: company.name.clone(),
            path: company.path.clone(),
            logo: company.logo.clone(),
            website: company.website.clone(),
        }
    }
}

/// The short form of a job recorded on its owning company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub ago: String,
}

impl JobSummary {
    pub fn from_job(job: &RawJob) -> Self {
        Self {
            id: job.id.clone(),
            title: job.title.clone(),
            location: job.location.clone(),
            ago: job.ago.clone(),
        }
    }
}

/// A job with its owning company resolved to a [`CompanyCard`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedJob {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub ago: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub company_size: String,
    #[serde(default)]
    pub company_type: String,
    pub tags: Vec<String>,
    pub description: String,
    pub company: CompanyCard,
}

impl LinkedJob {
    /// Replace the raw company reference with the resolved projection.
    pub fn from_raw(job: RawJob, card: CompanyCard) -> Self {
        Self {
            id: job.id,
            title: job.title,
            location: job.location,
            ago: job.ago,
            job_type: job.job_type,
            role: job.role,
            experience: job.experience,
            industry: job.industry,
            company_size: job.company_size,
            company_type: job.company_type,
            tags: job.tags,
            description: job.description,
            company: card,
        }
    }
}

impl Identified for LinkedJob {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A company with the backreferences of the jobs linked to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedCompany {
    #[serde(flatten)]
    pub company: RawCompany,
    /// Jobs owned by this company, keyed by job id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub offers: BTreeMap<String, JobSummary>,
}

impl LinkedCompany {
    pub fn new(company: RawCompany) -> Self {
        Self {
            company,
            offers: BTreeMap::new(),
        }
    }
}

impl Identified for LinkedCompany {
    fn id(&self) -> &str {
        &self.company.id
    }
}

// ---------------------------------------------------------------------------
// Board records (destination shape)
// ---------------------------------------------------------------------------

/// Contact block on a converted offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contacts {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub phone: String,
}

/// A job offer in the destination schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub title: String,
    pub publish_date: DateTime<Utc>,
    pub publish_end_date: DateTime<Utc>,
    pub job_min_duration: u32,
    pub job_max_duration: u32,
    pub description: String,
    pub contacts: Contacts,
    pub is_paid: bool,
    pub vacancies: u32,
    pub job_type: String,
    pub fields: Vec<String>,
    pub technologies: Vec<String>,
    pub is_hidden: bool,
    #[serde(default)]
    pub location: String,
    pub company: String,
    #[serde(default)]
    pub company_name: String,
}

impl Identified for Offer {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A company in the destination schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCompany {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub contacts: Vec<String>,
}

impl Identified for BoardCompany {
    fn id(&self) -> &str {
        &self.id
    }
}
