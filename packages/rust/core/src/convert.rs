//! Linked records → destination schema shape.

use tracing::info;

use jobharvest_shared::text::identifier;
use jobharvest_shared::{BoardCompany, Contacts, LinkedCompany, LinkedJob, Offer};

use crate::classify::Taxonomies;
use crate::synth;

/// Job types accepted by the destination schema. The source's free-text
/// job type does not map onto these, so one is drawn at random.
pub const JOB_TYPES: &[&str] = &[
    "FULL_TIME",
    "PART_TIME",
    "SUMMER_INTERNSHIP",
    "CURRICULAR_INTERNSHIP",
    "OTHER",
];

/// The field assigned when nothing better can be guessed.
pub const DEFAULT_FIELD: &str = "OTHER";

/// Convert one linked job into a destination offer.
///
/// Returns `None` when the conversion yields an unusable offer (no title,
/// description or technologies); the drop is logged for this id.
pub fn convert_offer(job: &LinkedJob, taxonomies: &Taxonomies) -> Option<Offer> {
    // Tags were classified before linking; unresolvable ones are gone.
    let technologies = job.tags.clone();
    let fields = resolve_fields(job, taxonomies);

    if job.title.is_empty() || job.description.is_empty() {
        info!(id = %job.id, "dropping offer: no title or description");
        return None;
    }
    if technologies.is_empty() {
        info!(id = %job.id, "dropping offer: no technologies survived classification");
        return None;
    }

    let company = identifier(&job.company.id);
    let publish_date = synth::from_ago_text(&job.ago);
    let publish_end_date = synth::few_weeks_after(publish_date);
    let (job_min_duration, job_max_duration) = synth::random_job_duration();

    Some(Offer {
        id: job.id.clone(),
        title: job.title.clone(),
        publish_date,
        publish_end_date,
        job_min_duration,
        job_max_duration,
        description: job.description.clone(),
        contacts: Contacts {
            name: company.clone(),
            address: job.location.clone(),
            website: format!("https://{company}.com"),
            phone: synth::random_phone_number(),
        },
        is_paid: synth::random_bool(0.96),
        vacancies: synth::random_vacancies(),
        job_type: synth::random_of(JOB_TYPES).to_string(),
        fields,
        technologies,
        is_hidden: synth::random_bool(0.03),
        location: job.location.clone(),
        company,
        company_name: job.company.name.clone(),
    })
}

/// The role label, when it classified; otherwise a keyword guess over the
/// offer's text, falling back to [`DEFAULT_FIELD`].
fn resolve_fields(job: &LinkedJob, taxonomies: &Taxonomies) -> Vec<String> {
    if !job.role.is_empty() {
        return vec![job.role.clone()];
    }

    let tags = job.tags.join(" ");
    let guess = taxonomies
        .field_guesses
        .guess(&[&job.title, &job.role, &tags, &job.description]);
    vec![guess.unwrap_or(DEFAULT_FIELD).to_string()]
}

/// Convert one linked company into the board shape.
pub fn convert_company(company: &LinkedCompany) -> BoardCompany {
    let raw = &company.company;

    let bio = match (raw.tagline.is_empty(), raw.description.is_empty()) {
        (false, false) => format!("{}\n\n{}", raw.tagline, raw.description),
        (false, true) => raw.tagline.clone(),
        (true, _) => raw.description.clone(),
    };

    let mut contacts = Vec::new();
    if !raw.website.is_empty() {
        contacts.push(raw.website.clone());
    }

    BoardCompany {
        id: raw.id.clone(),
        name: raw.name.clone(),
        bio,
        logo: raw.logo.clone(),
        website: raw.website.clone(),
        contacts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::test_support;
    use jobharvest_shared::{CompanyCard, RawCompany};

    fn linked_job(id: &str, tags: &[&str], role: &str) -> LinkedJob {
        LinkedJob {
            id: id.into(),
            title: "Senior Backend Engineer".into(),
            location: "Porto, Portugal".into(),
            ago: "7d ago".into(),
            job_type: "Full-time".into(),
            role: role.into(),
            experience: "Senior".into(),
            industry: String::new(),
            company_size: String::new(),
            company_type: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            description: "Build and ship backend services.".into(),
            company: CompanyCard {
                id: "acme".into(),
                name: "Acme Corp".into(),
                path: "/jobs/companies/acme".into(),
                logo: String::new(),
                website: "https://acme.test".into(),
            },
        }
    }

    #[test]
    fn offer_carries_classified_technologies_and_role_field() {
        let taxonomies = test_support::taxonomies();

        let job = linked_job("1", &["Rust", "PostgreSQL"], "BACKEND_DEVELOPER");
        let offer = convert_offer(&job, &taxonomies).expect("offer");

        assert_eq!(offer.technologies, vec!["Rust", "PostgreSQL"]);
        assert_eq!(offer.fields, vec!["BACKEND_DEVELOPER"]);
        assert_eq!(offer.company, "acme");
        assert_eq!(offer.company_name, "Acme Corp");
        assert_eq!(offer.contacts.website, "https://acme.com");
        assert!(JOB_TYPES.contains(&offer.job_type.as_str()));
        assert!(offer.publish_end_date > offer.publish_date);
        assert!(offer.job_max_duration > offer.job_min_duration);
    }

    #[test]
    fn missing_role_falls_back_to_keyword_guess() {
        let taxonomies = test_support::taxonomies();

        let job = linked_job("1", &["Rust"], "");
        let offer = convert_offer(&job, &taxonomies).expect("offer");
        // "backend" appears in the title.
        assert_eq!(offer.fields, vec!["BACKEND_DEVELOPER"]);
    }

    #[test]
    fn nothing_to_guess_defaults_to_other() {
        let taxonomies = test_support::taxonomies();

        let mut job = linked_job("1", &["Rust"], "");
        job.title = "Wizard of nothing in particular".into();
        job.description = "A mystery position.".into();
        let offer = convert_offer(&job, &taxonomies).expect("offer");
        assert_eq!(offer.fields, vec![DEFAULT_FIELD]);
    }

    #[test]
    fn offer_without_technologies_is_dropped() {
        let taxonomies = test_support::taxonomies();

        let job = linked_job("1", &[], "BACKEND_DEVELOPER");
        assert!(convert_offer(&job, &taxonomies).is_none());
    }

    #[test]
    fn company_bio_joins_tagline_and_description() {
        let mut linked = LinkedCompany::new(RawCompany {
            id: "acme".into(),
            name: "Acme Corp".into(),
            tagline: "We make anvils".into(),
            path: "/jobs/companies/acme".into(),
            logo: "logo.png".into(),
            website_name: String::new(),
            website: "https://acme.test".into(),
            industry: String::new(),
            size: String::new(),
            founded: String::new(),
            status: String::new(),
            tags: vec!["Rust".into()],
            description: "Anvils since 1990.".into(),
            benefits: vec![],
            social: vec![],
        });
        linked.offers.clear();

        let board = convert_company(&linked);
        assert_eq!(board.bio, "We make anvils\n\nAnvils since 1990.");
        assert_eq!(board.contacts, vec!["https://acme.test"]);
    }
}
