//! Company detail page → [`RawCompany`].

use scraper::{ElementRef, Html};
use tracing::info;

use jobharvest_shared::text::{english, multiline, oneline};
use jobharvest_shared::{RawCompany, SocialLink};

use crate::job::normalize_tokens;
use crate::locator::{
    FieldLocator, Locator, block_text, collapsed_text, labeled_sibling_element, locate_fields,
    next_element, section_with_heading, sel,
};

const RIGHT_COLUMN: &str = "#right-column";

/// Labeled facts in the company page's right column.
const COMPANY_ABOUT: &[FieldLocator] = &[
    FieldLocator {
        field: "website_name",
        locator: Locator::ParagraphLabeled {
            root: RIGHT_COLUMN,
            label: "Website",
        },
    },
    FieldLocator {
        field: "industry",
        locator: Locator::ParagraphLabeled {
            root: RIGHT_COLUMN,
            label: "Industry",
        },
    },
    FieldLocator {
        field: "size",
        locator: Locator::ParagraphLabeled {
            root: RIGHT_COLUMN,
            label: "Size",
        },
    },
    FieldLocator {
        field: "founded",
        locator: Locator::ParagraphLabeled {
            root: RIGHT_COLUMN,
            label: "Founded",
        },
    },
    FieldLocator {
        field: "status",
        locator: Locator::ParagraphLabeled {
            root: RIGHT_COLUMN,
            label: "Status",
        },
    },
];

/// Extract one company record from its detail page.
///
/// Returns `None` when required-field validation fails; the reason is
/// logged for this id and the run continues.
pub fn parse_company(html: &str, id: &str) -> Option<RawCompany> {
    let doc = Html::parse_document(html);

    let name = doc
        .select(&sel("#company-name-tagline h1"))
        .next()
        .map(collapsed_text)
        .unwrap_or_default();
    let tagline = doc
        .select(&sel("#company-name-tagline h1 + p"))
        .next()
        .map(collapsed_text)
        .unwrap_or_default();
    let logo = doc
        .select(&sel("img#gh-logo[src]"))
        .next()
        .and_then(|el| el.value().attr("src"))
        .map(|src| src.trim().to_string())
        .unwrap_or_default();

    let mut about: std::collections::BTreeMap<&str, String> =
        locate_fields(&doc, COMPANY_ABOUT).into_iter().collect();
    let mut about_field = |field: &str| about.remove(field).unwrap_or_default();

    let website = website_link(&doc).unwrap_or_default();
    let social = social_links(&doc);

    let tags = normalize_tokens(
        doc.select(&sel("#tech-stack-items a.post-tag"))
            .map(collapsed_text)
            .collect(),
    );

    let description = company_description(&doc);
    let benefits = company_benefits(&doc);

    let company = RawCompany {
        id: id.to_string(),
        name: oneline(&name),
        tagline: oneline(&tagline),
        path: format!("/jobs/companies/{id}"),
        logo,
        website_name: about_field("website_name"),
        website,
        industry: about_field("industry"),
        size: about_field("size"),
        founded: about_field("founded"),
        status: about_field("status"),
        tags,
        description,
        benefits,
        social,
    };

    validate(company)
}

/// The actual link inside the Website row, as opposed to its display text.
fn website_link(doc: &Html) -> Option<String> {
    let root = doc.select(&sel(RIGHT_COLUMN)).next()?;
    let value = labeled_sibling_element(root, "p", "Website")?;
    value
        .select(&sel("a[href]"))
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|href| href.trim().to_string())
}

/// Social profile anchors: any link in the Social row carrying an icon.
/// The provider is read off the icon's `icon<Name>` class.
fn social_links(doc: &Html) -> Vec<SocialLink> {
    let Some(root) = doc.select(&sel(RIGHT_COLUMN)).next() else {
        return Vec::new();
    };
    let Some(row) = root
        .select(&sel("p"))
        .find(|el| collapsed_text(*el).to_lowercase().contains("social"))
        .and_then(|el| el.parent().and_then(ElementRef::wrap))
    else {
        return Vec::new();
    };

    row.select(&sel("a[href]"))
        .filter_map(|anchor| {
            let icon = anchor.select(&sel("svg.svg-icon")).next()?;
            let uri = anchor.value().attr("href")?.trim().to_string();
            let provider = icon
                .value()
                .classes()
                .find_map(|class| class.strip_prefix("icon"))
                .filter(|name| !name.is_empty())
                .map(|name| name.to_lowercase());
            Some(SocialLink { uri, provider })
        })
        .collect()
}

/// Main description plus whatever prose follows the tech-stack tags.
fn company_description(doc: &Html) -> String {
    let main = doc
        .select(&sel("#about-items"))
        .next()
        .map(|el| english(&multiline(&block_text(el))))
        .unwrap_or_default();

    let rest = doc
        .select(&sel("#tech-stack-items"))
        .next()
        .and_then(|section| section.select(&sel("h2 + div")).next())
        .map(|tags_div| {
            let mut texts = Vec::new();
            let mut current = next_element(tags_div);
            while let Some(el) = current {
                texts.push(block_text(el));
                current = next_element(el);
            }
            english(&multiline(&texts.join("\n")))
        })
        .unwrap_or_default();

    match (main.is_empty(), rest.is_empty()) {
        (false, false) => format!("{main}\n\n{rest}"),
        (false, true) => main,
        (true, false) => rest,
        (true, true) => String::new(),
    }
}

/// Benefit entries: the text block next to each list item's icon.
fn company_benefits(doc: &Html) -> Vec<String> {
    let Some(section) = section_with_heading(doc, "Company Benefits") else {
        return Vec::new();
    };

    let mut benefits = Vec::new();
    for item in section.select(&sel("ol > li")) {
        let icon_div = item
            .select(&sel("div"))
            .find(|div| div.select(&sel("svg")).next().is_some());
        if let Some(text) = icon_div.and_then(next_element).map(collapsed_text) {
            if !text.is_empty() {
                benefits.push(text);
            }
        }
    }
    benefits
}

fn validate(company: RawCompany) -> Option<RawCompany> {
    if company.name.is_empty() {
        info!(id = %company.id, "discarding company: no name");
        return None;
    }
    if company.tags.is_empty() {
        info!(id = %company.id, "discarding company: no tags");
        return None;
    }
    if company.description.is_empty() {
        info!(id = %company.id, "discarding company: no description");
        return None;
    }
    Some(company)
}
