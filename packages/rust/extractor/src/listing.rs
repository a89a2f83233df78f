//! Listing pages → record id lists.

use scraper::Html;

use jobharvest_shared::text::endofpath;

use crate::locator::sel;

/// Ids of the jobs on one listing page, in page order. One page's worth,
/// not restartable.
pub fn parse_job_listing(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    doc.select(&sel("div.-job[data-jobid]"))
        .filter_map(|el| el.value().attr("data-jobid"))
        .map(str::to_string)
        .collect()
}

/// Ids of the companies on one listing page, in page order.
pub fn parse_company_listing(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    doc.select(&sel("div.company-list > div.-company"))
        .filter_map(|row| {
            row.select(&sel("h2 > a[href]"))
                .next()
                .and_then(|a| a.value().attr("href"))
        })
        .map(|href| endofpath(href).to_string())
        .filter(|id| !id.is_empty())
        .collect()
}
