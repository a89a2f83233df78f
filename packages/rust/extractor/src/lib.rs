//! HTML → raw record extraction.
//!
//! This crate turns fetched pages into structured records:
//! - [`parse_job_listing`] / [`parse_company_listing`] — listing pages → id lists
//! - [`parse_job`] — job detail page → [`jobharvest_shared::RawJob`]
//! - [`parse_company`] — company detail page → [`jobharvest_shared::RawCompany`]
//!
//! Extraction is label-driven (see [`locator`]): fields are found by heading
//! and label text rather than positional offsets, and fail closed to empty
//! values. Required-field validation then discards whole records that are
//! unusable, logging the reason per record id.

pub mod locator;

mod company;
mod job;
mod listing;

pub use company::parse_company;
pub use job::parse_job;
pub use listing::{parse_company_listing, parse_job_listing};
