//! Shared types, error model, and configuration for jobharvest.
//!
//! This crate is the foundation depended on by all other jobharvest crates.
//! It provides:
//! - [`JobharvestError`] — the unified error type
//! - Domain types ([`RawJob`], [`RawCompany`], [`LinkedJob`], [`Offer`], ...)
//! - Configuration ([`AppConfig`], [`SchemaBounds`], config loading)
//! - Text cleanup helpers shared by the extractor and converter

pub mod config;
pub mod error;
pub mod text;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FetchConfig, OutputConfig, SchemaBounds, config_dir, config_file_path,
    init_config, load_config, load_config_from, parse_pages,
};
pub use error::{JobharvestError, Result};
pub use types::{
    BoardCompany, CompanyCard, CompanyRef, Contacts, Identified, JobSummary, LinkedCompany,
    LinkedJob, Offer, OrphanJob, RawCompany, RawJob, SocialLink,
};
