//! Pipeline stages: classification, linking, adoption, conversion,
//! projection, and the orchestration that sequences them.

pub mod adopter;
pub mod classify;
pub mod convert;
pub mod linker;
pub mod pipeline;
pub mod projector;
pub mod synth;

pub use adopter::{adopt, adopt_all};
pub use classify::{RunTrackers, Taxonomies, classify_companies, classify_jobs};
pub use convert::{convert_company, convert_offer};
pub use linker::{Partition, link};
pub use pipeline::{
    ConvertSummary, ScrapeSummary, run_accept, run_adopt, run_all, run_convert, run_link,
    run_scrape, stats_dir,
};
pub use projector::{TweakCounters, project};
