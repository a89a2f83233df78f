//! Application configuration for jobharvest.
//!
//! User config lives at `~/.jobharvest/jobharvest.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{JobharvestError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "jobharvest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".jobharvest";

// ---------------------------------------------------------------------------
// Config structs (matching jobharvest.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Fetching behavior.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Output locations.
    #[serde(default)]
    pub output: OutputConfig,

    /// Destination schema bounds enforced by the projector.
    #[serde(default)]
    pub bounds: SchemaBounds,
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Base URL of the job board.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Concurrent in-flight listing-page requests.
    #[serde(default = "default_listing_concurrency")]
    pub listing_concurrency: usize,

    /// Concurrent in-flight detail-page requests.
    #[serde(default = "default_detail_concurrency")]
    pub detail_concurrency: usize,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries per request on timeout/connection errors.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Listing pages to fetch, e.g. `"1-40"` or `"1,2,7-9"`.
    #[serde(default = "default_pages")]
    pub pages: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            listing_concurrency: default_listing_concurrency(),
            detail_concurrency: default_detail_concurrency(),
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
            pages: default_pages(),
        }
    }
}

fn default_base_url() -> String {
    "https://stackoverflow.com".into()
}
fn default_listing_concurrency() -> usize {
    25
}
fn default_detail_concurrency() -> usize {
    100
}
fn default_timeout_ms() -> u64 {
    20_000
}
fn default_retries() -> u32 {
    3
}
fn default_pages() -> String {
    "1-40".into()
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for all blob collections and merged artifacts.
    #[serde(default = "default_output_root")]
    pub root: String,

    /// Directory holding the plain-text taxonomy mapping tables.
    #[serde(default = "default_taxonomy_dir")]
    pub taxonomy_dir: String,

    /// Hand-off directory the merged artifacts are copied to on accept.
    #[serde(default = "default_deploy_dir")]
    pub deploy_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_output_root(),
            taxonomy_dir: default_taxonomy_dir(),
            deploy_dir: default_deploy_dir(),
        }
    }
}

fn default_output_root() -> String {
    "output".into()
}
fn default_taxonomy_dir() -> String {
    "taxonomies".into()
}
fn default_deploy_dir() -> String {
    "data".into()
}

/// `[bounds]` section — length and array-size limits of the destination
/// schema. Supplied by the downstream board, consumed here verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaBounds {
    #[serde(default = "default_offer_title_max")]
    pub offer_title_max: usize,
    #[serde(default = "default_offer_description_max")]
    pub offer_description_max: usize,
    #[serde(default = "default_company_name_min")]
    pub company_name_min: usize,
    #[serde(default = "default_company_name_max")]
    pub company_name_max: usize,
    #[serde(default = "default_company_bio_max")]
    pub company_bio_max: usize,
    #[serde(default = "default_min_technologies")]
    pub min_technologies: usize,
    #[serde(default = "default_max_technologies")]
    pub max_technologies: usize,
    #[serde(default = "default_min_fields")]
    pub min_fields: usize,
    #[serde(default = "default_max_fields")]
    pub max_fields: usize,

    /// Pool drawn from when an offer has fewer technologies than the minimum.
    #[serde(default = "default_technology_pool")]
    pub default_technologies: Vec<String>,

    /// Pool drawn from when an offer has fewer fields than the minimum.
    #[serde(default = "default_field_pool")]
    pub default_fields: Vec<String>,
}

impl Default for SchemaBounds {
    fn default() -> Self {
        Self {
            offer_title_max: default_offer_title_max(),
            offer_description_max: default_offer_description_max(),
            company_name_min: default_company_name_min(),
            company_name_max: default_company_name_max(),
            company_bio_max: default_company_bio_max(),
            min_technologies: default_min_technologies(),
            max_technologies: default_max_technologies(),
            min_fields: default_min_fields(),
            max_fields: default_max_fields(),
            default_technologies: default_technology_pool(),
            default_fields: default_field_pool(),
        }
    }
}

fn default_offer_title_max() -> usize {
    90
}
fn default_offer_description_max() -> usize {
    1500
}
fn default_company_name_min() -> usize {
    2
}
fn default_company_name_max() -> usize {
    50
}
fn default_company_bio_max() -> usize {
    1500
}
fn default_min_technologies() -> usize {
    1
}
fn default_max_technologies() -> usize {
    7
}
fn default_min_fields() -> usize {
    1
}
fn default_max_fields() -> usize {
    5
}
fn default_technology_pool() -> Vec<String> {
    ["AWS", "Docker", "Linux", "Windows", "macOS"]
        .map(String::from)
        .to_vec()
}
fn default_field_pool() -> Vec<String> {
    ["OTHER", "QUALITY_ASSURANCE", "DEVOPS"]
        .map(String::from)
        .to_vec()
}

// ---------------------------------------------------------------------------
// Page range parsing
// ---------------------------------------------------------------------------

/// Parse a listing page specification like `"40"`, `"1-40"` or `"1,3,7-9"`
/// into an ordered, deduplicated page list.
///
/// The upstream silently answers page 1 for nonsense page numbers, so a
/// malformed spec is a fatal config error rather than a best-effort guess.
pub fn parse_pages(spec: &str) -> Result<Vec<u32>> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Ok(Vec::new());
    }

    let mut pages = Vec::new();
    for part in spec.split([',', ';']) {
        let part = part.trim();
        match part.split_once('-') {
            Some((lo, hi)) => {
                let lo: u32 = parse_page_number(lo)?;
                let hi: u32 = parse_page_number(hi)?;
                if lo > hi {
                    return Err(JobharvestError::config(format!(
                        "page range '{part}' is reversed"
                    )));
                }
                pages.extend(lo..=hi);
            }
            None => pages.push(parse_page_number(part)?),
        }
    }

    pages.sort_unstable();
    pages.dedup();
    Ok(pages)
}

fn parse_page_number(text: &str) -> Result<u32> {
    let n: u32 = text
        .trim()
        .parse()
        .map_err(|_| JobharvestError::config(format!("invalid page number '{text}'")))?;
    if n == 0 {
        return Err(JobharvestError::config("page numbers start at 1"));
    }
    Ok(n)
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.jobharvest/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| JobharvestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.jobharvest/jobharvest.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| JobharvestError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        JobharvestError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    // Surface a bad pages spec at load time, not mid-run.
    parse_pages(&config.fetch.pages)?;

    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| JobharvestError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| JobharvestError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| JobharvestError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("offer_title_max"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.fetch.listing_concurrency, 25);
        assert_eq!(parsed.fetch.detail_concurrency, 100);
        assert_eq!(parsed.bounds.max_technologies, 7);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[fetch]
pages = "1-3"

[bounds]
max_fields = 4
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.fetch.pages, "1-3");
        assert_eq!(config.fetch.timeout_ms, 20_000);
        assert_eq!(config.bounds.max_fields, 4);
        assert_eq!(config.bounds.min_fields, 1);
    }

    #[test]
    fn parse_pages_single_and_ranges() {
        assert_eq!(parse_pages("40").unwrap(), vec![40]);
        assert_eq!(parse_pages("1-4").unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(parse_pages("1,3,7-9").unwrap(), vec![1, 3, 7, 8, 9]);
        assert_eq!(parse_pages("2;4").unwrap(), vec![2, 4]);
        assert_eq!(parse_pages("").unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn parse_pages_dedups_and_sorts() {
        assert_eq!(parse_pages("3,1-4,2").unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn parse_pages_rejects_garbage() {
        assert!(parse_pages("abc").is_err());
        assert!(parse_pages("1-x").is_err());
        assert!(parse_pages("5-2").is_err());
        assert!(parse_pages("0").is_err());
    }
}
