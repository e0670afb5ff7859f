use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Provider-imposed maximum for search page sizes.
const DEFAULT_SEARCH_PAGE_SIZE: u32 = 50;
const DEFAULT_WRITE_CAPACITY: usize = 5;
const DEFAULT_VIEW_PAGE_SIZE: u32 = 20;
const DEFAULT_EMPTY_RUN_THRESHOLD: u32 = 10;

/// Runtime configuration, loaded from the environment.
///
/// `dotenv` is loaded by the binary before this runs, so a local `.env`
/// file works too.
#[derive(Debug, Clone)]
pub struct Config {
    /// Spreadsheet document id.
    pub document_id: String,
    /// Path to the service-account key JSON.
    pub service_account_json: PathBuf,
    /// Search page size, capped by the provider.
    pub search_page_size: u32,
    /// Write buffer capacity (rows per batched write).
    pub write_capacity: usize,
    /// Rows fetched per sheet read.
    pub view_page_size: u32,
    /// Consecutive empty rows treated as the end of the used region.
    pub empty_run_threshold: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            document_id: require("GOOGLE_SHEET_ID")?,
            service_account_json: require("SERVICE_ACCOUNT_JSON")?.into(),
            search_page_size: parse_or(
                "STAYSHEET_SEARCH_PAGE_SIZE",
                DEFAULT_SEARCH_PAGE_SIZE,
            )?,
            write_capacity: parse_or("STAYSHEET_WRITE_CAPACITY", DEFAULT_WRITE_CAPACITY)?,
            view_page_size: parse_or("STAYSHEET_VIEW_PAGE_SIZE", DEFAULT_VIEW_PAGE_SIZE)?,
            empty_run_threshold: parse_or(
                "STAYSHEET_EMPTY_RUN_THRESHOLD",
                DEFAULT_EMPTY_RUN_THRESHOLD,
            )?,
        })
    }
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    env::var(var).map_err(|_| ConfigError::MissingVar(var))
}

fn parse_or<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidVar { var, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Config with defaults and placeholder credentials, for tests that
    /// never touch the real provider.
    pub fn for_tests() -> Self {
        Config {
            document_id: "test-document".to_owned(),
            service_account_json: PathBuf::from("service-account.json"),
            search_page_size: DEFAULT_SEARCH_PAGE_SIZE,
            write_capacity: DEFAULT_WRITE_CAPACITY,
            view_page_size: DEFAULT_VIEW_PAGE_SIZE,
            empty_run_threshold: DEFAULT_EMPTY_RUN_THRESHOLD,
        }
    }
}
