//! Synchronizes a Google Sheets spreadsheet of vacation-rental listings with
//! data scraped from the listing provider and a weather provider.
//!
//! The spreadsheet is the only persistent state: each run rebuilds its view
//! of the sheet, merges freshly scraped values into existing rows (refresh
//! mode) or fills newly discovered listings into empty rows (add mode), and
//! writes back in batches.

pub mod cell_encoding;
pub mod config;
pub mod listing;
pub mod providers;
pub mod scrape;
pub mod sheet;
pub mod sync;

pub use config::Config;
pub use listing::{ListingRef, StayParams};
pub use providers::google_sheets::GoogleSheetProvider;
pub use providers::SpreadsheetProvider;
pub use scrape::{ScrapeClient, SearchQuery};
pub use sync::Reconciler;
