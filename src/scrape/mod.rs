use clap::ValueEnum;
use thiserror::Error;
use tracing::info;

use crate::listing::{ListingRef, ListingUrlError, StayParams};

mod airbnb;
mod weather;

pub use airbnb::ScrapeClient;
pub use weather::WeatherClient;

/// Column order of rows produced by the fetcher. The spreadsheet's header
/// row is expected to match; the reconciler only interprets `Link`.
pub const OUTPUT_COLUMNS: [&str; 11] = [
    "Name",
    "Link",
    "Location",
    "Bedrooms",
    "Bathrooms",
    "Max guests",
    "Rating",
    "Reviews",
    "Price per night",
    "Avg high (°F)",
    "Avg low (°F)",
];

/// Searchable amenity filters and their provider codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Amenity {
    Pool,
    Hottub,
}

impl Amenity {
    pub const fn code(self) -> u32 {
        match self {
            Self::Pool => 7,
            Self::Hottub => 25,
        }
    }
}

/// A location search request.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub location: String,
    pub stay: StayParams,
    pub min_bedrooms: u32,
    pub amenities: Vec<u32>,
    pub price_max: Option<u32>,
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response shape: {0}")]
    Shape(&'static str),

    #[error(transparent)]
    ListingUrl(#[from] ListingUrlError),
}

/// Fetches one spreadsheet row of scraped values for a listing. Must accept
/// an identifier or a full listing URL interchangeably.
#[allow(async_fn_in_trait)]
pub trait ListingFetcher {
    async fn fetch_row(
        &self,
        listing: &ListingRef,
        stay: &StayParams,
    ) -> Result<Vec<String>, ScrapeError>;
}

/// One page of a location search: listing identifiers at `offset`. A page
/// shorter than `page_size` signals exhaustion.
#[allow(async_fn_in_trait)]
pub trait ListingSearch {
    async fn search_page(
        &self,
        query: &SearchQuery,
        offset: u32,
        page_size: u32,
    ) -> Result<Vec<String>, ScrapeError>;
}

/// Accumulates listing identifiers from the paged search endpoint until
/// `max_results` is reached or a short page signals exhaustion. The offset
/// advances by the number of identifiers accumulated so far; excess results
/// from the final page are truncated.
pub async fn search_listing_ids<S: ListingSearch>(
    search: &S,
    query: &SearchQuery,
    max_results: usize,
    page_size: u32,
) -> Result<Vec<String>, ScrapeError> {
    let mut ids: Vec<String> = Vec::new();
    while ids.len() < max_results {
        let page = search
            .search_page(query, ids.len() as u32, page_size)
            .await?;
        let exhausted = (page.len() as u32) < page_size;
        info!(
            found = page.len(),
            offset = ids.len(),
            "search page fetched"
        );
        ids.extend(page);
        if exhausted {
            break;
        }
    }
    ids.truncate(max_results);
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct PagedStub {
        pages: RefCell<Vec<Vec<String>>>,
        offsets: RefCell<Vec<u32>>,
    }

    impl PagedStub {
        fn new(pages: Vec<Vec<String>>) -> Self {
            PagedStub {
                pages: RefCell::new(pages),
                offsets: RefCell::new(Vec::new()),
            }
        }
    }

    impl ListingSearch for PagedStub {
        async fn search_page(
            &self,
            _query: &SearchQuery,
            offset: u32,
            _page_size: u32,
        ) -> Result<Vec<String>, ScrapeError> {
            self.offsets.borrow_mut().push(offset);
            let mut pages = self.pages.borrow_mut();
            if pages.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(pages.remove(0))
            }
        }
    }

    fn ids(range: std::ops::Range<u32>) -> Vec<String> {
        range.map(|i| i.to_string()).collect()
    }

    fn query() -> SearchQuery {
        SearchQuery {
            location: "Lake Tahoe".to_owned(),
            stay: StayParams {
                check_in: "2026-09-01".to_owned(),
                check_out: "2026-09-05".to_owned(),
                guests: 4,
            },
            min_bedrooms: 1,
            amenities: vec![],
            price_max: None,
        }
    }

    #[tokio::test]
    async fn accumulates_until_a_short_page() {
        // Two full pages of 50, then a short page of 10.
        let stub = PagedStub::new(vec![ids(0..50), ids(50..100), ids(100..110)]);
        let found = search_listing_ids(&stub, &query(), 200, 50).await.unwrap();

        assert_eq!(found.len(), 110);
        assert_eq!(*stub.offsets.borrow(), [0, 50, 100]);
    }

    #[tokio::test]
    async fn stops_at_max_results_and_truncates() {
        let stub = PagedStub::new(vec![ids(0..50), ids(50..100), ids(100..150)]);
        let found = search_listing_ids(&stub, &query(), 120, 50).await.unwrap();

        assert_eq!(found.len(), 120);
        assert_eq!(found.last().unwrap(), "119");
        assert_eq!(*stub.offsets.borrow(), [0, 50, 100]);
    }

    #[tokio::test]
    async fn empty_first_page_yields_nothing() {
        let stub = PagedStub::new(vec![]);
        let found = search_listing_ids(&stub, &query(), 200, 50).await.unwrap();
        assert!(found.is_empty());
        assert_eq!(*stub.offsets.borrow(), [0]);
    }

    #[test]
    fn amenity_codes_match_the_provider() {
        assert_eq!(Amenity::Pool.code(), 7);
        assert_eq!(Amenity::Hottub.code(), 25);
    }
}
