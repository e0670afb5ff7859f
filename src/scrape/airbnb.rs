use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::listing::{ListingRef, StayParams};
use crate::scrape::weather::WeatherClient;
use crate::scrape::{ListingFetcher, ListingSearch, ScrapeError, SearchQuery};

const USER_AGENT: &str = "PostmanRuntime/7.26.8";
const SEARCH_URL: &str = "https://www.airbnb.com/api/v3/ExploreSearch";
const LISTING_URL: &str = "https://api.airbnb.com/v2/listings";
const LISTINGS_SECTION: &str = "DoraExploreV3ListingsSection";

/// Persisted-query hash pinned to the ExploreSearch operation revision this
/// client speaks.
const SEARCH_QUERY_HASH: &str =
    "2934608b8b7600024baa490b2221e3d94e8e00ccf905ea7d2d89882d0a1b09e9";

/// Scrapes the listing provider (and, through it, the weather provider).
///
/// Implements both collaborator seams: [`ListingFetcher`] for one row of
/// values per listing and [`ListingSearch`] for paged location searches.
#[derive(Debug, Clone)]
pub struct ScrapeClient {
    http: reqwest::Client,
    api_key: String,
    weather: WeatherClient,
}

impl ScrapeClient {
    pub fn new(api_key: impl Into<String>, weather_api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("default TLS backend available");
        let weather = WeatherClient::new(http.clone(), weather_api_key);
        ScrapeClient {
            http,
            api_key: api_key.into(),
            weather,
        }
    }

    async fn listing_details(&self, id: &str) -> Result<ListingDetails, ScrapeError> {
        let url = format!("{LISTING_URL}/{id}");
        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("_format", "v1_legacy_for_p3")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ScrapeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ListingEnvelope = response.json().await?;
        Ok(envelope.listing)
    }
}

impl ListingFetcher for ScrapeClient {
    async fn fetch_row(
        &self,
        listing: &ListingRef,
        stay: &StayParams,
    ) -> Result<Vec<String>, ScrapeError> {
        let id = listing.id()?;
        let details = self.listing_details(&id).await?;
        debug!(id = %id, name = %details.name, "fetched listing details");

        let link = format!("https://www.airbnb.com/rooms/{id}");
        let (high, low) = match self
            .weather
            .day_temperatures(details.lat, details.lng, &stay.check_in)
            .await
        {
            Ok(Some((high, low))) => (high.to_string(), low.to_string()),
            Ok(None) => (String::new(), String::new()),
            // Weather is the tail of the row; leave those cells empty so
            // the merge keeps whatever the sheet already has.
            Err(e) => {
                warn!(id = %id, error = %e, "weather lookup failed; leaving weather cells empty");
                (String::new(), String::new())
            }
        };

        let row = vec![
            details.name,
            link,
            details.city,
            details.bedrooms.to_string(),
            format_fractional(details.bathrooms),
            details.person_capacity.to_string(),
            details
                .star_rating
                .map(format_fractional)
                .unwrap_or_default(),
            details.reviews_count.to_string(),
            details
                .price
                .map(|p| p.to_string())
                .unwrap_or_default(),
            high,
            low,
        ];
        debug_assert_eq!(row.len(), crate::scrape::OUTPUT_COLUMNS.len());
        Ok(row)
    }
}

impl ListingSearch for ScrapeClient {
    async fn search_page(
        &self,
        query: &SearchQuery,
        offset: u32,
        page_size: u32,
    ) -> Result<Vec<String>, ScrapeError> {
        let extensions = serde_json::json!({
            "persistedQuery": {
                "version": 1,
                "sha256Hash": SEARCH_QUERY_HASH,
            },
        });
        let variables = ExploreVariables {
            request: ExploreRequest {
                metadata_only: false,
                items_per_grid: page_size,
                items_offset: offset,
                refinement_paths: ["/homes"],
                checkin: &query.stay.check_in,
                checkout: &query.stay.check_out,
                min_bedrooms: query.min_bedrooms,
                query: &query.location,
                adults: query.stay.guests,
                amenities: &query.amenities,
                price_max: query.price_max,
            },
        };

        let extensions = extensions.to_string();
        let variables = serde_json::to_string(&variables).expect("serializable request");
        let response = self
            .http
            .get(SEARCH_URL)
            .query(&[
                ("operationName", "ExploreSearch"),
                ("locale", "en"),
                ("currency", "USD"),
                ("extensions", extensions.as_str()),
                ("variables", variables.as_str()),
            ])
            .header(header::ACCEPT, "*/*")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ORIGIN, "https://www.airbnb.com")
            .header("x-airbnb-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ScrapeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ExploreResponse = response.json().await?;
        body.listing_ids()
    }
}

fn format_fractional(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Serialize)]
struct ExploreVariables<'a> {
    request: ExploreRequest<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExploreRequest<'a> {
    metadata_only: bool,
    items_per_grid: u32,
    items_offset: u32,
    refinement_paths: [&'static str; 1],
    checkin: &'a str,
    checkout: &'a str,
    min_bedrooms: u32,
    query: &'a str,
    adults: u32,
    amenities: &'a [u32],
    price_max: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ListingEnvelope {
    listing: ListingDetails,
}

#[derive(Debug, Deserialize)]
struct ListingDetails {
    name: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    bedrooms: u32,
    #[serde(default)]
    bathrooms: f64,
    #[serde(default)]
    person_capacity: u32,
    #[serde(default)]
    star_rating: Option<f64>,
    #[serde(default)]
    reviews_count: u32,
    #[serde(default)]
    price: Option<u32>,
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    data: ExploreData,
}

#[derive(Debug, Deserialize)]
struct ExploreData {
    dora: DoraData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DoraData {
    explore_v3: ExploreV3,
}

#[derive(Debug, Deserialize)]
struct ExploreV3 {
    sections: Vec<ExploreSection>,
}

#[derive(Debug, Deserialize)]
struct ExploreSection {
    #[serde(rename = "__typename")]
    typename: String,
    #[serde(default)]
    items: Vec<ExploreItem>,
}

#[derive(Debug, Deserialize)]
struct ExploreItem {
    listing: ListingStub,
}

#[derive(Debug, Deserialize)]
struct ListingStub {
    id: ListingId,
}

/// The provider serializes listing ids as either strings or numbers
/// depending on the surface.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListingId {
    Str(String),
    Num(u64),
}

impl ListingId {
    fn into_string(self) -> String {
        match self {
            ListingId::Str(s) => s,
            ListingId::Num(n) => n.to_string(),
        }
    }
}

impl ExploreResponse {
    fn listing_ids(self) -> Result<Vec<String>, ScrapeError> {
        let section = self
            .data
            .dora
            .explore_v3
            .sections
            .into_iter()
            .find(|s| s.typename == LISTINGS_SECTION)
            .ok_or(ScrapeError::Shape("no listings section in search response"))?;
        Ok(section
            .items
            .into_iter()
            .map(|item| item.listing.id.into_string())
            .collect())
    }
}
