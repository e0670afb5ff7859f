use thiserror::Error;
use url::Url;

/// Stay parameters shared by every fetch and search call.
#[derive(Debug, Clone)]
pub struct StayParams {
    /// Check-in date, `YYYY-MM-DD`.
    pub check_in: String,
    /// Check-out date, `YYYY-MM-DD`.
    pub check_out: String,
    pub guests: u32,
}

/// A listing, referred to either by its stable identifier or by the full
/// listing URL. Fetchers must accept both interchangeably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingRef {
    Id(String),
    Url(String),
}

impl ListingRef {
    /// The listing identifier, deriving it from the URL when needed.
    pub fn id(&self) -> Result<String, ListingUrlError> {
        match self {
            ListingRef::Id(id) => Ok(id.clone()),
            ListingRef::Url(link) => listing_id_from_link(link),
        }
    }
}

#[derive(Debug, Error)]
pub enum ListingUrlError {
    #[error("not a valid listing URL: {0}")]
    Malformed(String),

    #[error("listing URL has an empty path: {0}")]
    EmptyPath(String),
}

/// Derives the stable listing identifier from a listing URL: the final
/// non-empty path segment. Two rows with the same identifier refer to the
/// same listing.
pub fn listing_id_from_link(link: &str) -> Result<String, ListingUrlError> {
    let url = Url::parse(link).map_err(|_| ListingUrlError::Malformed(link.to_owned()))?;
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ListingUrlError::EmptyPath(link.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_last_path_segment() {
        let id = listing_id_from_link("https://www.airbnb.com/rooms/31895304").unwrap();
        assert_eq!(id, "31895304");
    }

    #[test]
    fn query_string_is_ignored() {
        let id =
            listing_id_from_link("https://www.airbnb.com/rooms/777?adults=4&source_impression_id=x")
                .unwrap();
        assert_eq!(id, "777");
    }

    #[test]
    fn empty_path_is_an_error() {
        assert!(matches!(
            listing_id_from_link("https://www.airbnb.com/rooms/777/"),
            Err(ListingUrlError::EmptyPath(_))
        ));
        assert!(matches!(
            listing_id_from_link("https://www.airbnb.com"),
            Err(ListingUrlError::EmptyPath(_))
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            listing_id_from_link("not a url"),
            Err(ListingUrlError::Malformed(_))
        ));
    }

    #[test]
    fn ref_id_accepts_both_forms() {
        assert_eq!(ListingRef::Id("42".into()).id().unwrap(), "42");
        assert_eq!(
            ListingRef::Url("https://www.airbnb.com/rooms/42".into())
                .id()
                .unwrap(),
            "42"
        );
    }
}
