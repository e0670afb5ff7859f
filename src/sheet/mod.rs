use std::str::FromStr;

use a1_notation::A1;
use thiserror::Error;

use crate::cell_encoding::DecodeStringError;

mod buffer;
mod view;

pub use buffer::WriteBuffer;
pub use view::{Headers, SheetView};

/// Row 1 holds the headers; data starts below it.
pub const HEADER_ROW: u32 = 1;
pub const FIRST_DATA_ROW: u32 = 2;

/// Column span read per row, `A:<SCAN_WIDTH>`. Sheets wider than this are
/// not synchronized past it.
pub const SCAN_WIDTH: usize = 26;

#[derive(Debug, Error)]
pub enum SheetError<E: std::error::Error + 'static> {
    #[error("sheet storage: {0}")]
    Storage(#[source] E),

    #[error("invalid A1 range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },

    #[error("cell decode: {0}")]
    Decode(#[from] DecodeStringError),

    #[error("sheet has no header row")]
    MissingHeaders,
}

/// Builds the A1 range covering rows `first..=last` over `width` columns of
/// the named sheet.
pub(crate) fn range_for_rows<E: std::error::Error>(
    sheet_name: &str,
    first: u32,
    last: u32,
    width: usize,
) -> Result<A1, SheetError<E>> {
    let range = format!(
        "{}!A{}:{}{}",
        quote_sheet_name(sheet_name),
        first,
        column_letters(width),
        last
    );
    A1::from_str(&range).map_err(|e| SheetError::InvalidRange {
        range,
        reason: e.to_string(),
    })
}

/// Sheet names with anything beyond `[A-Za-z0-9_]` need single quotes in A1
/// notation; embedded quotes are doubled.
fn quote_sheet_name(name: &str) -> String {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_owned()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// 1-based column count to letters: 1 -> A, 26 -> Z, 27 -> AA.
fn column_letters(mut count: usize) -> String {
    debug_assert!(count >= 1);
    let mut letters = Vec::new();
    while count > 0 {
        let rem = (count - 1) % 26;
        letters.push(b'A' + rem as u8);
        count = (count - 1) / 26;
    }
    letters.reverse();
    letters.into_iter().map(char::from).collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[test]
    fn column_letters_cover_multi_letter_columns() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(52), "AZ");
    }

    #[test]
    fn plain_sheet_names_stay_unquoted() {
        let range = range_for_rows::<Infallible>("Sheet1", 2, 6, 26).unwrap();
        assert_eq!(range.to_string(), "Sheet1!A2:Z6");
    }

    #[test]
    fn sheet_names_with_spaces_are_quoted() {
        let range = range_for_rows::<Infallible>("April Locations", 1, 1, 26).unwrap();
        assert_eq!(range.to_string(), "'April Locations'!A1:Z1");
    }
}
