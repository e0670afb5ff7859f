use std::collections::VecDeque;

use serde_json::Value;
use tracing::debug;

use crate::cell_encoding::DecodeCell;
use crate::providers::SpreadsheetProvider;
use crate::sheet::{range_for_rows, SheetError, HEADER_ROW, SCAN_WIDTH};

/// The header row of a named range. Column semantics are positional; only
/// `Link` is looked up structurally.
#[derive(Debug, Clone)]
pub struct Headers(Vec<String>);

impl Headers {
    pub fn link_index(&self) -> Option<usize> {
        self.0.iter().position(|h| h == "Link")
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }
}

/// Lazy, forward-only iterator over the data rows of a named sheet.
///
/// Rows are fetched in chunks of `page_size`. The storage omits trailing
/// empty rows inside a requested chunk, so a short chunk is padded back to
/// full size with empty rows; a chunk with no rows at all means the storage
/// has no more rows and the view is exhausted. Re-scanning requires a fresh
/// view; stopping early (e.g. on an empty row) is the caller's policy.
pub struct SheetView<'a, P: SpreadsheetProvider> {
    provider: &'a P,
    sheet_name: String,
    headers: Headers,
    next_fetch_row: u32,
    pending: VecDeque<Vec<String>>,
    exhausted: bool,
    page_size: u32,
}

impl<'a, P: SpreadsheetProvider> SheetView<'a, P> {
    /// Opens a view on `sheet_name`, reading the header row up front.
    pub async fn open(
        provider: &'a P,
        sheet_name: &str,
        page_size: u32,
    ) -> Result<Self, SheetError<P::Error>> {
        let header_range = range_for_rows(sheet_name, HEADER_ROW, HEADER_ROW, SCAN_WIDTH)?;
        let mut rows = provider
            .read_range(&header_range)
            .await
            .map_err(SheetError::Storage)?;
        if rows.is_empty() {
            return Err(SheetError::MissingHeaders);
        }
        let headers = Headers(decode_row(rows.remove(0))?);

        Ok(SheetView {
            provider,
            sheet_name: sheet_name.to_owned(),
            headers,
            next_fetch_row: HEADER_ROW + 1,
            pending: VecDeque::new(),
            exhausted: false,
            page_size: page_size.max(1),
        })
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The next data row, or `None` once the storage reports no more rows.
    pub async fn next_row(&mut self) -> Result<Option<Vec<String>>, SheetError<P::Error>> {
        if self.pending.is_empty() && !self.exhausted {
            self.fetch_page().await?;
        }
        Ok(self.pending.pop_front())
    }

    async fn fetch_page(&mut self) -> Result<(), SheetError<P::Error>> {
        let first = self.next_fetch_row;
        let last = first + self.page_size - 1;
        let range = range_for_rows(&self.sheet_name, first, last, SCAN_WIDTH)?;
        let rows = self
            .provider
            .read_range(&range)
            .await
            .map_err(SheetError::Storage)?;
        debug!(first, last, fetched = rows.len(), "sheet view chunk");

        if rows.is_empty() {
            self.exhausted = true;
            return Ok(());
        }

        let fetched = rows.len() as u32;
        for row in rows {
            self.pending.push_back(decode_row(row)?);
        }
        for _ in fetched..self.page_size {
            self.pending.push_back(Vec::new());
        }
        self.next_fetch_row = last + 1;
        Ok(())
    }
}

fn decode_row<E: std::error::Error>(row: Vec<Value>) -> Result<Vec<String>, SheetError<E>> {
    row.iter()
        .map(|cell| String::decode_cell(cell).map_err(SheetError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::testing::{vrow, FakeProvider};

    #[tokio::test]
    async fn headers_come_from_row_one() {
        let provider = FakeProvider::with_rows(vec![
            vrow(&["Name", "Link"]),
            vrow(&["Chalet", "https://example.com/rooms/1"]),
        ]);
        let view = SheetView::open(&provider, "Sheet1", 10).await.unwrap();
        assert_eq!(view.headers().cells(), ["Name", "Link"]);
        assert_eq!(view.headers().link_index(), Some(1));
    }

    #[tokio::test]
    async fn missing_header_row_is_an_error() {
        let provider = FakeProvider::with_rows(vec![]);
        let result = SheetView::open(&provider, "Sheet1", 10).await;
        assert!(matches!(result, Err(SheetError::MissingHeaders)));
    }

    #[tokio::test]
    async fn yields_rows_in_order_then_exhausts() {
        let provider = FakeProvider::with_rows(vec![
            vrow(&["Name", "Link"]),
            vrow(&["a", "1"]),
            vrow(&["b", "2"]),
            vrow(&["c", "3"]),
        ]);
        let mut view = SheetView::open(&provider, "Sheet1", 3).await.unwrap();

        assert_eq!(view.next_row().await.unwrap().unwrap(), ["a", "1"]);
        assert_eq!(view.next_row().await.unwrap().unwrap(), ["b", "2"]);
        assert_eq!(view.next_row().await.unwrap().unwrap(), ["c", "3"]);
        assert_eq!(view.next_row().await.unwrap(), None);
        assert_eq!(view.next_row().await.unwrap(), None);
    }

    #[tokio::test]
    async fn short_chunks_are_padded_with_empty_rows() {
        // Rows 4 and 5 of the first chunk are empty; the data resumes in
        // the second chunk.
        let provider = FakeProvider::with_rows(vec![
            vrow(&["Name", "Link"]),
            vrow(&["a", "1"]),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            vrow(&["b", "2"]),
        ]);
        let mut view = SheetView::open(&provider, "Sheet1", 4).await.unwrap();

        assert_eq!(view.next_row().await.unwrap().unwrap(), ["a", "1"]);
        assert_eq!(view.next_row().await.unwrap().unwrap(), Vec::<String>::new());
        assert_eq!(view.next_row().await.unwrap().unwrap(), Vec::<String>::new());
        assert_eq!(view.next_row().await.unwrap().unwrap(), Vec::<String>::new());
        assert_eq!(view.next_row().await.unwrap().unwrap(), ["b", "2"]);
    }

    #[tokio::test]
    async fn numeric_cells_decode_to_strings() {
        let provider = FakeProvider::with_rows(vec![
            vrow(&["Name", "Guests"]),
            vec![serde_json::json!("a"), serde_json::json!(6)],
        ]);
        let mut view = SheetView::open(&provider, "Sheet1", 4).await.unwrap();
        assert_eq!(view.next_row().await.unwrap().unwrap(), ["a", "6"]);
    }
}
