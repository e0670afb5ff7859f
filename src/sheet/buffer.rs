use serde_json::Value;
use tracing::debug;

use crate::cell_encoding::EncodeCell;
use crate::providers::SpreadsheetProvider;
use crate::sheet::{range_for_rows, SheetError};

/// Accumulates rows and writes them to the sheet in batches: one storage
/// write per flush instead of one per row.
///
/// Rows land at consecutive indices from `start_index`. Callers writing to
/// a non-contiguous destination flush first and reposition with
/// [`set_start_index`](WriteBuffer::set_start_index). There is no implicit
/// flush on drop; finish with an explicit [`flush`](WriteBuffer::flush).
pub struct WriteBuffer<'a, P: SpreadsheetProvider> {
    provider: &'a P,
    sheet_name: String,
    start_index: u32,
    capacity: usize,
    rows: Vec<Vec<String>>,
}

impl<'a, P: SpreadsheetProvider> WriteBuffer<'a, P> {
    pub fn new(
        provider: &'a P,
        sheet_name: impl Into<String>,
        start_index: u32,
        capacity: usize,
    ) -> Self {
        WriteBuffer {
            provider,
            sheet_name: sheet_name.into(),
            start_index,
            capacity: capacity.max(1),
            rows: Vec::new(),
        }
    }

    pub fn start_index(&self) -> u32 {
        self.start_index
    }

    /// Repositions the buffer's target offset. Only meaningful between
    /// flushes; buffered rows move with the offset.
    pub fn set_start_index(&mut self, index: u32) {
        self.start_index = index;
    }

    /// Sheet index of the last buffered row (`start_index - 1` when the
    /// buffer is empty).
    pub fn end_index(&self) -> u32 {
        self.start_index + self.rows.len() as u32 - 1
    }

    /// Buffers a row at the next logical index, flushing first when the
    /// buffer is at capacity.
    pub async fn append(&mut self, row: Vec<String>) -> Result<(), SheetError<P::Error>> {
        if self.rows.len() >= self.capacity {
            self.flush().await?;
        }
        self.rows.push(row);
        Ok(())
    }

    /// Writes all buffered rows as one batched call covering
    /// `start_index..=end_index`, then advances `start_index` past them.
    pub async fn flush(&mut self) -> Result<(), SheetError<P::Error>> {
        if self.rows.is_empty() {
            return Ok(());
        }

        let width = self.rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let last = self.end_index();
        let range = range_for_rows(&self.sheet_name, self.start_index, last, width)?;

        let values: Vec<Vec<Value>> = self
            .rows
            .drain(..)
            .map(|row| {
                row.into_iter()
                    .map(|cell| cell.encode_cell().unwrap_or_else(|never| match never {}))
                    .collect()
            })
            .collect();

        debug!(
            range = %range,
            rows = values.len(),
            "flushing write buffer"
        );
        self.provider
            .write_range(&range, values)
            .await
            .map_err(SheetError::Storage)?;
        self.start_index = last + 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::testing::{vrow, FakeProvider};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_owned()).collect()
    }

    #[tokio::test]
    async fn flush_writes_one_contiguous_block() {
        let provider = FakeProvider::default();
        let mut buffer = WriteBuffer::new(&provider, "Sheet1", 2, 5);

        buffer.append(row(&["a", "1"])).await.unwrap();
        buffer.append(row(&["b", "2"])).await.unwrap();
        buffer.flush().await.unwrap();

        assert_eq!(provider.written_ranges(), ["Sheet1!A2:B3"]);
        assert_eq!(
            provider.grid.borrow()[1..3],
            [vrow(&["a", "1"]), vrow(&["b", "2"])]
        );
        // Next appends continue past the flushed block.
        assert_eq!(buffer.start_index(), 4);
    }

    #[tokio::test]
    async fn sixth_append_triggers_exactly_one_auto_flush() {
        let provider = FakeProvider::default();
        let mut buffer = WriteBuffer::new(&provider, "Sheet1", 2, 5);

        for i in 0..6 {
            buffer.append(row(&[&format!("r{i}")])).await.unwrap();
        }

        // Rows 2..=6 were flushed automatically; the sixth row is still
        // buffered for row 7.
        assert_eq!(provider.written_ranges(), ["Sheet1!A2:A6"]);
        assert_eq!(buffer.start_index(), 7);
        assert_eq!(buffer.end_index(), 7);

        buffer.flush().await.unwrap();
        assert_eq!(provider.written_ranges(), ["Sheet1!A2:A6", "Sheet1!A7:A7"]);
    }

    #[tokio::test]
    async fn repositioning_writes_into_a_gap() {
        let provider = FakeProvider::default();
        let mut buffer = WriteBuffer::new(&provider, "Sheet1", 2, 5);

        buffer.append(row(&["first"])).await.unwrap();
        buffer.flush().await.unwrap();

        buffer.set_start_index(9);
        buffer.append(row(&["gap"])).await.unwrap();
        buffer.flush().await.unwrap();

        assert_eq!(provider.written_ranges(), ["Sheet1!A2:A2", "Sheet1!A9:A9"]);
        assert_eq!(provider.grid.borrow()[8], vrow(&["gap"]));
    }

    #[tokio::test]
    async fn flush_of_empty_buffer_is_a_no_op() {
        let provider = FakeProvider::default();
        let mut buffer = WriteBuffer::new(&provider, "Sheet1", 2, 5);
        buffer.flush().await.unwrap();
        assert!(provider.written_ranges().is_empty());
        assert_eq!(buffer.start_index(), 2);
    }

    #[tokio::test]
    async fn range_width_tracks_the_widest_row() {
        let provider = FakeProvider::default();
        let mut buffer = WriteBuffer::new(&provider, "Sheet1", 2, 5);

        buffer.append(row(&["a"])).await.unwrap();
        buffer.append(row(&["b", "2", "x"])).await.unwrap();
        buffer.flush().await.unwrap();

        assert_eq!(provider.written_ranges(), ["Sheet1!A2:C3"]);
    }
}
