use std::collections::HashSet;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::listing::{listing_id_from_link, ListingRef, ListingUrlError, StayParams};
use crate::providers::SpreadsheetProvider;
use crate::scrape::{ListingFetcher, ScrapeError};
use crate::sheet::{SheetError, SheetView, WriteBuffer, FIRST_DATA_ROW};

#[derive(Debug, Error)]
pub enum SyncError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Sheet(#[from] SheetError<E>),

    #[error("sheet has no 'Link' header")]
    MissingLinkHeader,

    #[error(transparent)]
    ListingUrl(#[from] ListingUrlError),

    #[error("listing fetch: {0}")]
    Fetch(#[from] ScrapeError),
}

/// Outcome of a refresh pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Rows written back (merged, blanked and unmodified alike).
    pub written: usize,
    pub merged: usize,
    /// Duplicate rows erased.
    pub blanked: usize,
    /// Rows kept as-is after a failed fetch.
    pub failed: usize,
}

/// Outcome of an add pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AddSummary {
    /// Identifiers requested, before de-duplication.
    pub requested: usize,
    /// Unique identifiers that were already present in the sheet.
    pub already_tracked: usize,
    pub added: usize,
}

/// How the add-mode row scan ended. The scan itself is the implicit
/// `scanning` state; destination building branches on the terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEnd {
    /// A long run of empty rows marked the end of the used region.
    EmptyRun { last_row: u32 },
    /// The storage reported no more rows; `last_row` is `None` when not a
    /// single data row was scanned.
    Exhausted { last_row: Option<u32> },
}

/// Walks existing rows, merges freshly scraped values into them, and fills
/// newly discovered listings into empty rows, batching all writes through
/// a [`WriteBuffer`].
pub struct Reconciler<'a, P, F> {
    provider: &'a P,
    fetcher: &'a F,
    config: &'a Config,
    sheet_name: &'a str,
    stay: &'a StayParams,
}

impl<'a, P, F> Reconciler<'a, P, F>
where
    P: SpreadsheetProvider,
    F: ListingFetcher,
{
    pub fn new(
        provider: &'a P,
        fetcher: &'a F,
        config: &'a Config,
        sheet_name: &'a str,
        stay: &'a StayParams,
    ) -> Self {
        Reconciler {
            provider,
            fetcher,
            config,
            sheet_name,
            stay,
        }
    }

    /// Refresh mode: update rows already present in the sheet.
    ///
    /// Scans from the top of the data range until an all-empty row. Rows
    /// sharing an identifier with an earlier row are erased; rows whose
    /// fetch fails are kept as-is; everything else is merged cell-by-cell,
    /// preferring the fresh value unless it is empty.
    pub async fn refresh(&self) -> Result<RefreshSummary, SyncError<P::Error>> {
        let mut view =
            SheetView::open(self.provider, self.sheet_name, self.config.view_page_size).await?;
        let link_index = view
            .headers()
            .link_index()
            .ok_or(SyncError::MissingLinkHeader)?;
        let mut buffer = WriteBuffer::new(
            self.provider,
            self.sheet_name,
            FIRST_DATA_ROW,
            self.config.write_capacity,
        );

        let mut seen: HashSet<String> = HashSet::new();
        let mut summary = RefreshSummary::default();

        while let Some(row) = view.next_row().await? {
            if is_empty_row(&row) {
                break;
            }

            let output = match non_empty_link(&row, link_index) {
                None => row.clone(),
                Some(link) => {
                    let listing_id = listing_id_from_link(link)?;
                    if !seen.insert(listing_id) {
                        summary.blanked += 1;
                        vec![String::new(); row.len()]
                    } else {
                        let listing = ListingRef::Url(link.to_owned());
                        match self.fetcher.fetch_row(&listing, self.stay).await {
                            Ok(values) => {
                                summary.merged += 1;
                                merge_row(&row, &values)
                            }
                            Err(e) => {
                                warn!(row = ?row, error = %e, "listing fetch failed; keeping row unmodified");
                                summary.failed += 1;
                                row.clone()
                            }
                        }
                    }
                }
            };

            buffer.append(output).await?;
            summary.written += 1;
        }

        buffer.flush().await?;
        info!(
            written = summary.written,
            merged = summary.merged,
            blanked = summary.blanked,
            failed = summary.failed,
            "refresh pass complete"
        );
        Ok(summary)
    }

    /// Add mode: fill newly discovered listings into the sheet, reusing
    /// empty rows before extending past the used region.
    ///
    /// Identifiers already present in a non-empty row are dropped from the
    /// target set. Fetch failures here are fatal, unlike in refresh.
    pub async fn add_listings(
        &self,
        discovered: &[String],
    ) -> Result<AddSummary, SyncError<P::Error>> {
        let mut targets = dedup_preserving_order(discovered);
        let unique = targets.len();

        let mut view =
            SheetView::open(self.provider, self.sheet_name, self.config.view_page_size).await?;
        let link_index = view
            .headers()
            .link_index()
            .ok_or(SyncError::MissingLinkHeader)?;

        let mut empties: Vec<u32> = Vec::new();
        let mut consecutive_empty: u32 = 0;
        let mut last_scanned: Option<u32> = None;
        let mut row_index = FIRST_DATA_ROW;

        let end = loop {
            let Some(row) = view.next_row().await? else {
                break ScanEnd::Exhausted {
                    last_row: last_scanned,
                };
            };
            let index = row_index;
            row_index += 1;
            last_scanned = Some(index);

            match non_empty_link(&row, link_index) {
                None => {
                    empties.push(index);
                    consecutive_empty += 1;
                    // A long empty run means we are past the used region;
                    // stop once there are more gaps than listings left.
                    if empties.len() > targets.len()
                        && consecutive_empty >= self.config.empty_run_threshold
                    {
                        break ScanEnd::EmptyRun { last_row: index };
                    }
                }
                Some(link) => {
                    consecutive_empty = 0;
                    let listing_id = listing_id_from_link(link)?;
                    targets.retain(|t| *t != listing_id);
                }
            }
        };

        let mut summary = AddSummary {
            requested: discovered.len(),
            already_tracked: unique - targets.len(),
            added: 0,
        };
        let destinations = destinations(&end, empties, targets.len());
        let mut buffer = WriteBuffer::new(
            self.provider,
            self.sheet_name,
            FIRST_DATA_ROW,
            self.config.write_capacity,
        );

        for (listing_id, dest) in targets.iter().zip(destinations) {
            let listing = ListingRef::Id(listing_id.clone());
            let values = self.fetcher.fetch_row(&listing, self.stay).await?;
            if dest != buffer.end_index() + 1 {
                buffer.flush().await?;
                buffer.set_start_index(dest);
            }
            buffer.append(values).await?;
            summary.added += 1;
        }

        buffer.flush().await?;
        info!(
            requested = summary.requested,
            already_tracked = summary.already_tracked,
            added = summary.added,
            "add pass complete"
        );
        Ok(summary)
    }
}

/// Destination row indices for the remaining targets: reused empty rows
/// first, then fresh rows past the last scanned one. The exhausted-with-
/// nothing-scanned case falls back to a contiguous block at the top of the
/// data range.
fn destinations(end: &ScanEnd, mut empties: Vec<u32>, needed: usize) -> Vec<u32> {
    match end {
        ScanEnd::EmptyRun { last_row }
        | ScanEnd::Exhausted {
            last_row: Some(last_row),
        } => {
            let mut next = last_row + 1;
            while empties.len() < needed {
                empties.push(next);
                next += 1;
            }
            empties.truncate(needed);
            empties
        }
        ScanEnd::Exhausted { last_row: None } => {
            (FIRST_DATA_ROW..FIRST_DATA_ROW + needed as u32).collect()
        }
    }
}

/// Cell-by-cell merge: the fresh value wins unless it is empty, so cells
/// the provider omits (or a human filled in by hand) survive. Both sides
/// are treated as padded to the longer width.
fn merge_row(old: &[String], new: &[String]) -> Vec<String> {
    let width = old.len().max(new.len());
    (0..width)
        .map(|i| {
            let new_val = new.get(i).map(String::as_str).unwrap_or("");
            if new_val.is_empty() {
                old.get(i).cloned().unwrap_or_default()
            } else {
                new_val.to_owned()
            }
        })
        .collect()
}

/// All cells blank or unchecked checkboxes (which render as `FALSE`).
fn is_empty_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.is_empty() || cell == "FALSE")
}

fn non_empty_link(row: &[String], link_index: usize) -> Option<&str> {
    row.get(link_index)
        .map(String::as_str)
        .filter(|link| !link.is_empty())
}

fn dedup_preserving_order(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}
