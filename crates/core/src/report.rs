use serde::{Deserialize, Serialize};

use super::role::ColumnRole;

/// A structural edit made while rebuilding a table. Row numbers are indices
/// into the raw input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChangeEvent {
    HeaderLocated { row: usize, rows: usize },
    FallbackSchemaUsed,
    PreambleSkipped { row: usize },
    DuplicateHeaderRemoved { row: usize, rows: usize },
    TrailerDropped { row: usize, rows: usize },
    BlankRowSkipped { row: usize },
    LeadingBlankColumnRemoved { column: usize, rows: usize },
    RowPadded { row: usize, from: usize, to: usize },
    RowTruncated { row: usize, from: usize, to: usize },
    DatePrefixSplit { row: usize },
    DateCellTextMoved { row: usize },
    RowMerged { row: usize, into: usize },
    OrphanDiscarded { row: usize, had_amount: bool },
    ColumnsShifted { row: usize, anchor: ColumnRole },
    BalanceRotated { row: usize },
    DrCrSplit { row: usize },
    RecordWithoutDateDropped { row: usize },
    SparseRecordDropped { row: usize },
    InvalidNumeric { row: usize, column: String, text: String },
    ExtraColumnDropped { column: String, empty_ratio: f64 },
}

/// Counts derived from a [`ChangeReport`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub header_found: bool,
    pub fallback_schema_used: bool,
    pub preamble_rows_skipped: usize,
    pub duplicate_headers_removed: usize,
    pub trailer_rows_dropped: usize,
    pub blank_rows_skipped: usize,
    pub leading_blank_cells_removed: usize,
    pub malformed_rows: usize,
    pub date_prefixes_split: usize,
    pub date_cell_texts_moved: usize,
    pub rows_merged: usize,
    pub orphan_rows_discarded: usize,
    pub orphan_amount_rows: usize,
    pub columns_shifted: usize,
    pub balance_rotations: usize,
    pub drcr_splits: usize,
    pub records_without_date: usize,
    pub sparse_records_dropped: usize,
    pub invalid_numeric_fields: usize,
    pub extra_columns_dropped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeReport {
    events: Vec<ChangeEvent>,
}

impl ChangeReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ChangeEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn summary(&self) -> ReportSummary {
        let mut s = ReportSummary::default();
        for event in &self.events {
            match event {
                ChangeEvent::HeaderLocated { .. } => s.header_found = true,
                ChangeEvent::FallbackSchemaUsed => s.fallback_schema_used = true,
                ChangeEvent::PreambleSkipped { .. } => s.preamble_rows_skipped += 1,
                ChangeEvent::DuplicateHeaderRemoved { .. } => s.duplicate_headers_removed += 1,
                ChangeEvent::TrailerDropped { rows, .. } => s.trailer_rows_dropped += rows,
                ChangeEvent::BlankRowSkipped { .. } => s.blank_rows_skipped += 1,
                ChangeEvent::LeadingBlankColumnRemoved { rows, .. } => {
                    s.leading_blank_cells_removed += rows
                }
                ChangeEvent::RowPadded { .. } | ChangeEvent::RowTruncated { .. } => {
                    s.malformed_rows += 1
                }
                ChangeEvent::DatePrefixSplit { .. } => s.date_prefixes_split += 1,
                ChangeEvent::DateCellTextMoved { .. } => s.date_cell_texts_moved += 1,
                ChangeEvent::RowMerged { .. } => s.rows_merged += 1,
                ChangeEvent::OrphanDiscarded { had_amount, .. } => {
                    s.orphan_rows_discarded += 1;
                    if *had_amount {
                        s.orphan_amount_rows += 1;
                    }
                }
                ChangeEvent::ColumnsShifted { .. } => s.columns_shifted += 1,
                ChangeEvent::BalanceRotated { .. } => s.balance_rotations += 1,
                ChangeEvent::DrCrSplit { .. } => s.drcr_splits += 1,
                ChangeEvent::RecordWithoutDateDropped { .. } => s.records_without_date += 1,
                ChangeEvent::SparseRecordDropped { .. } => s.sparse_records_dropped += 1,
                ChangeEvent::InvalidNumeric { .. } => s.invalid_numeric_fields += 1,
                ChangeEvent::ExtraColumnDropped { .. } => s.extra_columns_dropped += 1,
            }
        }
        s
    }
}
