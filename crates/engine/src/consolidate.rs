//! Folds continuation rows into the transaction opened by the last dated row.

use rowmend_core::{parse_amount, ChangeEvent, ChangeReport, ColumnRole, RawRow, RepairModes};

use crate::classify::{drcr_tokens, is_amount_like, is_blank, is_date_like, split_date_prefix};
use crate::header::BodyRow;
use crate::schema::Layout;

/// A finished transaction row, still as text cells in layout order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedRow {
    pub source_row: usize,
    pub cells: RawRow,
}

struct OpenRecord {
    source_row: usize,
    cells: RawRow,
}

impl OpenRecord {
    fn open(row: BodyRow) -> Self {
        Self { source_row: row.source_row, cells: row.cells }
    }

    fn finish(self) -> ConsolidatedRow {
        ConsolidatedRow { source_row: self.source_row, cells: self.cells }
    }
}

enum Cursor {
    NoOpenRecord,
    RecordOpen(OpenRecord),
}

pub struct Consolidator<'a> {
    layout: &'a Layout,
    /// Accept `amount(Dr)` / `amount(Cr)` text in amount columns.
    marked_amounts: bool,
}

impl<'a> Consolidator<'a> {
    pub fn new(layout: &'a Layout, repairs: &RepairModes) -> Self {
        Self { layout, marked_amounts: repairs.split_drcr }
    }

    fn holds_amount(&self, text: &str) -> bool {
        is_amount_like(text)
            || (self.marked_amounts && (parse_amount(text).is_ok() || !drcr_tokens(text).is_empty()))
    }

    fn opens_record(&self, row: &BodyRow) -> bool {
        row.cells
            .get(self.layout.date_index())
            .is_some_and(|c| is_date_like(c))
    }

    /// Single pass over the body. Records are emitted in the order of the
    /// rows that opened them and never touched again.
    pub fn consolidate(&self, rows: Vec<BodyRow>, report: &mut ChangeReport) -> Vec<ConsolidatedRow> {
        let mut out = Vec::new();
        let mut cursor = Cursor::NoOpenRecord;

        for row in rows {
            if row.is_blank() {
                report.push(ChangeEvent::BlankRowSkipped { row: row.source_row });
                continue;
            }
            let dated = self.opens_record(&row);
            cursor = match (cursor, dated) {
                (Cursor::NoOpenRecord, true) => Cursor::RecordOpen(OpenRecord::open(row)),
                (Cursor::NoOpenRecord, false) => {
                    self.discard_orphan(&row, report);
                    Cursor::NoOpenRecord
                }
                (Cursor::RecordOpen(open), true) => {
                    out.push(open.finish());
                    Cursor::RecordOpen(OpenRecord::open(row))
                }
                (Cursor::RecordOpen(mut open), false) => {
                    self.merge(&mut open, row, report);
                    Cursor::RecordOpen(open)
                }
            };
        }

        if let Cursor::RecordOpen(open) = cursor {
            out.push(open.finish());
        }
        out
    }

    fn discard_orphan(&self, row: &BodyRow, report: &mut ChangeReport) {
        let had_amount = row
            .cells
            .iter()
            .enumerate()
            .any(|(i, c)| self.layout.role_at(i).is_amount() && self.holds_amount(c));
        if had_amount {
            tracing::warn!(row = row.source_row, cells = ?row.cells, "Orphan row with an amount discarded before any dated row");
        } else {
            tracing::debug!(row = row.source_row, "Orphan row discarded");
        }
        report.push(ChangeEvent::OrphanDiscarded { row: row.source_row, had_amount });
    }

    fn merge(&self, open: &mut OpenRecord, row: BodyRow, report: &mut ChangeReport) {
        for (i, incoming) in row.cells.into_iter().enumerate() {
            if is_blank(&incoming) {
                continue;
            }
            let Some(current) = open.cells.get_mut(i) else {
                continue;
            };
            let incoming = incoming.trim();
            match self.layout.role_at(i) {
                ColumnRole::Description => {
                    if is_blank(current) {
                        *current = incoming.to_string();
                    } else {
                        let joined = format!("{} {}", current.trim_end(), incoming);
                        *current = joined;
                    }
                }
                role if role.is_amount() => {
                    if is_blank(current) && self.holds_amount(incoming) {
                        *current = incoming.to_string();
                    }
                }
                _ => {
                    if is_blank(current) {
                        *current = incoming.to_string();
                    }
                }
            }
        }
        tracing::debug!(row = row.source_row, into = open.source_row, "Continuation row merged");
        report.push(ChangeEvent::RowMerged { row: row.source_row, into: open.source_row });
    }
}

/// Splits date cells of the form `<date> <ref> <text>` and moves stray text
/// out of the date column so it reaches the description.
pub fn split_date_prefixes(layout: &Layout, rows: &mut [BodyRow], report: &mut ChangeReport) {
    let date_idx = layout.date_index();
    let Some(desc_idx) = layout.index_of(ColumnRole::Description) else {
        return;
    };
    let ref_idx = layout.index_of(ColumnRole::Reference);

    for row in rows.iter_mut().filter(|r| r.cells.len() >= layout.width()) {
        let cell = row.cells[date_idx].trim().to_string();
        if is_blank(&cell) {
            continue;
        }

        let moved_text = match split_date_prefix(&cell) {
            Some((_, "")) => continue,
            Some((date, rest)) => {
                let mut tokens = rest.split_whitespace().peekable();
                if let Some(ref_idx) = ref_idx {
                    let first_has_digit = tokens
                        .peek()
                        .is_some_and(|t| t.chars().any(|c| c.is_ascii_digit()));
                    if first_has_digit && is_blank(&row.cells[ref_idx]) {
                        if let Some(reference) = tokens.next() {
                            row.cells[ref_idx] = reference.to_string();
                        }
                    }
                }
                let text = tokens.collect::<Vec<_>>().join(" ");
                row.cells[date_idx] = date.to_string();
                report.push(ChangeEvent::DatePrefixSplit { row: row.source_row });
                text
            }
            None => {
                row.cells[date_idx] = String::new();
                report.push(ChangeEvent::DateCellTextMoved { row: row.source_row });
                cell
            }
        };

        if moved_text.is_empty() {
            continue;
        }
        let desc = row.cells[desc_idx].trim();
        let merged = if is_blank(desc) {
            moved_text
        } else {
            format!("{moved_text} {desc}")
        };
        row.cells[desc_idx] = merged;
    }
}
