//! Column repairs for rows the extractor shifted or merged.
//!
//! Row repairs are column-local and idempotent. Each one re-checks its
//! trigger afterwards; a trigger that still holds is an internal error.

use rowmend_core::amount::is_zero_amount;
use rowmend_core::{ChangeEvent, ChangeReport, ColumnRole, DrCr, RawRow, RepairModes};

use crate::classify::{drcr_tokens, is_amount_like, is_blank};
use crate::consolidate::ConsolidatedRow;
use crate::header::BodyRow;
use crate::pipeline::EngineError;
use crate::schema::Layout;

pub struct Realigner<'a> {
    layout: &'a Layout,
    repairs: &'a RepairModes,
}

impl<'a> Realigner<'a> {
    pub fn new(layout: &'a Layout, repairs: &'a RepairModes) -> Self {
        Self { layout, repairs }
    }

    pub fn realign(
        &self,
        mut rows: Vec<ConsolidatedRow>,
        report: &mut ChangeReport,
    ) -> Result<Vec<ConsolidatedRow>, EngineError> {
        for row in rows.iter_mut() {
            self.realign_row(row, report)?;
        }
        Ok(rows)
    }

    fn realign_row(&self, row: &mut ConsolidatedRow, report: &mut ChangeReport) -> Result<(), EngineError> {
        let at = row.source_row;

        if self.repairs.split_drcr {
            if let Some(debit) = self.layout.index_of(ColumnRole::Debit) {
                let credit = self.layout.index_of(ColumnRole::Credit);
                let balance = self.layout.index_of(ColumnRole::Balance);
                if split_drcr(&mut row.cells, debit, credit, balance) {
                    tracing::debug!(row = at, "Dr/Cr amounts split");
                    report.push(ChangeEvent::DrCrSplit { row: at });
                    if needs_drcr_split(&row.cells, debit, credit, balance) {
                        return Err(EngineError::RepairNoOp { repair: "drcr_split", row: at });
                    }
                }
            }
        }

        if let Some(anchor_role) = self.repairs.anchor_shift {
            if let Some(anchor) = self.layout.index_of(anchor_role) {
                if needs_shift(&row.cells, anchor) {
                    shift_left(&mut row.cells, anchor);
                    tracing::debug!(row = at, anchor = %anchor_role, "Columns shifted left");
                    report.push(ChangeEvent::ColumnsShifted { row: at, anchor: anchor_role });
                    if needs_shift(&row.cells, anchor) {
                        return Err(EngineError::RepairNoOp { repair: "anchor_shift", row: at });
                    }
                }
            }
        }

        if self.repairs.balance_rotation {
            if let Some(slots) = self.rotation_slots() {
                if needs_rotation(&row.cells, slots) {
                    rotate_balance(&mut row.cells, slots);
                    tracing::debug!(row = at, "Balance rotated out of the credit column");
                    report.push(ChangeEvent::BalanceRotated { row: at });
                    if needs_rotation(&row.cells, slots) {
                        return Err(EngineError::RepairNoOp { repair: "balance_rotation", row: at });
                    }
                }
            }
        }
        Ok(())
    }

    fn rotation_slots(&self) -> Option<RotationSlots> {
        Some(RotationSlots {
            debit: self.layout.index_of(ColumnRole::Debit)?,
            credit: self.layout.index_of(ColumnRole::Credit)?,
            balance: self.layout.index_of(ColumnRole::Balance)?,
        })
    }
}

// ── Anchor shift ──────────────────────────────────────────────────────────────

/// The anchor is blank while the cell after it holds something.
pub fn needs_shift(cells: &[String], anchor: usize) -> bool {
    match (cells.get(anchor), cells.get(anchor + 1)) {
        (Some(a), Some(next)) => is_blank(a) && !is_blank(next),
        _ => false,
    }
}

/// Drops the anchor cell, pulling every later cell one position left and
/// leaving the last cell blank.
fn shift_left(cells: &mut RawRow, anchor: usize) {
    cells.remove(anchor);
    cells.push(String::new());
}

// ── Balance rotation ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct RotationSlots {
    debit: usize,
    credit: usize,
    balance: usize,
}

fn needs_rotation(cells: &[String], slots: RotationSlots) -> bool {
    let balance = &cells[slots.balance];
    let credit = &cells[slots.credit];
    (is_blank(balance) || is_zero_amount(balance)) && is_amount_like(credit) && !is_zero_amount(credit)
}

fn rotate_balance(cells: &mut [String], slots: RotationSlots) {
    let debit = std::mem::take(&mut cells[slots.debit]);
    let credit = std::mem::replace(&mut cells[slots.credit], debit);
    cells[slots.balance] = credit;
}

// ── Dr/Cr split ───────────────────────────────────────────────────────────────

fn needs_drcr_split(cells: &[String], debit: usize, credit: Option<usize>, balance: Option<usize>) -> bool {
    let tokens = drcr_tokens(&cells[debit]);
    match tokens.as_slice() {
        [] => false,
        [(_, side)] => *side == DrCr::Cr && credit.is_some_and(|c| is_blank(&cells[c])),
        [_, _, ..] => balance.is_some_and(|b| is_blank(&cells[b])),
    }
}

/// Separates a debit cell that swallowed the balance, then moves a lone
/// `(Cr)` amount to the credit column. Returns true when anything moved.
fn split_drcr(cells: &mut [String], debit: usize, credit: Option<usize>, balance: Option<usize>) -> bool {
    let mut changed = false;

    let tokens: Vec<(String, DrCr)> = drcr_tokens(&cells[debit])
        .into_iter()
        .map(|(t, side)| (t.to_string(), side))
        .collect();
    if tokens.len() >= 2 {
        if let Some(b) = balance.filter(|b| is_blank(&cells[*b])) {
            cells[b] = tokens[1].0.clone();
        }
        cells[debit] = tokens[0].0.clone();
        changed = true;
    }

    let lone_credit = matches!(drcr_tokens(&cells[debit]).as_slice(), [(_, DrCr::Cr)]);
    if lone_credit {
        if let Some(c) = credit.filter(|c| is_blank(&cells[*c])) {
            cells[c] = std::mem::take(&mut cells[debit]);
            changed = true;
        }
    }
    changed
}

// ── Leading blank columns ─────────────────────────────────────────────────────

fn is_unnamed(cell: &str) -> bool {
    is_blank(cell) || cell.trim().to_lowercase().starts_with("unnamed")
}

/// For every unnamed header position, deletes the leading run of blank cells
/// below it, pulling the rest of those rows one position left. Positions are
/// handled right to left so earlier indices stay valid. Unnamed positions
/// after the last named header cell are left alone.
pub fn remove_leading_blank_columns(header: &mut RawRow, body: &mut [BodyRow], report: &mut ChangeReport) {
    let named_end = header.iter().rposition(|c| !is_unnamed(c)).map_or(0, |i| i + 1);
    for col in (0..named_end).rev() {
        if !is_unnamed(&header[col]) {
            continue;
        }
        let span = body
            .iter()
            .take_while(|r| r.cells.get(col).map_or(true, |c| is_blank(c)))
            .count();
        if span == 0 {
            continue;
        }
        for row in body.iter_mut().take(span) {
            if col < row.cells.len() {
                row.cells.remove(col);
                row.cells.push(String::new());
            }
        }
        header.remove(col);
        header.push(String::new());
        tracing::debug!(column = col, rows = span, "Leading blank column removed");
        report.push(ChangeEvent::LeadingBlankColumnRemoved { column: col, rows: span });
    }
}
