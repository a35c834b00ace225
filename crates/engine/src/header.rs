use std::collections::HashSet;

use rowmend_core::{BankProfile, ChangeEvent, ChangeReport, ColumnRole, RawRow};

use crate::classify::{is_blank, is_date_like};

/// A data row together with its index in the raw input.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyRow {
    pub source_row: usize,
    pub cells: RawRow,
}

impl BodyRow {
    pub fn new(source_row: usize, cells: RawRow) -> Self {
        Self { source_row, cells }
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| is_blank(c))
    }
}

/// Result of splitting raw rows into the canonical header and the body.
#[derive(Debug, Clone, Default)]
pub struct HeaderScan {
    /// Merged header cells, `None` when no row met the header rule.
    pub header: Option<RawRow>,
    pub header_row: Option<usize>,
    pub body: Vec<BodyRow>,
}

/// Finds header rows by counting the declared roles their cells mention.
pub struct HeaderLocator<'a> {
    profile: &'a BankProfile,
}

impl<'a> HeaderLocator<'a> {
    pub fn new(profile: &'a BankProfile) -> Self {
        Self { profile }
    }

    /// Declared roles claimed by the row's cells. Each cell supplies at most
    /// one role, chosen the same way the schema resolver chooses it.
    pub fn matched_roles(&self, cells: &[String]) -> HashSet<ColumnRole> {
        self.profile
            .assign_roles(cells)
            .into_iter()
            .map(|(_, role)| role)
            .collect()
    }

    /// True when a single row satisfies the header rule on its own.
    pub fn is_header_row(&self, cells: &[String]) -> bool {
        !cells.iter().any(|c| is_date_like(c)) && self.meets_rule(&self.matched_roles(cells))
    }

    fn meets_rule(&self, roles: &HashSet<ColumnRole>) -> bool {
        let rule = &self.profile.header;
        if !roles.contains(&ColumnRole::Date) || roles.len() < rule.min_roles {
            return false;
        }
        match rule.require_leading {
            Some(n) => self.profile.columns.iter().take(n).all(|s| roles.contains(&s.role)),
            None => true,
        }
    }

    /// A lone row left over from a reflowed or split header block. Every
    /// non-blank cell must name a role, with the date role in the canonical
    /// header's date column.
    fn is_residual_header(&self, cells: &[String], date_col: Option<usize>) -> bool {
        if cells.iter().any(|c| is_date_like(c)) {
            return false;
        }
        let pairs = self.profile.assign_roles(cells);
        let filled = cells.iter().filter(|c| !is_blank(c)).count();
        pairs.len() >= 2
            && pairs.len() == filled
            && date_col.is_some_and(|col| pairs.contains(&(col, ColumnRole::Date)))
    }

    /// The merged header starting at `start`, if the block there is one.
    fn header_block_at(&self, rows: &[RawRow], start: usize) -> Option<RawRow> {
        let n = self.profile.header.block_rows;
        let block = rows.get(start..start + n)?;
        if block.iter().flatten().any(|c| is_date_like(c)) {
            return None;
        }
        if n > 1 && block.iter().any(|row| self.matched_roles(row).is_empty()) {
            return None;
        }
        let merged = merge_block(block);
        self.meets_rule(&self.matched_roles(&merged)).then_some(merged)
    }

    fn is_trailer(&self, cells: &[String]) -> bool {
        if self.profile.trailer_keywords.is_empty() {
            return false;
        }
        let text = cells.join(" ").to_lowercase();
        self.profile
            .trailer_keywords
            .iter()
            .any(|k| text.contains(&k.to_lowercase()))
    }

    /// Keeps the first header, drops preamble rows before it, every repeated
    /// header after it, and the trailer block when one is configured.
    pub fn scan(&self, rows: &[RawRow], report: &mut ChangeReport) -> HeaderScan {
        let n = self.profile.header.block_rows;
        let first = (0..rows.len()).find_map(|i| self.header_block_at(rows, i).map(|h| (i, h)));

        let mut scan = HeaderScan::default();
        let mut i = match first {
            Some((at, merged)) => {
                for row in 0..at {
                    report.push(ChangeEvent::PreambleSkipped { row });
                }
                tracing::debug!(row = at, rows = n, "Header located");
                report.push(ChangeEvent::HeaderLocated { row: at, rows: n });
                scan.header = Some(merged);
                scan.header_row = Some(at);
                at + n
            }
            None => 0,
        };

        let date_col = scan.header.as_deref().and_then(|h| {
            self.profile
                .assign_roles(h)
                .into_iter()
                .find_map(|(col, role)| (role == ColumnRole::Date).then_some(col))
        });

        while i < rows.len() {
            if scan.header.is_some() && self.header_block_at(rows, i).is_some() {
                tracing::debug!(row = i, "Duplicate header removed");
                report.push(ChangeEvent::DuplicateHeaderRemoved { row: i, rows: n });
                i += n;
                continue;
            }
            if n > 1 && self.is_residual_header(&rows[i], date_col) {
                tracing::debug!(row = i, "Residual header row removed");
                report.push(ChangeEvent::DuplicateHeaderRemoved { row: i, rows: 1 });
                i += 1;
                continue;
            }
            if self.is_trailer(&rows[i]) {
                let dropped = rows.len() - i;
                tracing::debug!(row = i, rows = dropped, "Trailer dropped");
                report.push(ChangeEvent::TrailerDropped { row: i, rows: dropped });
                break;
            }
            scan.body.push(BodyRow::new(i, rows[i].clone()));
            i += 1;
        }
        scan
    }
}

/// Space-joins the non-blank cells of each column across the block.
fn merge_block(block: &[RawRow]) -> RawRow {
    let width = block.iter().map(Vec::len).max().unwrap_or(0);
    (0..width)
        .map(|col| {
            block
                .iter()
                .filter_map(|row| row.get(col))
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
