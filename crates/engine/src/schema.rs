use std::collections::HashSet;

use rowmend_core::{BankProfile, ChangeEvent, ChangeReport, Column, ColumnRole};

use crate::header::BodyRow;
use crate::pipeline::EngineError;

/// The resolved column list for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub columns: Vec<Column>,
    /// Columns backed by input cells. Synthesized columns follow them.
    pub observed: usize,
    date: usize,
}

impl Layout {
    fn new(columns: Vec<Column>, observed: usize) -> Result<Self, EngineError> {
        let date = columns
            .iter()
            .position(|c| c.role == ColumnRole::Date && !c.synthesized)
            .ok_or_else(|| EngineError::SchemaMismatch("no date column in the input".into()))?;
        Ok(Self { columns, observed, date })
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn date_index(&self) -> usize {
        self.date
    }

    pub fn index_of(&self, role: ColumnRole) -> Option<usize> {
        if role == ColumnRole::Other {
            return None;
        }
        self.columns.iter().position(|c| c.role == role)
    }

    pub fn role_at(&self, index: usize) -> ColumnRole {
        self.columns.get(index).map_or(ColumnRole::Other, |c| c.role)
    }
}

/// Maps header cells to declared roles.
pub struct SchemaResolver<'a> {
    profile: &'a BankProfile,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(profile: &'a BankProfile) -> Self {
        Self { profile }
    }

    fn observed_width(&self, width: usize) -> usize {
        match self.profile.max_columns {
            Some(max) => width.min(max),
            None => width,
        }
    }

    /// Builds the layout from a located header.
    pub fn resolve(&self, header: &[String], body_width: usize) -> Result<Layout, EngineError> {
        let width = self.observed_width(header.len().max(body_width));
        let mut assigned = HashSet::new();
        let mut columns = Vec::with_capacity(width);

        for i in 0..width {
            let cell = header.get(i).map(|c| c.trim()).unwrap_or("");
            let column = match self.profile.best_match(cell, &assigned) {
                Some(spec) => {
                    assigned.insert(spec.role);
                    Column::new(spec.label.clone(), spec.role)
                }
                None if cell.is_empty() => Column::new(format!("Extra_{i}"), ColumnRole::Other),
                None => Column::new(cell, ColumnRole::Other),
            };
            columns.push(column);
        }

        if !assigned.contains(&ColumnRole::Date) {
            return Err(EngineError::SchemaMismatch(format!(
                "header [{}] has no column matching the date keywords of profile '{}'",
                header.join(", "),
                self.profile.name
            )));
        }
        self.synthesize_missing(&mut columns, &assigned);
        Layout::new(columns, width)
    }

    /// Positional layout used when no header row was found.
    pub fn fallback(&self, body_width: usize) -> Result<Layout, EngineError> {
        let width = self.observed_width(body_width);
        let mut assigned = HashSet::new();
        let mut columns: Vec<Column> = (0..width)
            .map(|i| match self.profile.columns.get(i) {
                Some(spec) => {
                    assigned.insert(spec.role);
                    Column::new(spec.label.clone(), spec.role)
                }
                None => Column::new(format!("Extra_{i}"), ColumnRole::Other),
            })
            .collect();
        if !assigned.contains(&ColumnRole::Date) {
            return Err(EngineError::SchemaMismatch(format!(
                "rows are {body_width} cells wide, too narrow for the date column of profile '{}'",
                self.profile.name
            )));
        }
        self.synthesize_missing(&mut columns, &assigned);
        Layout::new(columns, width)
    }

    fn synthesize_missing(&self, columns: &mut Vec<Column>, assigned: &HashSet<ColumnRole>) {
        for spec in &self.profile.columns {
            if !assigned.contains(&spec.role) {
                tracing::debug!(role = %spec.role, "Declared column missing from input, synthesized");
                columns.push(Column::synthesized(spec.label.clone(), spec.role));
            }
        }
    }
}

/// Pads or truncates every body row to the observed width, then extends it
/// with blanks for the synthesized columns.
pub fn conform_rows(layout: &Layout, rows: &mut [BodyRow], report: &mut ChangeReport) {
    for row in rows.iter_mut() {
        let from = row.cells.len();
        if from < layout.observed {
            report.push(ChangeEvent::RowPadded { row: row.source_row, from, to: layout.observed });
        } else if from > layout.observed {
            tracing::debug!(row = row.source_row, from, to = layout.observed, "Row truncated");
            report.push(ChangeEvent::RowTruncated { row: row.source_row, from, to: layout.observed });
        }
        row.cells.resize(layout.width(), String::new());
    }
}

/// Widest row in the body.
pub fn body_width(rows: &[BodyRow]) -> usize {
    rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
}
