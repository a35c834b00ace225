use rust_decimal::Decimal;

use rowmend_core::{
    parse_amount, AmountError, BankProfile, ChangeEvent, ChangeReport, Column, ColumnRole, DrCr,
    EmptyAmountPolicy, FieldValue, NormalizedTable, TransactionRecord,
};

use crate::classify::{is_blank, is_date_like};
use crate::consolidate::ConsolidatedRow;
use crate::schema::Layout;

/// Turns consolidated text rows into typed records.
pub struct Normalizer<'a> {
    profile: &'a BankProfile,
    layout: &'a Layout,
}

impl<'a> Normalizer<'a> {
    pub fn new(profile: &'a BankProfile, layout: &'a Layout) -> Self {
        Self { profile, layout }
    }

    pub fn normalize(&self, rows: Vec<ConsolidatedRow>, report: &mut ChangeReport) -> NormalizedTable {
        let date_idx = self.layout.date_index();
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            if !row.cells.get(date_idx).is_some_and(|c| is_date_like(c)) {
                report.push(ChangeEvent::RecordWithoutDateDropped { row: row.source_row });
                continue;
            }
            if let Some(min) = self.profile.min_filled_fields {
                let filled = row.cells.iter().filter(|c| !is_blank(c)).count();
                if filled < min {
                    tracing::debug!(row = row.source_row, filled, min, "Sparse record dropped");
                    report.push(ChangeEvent::SparseRecordDropped { row: row.source_row });
                    continue;
                }
            }

            let fields = self
                .layout
                .columns
                .iter()
                .enumerate()
                .map(|(i, column)| {
                    let text = row.cells.get(i).map(String::as_str).unwrap_or("");
                    self.field(column, text, row.source_row, report)
                })
                .collect();
            records.push(TransactionRecord { source_row: row.source_row, fields });
        }

        let mut table = NormalizedTable { columns: self.layout.columns.clone(), records };
        self.drop_sparse_extra_columns(&mut table, report);
        table
    }

    fn field(&self, column: &Column, text: &str, row: usize, report: &mut ChangeReport) -> FieldValue {
        if let Some(rule) = self.profile.scrub.iter().find(|r| r.role == column.role) {
            if scrubbed(text.trim(), &rule.prefix) {
                return FieldValue::Text(rule.prefix.clone());
            }
        }

        match column.role {
            ColumnRole::Description => text_or_empty(&collapse_whitespace(text)),
            role if role.is_amount() => match self.amount(text, role) {
                Ok(value) => value,
                Err(raw) => {
                    tracing::warn!(row, column = %column.label, text = %raw, "Amount could not be parsed");
                    report.push(ChangeEvent::InvalidNumeric {
                        row,
                        column: column.label.clone(),
                        text: raw.clone(),
                    });
                    FieldValue::Invalid(raw)
                }
            },
            _ => text_or_empty(text.trim()),
        }
    }

    /// `Err` carries the raw text of an unparseable amount.
    fn amount(&self, text: &str, role: ColumnRole) -> Result<FieldValue, String> {
        if is_blank(text) {
            return Ok(self.empty_amount());
        }
        match parse_amount(text) {
            Ok(parsed) => {
                let value = match (role, parsed.side) {
                    (ColumnRole::Balance, Some(DrCr::Dr)) => -parsed.value.abs(),
                    _ => parsed.value,
                };
                Ok(FieldValue::Amount(value))
            }
            Err(AmountError::Empty) => Ok(self.empty_amount()),
            Err(AmountError::Invalid(raw)) => Err(raw),
        }
    }

    fn empty_amount(&self) -> FieldValue {
        match self.profile.empty_amount {
            EmptyAmountPolicy::Zero => FieldValue::Amount(Decimal::ZERO),
            EmptyAmountPolicy::Null => FieldValue::Empty,
        }
    }

    /// Removes `Other` columns that are empty in more than the configured
    /// share of records.
    fn drop_sparse_extra_columns(&self, table: &mut NormalizedTable, report: &mut ChangeReport) {
        let threshold = self.profile.extra_column_empty_ratio;
        let total = table.records.len();

        for i in (0..table.columns.len()).rev() {
            if table.columns[i].role != ColumnRole::Other {
                continue;
            }
            let empty = table.records.iter().filter(|r| r.fields[i].is_empty()).count();
            let ratio = if total == 0 { 1.0 } else { empty as f64 / total as f64 };
            if ratio <= threshold {
                continue;
            }
            let column = table.columns.remove(i);
            for record in table.records.iter_mut() {
                record.fields.remove(i);
            }
            tracing::debug!(column = %column.label, ratio, "Extra column dropped");
            report.push(ChangeEvent::ExtraColumnDropped { column: column.label, empty_ratio: ratio });
        }
    }
}

fn text_or_empty(text: &str) -> FieldValue {
    if is_blank(text) {
        FieldValue::Empty
    } else {
        FieldValue::Text(text.to_string())
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when `text` is `prefix`, an optional separator, then at least one
/// alphanumeric character followed by anything.
fn scrubbed(text: &str, prefix: &str) -> bool {
    let Some(rest) = text.strip_prefix(prefix) else {
        return false;
    };
    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix(['/', '\\', '-'])
        .unwrap_or(rest)
        .trim_start();
    rest.starts_with(|c: char| c.is_ascii_alphanumeric())
}
