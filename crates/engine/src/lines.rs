use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rowmend_core::{ColumnRole, FieldValue, NormalizedTable, TransactionRecord};

use crate::classify::parse_date;

/// A record with its well-known columns typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    pub source_row: usize,
    pub date: NaiveDate,
    pub value_date: Option<NaiveDate>,
    pub description: String,
    pub reference: Option<String>,
    pub debit: Option<Decimal>,
    pub credit: Option<Decimal>,
    pub balance: Option<Decimal>,
}

/// Typed view of every record whose date is a real calendar date.
pub fn statement_lines(table: &NormalizedTable) -> Vec<StatementLine> {
    table
        .records
        .iter()
        .filter_map(|record| {
            let line = to_line(table, record);
            if line.is_none() {
                tracing::debug!(row = record.source_row, "Record date is not a calendar date, skipped");
            }
            line
        })
        .collect()
}

fn to_line(table: &NormalizedTable, record: &TransactionRecord) -> Option<StatementLine> {
    let text = |role| table.field(record, role).and_then(FieldValue::as_text);
    let amount = |role| table.field(record, role).and_then(FieldValue::as_amount);

    Some(StatementLine {
        source_row: record.source_row,
        date: parse_date(text(ColumnRole::Date)?)?,
        value_date: text(ColumnRole::ValueDate).and_then(parse_date),
        description: text(ColumnRole::Description).unwrap_or_default().to_string(),
        reference: text(ColumnRole::Reference).map(str::to_string),
        debit: amount(ColumnRole::Debit),
        credit: amount(ColumnRole::Credit),
        balance: amount(ColumnRole::Balance),
    })
}
