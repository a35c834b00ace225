use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::role::ColumnRole;

/// One physical row as produced by the table extractor.
pub type RawRow = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub label: String,
    pub role: ColumnRole,
    /// True when the role was declared by the profile but absent from the input.
    pub synthesized: bool,
}

impl Column {
    pub fn new(label: impl Into<String>, role: ColumnRole) -> Self {
        Column {
            label: label.into(),
            role,
            synthesized: false,
        }
    }

    pub fn synthesized(label: impl Into<String>, role: ColumnRole) -> Self {
        Column {
            label: label.into(),
            role,
            synthesized: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Amount(Decimal),
    Empty,
    /// Amount text that failed to parse, kept verbatim.
    Invalid(String),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            FieldValue::Amount(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) | FieldValue::Invalid(s) => write!(f, "{s}"),
            FieldValue::Amount(d) => write!(f, "{d}"),
            FieldValue::Empty => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Index of the input row that opened this transaction.
    pub source_row: usize,
    /// One value per column of the owning [`NormalizedTable`].
    pub fields: Vec<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTable {
    pub columns: Vec<Column>,
    pub records: Vec<TransactionRecord>,
}

impl NormalizedTable {
    pub fn column_index(&self, role: ColumnRole) -> Option<usize> {
        self.columns.iter().position(|c| c.role == role)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }

    pub fn field<'a>(&self, record: &'a TransactionRecord, role: ColumnRole) -> Option<&'a FieldValue> {
        self.column_index(role).and_then(|i| record.fields.get(i))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
