use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical meaning of a statement column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Date,
    ValueDate,
    Reference,
    Description,
    BranchCode,
    Debit,
    Credit,
    Balance,
    /// Unrecognized header text or an extra trailing column.
    Other,
}

/// Fixed tie-break order used when one header cell matches two roles with
/// keywords of equal length. Earlier wins.
pub const ROLE_PRIORITY: &[ColumnRole] = &[
    ColumnRole::Date,
    ColumnRole::ValueDate,
    ColumnRole::Reference,
    ColumnRole::Debit,
    ColumnRole::Credit,
    ColumnRole::Balance,
    ColumnRole::BranchCode,
    ColumnRole::Description,
];

impl ColumnRole {
    /// Debit, Credit and Balance hold money.
    pub fn is_amount(self) -> bool {
        matches!(self, ColumnRole::Debit | ColumnRole::Credit | ColumnRole::Balance)
    }

    /// Position in [`ROLE_PRIORITY`]; `Other` sorts last.
    pub fn priority_rank(self) -> usize {
        ROLE_PRIORITY
            .iter()
            .position(|r| *r == self)
            .unwrap_or(ROLE_PRIORITY.len())
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::Date => write!(f, "date"),
            ColumnRole::ValueDate => write!(f, "value_date"),
            ColumnRole::Reference => write!(f, "reference"),
            ColumnRole::Description => write!(f, "description"),
            ColumnRole::BranchCode => write!(f, "branch_code"),
            ColumnRole::Debit => write!(f, "debit"),
            ColumnRole::Credit => write!(f, "credit"),
            ColumnRole::Balance => write!(f, "balance"),
            ColumnRole::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for ColumnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "date" => Ok(ColumnRole::Date),
            "value_date" => Ok(ColumnRole::ValueDate),
            "reference" | "ref" => Ok(ColumnRole::Reference),
            "description" | "narration" => Ok(ColumnRole::Description),
            "branch_code" => Ok(ColumnRole::BranchCode),
            "debit" => Ok(ColumnRole::Debit),
            "credit" => Ok(ColumnRole::Credit),
            "balance" => Ok(ColumnRole::Balance),
            "other" => Ok(ColumnRole::Other),
            other => Err(format!("Unknown column role: '{other}'")),
        }
    }
}
