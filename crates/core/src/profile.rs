use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use super::role::ColumnRole;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Failed to parse profile TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid profile '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

/// Lowercases and collapses whitespace so header text compares stably.
pub fn normalize_header_text(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A declared column: its role, the label used in output, and the header
/// keywords that identify it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnSpec {
    pub role: ColumnRole,
    pub label: String,
    /// Synonyms matched case-insensitively as substrings. Falls back to the
    /// label when empty.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Words that disqualify a cell for this role (e.g. `value` for `date`).
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ColumnSpec {
    pub fn new(role: ColumnRole, label: &str, keywords: &[&str]) -> Self {
        ColumnSpec {
            role,
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            exclude: Vec::new(),
        }
    }

    pub fn excluding(mut self, words: &[&str]) -> Self {
        self.exclude = words.iter().map(|w| w.to_string()).collect();
        self
    }

    /// Length of the longest keyword contained in `cell`, or `None` when no
    /// keyword matches or an excluded word is present.
    pub fn match_len(&self, cell: &str) -> Option<usize> {
        let text = normalize_header_text(cell);
        if text.is_empty() {
            return None;
        }
        if self
            .exclude
            .iter()
            .any(|w| text.contains(&normalize_header_text(w)))
        {
            return None;
        }
        let label_kw;
        let keywords: &[String] = if self.keywords.is_empty() {
            label_kw = [self.label.clone()];
            &label_kw
        } else {
            &self.keywords
        };
        keywords
            .iter()
            .map(|k| normalize_header_text(k))
            .filter(|k| !k.is_empty() && text.contains(k.as_str()))
            .map(|k| k.len())
            .max()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeaderRule {
    /// Minimum number of distinct declared roles a header must mention.
    #[serde(default = "default_min_roles")]
    pub min_roles: usize,
    /// When set, the first `n` declared roles must all be present.
    #[serde(default)]
    pub require_leading: Option<usize>,
    /// Physical rows that make up one logical header.
    #[serde(default = "default_block_rows")]
    pub block_rows: usize,
}

impl Default for HeaderRule {
    fn default() -> Self {
        Self {
            min_roles: default_min_roles(),
            require_leading: None,
            block_rows: default_block_rows(),
        }
    }
}

fn default_min_roles() -> usize {
    3
}

fn default_block_rows() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_extra_ratio() -> f64 {
    0.8
}

/// Column repairs, each independently toggleable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RepairModes {
    /// Column whose emptiness means the extractor shifted the row.
    #[serde(default)]
    pub anchor_shift: Option<ColumnRole>,
    /// Rotate debit → credit → balance when the balance landed in the credit slot.
    #[serde(default)]
    pub balance_rotation: bool,
    /// Delete leading blank spans under unnamed header cells.
    #[serde(default)]
    pub leading_blank_columns: bool,
    /// Split `DD-MM-YYYY <ref> <text>` date cells.
    #[serde(default)]
    pub split_date_prefix: bool,
    /// Split `amount(Dr) amount(Cr)` cells in the debit column.
    #[serde(default)]
    pub split_drcr: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmptyAmountPolicy {
    Zero,
    #[default]
    Null,
}

/// Canonicalizes a noisy field that starts with `prefix` to just `prefix`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrubRule {
    pub role: ColumnRole,
    pub prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BankProfile {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub header: HeaderRule,
    #[serde(default)]
    pub repairs: RepairModes,
    #[serde(default)]
    pub empty_amount: EmptyAmountPolicy,
    #[serde(default)]
    pub scrub: Vec<ScrubRule>,
    /// Rows from the first one mentioning any of these onward are dropped.
    #[serde(default)]
    pub trailer_keywords: Vec<String>,
    #[serde(default)]
    pub max_columns: Option<usize>,
    #[serde(default)]
    pub min_filled_fields: Option<usize>,
    #[serde(default = "default_extra_ratio")]
    pub extra_column_empty_ratio: f64,
    /// Use the declared columns positionally when no header is found.
    #[serde(default = "default_true")]
    pub fallback_to_declared: bool,
}

impl BankProfile {
    /// A profile with default rules for the given columns.
    pub fn new(name: &str, columns: Vec<ColumnSpec>) -> Self {
        BankProfile {
            name: name.to_string(),
            columns,
            header: HeaderRule::default(),
            repairs: RepairModes::default(),
            empty_amount: EmptyAmountPolicy::default(),
            scrub: Vec::new(),
            trailer_keywords: Vec::new(),
            max_columns: None,
            min_filled_fields: None,
            extra_column_empty_ratio: default_extra_ratio(),
            fallback_to_declared: true,
        }
    }

    pub fn from_toml(toml_content: &str) -> Result<Self, ProfileError> {
        let profile: BankProfile = toml::from_str(toml_content)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn preset(variant: BankVariant) -> Self {
        match variant {
            BankVariant::Canara => canara(),
            BankVariant::CanaraCurrent => canara_current(),
            BankVariant::Hdfc => hdfc(),
            BankVariant::Kotak => kotak(),
            BankVariant::Generic => generic(),
        }
    }

    pub fn spec(&self, role: ColumnRole) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.role == role)
    }

    pub fn declares(&self, role: ColumnRole) -> bool {
        self.spec(role).is_some()
    }

    /// The declared column outside `assigned` that best matches `cell`:
    /// longest keyword first, then the fixed role priority.
    pub fn best_match(&self, cell: &str, assigned: &HashSet<ColumnRole>) -> Option<&ColumnSpec> {
        self.columns
            .iter()
            .filter(|spec| !assigned.contains(&spec.role))
            .filter_map(|spec| spec.match_len(cell).map(|len| (len, spec)))
            .max_by(|(la, a), (lb, b)| {
                la.cmp(lb)
                    .then_with(|| b.role.priority_rank().cmp(&a.role.priority_rank()))
            })
            .map(|(_, spec)| spec)
    }

    /// Assigns header cells to declared roles left to right, each role at
    /// most once. Returns `(cell index, role)` pairs.
    pub fn assign_roles(&self, cells: &[String]) -> Vec<(usize, ColumnRole)> {
        let mut assigned = HashSet::new();
        let mut pairs = Vec::new();
        for (i, cell) in cells.iter().enumerate() {
            if let Some(spec) = self.best_match(cell, &assigned) {
                assigned.insert(spec.role);
                pairs.push((i, spec.role));
            }
        }
        pairs
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        let invalid = |reason: String| ProfileError::Invalid {
            name: self.name.clone(),
            reason,
        };

        if self.columns.is_empty() {
            return Err(invalid("no columns declared".into()));
        }
        if !self.declares(ColumnRole::Date) {
            return Err(invalid("a date column is required".into()));
        }

        let mut seen = HashSet::new();
        for spec in &self.columns {
            if spec.role == ColumnRole::Other {
                return Err(invalid(format!("column '{}' uses the reserved role 'other'", spec.label)));
            }
            if !seen.insert(spec.role) {
                return Err(invalid(format!("role '{}' declared twice", spec.role)));
            }
        }

        if self.header.block_rows == 0 {
            return Err(invalid("header.block_rows must be at least 1".into()));
        }
        if self.header.min_roles == 0 {
            return Err(invalid("header.min_roles must be at least 1".into()));
        }
        if let Some(n) = self.header.require_leading {
            if n > self.columns.len() {
                return Err(invalid(format!(
                    "header.require_leading = {n} exceeds the {} declared columns",
                    self.columns.len()
                )));
            }
        }

        if let Some(anchor) = self.repairs.anchor_shift {
            if anchor == ColumnRole::Date || anchor.is_amount() {
                return Err(invalid(format!("'{anchor}' cannot be a shift anchor")));
            }
            if !self.declares(anchor) {
                return Err(invalid(format!("shift anchor '{anchor}' is not a declared column")));
            }
        }
        if self.repairs.balance_rotation
            && ![ColumnRole::Debit, ColumnRole::Credit, ColumnRole::Balance]
                .iter()
                .all(|r| self.declares(*r))
        {
            return Err(invalid("balance rotation needs debit, credit and balance columns".into()));
        }

        if !(0.0..=1.0).contains(&self.extra_column_empty_ratio) {
            return Err(invalid("extra_column_empty_ratio must be within 0..=1".into()));
        }
        if self.max_columns == Some(0) {
            return Err(invalid("max_columns must be at least 1".into()));
        }
        Ok(())
    }
}

// ── Bank presets ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BankVariant {
    /// Savings layout: Txn Date, Value Date, Cheque No., Description, Branch Code, Debit, Credit, Balance.
    Canara,
    /// Current-account layout: Date, Particulars, Withdrawals, Deposits, Balance.
    CanaraCurrent,
    Hdfc,
    Kotak,
    Generic,
}

impl BankVariant {
    pub const ALL: &'static [BankVariant] = &[
        BankVariant::Canara,
        BankVariant::CanaraCurrent,
        BankVariant::Hdfc,
        BankVariant::Kotak,
        BankVariant::Generic,
    ];

    pub fn profile(self) -> BankProfile {
        BankProfile::preset(self)
    }
}

impl fmt::Display for BankVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankVariant::Canara => write!(f, "canara"),
            BankVariant::CanaraCurrent => write!(f, "canara-current"),
            BankVariant::Hdfc => write!(f, "hdfc"),
            BankVariant::Kotak => write!(f, "kotak"),
            BankVariant::Generic => write!(f, "generic"),
        }
    }
}

impl std::str::FromStr for BankVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "canara" => Ok(BankVariant::Canara),
            "canara-current" | "canara2" => Ok(BankVariant::CanaraCurrent),
            "hdfc" => Ok(BankVariant::Hdfc),
            "kotak" => Ok(BankVariant::Kotak),
            "generic" => Ok(BankVariant::Generic),
            other => {
                let known: Vec<String> = BankVariant::ALL.iter().map(|v| v.to_string()).collect();
                Err(format!("Unknown bank '{other}' (available: {})", known.join(", ")))
            }
        }
    }
}

fn date_spec(label: &str, keywords: &[&str]) -> ColumnSpec {
    ColumnSpec::new(ColumnRole::Date, label, keywords).excluding(&["value"])
}

fn canara() -> BankProfile {
    let mut p = BankProfile::new(
        "canara",
        vec![
            date_spec("Txn Date", &["txn date", "date"]),
            ColumnSpec::new(ColumnRole::ValueDate, "Value Date", &["value date", "value dt"]),
            ColumnSpec::new(ColumnRole::Reference, "Cheque No.", &["cheque", "chq", "ref"]),
            ColumnSpec::new(ColumnRole::Description, "Description", &["description", "narration", "particular"]),
            ColumnSpec::new(ColumnRole::BranchCode, "Branch Code", &["branch code", "branch"]),
            ColumnSpec::new(ColumnRole::Debit, "Debit", &["debit", "withdrawal"]),
            ColumnSpec::new(ColumnRole::Credit, "Credit", &["credit", "deposit"]),
            ColumnSpec::new(ColumnRole::Balance, "Balance", &["balance"]),
        ],
    );
    p.header = HeaderRule {
        min_roles: 4,
        require_leading: Some(4),
        block_rows: 1,
    };
    p.scrub = vec![ScrubRule {
        role: ColumnRole::BranchCode,
        prefix: "33".into(),
    }];
    p
}

fn canara_current() -> BankProfile {
    let mut p = BankProfile::new(
        "canara-current",
        vec![
            date_spec("Date", &["date"]),
            ColumnSpec::new(ColumnRole::Description, "Particulars", &["particular", "narration", "description"]),
            ColumnSpec::new(ColumnRole::Debit, "Withdrawals", &["withdrawal", "debit"]),
            ColumnSpec::new(ColumnRole::Credit, "Deposits", &["deposit", "credit"]),
            ColumnSpec::new(ColumnRole::Balance, "Balance", &["balance"]),
        ],
    );
    p.repairs.leading_blank_columns = true;
    p
}

fn hdfc() -> BankProfile {
    let mut p = BankProfile::new(
        "hdfc",
        vec![
            date_spec("Date", &["date"]),
            ColumnSpec::new(ColumnRole::Description, "Narration", &["narration", "description", "particular"]),
            ColumnSpec::new(ColumnRole::Reference, "Chq./Ref.No.", &["chq", "ref", "cheque"]),
            ColumnSpec::new(ColumnRole::ValueDate, "Value Dt", &["value dt", "value date"]),
            ColumnSpec::new(ColumnRole::Debit, "Withdrawal Amt.", &["withdrawal", "debit"]),
            ColumnSpec::new(ColumnRole::Credit, "Deposit Amt.", &["deposit", "credit"]),
            ColumnSpec::new(ColumnRole::Balance, "Closing Balance", &["closing balance", "balance"]),
        ],
    );
    p.header.min_roles = 4;
    p.max_columns = Some(7);
    p.repairs.anchor_shift = Some(ColumnRole::Reference);
    p.repairs.balance_rotation = true;
    p.empty_amount = EmptyAmountPolicy::Zero;
    p
}

fn kotak() -> BankProfile {
    let mut p = BankProfile::new(
        "kotak",
        vec![
            date_spec("Date", &["date"]),
            ColumnSpec::new(ColumnRole::Description, "Narration", &["narration", "description"]),
            ColumnSpec::new(ColumnRole::Reference, "Chq/Ref No", &["chq", "ref"]),
            ColumnSpec::new(ColumnRole::Debit, "Withdrawal(Dr)", &["withdrawal", "(dr)"]),
            ColumnSpec::new(ColumnRole::Credit, "Deposit(Cr)", &["deposit", "(cr)"]),
            ColumnSpec::new(ColumnRole::Balance, "Balance", &["balance"]),
        ],
    );
    p.header.block_rows = 3;
    p.repairs.split_date_prefix = true;
    p.repairs.split_drcr = true;
    p.trailer_keywords = [
        "Statement Summary",
        "Opening Balance",
        "Total Withdrawal Amount",
        "Total Deposit Amount",
        "Closing Balance",
        "Withdrawal Count",
        "Deposit Count",
        "Any discrepancy",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    p.min_filled_fields = Some(2);
    p
}

fn generic() -> BankProfile {
    BankProfile::new(
        "generic",
        vec![
            date_spec("Date", &["txn date", "transaction date", "date"]),
            ColumnSpec::new(ColumnRole::ValueDate, "Value Date", &["value date", "value dt"]),
            ColumnSpec::new(ColumnRole::Reference, "Reference", &["reference", "ref", "chq", "cheque"]),
            ColumnSpec::new(
                ColumnRole::Description,
                "Description",
                &["description", "narration", "particular", "details", "remarks"],
            ),
            ColumnSpec::new(ColumnRole::Debit, "Debit", &["withdrawal", "debit"]),
            ColumnSpec::new(ColumnRole::Credit, "Credit", &["deposit", "credit"]),
            ColumnSpec::new(ColumnRole::Balance, "Balance", &["balance"]),
        ],
    )
}
