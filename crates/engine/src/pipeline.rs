use thiserror::Error;

use rowmend_core::{
    BankProfile, BankVariant, ChangeEvent, ChangeReport, NormalizedTable, ProfileError, RawRow,
};

use crate::classify::is_blank;
use crate::consolidate::{split_date_prefixes, Consolidator};
use crate::header::{HeaderLocator, HeaderScan};
use crate::normalize::Normalizer;
use crate::realign::{remove_leading_blank_columns, Realigner};
use crate::schema::{body_width, conform_rows, SchemaResolver};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Input contains no non-blank rows")]
    EmptyInput,
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("Invalid profile: {0}")]
    InvalidProfile(#[from] ProfileError),
    #[error("Repair '{repair}' did not settle row {row}")]
    RepairNoOp { repair: &'static str, row: usize },
}

/// The rebuilt table and the record of every edit made to get there.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub table: NormalizedTable,
    pub report: ChangeReport,
}

/// Orchestrates: header scan → column cleanup → layout → consolidation →
/// realignment → normalization.
///
/// Holds only the profile, so one engine can serve many tables, including
/// from several threads at once.
#[derive(Debug, Clone)]
pub struct StatementEngine {
    profile: BankProfile,
}

impl StatementEngine {
    pub fn new(profile: BankProfile) -> Result<Self, EngineError> {
        profile.validate()?;
        Ok(Self { profile })
    }

    pub fn for_bank(variant: BankVariant) -> Result<Self, EngineError> {
        Self::new(variant.profile())
    }

    pub fn profile(&self) -> &BankProfile {
        &self.profile
    }

    pub fn run(&self, rows: &[RawRow]) -> Result<EngineOutput, EngineError> {
        if rows.iter().flatten().all(|c| is_blank(c)) {
            return Err(EngineError::EmptyInput);
        }
        let profile = &self.profile;
        let mut report = ChangeReport::new();

        let HeaderScan { header, mut body, .. } = HeaderLocator::new(profile).scan(rows, &mut report);

        let resolver = SchemaResolver::new(profile);
        let layout = match header {
            Some(mut header) => {
                if profile.repairs.leading_blank_columns {
                    remove_leading_blank_columns(&mut header, &mut body, &mut report);
                }
                resolver.resolve(&header, body_width(&body))?
            }
            None if profile.fallback_to_declared => {
                tracing::warn!(profile = %profile.name, "No header row found, using declared column order");
                report.push(ChangeEvent::FallbackSchemaUsed);
                resolver.fallback(body_width(&body))?
            }
            None => {
                return Err(EngineError::SchemaMismatch(format!(
                    "no header row matches profile '{}'",
                    profile.name
                )))
            }
        };

        conform_rows(&layout, &mut body, &mut report);
        if profile.repairs.split_date_prefix {
            split_date_prefixes(&layout, &mut body, &mut report);
        }

        let rows = Consolidator::new(&layout, &profile.repairs).consolidate(body, &mut report);
        let rows = Realigner::new(&layout, &profile.repairs).realign(rows, &mut report)?;
        let table = Normalizer::new(profile, &layout).normalize(rows, &mut report);

        let summary = report.summary();
        tracing::info!(
            profile = %profile.name,
            records = table.len(),
            merged = summary.rows_merged,
            duplicate_headers = summary.duplicate_headers_removed,
            orphans = summary.orphan_rows_discarded,
            repairs = summary.columns_shifted + summary.balance_rotations + summary.drcr_splits,
            "Statement rebuilt"
        );

        Ok(EngineOutput { table, report })
    }
}
