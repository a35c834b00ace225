pub mod amount;
pub mod profile;
pub mod record;
pub mod report;
pub mod role;

pub use amount::{parse_amount, AmountError, DrCr, ParsedAmount};
pub use profile::{
    BankProfile, BankVariant, ColumnSpec, EmptyAmountPolicy, HeaderRule, ProfileError,
    RepairModes, ScrubRule,
};
pub use record::{Column, FieldValue, NormalizedTable, RawRow, TransactionRecord};
pub use report::{ChangeEvent, ChangeReport, ReportSummary};
pub use role::ColumnRole;
