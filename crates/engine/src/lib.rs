pub mod classify;
pub mod consolidate;
pub mod header;
pub mod io;
pub mod lines;
pub mod normalize;
pub mod pipeline;
pub mod realign;
pub mod schema;

pub use consolidate::{ConsolidatedRow, Consolidator};
pub use header::{BodyRow, HeaderLocator, HeaderScan};
pub use io::{read_raw_rows, write_lines_json, write_table, IoError};
pub use lines::{statement_lines, StatementLine};
pub use normalize::Normalizer;
pub use pipeline::{EngineError, EngineOutput, StatementEngine};
pub use realign::Realigner;
pub use schema::{Layout, SchemaResolver};
