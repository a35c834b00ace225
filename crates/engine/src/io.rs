use std::io::{Read, Write};
use thiserror::Error;

use rowmend_core::{NormalizedTable, RawRow};

use crate::lines::StatementLine;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reads extractor output as raw text rows. No header handling and rows may
/// have any width.
pub fn read_raw_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, IoError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }
    Ok(rows)
}

/// Writes column labels, then one line per record.
pub fn write_table<W: Write>(writer: W, table: &NormalizedTable) -> Result<(), IoError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.labels())?;
    for record in &table.records {
        wtr.write_record(record.fields.iter().map(|f| f.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes one JSON object per line.
pub fn write_lines_json<W: Write>(mut writer: W, lines: &[StatementLine]) -> Result<(), IoError> {
    for line in lines {
        serde_json::to_writer(&mut writer, line)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
