use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use rowmend_core::{BankProfile, BankVariant, ChangeEvent, ReportSummary};
use rowmend_engine::{read_raw_rows, statement_lines, write_lines_json, write_table, StatementEngine};

use crate::{Cli, OutputFormat};

#[derive(Serialize)]
struct ReportFile<'a> {
    input: String,
    profile: &'a str,
    records: usize,
    summary: ReportSummary,
    events: &'a [ChangeEvent],
}

/// Resolves the profile from `--profile` or `--bank`, falling back to the
/// generic layout.
pub fn load_profile(profile: Option<&Path>, bank: Option<BankVariant>) -> Result<BankProfile> {
    match profile {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading profile {}", path.display()))?;
            BankProfile::from_toml(&text).with_context(|| format!("loading profile {}", path.display()))
        }
        None => Ok(bank.unwrap_or(BankVariant::Generic).profile()),
    }
}

pub fn rebuild(cli: &Cli) -> Result<()> {
    let profile = load_profile(cli.profile.as_deref(), cli.bank)?;
    let engine = StatementEngine::new(profile)?;
    tracing::info!("Using profile '{}'", engine.profile().name);

    let file = File::open(&cli.input).with_context(|| format!("opening {}", cli.input.display()))?;
    let rows = read_raw_rows(BufReader::new(file))
        .with_context(|| format!("parsing {}", cli.input.display()))?;
    tracing::info!("Read {} rows from {}", rows.len(), cli.input.display());

    let out = engine
        .run(&rows)
        .with_context(|| format!("rebuilding {}", cli.input.display()))?;

    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    match cli.format {
        OutputFormat::Csv => write_table(writer, &out.table)?,
        OutputFormat::Json => write_lines_json(writer, &statement_lines(&out.table))?,
    }

    if let Some(path) = &cli.report {
        let report = ReportFile {
            input: cli.input.display().to_string(),
            profile: &engine.profile().name,
            records: out.table.len(),
            summary: out.report.summary(),
            events: out.report.events(),
        };
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &report)
            .with_context(|| format!("writing report {}", path.display()))?;
        tracing::info!("Change report written to {}", path.display());
    }
    Ok(())
}
