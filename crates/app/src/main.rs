use anyhow::Result;
use clap::{Parser, ValueEnum};
use rowmend_core::BankVariant;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "rowmend",
    version,
    about = "Rebuild clean transaction tables from rows extracted out of bank statements"
)]
pub struct Cli {
    /// Extracted statement table as CSV (any width, no header assumed)
    pub input: PathBuf,

    /// Built-in bank layout (canara, canara-current, hdfc, kotak, generic)
    #[arg(long, conflicts_with = "profile")]
    pub bank: Option<BankVariant>,

    /// TOML profile describing a custom layout
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Write the change report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Column labels followed by one row per transaction
    Csv,
    /// One typed statement line per row
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    commands::rebuild(&cli)
}
