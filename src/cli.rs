use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    error::Result,
    formats::LoadOptions,
    io_utils::{self, DEFAULT_CSV_DELIMITER},
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Merge, clean, and inspect customer data files keyed by a shared identifier",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Discover, clean, and outer-join data files into one CSV keyed by customer
    Merge(MergeArgs),
    /// Report columns that need cleaning in a file or directory of CSV files
    Analyze(AnalyzeArgs),
    /// Clean a single file and write it as CSV
    Clean(CleanArgs),
    /// List the data files a merge of a directory would process
    Discover(DiscoverArgs),
    /// Preview the first few rows of any supported file in a formatted table
    Preview(PreviewArgs),
}

/// Read settings shared by every command that loads data files.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Delimiter of CSV inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of CSV inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

impl SourceArgs {
    pub fn load_options(&self, materialize: bool) -> Result<LoadOptions> {
        Ok(LoadOptions {
            materialize,
            delimiter: self.delimiter.unwrap_or(DEFAULT_CSV_DELIMITER),
            encoding: io_utils::resolve_encoding(self.input_encoding.as_deref())?,
        })
    }
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Directory whose supported files are merged
    #[arg(long = "dir", conflicts_with = "inputs")]
    pub dir: Option<PathBuf>,
    /// Explicit input file, in merge order (repeatable)
    #[arg(short = 'i', long = "input", action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Output CSV file (stdout if omitted or '-')
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Name of the join-key column in the merged output
    #[arg(long = "key")]
    pub key: Option<String>,
    /// Skip column cleaning before joining
    #[arg(long = "no-clean")]
    pub no_clean: bool,
    /// Additional file name to exclude from discovery (repeatable)
    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    pub exclude: Vec<String>,
    /// YAML pipeline configuration; command-line flags take precedence
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Read non-CSV sources directly instead of writing a sibling .csv first
    #[arg(long = "no-materialize")]
    pub no_materialize: bool,
    /// Log every skipped file together with the reason
    #[arg(long = "report")]
    pub report: bool,
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Single file to analyze (any supported format)
    #[arg(short = 'i', long = "input", conflicts_with = "dir", required_unless_present = "dir")]
    pub input: Option<PathBuf>,
    /// Directory whose CSV files are analyzed
    #[arg(long = "dir")]
    pub dir: Option<PathBuf>,
    /// Emit the full report as JSON
    #[arg(long)]
    pub json: bool,
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Input file (any supported format)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output CSV file (stdout if omitted or '-')
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Directory to scan
    #[arg(long = "dir")]
    pub dir: PathBuf,
    /// Additional file name to exclude (repeatable)
    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input file to preview (any supported format)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to show
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    #[command(flatten)]
    pub source: SourceArgs,
}

pub fn parse_delimiter(value: &str) -> std::result::Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
