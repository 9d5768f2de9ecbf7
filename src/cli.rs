use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "edgelog")]
#[command(author, version, about = "Normalize apache2, nginx and envoy access logs into structured records")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Number of parallel threads (0 = auto-detect)
    #[arg(long, short = 'j', global = true, default_value = "0")]
    pub parallel: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse access logs and output structured records
    Parse(ParseArgs),

    /// Show the line pattern and time layout of a dialect
    Patterns(PatternsArgs),
}

#[derive(Args)]
pub struct ParseArgs {
    /// Log dialect (apache2, nginx, envoy)
    #[arg(long, short = 'f')]
    pub format: String,

    /// Log files to parse (supports glob patterns); stdin when empty or "-"
    pub files: Vec<PathBuf>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Parser options file (TOML)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Keep the raw time string in each record
    #[arg(long)]
    pub keep_time: bool,

    /// Report lines whose time does not parse instead of dropping them
    #[arg(long)]
    pub strict_time: bool,

    /// Offset for times without a zone (e.g. +09:00)
    #[arg(long)]
    pub default_offset: Option<String>,

    /// Echo non-matching lines to stderr
    #[arg(long)]
    pub unmatched: bool,

    /// Maximum number of records to output
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Print a summary to stderr when done
    #[arg(long)]
    pub summary: bool,

    /// Lines per parallel batch
    #[arg(long, default_value = "4096")]
    pub batch_size: usize,
}

#[derive(Args)]
pub struct PatternsArgs {
    /// Dialect to show; all dialects when omitted
    #[arg(long, short = 'f')]
    pub format: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON array of objects
    Json,
    /// Newline-delimited JSON
    Ndjson,
    /// Matched input lines, unchanged
    Raw,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Ndjson => write!(f, "ndjson"),
            OutputFormat::Raw => write!(f, "raw"),
        }
    }
}
