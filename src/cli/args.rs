//! Command line argument parsing for the lexstat CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::TokenizerKind;

/// lexstat - corpus frequency and dispersion statistics
#[derive(Parser, Debug, Clone)]
#[command(name = "lexstat")]
#[command(about = "Incremental term-document counting and dispersion statistics")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct LexstatArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl LexstatArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Count a text file into a corpus store
    Ingest(IngestArgs),

    /// Show headline statistics of a store
    Stats(StatsArgs),

    /// Look up the corpus frequency of tokens
    Lookup(LookupArgs),

    /// List vocabulary counts
    Vocab(VocabArgs),

    /// Compute dispersion statistics (frozen stores only)
    Dispersion(DispersionArgs),
}

/// How documents are counted during ingestion.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    /// Sparse term-document matrix, frozen at the end
    Frozen,
    /// Running token tally with duplicate-pass detection
    Tally,
}

/// Arguments for ingesting a text file
#[derive(Parser, Debug, Clone)]
pub struct IngestArgs {
    /// Input file, one document per line
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Store directory
    #[arg(value_name = "STORE")]
    pub store: PathBuf,

    /// Counting mode
    #[arg(long, default_value = "frozen")]
    pub mode: IngestMode,

    /// Lowercase tokens before counting
    #[arg(long)]
    pub lowercase: bool,

    /// Only count the first N documents
    #[arg(long = "n-train", value_name = "N")]
    pub n_train: Option<usize>,

    /// Accumulator configuration file (JSON); flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Tokenizer: whitespace, unicode or regex
    #[arg(long, default_value = "whitespace")]
    pub tokenizer: TokenizerKind,

    /// Token pattern for the regex tokenizer
    #[arg(long, value_name = "RE")]
    pub pattern: Option<String>,

    /// Replay the input N times (tally mode)
    #[arg(long, default_value = "1", value_name = "N")]
    pub passes: usize,

    /// Read one JSON object per line
    #[arg(long)]
    pub jsonl: bool,

    /// Field holding the document text in JSON lines
    #[arg(long, default_value = "text", value_name = "NAME")]
    pub field: String,
}

/// Arguments for showing statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Store directory
    #[arg(value_name = "STORE")]
    pub store: PathBuf,
}

/// Arguments for token lookup
#[derive(Parser, Debug, Clone)]
pub struct LookupArgs {
    /// Store directory
    #[arg(value_name = "STORE")]
    pub store: PathBuf,

    /// Tokens to look up
    #[arg(value_name = "TOKEN", required = true)]
    pub tokens: Vec<String>,
}

/// Arguments for listing the vocabulary
#[derive(Parser, Debug, Clone)]
pub struct VocabArgs {
    /// Store directory
    #[arg(value_name = "STORE")]
    pub store: PathBuf,

    /// Merge case variants
    #[arg(long)]
    pub lowercase: bool,

    /// Drop English stop words
    #[arg(long)]
    pub exclude_stopwords: bool,

    /// Drop punctuation-only tokens
    #[arg(long)]
    pub exclude_punctuation: bool,

    /// Only show the N most frequent tokens
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,
}

/// Arguments for dispersion statistics
#[derive(Parser, Debug, Clone)]
pub struct DispersionArgs {
    /// Store directory
    #[arg(value_name = "STORE")]
    pub store: PathBuf,

    /// Restrict to these tokens
    #[arg(long = "token", value_name = "T")]
    pub tokens: Vec<String>,

    /// Only show the N most frequent tokens
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity() {
        let args = LexstatArgs::parse_from(["lexstat", "stats", "store"]);
        assert_eq!(args.verbosity(), 1);

        let args = LexstatArgs::parse_from(["lexstat", "-vvv", "stats", "store"]);
        assert_eq!(args.verbosity(), 3);

        let args = LexstatArgs::parse_from(["lexstat", "-q", "-vv", "stats", "store"]);
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_parse_ingest() {
        let args = LexstatArgs::parse_from([
            "lexstat",
            "-f",
            "json",
            "ingest",
            "docs.txt",
            "store",
            "--mode",
            "tally",
            "--lowercase",
            "--n-train",
            "5",
            "--tokenizer",
            "regex",
            "--pattern",
            "[a-z]+",
            "--passes",
            "3",
        ]);
        assert_eq!(args.output_format, OutputFormat::Json);
        match args.command {
            Command::Ingest(ingest) => {
                assert_eq!(ingest.mode, IngestMode::Tally);
                assert!(ingest.lowercase);
                assert_eq!(ingest.n_train, Some(5));
                assert_eq!(ingest.tokenizer, TokenizerKind::Regex);
                assert_eq!(ingest.pattern.as_deref(), Some("[a-z]+"));
                assert_eq!(ingest.passes, 3);
                assert!(!ingest.jsonl);
                assert_eq!(ingest.field, "text");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_dispersion_tokens() {
        let args = LexstatArgs::parse_from([
            "lexstat",
            "dispersion",
            "store",
            "--token",
            "a",
            "--token",
            "b",
        ]);
        match args.command {
            Command::Dispersion(d) => {
                assert_eq!(d.tokens, vec!["a", "b"]);
                assert_eq!(d.top, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
