use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Path to FASTA file with the base calls of the read
    pub fasta: PathBuf,

    /// Name of the FASTA record to use, defaults to the first one
    #[arg(long)]
    pub record: Option<String>,

    /// Tokens of the alignment row, defaults to the base calls
    #[arg(long)]
    pub row: Option<String>,

    /// Row column aligned with the left cut
    #[arg(long, default_value_t = 0)]
    pub anchor: isize,

    #[arg(long)]
    pub left_cut: Option<isize>,

    #[arg(long)]
    pub right_cut: Option<isize>,

    /// Path to a RON edit script to replay against the row
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Overrides the configured trace samples per base call
    #[arg(long)]
    pub samples_per_base: Option<usize>,

    /// Store the configuration in effect, overrides included
    #[arg(long)]
    pub save_config: bool,
}
