use std::path::PathBuf;

use clap::Args;
use ncdrank_core::{CodecKind, CompressionLevel, DuplicatePolicy};

#[derive(Debug, Clone, Default, Args)]
pub struct CompressorArgs {
    /// Compressor codec: gzip, zlib or deflate.
    #[arg(long)]
    pub codec: Option<CodecKind>,
    /// Compression level, 0 through 9.
    #[arg(long)]
    pub level: Option<CompressionLevel>,
}

#[derive(Debug, Args)]
pub struct RankArgs {
    #[arg(allow_hyphen_values = true)]
    pub query: String,
    /// Candidate text; repeat for more than one.
    #[arg(short = 'c', long = "candidate", value_name = "TEXT", allow_hyphen_values = true)]
    pub candidates: Vec<String>,
    /// One candidate per line, or JSON strings / `{"text": ...}` for `.jsonl`.
    #[arg(long, value_name = "PATH")]
    pub candidates_file: Option<PathBuf>,
    /// Read additional candidates from stdin, one per line.
    #[arg(long, default_value_t = false)]
    pub stdin: bool,
    /// Number of results; zero or negative returns nothing.
    #[arg(short = 'k', long, allow_negative_numbers = true)]
    pub top_k: Option<i64>,
    #[arg(long)]
    pub duplicates: Option<DuplicatePolicy>,
    #[arg(long)]
    pub threads: Option<usize>,
    /// Print index, score and compressed lengths per result.
    #[arg(long, default_value_t = false)]
    pub detailed: bool,
    /// Clip result text to this many characters (with `--detailed`).
    #[arg(long, requires = "detailed")]
    pub preview_chars: Option<usize>,
    #[command(flatten)]
    pub compressor: CompressorArgs,
}

#[derive(Debug, Args)]
pub struct ScoreArgs {
    #[arg(allow_hyphen_values = true)]
    pub query: String,
    #[arg(allow_hyphen_values = true)]
    pub candidate: String,
    #[command(flatten)]
    pub compressor: CompressorArgs,
}
