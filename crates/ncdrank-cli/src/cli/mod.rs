use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod args;


pub use args::{CompressorArgs, RankArgs, ScoreArgs};

#[derive(Debug, Parser)]
#[command(name = "ncdrank")]
#[command(about = "Rank text chunks against a query by compression distance", version)]
pub struct Cli {
    /// TOML config file; `NCDRANK_*` variables and flags override it.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Append one JSONL entry per invocation to this file.
    #[arg(long, global = true, value_name = "PATH")]
    pub request_log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rank candidates and print the closest ones.
    Rank(RankArgs),
    /// Print the distance breakdown for one query/candidate pair.
    Score(ScoreArgs),
    /// Rank the built-in sample and print the resulting list.
    Demo,
}

impl Commands {
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Rank(_) => "rank",
            Self::Score(_) => "score",
            Self::Demo => "demo",
        }
    }
}
