//! Compression-based similarity ranking.
//!
//! Candidates are ordered by their Normalized Compression Distance to a
//! query under one pinned DEFLATE-family compressor. No tokenizer, no
//! embeddings: only compressed lengths.

// Public fallible APIs in this crate share one concrete error contract (`RankError`).
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod candidates;
pub mod compress;
pub mod config;
pub mod error;
pub mod ncd;
pub mod rank;
pub mod request_log;
pub mod text;

pub use compress::{CodecKind, CompressionLevel, Compressor, CompressorConfig};
pub use config::RankConfig;
pub use error::{RankError, Result};
pub use ncd::{NcdBreakdown, ncd};
pub use rank::{
    DuplicatePolicy, Parallelism, RankOptions, RankedChunk, Ranker, rank, rank_with,
    top_k_from_signed,
};
