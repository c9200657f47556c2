//! Normalized Compression Distance between a query and one candidate.
//!
//! ```text
//! NCD(q, c) = (C(q + " " + c) - min(C(q), C(c))) / max(C(q), C(c))
//! ```
//!
//! `C` is the compressed length under one pinned [`Compressor`]. Operand
//! order and the single-space separator are fixed: swapping them changes
//! the joint length and therefore the score.

use serde::{Deserialize, Serialize};

use crate::compress::Compressor;
use crate::error::Result;

pub const SEPARATOR: &str = " ";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NcdBreakdown {
    pub score: f64,
    pub query_len: usize,
    pub candidate_len: usize,
    pub joint_len: usize,
}

#[must_use]
pub fn ncd_from_lengths(query_len: usize, candidate_len: usize, joint_len: usize) -> f64 {
    let max_len = query_len.max(candidate_len);
    if max_len == 0 {
        return 0.0;
    }
    let min_len = query_len.min(candidate_len);
    (usize_to_f64(joint_len) - usize_to_f64(min_len)) / usize_to_f64(max_len)
}

#[must_use]
pub fn joint_text(query: &str, candidate: &str) -> String {
    let mut joint = String::with_capacity(query.len() + SEPARATOR.len() + candidate.len());
    joint.push_str(query);
    joint.push_str(SEPARATOR);
    joint.push_str(candidate);
    joint
}

/// A query whose compressed length has been measured once and is reused
/// for every candidate scored against it.
pub struct QueryProfile<'a> {
    compressor: &'a dyn Compressor,
    query: &'a str,
    query_len: usize,
}

impl<'a> QueryProfile<'a> {
    pub fn new(compressor: &'a dyn Compressor, query: &'a str) -> Result<Self> {
        let query_len = compressor.compressed_len(query.as_bytes())?;
        Ok(Self {
            compressor,
            query,
            query_len,
        })
    }

    #[must_use]
    pub const fn query_len(&self) -> usize {
        self.query_len
    }

    pub fn score(&self, candidate: &str) -> Result<NcdBreakdown> {
        let candidate_len = self.compressor.compressed_len(candidate.as_bytes())?;
        let joint_len = self
            .compressor
            .compressed_len(joint_text(self.query, candidate).as_bytes())?;
        Ok(NcdBreakdown {
            score: ncd_from_lengths(self.query_len, candidate_len, joint_len),
            query_len: self.query_len,
            candidate_len,
            joint_len,
        })
    }
}

pub fn ncd(compressor: &dyn Compressor, query: &str, candidate: &str) -> Result<NcdBreakdown> {
    QueryProfile::new(compressor, query)?.score(candidate)
}

#[allow(
    clippy::cast_precision_loss,
    reason = "compressed lengths stay far below 2^52 bytes"
)]
const fn usize_to_f64(value: usize) -> f64 {
    value as f64
}
