//! Candidate chunk loading for callers that keep chunks on disk.
//!
//! Ranking itself never touches the filesystem; this is edge glue.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{RankError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateFormat {
    /// One candidate per non-empty line, taken verbatim.
    Lines,
    /// One JSON string or `{"text": ...}` object per line.
    Jsonl,
}

impl CandidateFormat {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson") => {
                Self::Jsonl
            }
            _ => Self::Lines,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CandidateLine {
    Text(String),
    Record { text: String },
}

impl CandidateLine {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) | Self::Record { text } => text,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateParseOutcome {
    pub candidates: Vec<String>,
    pub skipped_lines: usize,
    pub first_error: Option<(usize, String)>,
}

pub fn parse_candidates(raw: &str, format: CandidateFormat) -> CandidateParseOutcome {
    match format {
        CandidateFormat::Lines => CandidateParseOutcome {
            candidates: raw
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect(),
            ..CandidateParseOutcome::default()
        },
        CandidateFormat::Jsonl => parse_jsonl_tolerant(raw),
    }
}

fn parse_jsonl_tolerant(raw: &str) -> CandidateParseOutcome {
    let mut outcome = CandidateParseOutcome::default();
    for (line_no, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CandidateLine>(line) {
            Ok(candidate) => outcome.candidates.push(candidate.into_text()),
            Err(err) => {
                outcome.skipped_lines += 1;
                if outcome.first_error.is_none() {
                    outcome.first_error = Some((line_no + 1, err.to_string()));
                }
            }
        }
    }
    outcome
}

/// Reads `path` in the format implied by its extension. A JSONL file in
/// which every non-empty line is invalid is rejected outright.
pub fn load_candidates(path: &Path) -> Result<CandidateParseOutcome> {
    let raw = fs::read_to_string(path)?;
    let outcome = parse_candidates(&raw, CandidateFormat::from_path(path));
    if outcome.candidates.is_empty() && outcome.skipped_lines > 0 {
        return Err(all_lines_invalid(
            &path.display().to_string(),
            outcome.skipped_lines,
            outcome.first_error.as_ref(),
        ));
    }
    Ok(outcome)
}

fn all_lines_invalid(
    location: &str,
    skipped_lines: usize,
    first_error: Option<&(usize, String)>,
) -> RankError {
    if let Some((line_no, message)) = first_error {
        return RankError::Validation(format!(
            "candidate file {location}: all {skipped_lines} lines invalid (first at line {line_no}: {message})"
        ));
    }
    RankError::Validation(format!(
        "candidate file {location}: all {skipped_lines} lines invalid"
    ))
}
