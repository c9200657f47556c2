use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compress::{Compressor, CompressorConfig};
use crate::error::{RankError, Result};
use crate::ncd::{NcdBreakdown, QueryProfile};

pub const MAX_RANK_THREADS: usize = 64;

/// How repeated candidate texts map to output slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// One slot per distinct text, positioned at its first occurrence.
    #[default]
    Collapse,
    /// One slot per input occurrence.
    Keep,
}

impl DuplicatePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collapse => "collapse",
            Self::Keep => "keep",
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DuplicatePolicy {
    type Err = RankError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "collapse" | "distinct" => Ok(Self::Collapse),
            "keep" | "all" => Ok(Self::Keep),
            other => Err(RankError::Validation(format!(
                "unknown duplicate policy: {other} (expected collapse|keep)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Parallelism {
    #[default]
    Sequential,
    Threads(NonZeroUsize),
}

impl Parallelism {
    /// `0` and `1` both mean sequential; larger counts are capped at
    /// [`MAX_RANK_THREADS`].
    #[must_use]
    pub fn from_thread_count(threads: usize) -> Self {
        match NonZeroUsize::new(threads.min(MAX_RANK_THREADS)) {
            Some(count) if count.get() > 1 => Self::Threads(count),
            _ => Self::Sequential,
        }
    }

    #[must_use]
    pub const fn thread_count(self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Threads(count) => count.get(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankOptions {
    pub duplicates: DuplicatePolicy,
    pub parallelism: Parallelism,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedChunk {
    pub index: usize,
    pub text: String,
    #[serde(flatten)]
    pub ncd: NcdBreakdown,
}

#[derive(Debug, Clone, Copy)]
struct ScoredSlot {
    index: usize,
    ncd: NcdBreakdown,
}

pub struct Ranker {
    config: CompressorConfig,
    compressor: Box<dyn Compressor>,
    options: RankOptions,
}

impl fmt::Debug for Ranker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ranker")
            .field("config", &self.config)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(CompressorConfig::default(), RankOptions::default())
    }
}

impl Ranker {
    #[must_use]
    pub fn new(config: CompressorConfig, options: RankOptions) -> Self {
        Self {
            config,
            compressor: config.build(),
            options,
        }
    }

    #[must_use]
    pub const fn config(&self) -> CompressorConfig {
        self.config
    }

    #[must_use]
    pub const fn options(&self) -> RankOptions {
        self.options
    }

    #[must_use]
    pub fn compressor(&self) -> &dyn Compressor {
        self.compressor.as_ref()
    }

    pub fn rank<S>(&self, query: &str, candidates: &[S], top_k: usize) -> Result<Vec<String>>
    where
        S: AsRef<str> + Sync,
    {
        Ok(self
            .ranked_slots(query, candidates, top_k)?
            .into_iter()
            .map(|slot| candidates[slot.index].as_ref().to_string())
            .collect())
    }

    pub fn rank_detailed<S>(
        &self,
        query: &str,
        candidates: &[S],
        top_k: usize,
    ) -> Result<Vec<RankedChunk>>
    where
        S: AsRef<str> + Sync,
    {
        Ok(self
            .ranked_slots(query, candidates, top_k)?
            .into_iter()
            .map(|slot| RankedChunk {
                index: slot.index,
                text: candidates[slot.index].as_ref().to_string(),
                ncd: slot.ncd,
            })
            .collect())
    }

    /// Every slot, ranked, without a `top_k` cut.
    pub fn score_all<S>(&self, query: &str, candidates: &[S]) -> Result<Vec<RankedChunk>>
    where
        S: AsRef<str> + Sync,
    {
        self.rank_detailed(query, candidates, usize::MAX)
    }

    fn ranked_slots<S>(
        &self,
        query: &str,
        candidates: &[S],
        top_k: usize,
    ) -> Result<Vec<ScoredSlot>>
    where
        S: AsRef<str> + Sync,
    {
        if top_k == 0 || candidates.is_empty() {
            return Ok(Vec::new());
        }

        let slots = slot_indices(candidates, self.options.duplicates);
        tracing::debug!(
            codec = %self.config.codec,
            level = self.config.level.get(),
            candidates = candidates.len(),
            slots = slots.len(),
            top_k,
            threads = self.options.parallelism.thread_count(),
            "ranking candidates"
        );

        let profile = QueryProfile::new(self.compressor.as_ref(), query)?;
        let mut scored = match self.options.parallelism {
            Parallelism::Threads(count) if slots.len() > 1 => {
                score_slots_parallel(&profile, candidates, &slots, count.get())?
            }
            _ => score_slots(&profile, candidates, &slots)?,
        };

        sort_slots(&mut scored);
        scored.truncate(top_k);
        Ok(scored)
    }
}

pub fn rank<S>(query: &str, candidates: &[S], top_k: usize) -> Result<Vec<String>>
where
    S: AsRef<str> + Sync,
{
    Ranker::default().rank(query, candidates, top_k)
}

pub fn rank_with<S>(
    config: CompressorConfig,
    query: &str,
    candidates: &[S],
    top_k: usize,
) -> Result<Vec<String>>
where
    S: AsRef<str> + Sync,
{
    Ranker::new(config, RankOptions::default()).rank(query, candidates, top_k)
}

/// Non-positive counts select nothing.
#[must_use]
pub fn top_k_from_signed(value: i64) -> usize {
    if value <= 0 {
        return 0;
    }
    usize::try_from(value).unwrap_or(usize::MAX)
}

fn slot_indices<S: AsRef<str>>(candidates: &[S], policy: DuplicatePolicy) -> Vec<usize> {
    match policy {
        DuplicatePolicy::Keep => (0..candidates.len()).collect(),
        DuplicatePolicy::Collapse => {
            let mut seen = HashSet::<&str>::with_capacity(candidates.len());
            let mut slots = Vec::with_capacity(candidates.len());
            for (index, candidate) in candidates.iter().enumerate() {
                if seen.insert(candidate.as_ref()) {
                    slots.push(index);
                }
            }
            slots
        }
    }
}

fn score_slots<S: AsRef<str>>(
    profile: &QueryProfile<'_>,
    candidates: &[S],
    slots: &[usize],
) -> Result<Vec<ScoredSlot>> {
    slots
        .iter()
        .map(|&index| {
            profile
                .score(candidates[index].as_ref())
                .map(|ncd| ScoredSlot { index, ncd })
        })
        .collect()
}

fn score_slots_parallel<S>(
    profile: &QueryProfile<'_>,
    candidates: &[S],
    slots: &[usize],
    threads: usize,
) -> Result<Vec<ScoredSlot>>
where
    S: AsRef<str> + Sync,
{
    let available = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    let workers = threads.min(available).clamp(1, slots.len());
    let chunk_size = slots.len().div_ceil(workers);

    std::thread::scope(|scope| {
        let handles = slots
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || score_slots(profile, candidates, chunk)))
            .collect::<Vec<_>>();

        let mut out = Vec::<ScoredSlot>::with_capacity(slots.len());
        for handle in handles {
            let mut part = handle
                .join()
                .map_err(|_| RankError::Internal("ranking worker panicked".to_string()))??;
            out.append(&mut part);
        }
        Ok::<Vec<ScoredSlot>, RankError>(out)
    })
}

fn sort_slots(slots: &mut [ScoredSlot]) {
    slots.sort_by(|a, b| {
        a.ncd
            .score
            .total_cmp(&b.ncd.score)
            .then_with(|| a.index.cmp(&b.index))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::{CodecKind, CompressionLevel};
    use crate::ncd::ncd;

    const CAT: &str = "cat sat on the mat";
    const FOX: &str = "the quick brown fox jumps over the lazy dog";

    fn corpus() -> Vec<String> {
        [
            "the cat sat on the mat and purred",
            "a dog barked at the mailman",
            "cat sat on the mat",
            "stock markets rallied after the announcement",
            "the quick brown fox jumps over the lazy dog",
            "cats sitting on mats is a classic example",
            "rust ownership and borrowing rules",
            "a dog barked at the mailman",
        ]
        .into_iter()
        .map(str::to_string)
        .collect()
    }

    fn slot(index: usize, score: f64) -> ScoredSlot {
        ScoredSlot {
            index,
            ncd: NcdBreakdown {
                score,
                query_len: 0,
                candidate_len: 0,
                joint_len: 0,
            },
        }
    }

    #[test]
    fn identical_candidate_outranks_unrelated_one() {
        let ranked = rank(CAT, &[CAT, FOX], 1).expect("rank");
        assert_eq!(ranked, vec![CAT.to_string()]);
    }

    #[test]
    fn single_candidate_always_wins() {
        let ranked = rank("XXAPI実装", &["◯◯API"], 1).expect("rank");
        assert_eq!(ranked, vec!["◯◯API".to_string()]);
    }

    #[test]
    fn empty_candidates_return_empty_result() {
        let empty: [&str; 0] = [];
        assert!(rank(CAT, &empty, 3).expect("rank").is_empty());
        assert!(rank("", &empty, 0).expect("rank").is_empty());
    }

    #[test]
    fn zero_top_k_returns_empty_result() {
        assert!(rank(CAT, &[CAT, FOX], 0).expect("rank").is_empty());
        assert!(
            rank(CAT, &[CAT, FOX], top_k_from_signed(-3))
                .expect("rank")
                .is_empty()
        );
    }

    #[test]
    fn signed_top_k_clamps_non_positive_values_to_zero() {
        assert_eq!(top_k_from_signed(-1), 0);
        assert_eq!(top_k_from_signed(0), 0);
        assert_eq!(top_k_from_signed(5), 5);
    }

    #[test]
    fn result_length_is_bounded_by_top_k_and_distinct_candidates() {
        let candidates = corpus();
        let distinct = candidates.iter().collect::<HashSet<_>>().len();
        for k in 1..=10 {
            let ranked = rank(CAT, &candidates, k).expect("rank");
            assert_eq!(ranked.len(), k.min(distinct), "k={k}");
        }
    }

    #[test]
    fn duplicates_collapse_to_one_slot_by_default() {
        let candidates = ["a", "a", "b"];
        for k in 1..=2 {
            assert_eq!(rank("a", &candidates, k).expect("rank").len(), k);
        }
        let all = rank("a", &candidates, 10).expect("rank");
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|text| *text == "a").count(), 1);
    }

    #[test]
    fn keep_policy_gives_each_occurrence_its_own_slot() {
        let ranker = Ranker::new(
            CompressorConfig::default(),
            RankOptions {
                duplicates: DuplicatePolicy::Keep,
                ..RankOptions::default()
            },
        );
        let detailed = ranker
            .rank_detailed("a", &["a", "a", "b"], 10)
            .expect("rank");
        assert_eq!(detailed.len(), 3);
        let a_indices = detailed
            .iter()
            .filter(|chunk| chunk.text == "a")
            .map(|chunk| chunk.index)
            .collect::<Vec<_>>();
        assert_eq!(a_indices, vec![0, 1]);
    }

    #[test]
    fn collapsed_slot_keeps_first_occurrence_index() {
        let ranker = Ranker::default();
        let detailed = ranker
            .score_all("zzz", &["b", "a", "b", "a"])
            .expect("score all");
        let mut indices = detailed.iter().map(|chunk| chunk.index).collect::<Vec<_>>();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn scores_are_non_decreasing_in_output_order() {
        let detailed = Ranker::default()
            .score_all(CAT, &corpus())
            .expect("score all");
        for pair in detailed.windows(2) {
            assert!(pair[0].ncd.score <= pair[1].ncd.score, "{pair:?}");
        }
    }

    #[test]
    fn ranking_is_deterministic_across_calls() {
        let candidates = corpus();
        let first = rank(CAT, &candidates, 5).expect("first");
        let second = rank(CAT, &candidates, 5).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn ties_resolve_by_first_occurrence() {
        let mut slots = vec![slot(3, 0.5), slot(1, 0.5), slot(2, 0.1), slot(0, 0.5)];
        sort_slots(&mut slots);
        let order = slots.iter().map(|slot| slot.index).collect::<Vec<_>>();
        assert_eq!(order, vec![2, 0, 1, 3]);
    }

    #[test]
    fn identical_texts_tie_and_keep_input_order_under_keep_policy() {
        let ranker = Ranker::new(
            CompressorConfig::default(),
            RankOptions {
                duplicates: DuplicatePolicy::Keep,
                ..RankOptions::default()
            },
        );
        let detailed = ranker
            .rank_detailed(CAT, &[FOX, FOX, FOX], 3)
            .expect("rank");
        let order = detailed.iter().map(|chunk| chunk.index).collect::<Vec<_>>();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn parallel_scoring_matches_sequential_output() {
        let candidates = corpus();
        let sequential = Ranker::default()
            .score_all(CAT, &candidates)
            .expect("sequential");
        let parallel = Ranker::new(
            CompressorConfig::default(),
            RankOptions {
                parallelism: Parallelism::from_thread_count(4),
                ..RankOptions::default()
            },
        )
        .score_all(CAT, &candidates)
        .expect("parallel");
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn thread_count_zero_or_one_means_sequential() {
        assert_eq!(Parallelism::from_thread_count(0), Parallelism::Sequential);
        assert_eq!(Parallelism::from_thread_count(1), Parallelism::Sequential);
        assert_eq!(Parallelism::from_thread_count(3).thread_count(), 3);
        assert_eq!(
            Parallelism::from_thread_count(10_000).thread_count(),
            MAX_RANK_THREADS
        );
    }

    #[test]
    fn empty_query_and_candidates_are_legal() {
        let ranked = rank("", &["", "something"], 2).expect("rank");
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn duplicate_policy_parser_accepts_known_names() {
        assert_eq!(
            "collapse".parse::<DuplicatePolicy>().expect("collapse"),
            DuplicatePolicy::Collapse
        );
        assert_eq!(
            "KEEP".parse::<DuplicatePolicy>().expect("keep"),
            DuplicatePolicy::Keep
        );
        assert!("dedupe".parse::<DuplicatePolicy>().is_err());
    }

    #[test]
    fn rank_with_uses_the_given_compressor_config() {
        let config = CompressorConfig::new(CodecKind::Zlib, CompressionLevel::default());
        let ranked = rank_with(config, CAT, &[FOX, CAT], 1).expect("rank");
        assert_eq!(ranked, vec![CAT.to_string()]);
    }

    #[test]
    fn ranker_exposes_the_compressor_it_was_built_with() {
        let level = CompressionLevel::new(3).expect("level");
        let ranker = Ranker::new(
            CompressorConfig::new(CodecKind::Deflate, level),
            RankOptions::default(),
        );
        assert_eq!(ranker.compressor().codec(), CodecKind::Deflate);
        assert_eq!(ranker.compressor().level(), level);

        let detailed = ranker.rank_detailed(CAT, &[CAT], 1).expect("detailed");
        let expected = ncd(ranker.compressor(), CAT, CAT).expect("ncd");
        assert_eq!(detailed[0].ncd, expected);
    }
}
