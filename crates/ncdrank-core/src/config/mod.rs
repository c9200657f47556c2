use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::compress::{CodecKind, CompressionLevel, CompressorConfig};
use crate::error::Result;
use crate::rank::{DuplicatePolicy, Parallelism, RankOptions, Ranker, top_k_from_signed};

mod env;

use self::env::{EnvLookup, read_i64, read_parsed, read_usize};

pub const ENV_CODEC: &str = "NCDRANK_CODEC";
pub const ENV_LEVEL: &str = "NCDRANK_LEVEL";
pub const ENV_TOP_K: &str = "NCDRANK_TOP_K";
pub const ENV_DUPLICATES: &str = "NCDRANK_DUPLICATES";
pub const ENV_THREADS: &str = "NCDRANK_THREADS";

pub const DEFAULT_TOP_K: usize = 1;

/// Resolved in layers: defaults, then a TOML file, then `NCDRANK_*`
/// variables. Callers overlay CLI flags last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RankConfig {
    pub compressor: CompressorConfig,
    /// Non-positive values in TOML or `NCDRANK_TOP_K` select nothing.
    #[serde(deserialize_with = "deserialize_top_k")]
    pub top_k: usize,
    pub duplicates: DuplicatePolicy,
    pub threads: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            compressor: CompressorConfig::default(),
            top_k: DEFAULT_TOP_K,
            duplicates: DuplicatePolicy::default(),
            threads: 1,
        }
    }
}

impl RankConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Defaults (or `path` when given) with environment overrides applied.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env()
    }

    pub fn with_env(self) -> Result<Self> {
        self.with_env_lookup(&|name: &str| std::env::var(name).ok())
    }

    pub(crate) fn with_env_lookup(mut self, env: &impl EnvLookup) -> Result<Self> {
        if let Some(codec) = read_parsed::<CodecKind>(env, ENV_CODEC)? {
            self.compressor.codec = codec;
        }
        if let Some(level) = read_parsed::<CompressionLevel>(env, ENV_LEVEL)? {
            self.compressor.level = level;
        }
        if let Some(duplicates) = read_parsed::<DuplicatePolicy>(env, ENV_DUPLICATES)? {
            self.duplicates = duplicates;
        }
        if let Some(top_k) = read_i64(env, ENV_TOP_K) {
            self.top_k = top_k_from_signed(top_k);
        }
        self.threads = read_usize(env, ENV_THREADS, self.threads);
        Ok(self)
    }

    #[must_use]
    pub fn options(&self) -> RankOptions {
        RankOptions {
            duplicates: self.duplicates,
            parallelism: Parallelism::from_thread_count(self.threads),
        }
    }

    #[must_use]
    pub fn ranker(&self) -> Ranker {
        Ranker::new(self.compressor, self.options())
    }
}

fn deserialize_top_k<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    i64::deserialize(deserializer).map(top_k_from_signed)
}
