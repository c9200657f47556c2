use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use flate2::Compression;
use flate2::GzBuilder;
use flate2::write::{DeflateEncoder, ZlibEncoder};
use serde::{Deserialize, Serialize};

use crate::error::{RankError, Result};

pub const MAX_COMPRESSION_LEVEL: u32 = 9;
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    #[default]
    Gzip,
    Zlib,
    Deflate,
}

impl CodecKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Zlib => "zlib",
            Self::Deflate => "deflate",
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodecKind {
    type Err = RankError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "gzip" | "gz" => Ok(Self::Gzip),
            "zlib" => Ok(Self::Zlib),
            "deflate" | "raw" => Ok(Self::Deflate),
            other => Err(RankError::Validation(format!(
                "unknown codec: {other} (expected gzip|zlib|deflate)"
            ))),
        }
    }
}

/// DEFLATE effort level, `0` (stored) through `9` (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CompressionLevel(u32);

impl CompressionLevel {
    pub fn new(level: u32) -> Result<Self> {
        if level > MAX_COMPRESSION_LEVEL {
            return Err(RankError::Validation(format!(
                "compression level must be within 0..={MAX_COMPRESSION_LEVEL}, got {level}"
            )));
        }
        Ok(Self(level))
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    fn to_flate2(self) -> Compression {
        Compression::new(self.0)
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self(DEFAULT_COMPRESSION_LEVEL)
    }
}

impl TryFrom<u32> for CompressionLevel {
    type Error = RankError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CompressionLevel> for u32 {
    fn from(value: CompressionLevel) -> Self {
        value.0
    }
}

impl FromStr for CompressionLevel {
    type Err = RankError;

    fn from_str(raw: &str) -> Result<Self> {
        let parsed = raw.trim().parse::<u32>().map_err(|_| {
            RankError::Validation(format!("compression level must be an integer, got {raw:?}"))
        })?;
        Self::new(parsed)
    }
}

/// The scoring path only ever looks at `compressed_len`; `compress` exists so
/// callers can inspect the frame a length came from.
pub trait Compressor: Send + Sync {
    fn codec(&self) -> CodecKind;
    fn level(&self) -> CompressionLevel;
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>>;

    fn compressed_len(&self, input: &[u8]) -> Result<usize> {
        self.compress(input).map(|out| out.len())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GzipCompressor {
    level: CompressionLevel,
}

impl GzipCompressor {
    #[must_use]
    pub const fn new(level: CompressionLevel) -> Self {
        Self { level }
    }

    // Fixed header fields keep frames reproducible across runs.
    fn encode<W: Write>(&self, sink: W, input: &[u8]) -> io::Result<W> {
        let mut encoder = GzBuilder::new()
            .mtime(0)
            .write(sink, self.level.to_flate2());
        encoder.write_all(input)?;
        encoder.finish()
    }
}

impl Compressor for GzipCompressor {
    fn codec(&self) -> CodecKind {
        CodecKind::Gzip
    }

    fn level(&self) -> CompressionLevel {
        self.level
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        self.encode(Vec::new(), input)
            .map_err(RankError::Compression)
    }

    fn compressed_len(&self, input: &[u8]) -> Result<usize> {
        self.encode(LenSink::default(), input)
            .map(|sink| sink.len)
            .map_err(RankError::Compression)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ZlibCompressor {
    level: CompressionLevel,
}

impl ZlibCompressor {
    #[must_use]
    pub const fn new(level: CompressionLevel) -> Self {
        Self { level }
    }

    fn encode<W: Write>(&self, sink: W, input: &[u8]) -> io::Result<W> {
        let mut encoder = ZlibEncoder::new(sink, self.level.to_flate2());
        encoder.write_all(input)?;
        encoder.finish()
    }
}

impl Compressor for ZlibCompressor {
    fn codec(&self) -> CodecKind {
        CodecKind::Zlib
    }

    fn level(&self) -> CompressionLevel {
        self.level
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        self.encode(Vec::new(), input)
            .map_err(RankError::Compression)
    }

    fn compressed_len(&self, input: &[u8]) -> Result<usize> {
        self.encode(LenSink::default(), input)
            .map(|sink| sink.len)
            .map_err(RankError::Compression)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeflateCompressor {
    level: CompressionLevel,
}

impl DeflateCompressor {
    #[must_use]
    pub const fn new(level: CompressionLevel) -> Self {
        Self { level }
    }

    fn encode<W: Write>(&self, sink: W, input: &[u8]) -> io::Result<W> {
        let mut encoder = DeflateEncoder::new(sink, self.level.to_flate2());
        encoder.write_all(input)?;
        encoder.finish()
    }
}

impl Compressor for DeflateCompressor {
    fn codec(&self) -> CodecKind {
        CodecKind::Deflate
    }

    fn level(&self) -> CompressionLevel {
        self.level
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        self.encode(Vec::new(), input)
            .map_err(RankError::Compression)
    }

    fn compressed_len(&self, input: &[u8]) -> Result<usize> {
        self.encode(LenSink::default(), input)
            .map(|sink| sink.len)
            .map_err(RankError::Compression)
    }
}

/// Counts encoder output without buffering it.
#[derive(Debug, Default)]
struct LenSink {
    len: usize,
}

impl Write for LenSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.len += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Codec and level every length in a ranking is measured with.
///
/// Encoding goes through flate2's default `miniz_oxide` backend. Its DEFLATE
/// streams are valid but not byte-identical to C zlib's, so absolute lengths
/// and scores differ slightly from a zlib-backed `gzip.compress`; the relative
/// ordering of candidates is what stays comparable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompressorConfig {
    #[serde(default)]
    pub codec: CodecKind,
    #[serde(default)]
    pub level: CompressionLevel,
}

impl CompressorConfig {
    #[must_use]
    pub const fn new(codec: CodecKind, level: CompressionLevel) -> Self {
        Self { codec, level }
    }

    #[must_use]
    pub fn build(&self) -> Box<dyn Compressor> {
        match self.codec {
            CodecKind::Gzip => Box::new(GzipCompressor::new(self.level)),
            CodecKind::Zlib => Box::new(ZlibCompressor::new(self.level)),
            CodecKind::Deflate => Box::new(DeflateCompressor::new(self.level)),
        }
    }
}
