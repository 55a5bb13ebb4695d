//! Scores for a byte stream and for what the codec made of it.
//!
//! All functions work on in-memory slices; the batch pipeline reads the
//! files and hands their contents over.

use crate::{Error, Result};

/// Occurrence count of every byte value in a stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; 256],
    total: u64,
}

impl FrequencyTable {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut counts = [0u64; 256];
        for &byte in bytes {
            counts[byte as usize] += 1;
        }
        FrequencyTable {
            counts,
            total: bytes.len() as u64,
        }
    }

    pub fn count(&self, value: u8) -> u64 {
        self.counts[value as usize]
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of byte values that occur at least once.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&count| count > 0).count()
    }

    /// `(value, p)` for every value with `p > 0`.
    pub fn probabilities(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        let total = self.total as f64;
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(move |(value, &count)| (value as u8, count as f64 / total))
    }
}

/// Shannon entropy in bits per byte.
///
/// # Errors
///
/// [`Error::EmptyStream`] when `bytes` is empty, the distribution being undefined.
pub fn entropy(bytes: &[u8]) -> Result<f64> {
    if bytes.is_empty() {
        return Err(Error::EmptyStream);
    }
    let table = FrequencyTable::from_bytes(bytes);
    let h: f64 = table.probabilities().map(|(_, p)| -p * p.log2()).sum();
    // a single symbol sums to -0.0
    Ok(h.max(0.0))
}

/// Share of positions holding the same byte in `a` and `b`, over the longer length.
///
/// A strict prefix never scores 1.0. Two empty streams are identical and score 1.0.
pub fn fidelity(a: &[u8], b: &[u8]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    let matching = a.iter().zip(b).filter(|(x, y)| x == y).count();
    matching as f64 / longest as f64
}

/// `original / encoded`.
///
/// # Errors
///
/// [`Error::ZeroEncodedSize`] when `encoded` is 0.
pub fn compression_ratio(original: u64, encoded: u64) -> Result<f64> {
    if encoded == 0 {
        return Err(Error::ZeroEncodedSize);
    }
    Ok(original as f64 / encoded as f64)
}

/// How much of a stream sits in repeating sequences (maximal runs of length >= 2).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RunStats {
    pub len: usize,
    /// maximal runs of any length
    pub runs: usize,
    pub repeats: usize,
    pub repeated_bytes: usize,
}

impl RunStats {
    pub fn of(bytes: &[u8]) -> Self {
        let mut stats = RunStats {
            len: bytes.len(),
            ..Default::default()
        };
        for run in bytes.chunk_by(|a, b| a == b) {
            stats.runs += 1;
            if run.len() > 1 {
                stats.repeats += 1;
                stats.repeated_bytes += run.len();
            }
        }
        stats
    }

    /// Mean length of the repeating sequences, 0 when there are none.
    pub fn mean_repeat_length(&self) -> f64 {
        if self.repeats == 0 {
            return 0.0;
        }
        self.repeated_bytes as f64 / self.repeats as f64
    }

    /// Fraction of the stream a two-byte run marker saves, 0 for an empty stream.
    pub fn repeating_ratio(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        (self.repeated_bytes - 2 * self.repeats) as f64 / self.len as f64
    }
}

/// Everything measured about one file once it went through both codec directions.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricsRecord {
    pub entropy: f64,
    pub fidelity: f64,
    pub compression_ratio: f64,
    pub original_size: u64,
    pub encoded_size: u64,
    pub runs: RunStats,
}

impl MetricsRecord {
    pub fn measure(original: &[u8], encoded_size: u64, decoded: &[u8]) -> Result<Self> {
        let original_size = original.len() as u64;
        Ok(MetricsRecord {
            entropy: entropy(original)?,
            fidelity: fidelity(original, decoded),
            compression_ratio: compression_ratio(original_size, encoded_size)?,
            original_size,
            encoded_size,
            runs: RunStats::of(original),
        })
    }
}
