//! # RLE Encoding Scheme
//!
//! ```text
//!         ┌───────┬───────┬───────┬───────┬─────
//!         │ value │ count │ value │ count │ ...
//!         └───────┴───────┴───────┴───────┴─────
//!            u8      u8      u8      u8
//! ```
//!
//! The input is a flat byte stream (see [`serialize`]: R, G, B per pixel,
//! row-major). Every maximal run of equal bytes is written as a
//! `(value, count)` pair, `count` being the literal run length.
//!
//! A count byte holds at most [`MAX_RUN_LENGTH`] (255). Longer runs are split
//! into several consecutive pairs with the same value, so
//! 1000 × `0x2A` encodes as `2aff 2aff 2aff 2aeb`.
//! A count of 0 is never produced.
//!
//! In best case, 2 bytes encode 255 bytes, efficiency is 127.5.
//! In worst case (no two neighbours equal), 2 bytes encode 1 byte, efficiency is 0.5.
//!
//! There is no header, no length prefix and no checksum. The encoded length
//! is always even; an odd length or a zero count is reported as
//! [`Corruption`].
//!
//! # Streaming
//!
//! [`Rle`] and [`DeRle`] wrap any [`std::io::Write`] sink. A pair may be split
//! across two `write` calls on the decoder; a dangling value byte is only an
//! error once the decoder is finalized.

#[macro_use]
extern crate log;

mod derle;
mod error;
pub mod metrics;
pub mod pipeline;
pub mod report;
mod rle;
pub mod serialize;

pub use derle::DeRle;
pub use error::{Corruption, Error, Result};
pub use metrics::{compression_ratio, entropy, fidelity, MetricsRecord, RunStats};
pub use rle::Rle;

/// longest run a single count byte can describe
pub const MAX_RUN_LENGTH: u8 = u8::MAX;

/// One `(value, count)` pair of the encoded stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub value: u8,
    pub length: u8,
}

impl Run {
    #[inline(always)]
    pub fn to_bytes(self) -> [u8; 2] {
        [self.value, self.length]
    }
}

/// Encodes a whole byte stream at once.
pub fn encode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() / 2);
    rle::encode_into(input, &mut out);
    out
}

/// Decodes a whole encoded stream at once.
///
/// The stream is validated before anything is expanded, so a corrupted
/// input never yields a partial result.
pub fn decode(input: &[u8]) -> Result<Vec<u8>> {
    let runs = parse_runs(input)?;
    let total: usize = runs.iter().map(|run| run.length as usize).sum();
    let mut out = Vec::with_capacity(total);
    for run in runs {
        out.resize(out.len() + run.length as usize, run.value);
    }
    Ok(out)
}

/// Splits an encoded stream into its runs, checking its structure.
pub fn parse_runs(input: &[u8]) -> Result<Vec<Run>> {
    let pairs = input.chunks_exact(2);
    if !pairs.remainder().is_empty() {
        return Err(Corruption::TruncatedPair {
            offset: (input.len() - 1) as u64,
        }
        .into());
    }
    pairs
        .enumerate()
        .map(|(i, pair)| match pair[1] {
            0 => Err(Error::from(Corruption::ZeroLength {
                offset: (i * 2) as u64,
            })),
            length => Ok(Run {
                value: pair[0],
                length,
            }),
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::{decode, encode, parse_runs, Corruption, Error, Run, MAX_RUN_LENGTH};
    use crate::test_util::setup;

    #[test]
    fn test_roundtrip_edge_cases() {
        setup();
        let long_run = vec![0x2Au8; 1000];
        let no_repeats: Vec<u8> = (0..=255).collect();
        let cases: [&[u8]; 6] = [
            &[],
            &[7],
            &[9, 9, 9, 9],
            &no_repeats,
            &long_run,
            &[5, 5, 5, 7, 7, 2],
        ];
        for input in cases {
            assert_eq!(decode(&encode(input)).unwrap(), input);
        }
    }

    #[test]
    fn test_end_to_end_example() {
        let encoded = encode(&[5, 5, 5, 7, 7, 2]);
        assert_eq!(encoded, [5, 3, 7, 2, 2, 1]);
        assert_eq!(decode(&encoded).unwrap(), [5, 5, 5, 7, 7, 2]);
    }

    #[test]
    fn test_long_run_is_split() {
        let encoded = encode(&[0x2A; 1000]);
        assert_eq!(encoded, hex::decode("2aff2aff2aff2aeb").unwrap());
        let runs = parse_runs(&encoded).unwrap();
        assert_eq!(runs.len(), 4);
        assert!(runs.iter().all(|run| run.value == 0x2A));
        assert!(runs.iter().all(|run| run.length <= MAX_RUN_LENGTH));
        assert_eq!(runs.iter().map(|run| run.length as usize).sum::<usize>(), 1000);
    }

    #[test]
    fn test_odd_length_is_corruption() {
        match decode(&[5, 3, 7]) {
            Err(Error::Corrupted(Corruption::TruncatedPair { offset })) => assert_eq!(offset, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_zero_count_is_corruption() {
        match decode(&[5, 3, 7, 0, 2, 1]) {
            Err(Error::Corrupted(Corruption::ZeroLength { offset })) => assert_eq!(offset, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_runs() {
        assert_eq!(
            parse_runs(&[1, 2, 3, 4]).unwrap(),
            [Run { value: 1, length: 2 }, Run { value: 3, length: 4 }]
        );
        assert!(parse_runs(&[]).unwrap().is_empty());
    }
}
