use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Structural damage found while decoding an encoded stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Corruption {
    #[error("stream ends with an unpaired value byte at offset {offset}")]
    TruncatedPair { offset: u64 },

    #[error("run at offset {offset} has a zero length")]
    ZeroLength { offset: u64 },
}

impl From<Corruption> for io::Error {
    fn from(corruption: Corruption) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, corruption)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    #[error("corrupted encoded stream: {0}")]
    Corrupted(#[from] Corruption),

    #[error("entropy is undefined for an empty byte stream")]
    EmptyStream,

    #[error("compression ratio is undefined for an empty encoded stream")]
    ZeroEncodedSize,

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("a {len} byte stream does not hold a {width}x{height} RGB image")]
    Dimensions { len: usize, width: u32, height: u32 },

    #[error("malformed report line {line}: {reason}")]
    Report { line: usize, reason: String },

    #[error("{0} shares its stem with another input")]
    DuplicateStem(PathBuf),

    #[error("cannot build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

// Streaming decode reports corruption through `io::Error`; recover the typed
// variant so callers can tell damaged data from failing storage.
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.get_ref().and_then(|e| e.downcast_ref::<Corruption>()) {
            Some(corruption) => Error::Corrupted(corruption.clone()),
            None => Error::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::{Corruption, Error};
    use std::io;

    #[test]
    fn test_corruption_survives_io_error() {
        let err: io::Error = Corruption::ZeroLength { offset: 6 }.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        match Error::from(err) {
            Error::Corrupted(Corruption::ZeroLength { offset }) => assert_eq!(offset, 6),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_plain_io_error_stays_io() {
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(matches!(Error::from(err), Error::Io(_)));
        let err = io::Error::new(io::ErrorKind::InvalidData, "not ours");
        assert!(matches!(Error::from(err), Error::Io(_)));
    }
}
