//! Record store error handling
//!
//! Every failure maps onto one of three kinds: a record of the wrong size
//! (caller bug), an index past the end (the normal end-of-sequence signal),
//! or a storage failure (I/O, corruption, use after close).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a [`RecordError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Record length differs from the store's record size
    RecordSize,
    /// Index at or beyond the current length
    IndexOutOfRange,
    /// Underlying I/O failure, corrupted file, or closed store
    Storage,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorKind::RecordSize => "record size error",
            ErrorKind::IndexOutOfRange => "index out of range",
            ErrorKind::Storage => "storage error",
        })
    }
}

/// Main error type for the record engine
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("record must be exactly {expected} bytes, got {actual}")]
    RecordSize { expected: usize, actual: usize },

    #[error("no record at index position {index} (length {length})")]
    IndexOutOfRange { index: u64, length: u64 },

    #[error("I/O error on {} at offset {}: {source}", path.display(), fmt_offset(*offset))]
    Io {
        path: PathBuf,
        offset: Option<u64>,
        #[source]
        source: io::Error,
    },

    #[error(
        "{} is {size} bytes, not a multiple of record size {record_size}",
        path.display()
    )]
    Misaligned {
        path: PathBuf,
        size: u64,
        record_size: usize,
    },

    #[error(
        "short read on {} at offset {offset}: expected {expected} bytes, got {actual}",
        path.display()
    )]
    ShortRead {
        path: PathBuf,
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("record size must be positive")]
    InvalidRecordSize,

    #[error("store {} is closed", path.display())]
    Closed { path: PathBuf },

    #[error("{} is already open with record size {record_size}", path.display())]
    AlreadyOpen { path: PathBuf, record_size: usize },
}

fn fmt_offset(offset: Option<u64>) -> String {
    offset.map_or_else(|| "-".to_string(), |o| o.to_string())
}

impl RecordError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecordError::RecordSize { .. } => ErrorKind::RecordSize,
            RecordError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            RecordError::Io { .. }
            | RecordError::Misaligned { .. }
            | RecordError::ShortRead { .. }
            | RecordError::InvalidRecordSize
            | RecordError::Closed { .. }
            | RecordError::AlreadyOpen { .. } => ErrorKind::Storage,
        }
    }

    /// Check if this is the end-of-sequence signal rather than a failure
    pub fn is_out_of_range(&self) -> bool {
        self.kind() == ErrorKind::IndexOutOfRange
    }

    /// Check if this indicates a corrupted backing file
    pub fn is_corruption(&self) -> bool {
        matches!(self, RecordError::Misaligned { .. } | RecordError::ShortRead { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, offset: Option<u64>, source: io::Error) -> Self {
        RecordError::Io {
            path: path.into(),
            offset,
            source,
        }
    }
}

/// Result type for record operations
pub type RecordResult<T> = Result<T, RecordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = RecordError::RecordSize { expected: 4, actual: 3 };
        assert_eq!(err.kind(), ErrorKind::RecordSize);

        let err = RecordError::IndexOutOfRange { index: 2, length: 2 };
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
        assert!(err.is_out_of_range());

        let err = RecordError::Closed { path: PathBuf::from("a.dat") };
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!err.is_out_of_range());
    }

    #[test]
    fn test_corruption_check() {
        let err = RecordError::Misaligned {
            path: PathBuf::from("a.dat"),
            size: 7,
            record_size: 4,
        };
        assert!(err.is_corruption());
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!RecordError::InvalidRecordSize.is_corruption());
    }

    #[test]
    fn test_io_message_carries_context() {
        let err = RecordError::io(
            "data.rec",
            Some(128),
            io::Error::new(io::ErrorKind::Other, "disk full"),
        );
        let msg = err.to_string();
        assert!(msg.contains("data.rec"));
        assert!(msg.contains("128"));
        assert!(msg.contains("disk full"));

        let err = RecordError::io("data.rec", None, io::Error::new(io::ErrorKind::Other, "x"));
        assert!(err.to_string().contains("offset -"));
    }
}
