//! Offset and bounds arithmetic for fixed-size records
//!
//! Record `i` occupies bytes `[i * record_size, (i + 1) * record_size)`.
//! There is no header, so a file of `N * record_size` bytes holds exactly
//! `N` records.

use crate::error::{RecordError, RecordResult};

/// Record geometry of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    record_size: usize,
}

impl Layout {
    /// Create a layout, rejecting a zero record size
    pub fn new(record_size: usize) -> RecordResult<Self> {
        if record_size == 0 {
            return Err(RecordError::InvalidRecordSize);
        }
        Ok(Layout { record_size })
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Byte offset of the record at `index`, or `None` on overflow
    pub fn offset_of(&self, index: u64) -> Option<u64> {
        index.checked_mul(self.record_size as u64)
    }

    /// Number of records held in `size` bytes, or `None` if `size` is not
    /// an exact multiple of the record size
    pub fn records_in(&self, size: u64) -> Option<u64> {
        let record_size = self.record_size as u64;
        if size % record_size != 0 {
            return None;
        }
        Some(size / record_size)
    }

    /// Byte length of a file holding `count` records
    pub fn bytes_for(&self, count: u64) -> Option<u64> {
        self.offset_of(count)
    }

    /// Verify a caller supplied record has the configured size
    pub fn check(&self, record: &[u8]) -> RecordResult<()> {
        if record.len() != self.record_size {
            return Err(RecordError::RecordSize {
                expected: self.record_size,
                actual: record.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_record_size_rejected() {
        assert!(matches!(Layout::new(0), Err(RecordError::InvalidRecordSize)));
    }

    #[test]
    fn test_offsets() {
        let layout = Layout::new(16).unwrap();
        assert_eq!(layout.offset_of(0), Some(0));
        assert_eq!(layout.offset_of(3), Some(48));
        assert_eq!(layout.offset_of(u64::MAX), None);
        assert_eq!(layout.bytes_for(2), Some(32));
    }

    #[test]
    fn test_records_in_requires_alignment() {
        let layout = Layout::new(4).unwrap();
        assert_eq!(layout.records_in(0), Some(0));
        assert_eq!(layout.records_in(12), Some(3));
        assert_eq!(layout.records_in(13), None);
        assert_eq!(layout.records_in(3), None);
    }

    #[test]
    fn test_check_record_length() {
        let layout = Layout::new(4).unwrap();
        assert!(layout.check(b"aaaa").is_ok());
        match layout.check(b"aaa") {
            Err(RecordError::RecordSize { expected, actual }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(layout.check(b"aaaaa").is_err());
    }
}
