//! Owned backing file of a record store
//!
//! Raw byte-offset I/O with path and offset attached to every failure.
//! Knows nothing about records; [`RecordStore`](super::RecordStore) does
//! the index arithmetic.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{RecordError, RecordResult};

/// Exclusively owned, read/write handle on a data file
#[derive(Debug)]
pub struct DataFile {
    path: PathBuf,
    file: File,
}

impl DataFile {
    /// Open the file read/write, creating it if it does not exist
    pub fn open_or_create(path: &Path) -> RecordResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|e| RecordError::io(path, None, e))?;

        Ok(DataFile {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the file in bytes, as seen by the filesystem
    pub fn byte_len(&self) -> RecordResult<u64> {
        let metadata = self
            .file
            .metadata()
            .map_err(|e| RecordError::io(&self.path, None, e))?;
        Ok(metadata.len())
    }

    /// Read `len` bytes at `offset`
    ///
    /// Fewer bytes than requested is reported as [`RecordError::ShortRead`].
    pub fn read_at(&mut self, offset: u64, len: usize) -> RecordResult<Vec<u8>> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| RecordError::io(&self.path, Some(offset), e))?;

        let mut data = Vec::with_capacity(len);
        (&mut self.file)
            .take(len as u64)
            .read_to_end(&mut data)
            .map_err(|e| RecordError::io(&self.path, Some(offset), e))?;

        if data.len() != len {
            return Err(RecordError::ShortRead {
                path: self.path.clone(),
                offset,
                expected: len,
                actual: data.len(),
            });
        }

        Ok(data)
    }

    /// Write all of `data` at `offset`
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> RecordResult<()> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| RecordError::io(&self.path, Some(offset), e))?;
        self.file
            .write_all(data)
            .map_err(|e| RecordError::io(&self.path, Some(offset), e))
    }

    /// Set the file length, zero-filling when it grows
    pub fn set_len(&mut self, len: u64) -> RecordResult<()> {
        self.file
            .set_len(len)
            .map_err(|e| RecordError::io(&self.path, Some(len), e))
    }

    /// Push written data down to the device
    pub fn sync(&mut self) -> RecordResult<()> {
        self.file
            .flush()
            .and_then(|_| self.file.sync_data())
            .map_err(|e| RecordError::io(&self.path, None, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_write_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.dat");

        let mut file = DataFile::open_or_create(&path).unwrap();
        assert_eq!(file.byte_len().unwrap(), 0);

        file.write_at(0, b"hello").unwrap();
        file.write_at(5, b"world").unwrap();
        assert_eq!(file.byte_len().unwrap(), 10);
        assert_eq!(file.read_at(5, 5).unwrap(), b"world");
    }

    #[test]
    fn test_short_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.dat");

        let mut file = DataFile::open_or_create(&path).unwrap();
        file.write_at(0, b"abc").unwrap();

        match file.read_at(1, 4) {
            Err(RecordError::ShortRead { offset, expected, actual, .. }) => {
                assert_eq!(offset, 1);
                assert_eq!(expected, 4);
                assert_eq!(actual, 2);
            }
            other => panic!("expected short read, got {:?}", other),
        }
    }

    #[test]
    fn test_set_len_zero_fills() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.dat");

        let mut file = DataFile::open_or_create(&path).unwrap();
        file.write_at(0, b"ab").unwrap();
        file.set_len(6).unwrap();
        assert_eq!(file.read_at(0, 6).unwrap(), b"ab\0\0\0\0");

        file.set_len(1).unwrap();
        assert_eq!(file.byte_len().unwrap(), 1);
    }

    #[test]
    fn test_reopen_keeps_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.dat");

        {
            let mut file = DataFile::open_or_create(&path).unwrap();
            file.write_at(0, b"keep").unwrap();
            file.sync().unwrap();
        }

        let mut file = DataFile::open_or_create(&path).unwrap();
        assert_eq!(file.read_at(0, 4).unwrap(), b"keep");
    }
}
