//! Fixed-size random-access record store
//!
//! A [`RecordStore`] treats a flat binary file as a mutable sequence of
//! equally sized records. Length is never cached; it is derived from the
//! live file size on every call.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use super::data_file::DataFile;
use super::layout::Layout;
use super::options::StoreOptions;
use crate::error::{RecordError, RecordResult};

/// A file of fixed-size records addressed by position
///
/// Records have no identity beyond their index. Deleting record `i` moves
/// every record after it down one slot, so index `i + 1` becomes `i`.
/// Callers needing stable keys must keep their own key-to-index mapping.
///
/// The store is the sole owner of its file handle. It is not `Clone`; wrap
/// it in a mutex (see [`OpenStoreTable`](crate::file_manager::OpenStoreTable))
/// when several callers must share it.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    layout: Layout,
    data: Option<DataFile>,
    auto_flush: bool,
}

impl RecordStore {
    /// Open or create a store with auto-flush enabled
    pub fn open(path: impl AsRef<Path>, record_size: usize) -> RecordResult<Self> {
        Self::open_with(path, StoreOptions::new(record_size))
    }

    /// Open or create a store
    pub fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> RecordResult<Self> {
        let path = path.as_ref();
        let layout = Layout::new(options.record_size)?;
        let data = DataFile::open_or_create(path)?;

        let size = data.byte_len()?;
        match layout.records_in(size) {
            Some(records) => debug!(
                path = %path.display(),
                record_size = options.record_size,
                records,
                "opened record store"
            ),
            None => warn!(
                path = %path.display(),
                record_size = options.record_size,
                size,
                "record file size is not a multiple of the record size"
            ),
        }

        Ok(RecordStore {
            path: path.to_path_buf(),
            layout,
            data: Some(data),
            auto_flush: options.auto_flush,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_size(&self) -> usize {
        self.layout.record_size()
    }

    pub fn auto_flush(&self) -> bool {
        self.auto_flush
    }

    pub fn set_auto_flush(&mut self, auto_flush: bool) {
        self.auto_flush = auto_flush;
    }

    pub fn options(&self) -> StoreOptions {
        StoreOptions::new(self.record_size()).auto_flush(self.auto_flush)
    }

    pub fn is_closed(&self) -> bool {
        self.data.is_none()
    }

    /// Number of records, computed from the current file size
    pub fn len(&self) -> RecordResult<u64> {
        let data = self.data.as_ref().ok_or_else(|| self.closed())?;
        record_count(self.layout, data)
    }

    pub fn is_empty(&self) -> RecordResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Append a record at the end, returning its index
    pub fn append(&mut self, record: &[u8]) -> RecordResult<u64> {
        let layout = self.layout;
        layout.check(record)?;
        let auto_flush = self.auto_flush;
        let data = self.data_mut()?;

        let index = record_count(layout, data)?;
        let offset = layout
            .offset_of(index)
            .ok_or_else(|| overflow(data.path(), index))?;

        trace!(index, offset, "append record");
        data.write_at(offset, record)?;
        if auto_flush {
            data.sync()?;
        }
        Ok(index)
    }

    /// Read the record at `index`
    pub fn get(&mut self, index: u64) -> RecordResult<Vec<u8>> {
        let layout = self.layout;
        let data = self.data_mut()?;

        let length = record_count(layout, data)?;
        if index >= length {
            return Err(RecordError::IndexOutOfRange { index, length });
        }
        // index < length, so the offset lies inside the file
        let offset = index * layout.record_size() as u64;

        trace!(index, offset, "read record");
        data.read_at(offset, layout.record_size())
    }

    /// Write the record at `index`
    ///
    /// An index inside the store overwrites in place. An index at the
    /// current length appends. An index past the end extends the file and
    /// the skipped slots read back as all-zero records.
    pub fn set(&mut self, index: u64, record: &[u8]) -> RecordResult<()> {
        let layout = self.layout;
        layout.check(record)?;
        let auto_flush = self.auto_flush;
        let data = self.data_mut()?;

        let length = record_count(layout, data)?;
        let offset = index
            .checked_add(1)
            .and_then(|end| layout.offset_of(end))
            .map(|end| end - layout.record_size() as u64)
            .ok_or_else(|| overflow(data.path(), index))?;

        if index > length {
            debug!(
                path = %data.path().display(),
                from = length,
                to = index,
                "zero-filling gap before record"
            );
            data.set_len(offset)?;
        }

        trace!(index, offset, "write record");
        data.write_at(offset, record)?;
        if auto_flush {
            data.sync()?;
        }
        Ok(())
    }

    /// Remove the record at `index` and close the gap
    ///
    /// Every later record is copied down one slot, then the file is
    /// truncated by one record and flushed. The shift is done in place: if
    /// it fails partway the file holds a mix of shifted and unshifted
    /// records and must be treated as corrupt.
    pub fn delete(&mut self, index: u64) -> RecordResult<()> {
        let layout = self.layout;
        let record_size = layout.record_size();
        let data = self.data_mut()?;

        let length = record_count(layout, data)?;
        if index >= length {
            return Err(RecordError::IndexOutOfRange { index, length });
        }

        for position in index + 1..length {
            let from = position * record_size as u64;
            let record = data.read_at(from, record_size)?;
            data.write_at(from - record_size as u64, &record)?;
        }

        // length - 1 < length, and length records already fit in the file
        let truncated = layout
            .bytes_for(length - 1)
            .ok_or_else(|| overflow(data.path(), length - 1))?;
        data.set_len(truncated)?;
        data.sync()?;

        debug!(
            path = %data.path().display(),
            index,
            shifted = length - index - 1,
            "deleted record"
        );
        Ok(())
    }

    /// Force written records to durable storage
    pub fn flush(&mut self) -> RecordResult<()> {
        self.data_mut()?.sync()
    }

    /// Flush and release the file
    ///
    /// The handle is released even when the final flush fails. Closing an
    /// already closed store does nothing.
    pub fn close(&mut self) -> RecordResult<()> {
        let Some(mut data) = self.data.take() else {
            return Ok(());
        };
        let result = data.sync();
        drop(data);
        debug!(path = %self.path.display(), "closed record store");
        result
    }

    /// Iterate over every record from index 0 to the end
    pub fn records(&mut self) -> Records<'_> {
        Records {
            store: self,
            next: 0,
            done: false,
        }
    }

    fn data_mut(&mut self) -> RecordResult<&mut DataFile> {
        match self.data.as_mut() {
            Some(data) => Ok(data),
            None => Err(RecordError::Closed {
                path: self.path.clone(),
            }),
        }
    }

    fn closed(&self) -> RecordError {
        RecordError::Closed {
            path: self.path.clone(),
        }
    }
}

impl Drop for RecordStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), error = %e, "failed to close record store");
        }
    }
}

/// Records held by the file, rejecting a size that is not a whole number
/// of records
fn record_count(layout: Layout, data: &DataFile) -> RecordResult<u64> {
    let size = data.byte_len()?;
    layout.records_in(size).ok_or_else(|| RecordError::Misaligned {
        path: data.path().to_path_buf(),
        size,
        record_size: layout.record_size(),
    })
}

fn overflow(path: &Path, index: u64) -> RecordError {
    RecordError::io(
        path,
        None,
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("offset of record {} overflows", index),
        ),
    )
}

/// Iterator over the records of a store, in index order
///
/// Ends at the first index past the end. A storage failure is yielded once
/// and then the iterator stops.
pub struct Records<'a> {
    store: &'a mut RecordStore,
    next: u64,
    done: bool,
}

impl Iterator for Records<'_> {
    type Item = RecordResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.store.get(self.next) {
            Ok(record) => {
                self.next += 1;
                Some(Ok(record))
            }
            Err(e) if e.is_out_of_range() => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
