use crate::error::{ProcessingError, Result};
use crate::models::StationMap;
use crate::processors::PartitionRange;
use crate::readers::RecordParser;
use crate::utils::constants::DEFAULT_CHUNK_SIZE;
use crate::utils::progress::ProgressReporter;
use memmap2::Mmap;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// How a worker pulls bytes out of its partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadMode {
    /// Fixed-size `read` calls on a private file handle
    #[default]
    Buffered,
    /// Slices of a read-only memory map
    Mapped,
}

/// Reads one partition of the input in chunks and aggregates it.
pub struct PartitionReader {
    path: PathBuf,
    range: PartitionRange,
    chunk_size: usize,
    read_mode: ReadMode,
}

impl PartitionReader {
    pub fn new(path: &Path, range: PartitionRange) -> Self {
        Self {
            path: path.to_path_buf(),
            range,
            chunk_size: DEFAULT_CHUNK_SIZE,
            read_mode: ReadMode::Buffered,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_read_mode(mut self, read_mode: ReadMode) -> Self {
        self.read_mode = read_mode;
        self
    }

    /// Aggregate every record in the partition.
    ///
    /// `abort` is polled between chunks; once it is set the read stops with
    /// [`ProcessingError::Cancelled`].
    pub fn read(
        &self,
        abort: &AtomicBool,
        progress: Option<&ProgressReporter>,
    ) -> Result<StationMap> {
        let mut stations = StationMap::default();
        if self.range.is_empty() {
            return Ok(stations);
        }

        let mut parser = RecordParser::starting_at(self.range.start);
        match self.read_mode {
            ReadMode::Buffered => self.read_buffered(&mut parser, &mut stations, abort, progress)?,
            ReadMode::Mapped => self.read_mapped(&mut parser, &mut stations, abort, progress)?,
        }
        parser.finish()?;

        debug!(
            start = self.range.start,
            end = self.range.end,
            parsed_to = parser.offset(),
            stations = stations.len(),
            "partition complete"
        );

        Ok(stations)
    }

    fn read_buffered(
        &self,
        parser: &mut RecordParser,
        stations: &mut StationMap,
        abort: &AtomicBool,
        progress: Option<&ProgressReporter>,
    ) -> Result<()> {
        let mut file =
            File::open(&self.path).map_err(|e| ProcessingError::file_access(&self.path, e))?;
        file.seek(SeekFrom::Start(self.range.start))
            .map_err(|e| ProcessingError::file_access(&self.path, e))?;

        let mut reader = file.take(self.range.len());
        let mut buffer = vec![0u8; self.chunk_size];
        let mut consumed = 0u64;

        loop {
            if abort.load(Ordering::Relaxed) {
                return Err(ProcessingError::Cancelled);
            }

            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ProcessingError::file_access(&self.path, e)),
            };

            parser.feed(&buffer[..read], stations)?;
            consumed += read as u64;

            if let Some(p) = progress {
                p.increment(read as u64);
            }
        }

        if consumed != self.range.len() {
            return Err(self.truncated(consumed));
        }

        Ok(())
    }

    fn read_mapped(
        &self,
        parser: &mut RecordParser,
        stations: &mut StationMap,
        abort: &AtomicBool,
        progress: Option<&ProgressReporter>,
    ) -> Result<()> {
        let file =
            File::open(&self.path).map_err(|e| ProcessingError::file_access(&self.path, e))?;
        // The input is treated as immutable for the duration of the run.
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| ProcessingError::file_access(&self.path, e))?;

        let start = self.range.start as usize;
        let end = self.range.end as usize;
        let partition = mmap
            .get(start..end)
            .ok_or_else(|| self.truncated(mmap.len().saturating_sub(start) as u64))?;

        for chunk in partition.chunks(self.chunk_size) {
            if abort.load(Ordering::Relaxed) {
                return Err(ProcessingError::Cancelled);
            }

            parser.feed(chunk, stations)?;

            if let Some(p) = progress {
                p.increment(chunk.len() as u64);
            }
        }

        Ok(())
    }

    fn truncated(&self, consumed: u64) -> ProcessingError {
        ProcessingError::file_access(
            &self.path,
            std::io::Error::new(
                ErrorKind::UnexpectedEof,
                format!(
                    "partition {} ended after {} bytes; file changed while reading",
                    self.range, consumed
                ),
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FixedPoint;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const INPUT: &[u8] = b"A;1.0\nB;-2.5\nA;3.0\nC;0.0\n";

    fn input_file() -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(INPUT)?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_reads_whole_file_in_small_chunks() -> Result<()> {
        let file = input_file()?;
        let range = PartitionRange::new(0, INPUT.len() as u64);

        for mode in [ReadMode::Buffered, ReadMode::Mapped] {
            let stations = PartitionReader::new(file.path(), range)
                .with_chunk_size(3)
                .with_read_mode(mode)
                .read(&AtomicBool::new(false), None)?;

            assert_eq!(stations.len(), 3);
            let a = &stations[b"A".as_slice()];
            assert_eq!(a.count(), 2);
            assert_eq!(a.mean(), Some(FixedPoint::from_tenths(20)));
        }

        Ok(())
    }

    #[test]
    fn test_reads_only_its_range() -> Result<()> {
        let file = input_file()?;
        // "B;-2.5\nA;3.0\n"
        let range = PartitionRange::new(6, 19);

        let stations = PartitionReader::new(file.path(), range)
            .with_chunk_size(4)
            .read(&AtomicBool::new(false), None)?;

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[b"A".as_slice()].count(), 1);
        assert_eq!(
            stations[b"B".as_slice()].min(),
            Some(FixedPoint::from_tenths(-25))
        );
        assert!(!stations.contains_key(b"C".as_slice()));

        Ok(())
    }

    #[test]
    fn test_empty_range_needs_no_file() -> Result<()> {
        let stations = PartitionReader::new(Path::new("/does/not/exist"), PartitionRange::new(5, 5))
            .read(&AtomicBool::new(false), None)?;
        assert!(stations.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_file_access_error() {
        let result = PartitionReader::new(Path::new("/does/not/exist"), PartitionRange::new(0, 10))
            .read(&AtomicBool::new(false), None);
        assert!(matches!(result, Err(ProcessingError::FileAccess { .. })));
    }

    #[test]
    fn test_range_past_end_of_file_is_detected() -> Result<()> {
        let file = input_file()?;
        let range = PartitionRange::new(0, INPUT.len() as u64 + 6);

        for mode in [ReadMode::Buffered, ReadMode::Mapped] {
            let result = PartitionReader::new(file.path(), range)
                .with_read_mode(mode)
                .read(&AtomicBool::new(false), None);
            assert!(matches!(result, Err(ProcessingError::FileAccess { .. })));
        }

        Ok(())
    }

    #[test]
    fn test_abort_flag_stops_worker() -> Result<()> {
        let file = input_file()?;
        let range = PartitionRange::new(0, INPUT.len() as u64);

        let result = PartitionReader::new(file.path(), range).read(&AtomicBool::new(true), None);
        assert!(matches!(result, Err(ProcessingError::Cancelled)));

        Ok(())
    }

    #[test]
    fn test_progress_counts_partition_bytes() -> Result<()> {
        let file = input_file()?;
        let range = PartitionRange::new(0, INPUT.len() as u64);
        let progress = ProgressReporter::new(INPUT.len() as u64, "Reading", false);

        PartitionReader::new(file.path(), range)
            .with_chunk_size(5)
            .read(&AtomicBool::new(false), Some(&progress))?;

        assert_eq!(progress.position(), INPUT.len() as u64);
        Ok(())
    }
}
