use crate::error::{ProcessingError, Result};
use crate::utils::constants::{ALIGNMENT_SCAN_BUFFER_SIZE, RECORD_TERMINATOR};
use std::fmt;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Half-open byte range `[start, end)` of the input owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionRange {
    pub start: u64,
    pub end: u64,
}

impl PartitionRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for PartitionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}) ({} bytes)", self.start, self.end, self.len())
    }
}

/// Splits an input into record-aligned, contiguous partitions.
pub struct Partitioner {
    workers: usize,
}

impl Partitioner {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Compute one range per worker over `[0, file_size)`.
    ///
    /// Each internal boundary is moved forward to just past the next record
    /// terminator, so no record is split. Boundaries never move backwards,
    /// which can leave trailing ranges empty on small inputs. I/O failures
    /// while scanning are reported against `path`.
    pub fn partition<R: Read + Seek>(
        &self,
        path: &Path,
        reader: &mut R,
        file_size: u64,
    ) -> Result<Vec<PartitionRange>> {
        let workers = self.workers as u64;
        let part_size = file_size.div_ceil(workers);

        let mut boundaries = Vec::with_capacity(self.workers + 1);
        boundaries.push(0);

        for i in 1..workers {
            let previous = boundaries[boundaries.len() - 1];
            let nominal = (i * part_size).min(file_size).max(previous);

            let boundary = if nominal == 0 || nominal == file_size {
                nominal
            } else {
                Self::align(path, reader, nominal, file_size)?
            };
            boundaries.push(boundary);
        }
        boundaries.push(file_size);

        let ranges: Vec<PartitionRange> = boundaries
            .windows(2)
            .map(|pair| PartitionRange::new(pair[0], pair[1]))
            .collect();

        debug!(
            file_size,
            workers = self.workers,
            part_size,
            "computed {} partitions",
            ranges.len()
        );

        Ok(ranges)
    }

    /// Smallest offset `>= nominal` whose preceding byte is a terminator.
    fn align<R: Read + Seek>(
        path: &Path,
        reader: &mut R,
        nominal: u64,
        file_size: u64,
    ) -> Result<u64> {
        let mut position = nominal - 1;
        reader
            .seek(SeekFrom::Start(position))
            .map_err(|e| ProcessingError::file_access(path, e))?;

        let mut buffer = [0u8; ALIGNMENT_SCAN_BUFFER_SIZE];
        while position < file_size {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ProcessingError::file_access(path, e)),
            };

            if let Some(index) = buffer[..read].iter().position(|&b| b == RECORD_TERMINATOR) {
                return Ok(position + index as u64 + 1);
            }
            position += read as u64;
        }

        Err(ProcessingError::PartitionAlignment { offset: nominal })
    }
}
