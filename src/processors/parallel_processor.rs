use crate::error::{ProcessingError, Result};
use crate::models::{StationMap, StationTable};
use crate::processors::{DataMerger, PartitionRange, Partitioner};
use crate::readers::{PartitionReader, ReadMode};
use crate::utils::constants::DEFAULT_CHUNK_SIZE;
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct ParallelProcessor {
    max_workers: usize,
    chunk_size: usize,
    read_mode: ReadMode,
}

impl ParallelProcessor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
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

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Size the input and split it into one record-aligned range per worker.
    pub fn plan_partitions(&self, path: &Path) -> Result<(u64, Vec<PartitionRange>)> {
        let mut file = File::open(path).map_err(|e| ProcessingError::file_access(path, e))?;
        let file_size = file
            .metadata()
            .map_err(|e| ProcessingError::file_access(path, e))?
            .len();

        let ranges = Partitioner::new(self.max_workers)
            .partition(path, &mut file, file_size)?;

        Ok((file_size, ranges))
    }

    /// Aggregate the whole file: partition, read every partition on its own
    /// worker, then merge the per-worker maps.
    pub fn process_file(
        &self,
        path: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<StationTable> {
        let started = Instant::now();
        let (file_size, ranges) = self.plan_partitions(path)?;

        info!(
            path = %path.display(),
            file_size,
            workers = self.max_workers,
            chunk_size = self.chunk_size,
            read_mode = ?self.read_mode,
            "aggregating input"
        );
        for (index, range) in ranges.iter().enumerate() {
            debug!(worker = index, "partition {}", range);
        }

        if let Some(p) = progress {
            p.set_message(&format!("Reading {} partitions...", ranges.len()));
        }

        let partials = self.read_partitions(path, &ranges, progress)?;

        if let Some(p) = progress {
            p.set_message("Merging station data...");
        }

        let merger = DataMerger::new();
        let table = merger.merge_station_maps(partials);

        if let Some(p) = progress {
            p.finish_with_message(&format!("Aggregated {} stations", table.len()));
        }

        info!(
            stations = table.len(),
            records = merger.record_count(&table),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "aggregation complete"
        );

        Ok(table)
    }

    /// Run one worker per range on a dedicated pool and collect their maps.
    fn read_partitions(
        &self,
        path: &Path,
        ranges: &[PartitionRange],
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<StationMap>> {
        // Configure Rayon thread pool
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .thread_name(|index| format!("brc-worker-{}", index))
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let abort = AtomicBool::new(false);

        let results: Vec<Result<StationMap>> = pool.install(|| {
            ranges
                .par_iter()
                .map(|range| {
                    let result = PartitionReader::new(path, *range)
                        .with_chunk_size(self.chunk_size)
                        .with_read_mode(self.read_mode)
                        .read(&abort, progress);

                    if let Err(ref e) = result {
                        if !matches!(e, ProcessingError::Cancelled) {
                            warn!(start = range.start, end = range.end, "worker failed: {}", e);
                            abort.store(true, Ordering::Relaxed);
                        }
                    }

                    result
                })
                .collect()
        });

        Self::first_failure(results)
    }

    /// Prefer the error that triggered the abort over the cancellations it
    /// caused in the other workers.
    fn first_failure(results: Vec<Result<StationMap>>) -> Result<Vec<StationMap>> {
        let mut partials = Vec::with_capacity(results.len());
        let mut cancelled = false;

        for result in results {
            match result {
                Ok(stations) => partials.push(stations),
                Err(ProcessingError::Cancelled) => cancelled = true,
                Err(e) => return Err(e),
            }
        }

        if cancelled {
            return Err(ProcessingError::Cancelled);
        }

        Ok(partials)
    }
}

impl Default for ParallelProcessor {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}
