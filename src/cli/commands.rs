use crate::cli::args::{Cli, Commands};
use crate::cli::settings::Settings;
use crate::error::{ProcessingError, Result};
use crate::processors::{DataMerger, ParallelProcessor};
use crate::utils::progress::ProgressReporter;
use crate::writers::SummaryWriter;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, Level, Subscriber};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub fn run(cli: Cli) -> Result<()> {
    let subscriber = log_subscriber(cli.verbose, cli.log_file.as_deref())?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ProcessingError::Config(format!("failed to initialise logging: {}", e)))?;

    let stdout = io::stdout().lock();
    let mut out = BufWriter::new(stdout);
    execute(cli.command, cli.config.as_deref(), &mut out)?;
    out.flush()?;

    Ok(())
}

/// Run one command, writing its results to `out`.
fn execute<W: Write>(command: Commands, config_file: Option<&Path>, out: &mut W) -> Result<()> {
    let settings = Settings::load(config_file)?;

    match command {
        Commands::Process {
            input,
            workers,
            chunk_size,
            mmap,
            format,
            progress,
        } => {
            let settings = settings.with_overrides(workers, chunk_size, mmap)?;
            let processor = processor_for(&settings);

            let reporter = if progress {
                let size = std::fs::metadata(&input)
                    .map_err(|e| ProcessingError::file_access(&input, e))?
                    .len();
                ProgressReporter::new(size, "Aggregating measurements...", false)
            } else {
                ProgressReporter::silent()
            };

            let stations = match processor.process_file(&input, Some(&reporter)) {
                Ok(stations) => stations,
                Err(e) => {
                    reporter.abandon();
                    return Err(e);
                }
            };

            SummaryWriter::with_format(format).write_summary(&stations, out)?;
        }

        Commands::Validate { input, workers } => {
            let settings = settings.with_overrides(workers, None, false)?;
            let processor = processor_for(&settings);

            writeln!(out, "Validating {}...", input.display())?;
            let stations = processor.process_file(&input, None)?;

            let records = DataMerger::new().record_count(&stations);
            writeln!(
                out,
                "✅ {} records across {} stations parsed without errors",
                records,
                stations.len()
            )?;
        }

        Commands::Info { input, workers } => {
            let settings = settings.with_overrides(workers, None, false)?;
            let processor = processor_for(&settings);

            let (file_size, ranges) = processor.plan_partitions(&input)?;

            writeln!(out, "File: {}", input.display())?;
            writeln!(out, "Size: {} bytes", file_size)?;
            writeln!(
                out,
                "Workers: {}, Chunk size: {} bytes, Read mode: {:?}",
                settings.workers,
                settings.chunk_size,
                settings.read_mode()
            )?;
            writeln!(out, "\nPartitions:")?;
            for (index, range) in ranges.iter().enumerate() {
                writeln!(out, "  {:>4}. {}", index + 1, range)?;
            }
        }
    }

    Ok(())
}

fn processor_for(settings: &Settings) -> ParallelProcessor {
    info!(?settings, "resolved settings");
    ParallelProcessor::new(settings.workers)
        .with_chunk_size(settings.chunk_size)
        .with_read_mode(settings.read_mode())
}

/// Logs go to stderr or the log file; stdout carries only results.
fn log_subscriber(verbose: bool, log_file: Option<&Path>) -> Result<impl Subscriber + Send + Sync> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    let writer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|e| ProcessingError::file_access(path, e))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(io::stderr),
    };

    Ok(tracing_subscriber::fmt()
        .with_max_level(level)
        .with_thread_names(true)
        .with_ansi(log_file.is_none())
        .with_writer(writer)
        .finish())
}
