use crate::utils::constants::DEFAULT_INPUT_FILE;
use crate::writers::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "brc-processor")]
#[command(about = "High-performance station measurement aggregator")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Settings file (overridden by BRC_* environment variables and flags)"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate min/mean/max per station and print the summary
    Process {
        #[arg(short, long, default_value = DEFAULT_INPUT_FILE, help = "Input measurements file")]
        input: PathBuf,

        #[arg(long, help = "Worker threads [default: logical CPUs]")]
        workers: Option<usize>,

        #[arg(long, help = "Bytes read per chunk by each worker")]
        chunk_size: Option<usize>,

        #[arg(long, help = "Read partitions through a memory map")]
        mmap: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[arg(long, help = "Show a progress bar on stderr")]
        progress: bool,
    },

    /// Parse the whole file and report malformed records without printing a summary
    Validate {
        #[arg(short, long, default_value = DEFAULT_INPUT_FILE, help = "Input measurements file")]
        input: PathBuf,

        #[arg(long, help = "Worker threads [default: logical CPUs]")]
        workers: Option<usize>,
    },

    /// Display the file size and partition plan
    Info {
        #[arg(short, long, default_value = DEFAULT_INPUT_FILE, help = "Input measurements file")]
        input: PathBuf,

        #[arg(long, help = "Worker threads [default: logical CPUs]")]
        workers: Option<usize>,
    },
}
