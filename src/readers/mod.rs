pub mod partition_reader;
pub mod record_parser;

pub use partition_reader::{PartitionReader, ReadMode};
pub use record_parser::RecordParser;
