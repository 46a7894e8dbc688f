pub mod data_merger;
pub mod parallel_processor;
pub mod partitioner;

pub use data_merger::DataMerger;
pub use parallel_processor::ParallelProcessor;
pub use partitioner::{PartitionRange, Partitioner};
