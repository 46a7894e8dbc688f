/// Record syntax
pub const FIELD_SEPARATOR: u8 = b';';
pub const RECORD_TERMINATOR: u8 = b'\n';
pub const DECIMAL_POINT: u8 = b'.';
pub const NEGATIVE_SIGN: u8 = b'-';

/// Values carry exactly one fractional digit
pub const FIXED_POINT_SCALE: i64 = 10;

/// File names
pub const DEFAULT_INPUT_FILE: &str = "measurements.txt";

/// Processing defaults
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024; // 1MB
pub const ALIGNMENT_SCAN_BUFFER_SIZE: usize = 256;
pub const MAX_WORKERS: usize = 1024;

/// Environment variable prefix for settings (BRC_WORKERS, BRC_CHUNK_SIZE, ...)
pub const ENV_PREFIX: &str = "BRC";
