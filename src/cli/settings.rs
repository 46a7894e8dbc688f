use crate::error::Result;
use crate::readers::ReadMode;
use crate::utils::constants::{DEFAULT_CHUNK_SIZE, ENV_PREFIX, MAX_WORKERS};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use validator::Validate;

/// Processing settings, layered as defaults < settings file < `BRC_*`
/// environment variables < command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct Settings {
    #[validate(range(min = 1, max = 1024))]
    pub workers: usize,

    #[validate(range(min = 1))]
    pub chunk_size: usize,

    #[serde(default)]
    pub use_mmap: bool,
}

impl Settings {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        Self::load_with_environment(config_file, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_environment(config_file: Option<&Path>, environment: Environment) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("workers", num_cpus::get().min(MAX_WORKERS) as i64)?
            .set_default("chunk_size", DEFAULT_CHUNK_SIZE as i64)?
            .set_default("use_mmap", false)?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Apply command-line overrides and re-validate.
    pub fn with_overrides(
        mut self,
        workers: Option<usize>,
        chunk_size: Option<usize>,
        mmap: bool,
    ) -> Result<Self> {
        if let Some(workers) = workers {
            self.workers = workers;
        }
        if let Some(chunk_size) = chunk_size {
            self.chunk_size = chunk_size;
        }
        if mmap {
            self.use_mmap = true;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn read_mode(&self) -> ReadMode {
        if self.use_mmap {
            ReadMode::Mapped
        } else {
            ReadMode::Buffered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::Builder;

    fn no_environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::new()))
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with_environment(None, no_environment()).unwrap();

        assert!(settings.workers >= 1);
        assert_eq!(settings.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(!settings.use_mmap);
        assert_eq!(settings.read_mode(), ReadMode::Buffered);
    }

    #[test]
    fn test_settings_file_and_environment_layers() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "workers = 3\nchunk_size = 4096").unwrap();
        file.flush().unwrap();

        let environment = Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::from([
            ("BRC_CHUNK_SIZE".to_string(), "8192".to_string()),
        ])));

        let settings = Settings::load_with_environment(Some(file.path()), environment).unwrap();

        assert_eq!(settings.workers, 3);
        assert_eq!(settings.chunk_size, 8192);
        assert_eq!(settings.read_mode(), ReadMode::Buffered);
    }

    #[test]
    fn test_use_mmap_from_environment() {
        let environment = Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::from([
            ("BRC_USE_MMAP".to_string(), "true".to_string()),
            ("BRC_WORKERS".to_string(), "2".to_string()),
        ])));

        let settings = Settings::load_with_environment(None, environment).unwrap();

        assert_eq!(settings.workers, 2);
        assert!(settings.use_mmap);
        assert_eq!(settings.read_mode(), ReadMode::Mapped);
    }

    #[test]
    fn test_use_mmap_from_settings_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "use_mmap = true").unwrap();
        file.flush().unwrap();

        let settings = Settings::load_with_environment(Some(file.path()), no_environment()).unwrap();

        assert_eq!(settings.read_mode(), ReadMode::Mapped);
    }

    #[test]
    fn test_missing_settings_file_is_an_error() {
        let result = Settings::load_with_environment(
            Some(Path::new("/no/such/settings.toml")),
            no_environment(),
        );
        assert!(matches!(result, Err(ProcessingError::Settings(_))));
    }

    #[test]
    fn test_overrides_are_validated() {
        let settings = Settings::load_with_environment(None, no_environment()).unwrap();

        let overridden = settings
            .clone()
            .with_overrides(Some(2), Some(64), true)
            .unwrap();
        assert_eq!(overridden.workers, 2);
        assert_eq!(overridden.chunk_size, 64);
        assert_eq!(overridden.read_mode(), ReadMode::Mapped);

        assert!(matches!(
            settings.clone().with_overrides(Some(0), None, false),
            Err(ProcessingError::Validation(_))
        ));
        assert!(matches!(
            settings.with_overrides(None, Some(0), false),
            Err(ProcessingError::Validation(_))
        ));
    }
}
