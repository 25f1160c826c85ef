use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ingest::{CoercionPolicy, CommitMode, IngestOptions, WriteStrategy};

pub use crate::ingest::batch_writer::MAX_BATCH_SIZE;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

/// Ingestion pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub strategy: WriteStrategy,
    #[serde(default)]
    pub commit_mode: CommitMode,
    #[serde(default)]
    pub coercion: CoercionPolicy,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Folder scanned by the `load` binary for CSV files.
    #[serde(default)]
    pub data_folder: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            strategy: WriteStrategy::default(),
            commit_mode: CommitMode::default(),
            coercion: CoercionPolicy::default(),
            max_files: default_max_files(),
            data_folder: None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Reporting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_report_year")]
    pub year: i32,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            year: default_report_year(),
        }
    }
}

fn default_batch_size() -> usize {
    1000
}

fn default_max_files() -> usize {
    3
}

fn default_http_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_report_year() -> i32 {
    2021
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in STAFFLOAD_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("STAFFLOAD_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml(&config_str)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.ingest.batch_size == 0 || self.ingest.batch_size > MAX_BATCH_SIZE {
            anyhow::bail!(
                "ingest.batch_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE,
                self.ingest.batch_size
            );
        }

        if self.ingest.max_files == 0 {
            anyhow::bail!("ingest.max_files must be greater than 0");
        }

        if self.http_server.max_upload_bytes == 0 {
            anyhow::bail!("http_server.max_upload_bytes must be greater than 0");
        }

        Ok(())
    }

    /// Get database path
    pub fn db_path(&self) -> &Path {
        &self.storage.db_path
    }

    /// Pipeline options derived from the `[ingest]` section
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            batch_size: self.ingest.batch_size,
            strategy: self.ingest.strategy,
            commit_mode: self.ingest.commit_mode,
            coercion: self.ingest.coercion,
            max_files: self.ingest.max_files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    const FULL_CONFIG: &str = r#"
[storage]
db_path = "./test.db"

[ingest]
batch_size = 250
strategy = "insert_only"
commit_mode = "per_file"
coercion = "strict"
max_files = 3
data_folder = "./data"

[http_server]
port = 9090

[reports]
year = 2022
"#;

    fn with_config_env(config_path: &std::path::Path, f: impl FnOnce()) {
        let original = std::env::var("STAFFLOAD_CONFIG").ok();
        std::env::set_var("STAFFLOAD_CONFIG", config_path.to_str().unwrap());
        f();
        std::env::remove_var("STAFFLOAD_CONFIG");
        if let Some(val) = original {
            std::env::set_var("STAFFLOAD_CONFIG", val);
        }
    }

    #[test]
    fn test_config_load_success() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, FULL_CONFIG).unwrap();
        with_config_env(&config_path, || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            let config = config.unwrap();
            assert_eq!(config.ingest.batch_size, 250);
            assert_eq!(config.ingest.strategy, WriteStrategy::InsertOnly);
            assert_eq!(config.ingest.commit_mode, CommitMode::PerFile);
            assert_eq!(config.ingest.coercion, CoercionPolicy::Strict);
            assert_eq!(config.http_server.port, 9090);
            assert_eq!(config.reports.year, 2022);
            assert_eq!(config.ingest.data_folder, Some(PathBuf::from("./data")));
        });
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_toml("[storage]\ndb_path = \"x.db\"\n").unwrap();
        assert_eq!(config.ingest.batch_size, 1000);
        assert_eq!(config.ingest.strategy, WriteStrategy::Upsert);
        assert_eq!(config.ingest.commit_mode, CommitMode::EndOfRun);
        assert_eq!(config.ingest.coercion, CoercionPolicy::Lenient);
        assert_eq!(config.ingest.max_files, 3);
        assert_eq!(config.db_path(), Path::new("x.db"));
        assert_eq!(config.http_server.port, 8080);
        assert_eq!(config.reports.year, 2021);
    }

    #[test]
    fn test_config_rejects_oversized_batch() {
        let err = Config::from_toml("[storage]\ndb_path = \"x.db\"\n[ingest]\nbatch_size = 10000\n")
            .unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_config_rejects_unknown_strategy() {
        let result = Config::from_toml("[storage]\ndb_path = \"x.db\"\n[ingest]\nstrategy = \"merge_all\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        with_config_env(std::path::Path::new("nonexistent.toml"), || {
            assert!(Config::load().is_err());
        });
    }
}
