//! Configuration for the satchel service.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding the private and public storage areas.
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted file, in bytes. Applies to declared chunked sizes
    /// and to whole-file payloads.
    pub max_file_size: u64,

    /// Sessions with no chunk activity for this long are swept.
    pub session_idle_timeout_secs: u64,

    /// Interval between sweeper runs.
    pub sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig {
                root: PathBuf::from("./data"),
            },
            database: DatabaseConfig {
                url: "sqlite:./satchel.db".to_string(),
            },
            upload: UploadConfig {
                max_file_size: 500 * 1024 * 1024,
                session_idle_timeout_secs: 24 * 60 * 60,
                sweep_interval_secs: 300,
            },
        }
    }
}

impl Config {
    /// Build configuration from the environment, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            storage: StorageConfig {
                root: env::var("SATCHEL_STORAGE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.root),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            upload: UploadConfig {
                max_file_size: env::var("SATCHEL_MAX_FILE_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.upload.max_file_size),
                session_idle_timeout_secs: env::var("SATCHEL_SESSION_IDLE_TIMEOUT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.upload.session_idle_timeout_secs),
                sweep_interval_secs: env::var("SATCHEL_SWEEP_INTERVAL")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.upload.sweep_interval_secs),
            },
        }
    }
}
