//! Configuration file format.
//!
//! ```toml
//! [converter]
//! dir = "C:/Program Files/Philips Channel Editor"
//!
//! [names]
//! encoding = "windows-1252"
//!
//! [logging]
//! level = "info"
//! log_dir = "logs"
//! retention_days = 7
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default config file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "chanmap.toml";

pub const DEFAULT_ENCODING: &str = "windows-1252";

pub const DEFAULT_RETENTION_DAYS: u64 = 7;

#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub converter: ConverterSection,
    #[serde(default)]
    pub names: NamesSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize, Default)]
pub struct ConverterSection {
    /// Directory holding Air.dll, Cable.dll and dvbs2_cte.dll.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct NamesSection {
    pub encoding: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub retention_days: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Explicit path > `chanmap.toml` in the current directory > defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<(ConfigFile, Option<PathBuf>), ConfigError> {
    let path = explicit.map(Path::to_path_buf).or_else(|| {
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        default_path.exists().then_some(default_path)
    });
    match path {
        Some(path) => Ok((load_config(&path)?, Some(path))),
        None => Ok((ConfigFile::default(), None)),
    }
}
