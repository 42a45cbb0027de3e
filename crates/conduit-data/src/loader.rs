//! Loads the static transfer configuration from a data file.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and the
//! deserialize-then-validate step that hands the engine a checked
//! [`TransferConfig`].

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use conduit_core::config::{ConfigError, TransferConfig};
use tracing::debug;

/// Base name of the configuration file inside a data directory.
pub const CONFIG_BASE_NAME: &str = "transfer";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The configuration file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The file parsed but its rate tables are unusable.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    const ALL: [(Format, &'static str); 3] =
        [(Format::Ron, "ron"), (Format::Toml, "toml"), (Format::Json, "json")];
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let ext = path.extension().and_then(|e| e.to_str());
    Format::ALL
        .iter()
        .find(|(_, known)| Some(*known) == ext)
        .map(|(format, _)| *format)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Find `transfer.{ron,toml,json}` in `dir`.
///
/// Returns `Ok(None)` if none exists, or `Err(ConflictingFormats)` if more
/// than one format is present.
pub fn find_config_file(dir: &Path) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for (_, ext) in Format::ALL {
        let candidate = dir.join(format!("{CONFIG_BASE_NAME}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing,
                b: candidate,
            });
        }
        found = Some(candidate);
    }
    Ok(found)
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, e: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Read a file and deserialize it according to its format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Load and validate a transfer configuration file.
pub fn load_transfer_config(path: &Path) -> Result<TransferConfig, DataLoadError> {
    let config: TransferConfig = deserialize_file(path)?;
    config.validate()?;
    debug!(file = %path.display(), seed = config.seed, "transfer config loaded");
    Ok(config)
}

/// Load the configuration from a data directory. A directory without a
/// configuration file yields the defaults.
pub fn load_config_dir(dir: &Path) -> Result<TransferConfig, DataLoadError> {
    match find_config_file(dir)? {
        Some(path) => load_transfer_config(&path),
        None => {
            debug!(dir = %dir.display(), "no transfer config, using defaults");
            Ok(TransferConfig::default())
        }
    }
}

/// Like [`load_config_dir`], but a missing file is an error.
pub fn require_config_dir(dir: &Path) -> Result<TransferConfig, DataLoadError> {
    let path = find_config_file(dir)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: CONFIG_BASE_NAME,
        dir: dir.to_path_buf(),
    })?;
    load_transfer_config(&path)
}

// ===========================================================================
// Tests
// ===========================================================================
