//! Optional configuration file supplying defaults for CLI options.
//!
//! The file holds `key = value` lines; `#` starts a comment outside of a
//! double-quoted string. Paths are double-quoted strings, numbers are bare
//! integers:
//!
//! ```text
//! concurrency = 8          # workers
//! download_dir = "/srv/roms"
//! max_attempts = 5
//! retry_delay_ms = 500
//! ```
//!
//! Unknown keys and out-of-range values are rejected.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Name of the per-user config directory and of the default file inside it.
const CONFIG_DIR_NAME: &str = "linkdl";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors loading or validating a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// The config file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A non-comment line without `=`.
    #[error("invalid config syntax on line {line}: expected key = value")]
    Syntax {
        /// 1-based line number.
        line: usize,
    },

    /// A key this program does not know.
    #[error("unknown configuration key: '{key}' on line {line}")]
    UnknownKey {
        /// The offending key.
        key: String,
        /// 1-based line number.
        line: usize,
    },

    /// A value of the wrong shape for its key.
    #[error("invalid `{key}` value on line {line}: {reason}")]
    InvalidValue {
        /// The key being set.
        key: &'static str,
        /// 1-based line number.
        line: usize,
        /// What was expected.
        reason: String,
    },

    /// A well-formed value outside the accepted range.
    #[error("invalid config value for `{key}`: {value}. Expected range: {expected}")]
    OutOfRange {
        /// The key being set.
        key: &'static str,
        /// The rejected value.
        value: u64,
        /// The accepted range.
        expected: &'static str,
    },
}

/// Defaults read from the config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Default worker count (1..=100).
    pub concurrency: Option<usize>,
    /// Default download directory.
    pub download_dir: Option<PathBuf>,
    /// Default attempts per URL (1..=10).
    pub max_attempts: Option<u32>,
    /// Default pause between attempts in milliseconds (0..=60000).
    pub retry_delay_ms: Option<u64>,
    /// Default error log path.
    pub error_log: Option<PathBuf>,
    /// Default ranking report path.
    pub output: Option<PathBuf>,
    /// HTTP connect timeout in seconds (1..=3600).
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds (1..=3600).
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for the first value outside its range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("concurrency", self.concurrency.map(|v| v as u64), 1, 100, "1..=100")?;
        check_range("max_attempts", self.max_attempts.map(u64::from), 1, 10, "1..=10")?;
        check_range("retry_delay_ms", self.retry_delay_ms, 0, 60_000, "0..=60000")?;
        check_range("connect_timeout_secs", self.connect_timeout_secs, 1, 3600, "1..=3600")?;
        check_range("read_timeout_secs", self.read_timeout_secs, 1, 3600, "1..=3600")?;
        Ok(())
    }
}

fn check_range(
    key: &'static str,
    value: Option<u64>,
    min: u64,
    max: u64,
    expected: &'static str,
) -> Result<(), ConfigError> {
    match value {
        Some(value) if !(min..=max).contains(&value) => Err(ConfigError::OutOfRange {
            key,
            value,
            expected,
        }),
        _ => Ok(()),
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/linkdl/config.toml`
/// 2. `$HOME/.config/linkdl/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config at the default path, or an empty config if there is none.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file exists but cannot be read or is invalid.
pub fn load_default_file_config() -> Result<FileConfig, ConfigError> {
    match resolve_default_config_path() {
        Some(path) if path.exists() => load_file_config(&path),
        _ => {
            debug!("no config file found, using built-in defaults");
            Ok(FileConfig::default())
        }
    }
}

/// Loads and validates the config file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] if the file cannot be read, or the parse or
/// validation error for its content.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config_str(&raw)?;
    debug!(path = %path.display(), ?config, "loaded config file");
    Ok(config)
}

/// Parses and validates config file content.
///
/// # Errors
///
/// Returns a [`ConfigError`] for the first malformed line or invalid value.
pub fn parse_config_str(raw: &str) -> Result<FileConfig, ConfigError> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            return Err(ConfigError::Syntax { line: line_no });
        };
        let value = raw_value.trim();

        match raw_key.trim() {
            "concurrency" => {
                let parsed = parse_integer("concurrency", line_no, value)?;
                cfg.concurrency = Some(usize::try_from(parsed).unwrap_or(usize::MAX));
            }
            "max_attempts" => {
                let parsed = parse_integer("max_attempts", line_no, value)?;
                cfg.max_attempts = Some(u32::try_from(parsed).unwrap_or(u32::MAX));
            }
            "retry_delay_ms" => {
                cfg.retry_delay_ms = Some(parse_integer("retry_delay_ms", line_no, value)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs =
                    Some(parse_integer("connect_timeout_secs", line_no, value)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer("read_timeout_secs", line_no, value)?);
            }
            "download_dir" => {
                cfg.download_dir = Some(parse_path("download_dir", line_no, value)?);
            }
            "error_log" => {
                cfg.error_log = Some(parse_path("error_log", line_no, value)?);
            }
            "output" => {
                cfg.output = Some(parse_path("output", line_no, value)?);
            }
            unknown => {
                return Err(ConfigError::UnknownKey {
                    key: unknown.to_string(),
                    line: line_no,
                });
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_path(key: &'static str, line: usize, raw_value: &str) -> Result<PathBuf, ConfigError> {
    let inner = raw_value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .filter(|inner| !inner.is_empty());
    match inner {
        Some(inner) => Ok(PathBuf::from(inner)),
        None => Err(ConfigError::InvalidValue {
            key,
            line,
            reason: "expected non-empty double-quoted string".to_string(),
        }),
    }
}

fn parse_integer(key: &'static str, line: usize, raw_value: &str) -> Result<u64, ConfigError> {
    raw_value
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue {
            key,
            line,
            reason: format!("expected non-negative integer ({e})"),
        })
}
