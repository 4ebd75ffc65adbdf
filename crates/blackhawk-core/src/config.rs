//! # Configuration
//!
//! Settings for the procfs region source.
//!
//! ## Environment Variables
//!
//! - `BLACKHAWK_PROC_ROOT`: procfs mount point (default: `/proc`)
//! - `BLACKHAWK_BACKING`: `map_files` or `mem` (default: `map_files`)
//! - `BLACKHAWK_READ_CHUNK`: largest single read in bytes (default: 65536)
//! - `BLACKHAWK_NON_BLOCKING`: open backing files with `O_NONBLOCK` (default: `true`)
//!
//! Invalid values are logged and replaced by the default.
//!
//! ## Example
//!
//! ```rust
//! use blackhawk_core::config::{Backing, Config};
//!
//! let config = Config::default().with_backing(Backing::Mem).with_read_chunk(4096);
//! assert_eq!(config.read_chunk, 4096);
//! ```

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

/// Default largest single read (64 KiB)
pub const DEFAULT_READ_CHUNK: usize = 64 * 1024;

/// How region contents are read from procfs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backing
{
    /// One file per region under `/proc/<pid>/map_files`, read from offset 0
    ///
    /// Only file-backed mappings appear there, and opening the entries
    /// requires `CAP_SYS_ADMIN`.
    #[default]
    MapFiles,
    /// Regions listed from readable entries of `/proc/<pid>/maps`, read from
    /// `/proc/<pid>/mem` at the region's base address
    Mem,
}

impl FromStr for Backing
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "map_files" | "map-files" | "mapfiles" => Ok(Backing::MapFiles),
            "mem" | "maps" => Ok(Backing::Mem),
            _ => Err(format!("Unknown backing: {s}. Use 'map_files' or 'mem'")),
        }
    }
}

impl fmt::Display for Backing
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Backing::MapFiles => write!(f, "map_files"),
            Backing::Mem => write!(f, "mem"),
        }
    }
}

/// Procfs region source settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config
{
    /// Where procfs is mounted
    pub proc_root: PathBuf,
    /// Which procfs files back region reads
    pub backing: Backing,
    /// Largest number of bytes requested from a backing file in one call
    pub read_chunk: usize,
    /// Open backing files with `O_NONBLOCK` so a stalled file fails fast
    pub non_blocking: bool,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            proc_root: PathBuf::from("/proc"),
            backing: Backing::default(),
            read_chunk: DEFAULT_READ_CHUNK,
            non_blocking: true,
        }
    }
}

impl Config
{
    /// Build a configuration from `BLACKHAWK_*` environment variables.
    pub fn from_env() -> Self
    {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Used by [`Config::from_env`]; handy in tests to avoid touching the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(root) = lookup("BLACKHAWK_PROC_ROOT").filter(|s| !s.is_empty()) {
            config.proc_root = PathBuf::from(root);
        }
        if let Some(value) = lookup("BLACKHAWK_BACKING") {
            match value.parse::<Backing>() {
                Ok(backing) => config.backing = backing,
                Err(e) => warn!(error = %e, "ignoring BLACKHAWK_BACKING"),
            }
        }
        if let Some(value) = lookup("BLACKHAWK_READ_CHUNK") {
            match value.parse::<usize>() {
                Ok(chunk) if chunk > 0 => config.read_chunk = chunk,
                _ => warn!(value = %value, "ignoring BLACKHAWK_READ_CHUNK, expected a positive integer"),
            }
        }
        if let Some(value) = lookup("BLACKHAWK_NON_BLOCKING") {
            match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.non_blocking = true,
                "0" | "false" | "no" | "off" => config.non_blocking = false,
                _ => warn!(value = %value, "ignoring BLACKHAWK_NON_BLOCKING, expected a boolean"),
            }
        }

        config
    }

    /// Set the procfs mount point.
    pub fn with_proc_root(mut self, root: impl Into<PathBuf>) -> Self
    {
        self.proc_root = root.into();
        self
    }

    /// Set the backing.
    pub fn with_backing(mut self, backing: Backing) -> Self
    {
        self.backing = backing;
        self
    }

    /// Set the largest single read; values below 1 are raised to 1.
    pub fn with_read_chunk(mut self, read_chunk: usize) -> Self
    {
        self.read_chunk = read_chunk.max(1);
        self
    }

    /// Enable or disable `O_NONBLOCK` on backing files.
    pub fn with_non_blocking(mut self, non_blocking: bool) -> Self
    {
        self.non_blocking = non_blocking;
        self
    }
}
