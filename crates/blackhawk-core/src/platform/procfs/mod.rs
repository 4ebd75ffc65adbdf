//! # procfs Region Source
//!
//! Lists and reads a process's regions through `/proc`.
//!
//! ## Backings
//!
//! - [`Backing::MapFiles`]: every entry of `/proc/<pid>/map_files` is named
//!   `<start>-<end>` and opens the object mapped there. Region offset 0 is
//!   file offset 0.
//! - [`Backing::Mem`]: the readable lines of `/proc/<pid>/maps` give the
//!   regions; `/proc/<pid>/mem` is opened once per handle and read at
//!   `region.start + offset`.
//!
//! ## Bounded reads
//!
//! Files are opened with `O_NONBLOCK` (unless disabled in [`Config`]) and
//! every `pread` asks for at most [`Config::read_chunk`] bytes. A backing file
//! that would block fails with `WouldBlock`, which surfaces as
//! `RegionReadFailed` instead of stalling the scan.

mod maps;

use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{Backing, Config};
use crate::error::{BlackhawkError, Result};
use crate::source::{RegionHandle, RegionSource};
use crate::types::{ProcessId, RegionDescriptor};

/// Region source reading from a procfs mount
#[derive(Debug, Clone, Default)]
pub struct ProcFs
{
    config: Config,
}

impl ProcFs
{
    /// Create a source with explicit settings.
    pub fn new(config: Config) -> Self
    {
        Self { config }
    }

    /// Create a source configured from `BLACKHAWK_*` environment variables.
    pub fn from_env() -> Self
    {
        Self::new(Config::from_env())
    }

    /// The settings in use.
    pub fn config(&self) -> &Config
    {
        &self.config
    }

    /// `<proc_root>/<pid>`
    pub fn pid_dir(&self, pid: ProcessId) -> PathBuf
    {
        self.config.proc_root.join(pid.to_string())
    }

    fn open_file(&self, path: &Path, base: u64) -> io::Result<ProcFile>
    {
        let mut options = OpenOptions::new();
        options.read(true);
        if self.config.non_blocking {
            options.custom_flags(libc::O_NONBLOCK);
        }
        let file = options.open(path)?;
        Ok(ProcFile {
            file,
            base,
            chunk: self.config.read_chunk.max(1),
        })
    }

    fn list_map_files(&self, pid: ProcessId) -> io::Result<Vec<String>>
    {
        let dir = self.pid_dir(pid).join("map_files");
        let mut identifiers = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            match entry.file_name().into_string() {
                Ok(name) => identifiers.push(name),
                Err(name) => warn!(pid = %pid, name = ?name, "skipping non UTF-8 map_files entry"),
            }
        }
        Ok(identifiers)
    }

    fn list_maps(&self, pid: ProcessId) -> io::Result<Vec<String>>
    {
        let maps = fs::read_to_string(self.pid_dir(pid).join("maps"))?;
        Ok(maps::readable_identifiers(&maps))
    }
}

impl RegionSource for ProcFs
{
    type Handle = ProcFile;

    fn list_identifiers(&self, pid: ProcessId) -> Result<Vec<String>>
    {
        let listed = match self.config.backing {
            Backing::MapFiles => self.list_map_files(pid),
            Backing::Mem => self.list_maps(pid),
        };
        let identifiers = listed.map_err(|source| BlackhawkError::TargetUnavailable { pid, source })?;
        debug!(pid = %pid, backing = %self.config.backing, count = identifiers.len(), "listed region identifiers");
        Ok(identifiers)
    }

    fn open(&self, region: &RegionDescriptor) -> io::Result<ProcFile>
    {
        let dir = self.pid_dir(region.pid);
        match self.config.backing {
            Backing::MapFiles => self.open_file(&dir.join("map_files").join(&region.identifier), 0),
            Backing::Mem => self.open_file(&dir.join("mem"), region.range.start),
        }
    }
}

/// Positioned-read handle onto one procfs-backed region
#[derive(Debug)]
pub struct ProcFile
{
    file: File,
    base: u64,
    chunk: usize,
}

impl RegionHandle for ProcFile
{
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>
    {
        let position = self
            .base
            .checked_add(offset)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "read position overflows u64"))?;
        let len = buf.len().min(self.chunk);
        self.file.read_at(&mut buf[..len], position)
    }
}
