//! # blackhawk-core
//!
//! Live memory inspection of another process through the per-region handles
//! procfs exposes.
//!
//! This crate provides:
//! - Region enumeration and identifier parsing ([`catalog`])
//! - Boundary-aware pattern scanning across adjacent regions ([`search`])
//! - Re-readable views over one or two regions for polling ([`lens`])
//! - A procfs region source ([`platform::procfs`])
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blackhawk_core::prelude::*;
//!
//! let target = Target::attach(ProcessId(1234), Privilege::current())?;
//! let report = target.search(&Pattern::from_hex("48 65 6c 6c 6f")?)?;
//! for found in report.deduplicated() {
//!     println!("{}", found.range);
//! }
//! # Ok::<(), blackhawk_core::error::BlackhawkError>(())
//! ```
//!
//! ## Platform Support
//!
//! - **Linux**: `/proc/<pid>/map_files` or `/proc/<pid>/maps` + `/proc/<pid>/mem`
//! - **Other Unix**: any Linux-compatible procfs mount, via `BLACKHAWK_PROC_ROOT`
//!
//! ## Why unsafe code is needed
//!
//! Reading the effective uid for [`Privilege::current`](privilege::Privilege::current)
//! calls `geteuid` through `libc`. Everything else is safe Rust.

#![allow(unsafe_code)] // Required for geteuid()

pub mod catalog;
pub mod config;
pub mod error;
pub mod lens;
pub mod platform;
pub mod prelude;
pub mod privilege;
pub mod search;
pub mod source;
pub mod target;
pub mod types;

pub use catalog::RegionCatalog;
pub use config::{Backing, Config};
// Re-export commonly used types
pub use error::{BlackhawkError, Result};
pub use lens::MemoryLens;
#[cfg(unix)]
pub use platform::procfs::ProcFs;
pub use privilege::Privilege;
pub use search::{Pattern, PatternSearchEngine, Predicate, ScanProgress, ScanReport, WindowMatcher};
pub use source::{RegionHandle, RegionSource};
pub use target::Target;
pub use types::{AddressRange, Match, ProcessId, RegionDescriptor};
