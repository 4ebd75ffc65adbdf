//! # Error Types
//!
//! Error handling for catalog listing, scanning, and lens reads.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use thiserror::Error;

use crate::types::{AddressRange, ProcessId};

/// Main error type for Blackhawk operations
///
/// ## Error Categories
///
/// 1. **Attach errors**: InsufficientPrivilege
/// 2. **Enumeration errors**: TargetUnavailable, MalformedRegionIdentifier
/// 3. **Validation errors**: EmptyPattern, PatternTooLarge, ByteOutOfRange, InvalidPattern
/// 4. **Region I/O errors**: RegionReadFailed
/// 5. **Lens errors**: RangeUnderflow, RangeOverflow, RangeUnmapped, ReadOutOfBounds, UnsupportedSpan
///
/// Validation errors are always raised before any region is opened. Per-entry
/// and per-region errors are recoverable: the catalog and the scanner skip the
/// offending item and keep going (see [`BlackhawkError::is_recoverable`]).
#[derive(Error, Debug)]
pub enum BlackhawkError
{
    /// The caller's effective privilege cannot read another process's maps
    ///
    /// Raised once, when constructing a [`Target`](crate::Target). Reading
    /// `/proc/<pid>/map_files` requires `CAP_SYS_ADMIN` in practice, so the
    /// caller needs to be root.
    #[error("Insufficient privilege: {0}")]
    InsufficientPrivilege(String),

    /// The process could not be enumerated
    ///
    /// Usually the process exited, or its procfs directory is not accessible.
    /// The caller may retry later.
    #[error("Target process {pid} is unavailable")]
    TargetUnavailable
    {
        /// Process that could not be enumerated
        pid: ProcessId,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A region identifier did not decompose into two hexadecimal bounds
    #[error("Malformed region identifier: {0:?}")]
    MalformedRegionIdentifier(String),

    /// A search pattern must contain at least one byte
    #[error("Search pattern is empty")]
    EmptyPattern,

    /// A search pattern exceeded the maximum window length
    #[error("Search pattern is {length} bytes, maximum is {max}")]
    PatternTooLarge
    {
        /// Requested pattern length
        length: usize,
        /// Largest accepted pattern length
        max: usize,
    },

    /// An explicit pattern value does not fit in a byte
    #[error("Pattern value {value} at index {index} is outside 0..=255")]
    ByteOutOfRange
    {
        /// Position of the offending value in the pattern
        index: usize,
        /// The offending value
        value: i64,
    },

    /// A textual pattern could not be parsed
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// The contents of a region could not be read
    ///
    /// Typically the region was unmapped between listing and reading, or the
    /// backing resource would have blocked.
    #[error("Failed to read region {range}")]
    RegionReadFailed
    {
        /// Address range of the region that failed
        range: AddressRange,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The requested lens starts below the lowest mapped region
    #[error("Range {requested} starts below the lowest mapped address 0x{lowest:x}")]
    RangeUnderflow
    {
        /// Normalized range that was requested
        requested: AddressRange,
        /// Start of the lowest region in the catalog snapshot
        lowest: u64,
    },

    /// The requested lens ends above the highest mapped region
    #[error("Range {requested} ends above the highest mapped address 0x{highest:x}")]
    RangeOverflow
    {
        /// Normalized range that was requested
        requested: AddressRange,
        /// End of the highest region in the catalog snapshot
        highest: u64,
    },

    /// The range touches addresses that no region in the snapshot covers
    #[error("Range {0} is not backed by any mapped region")]
    RangeUnmapped(AddressRange),

    /// A lens read reached past the end of the lens's range
    #[error("Read of {length} bytes at offset 0x{offset:x} exceeds lens range {range}")]
    ReadOutOfBounds
    {
        /// Offset relative to the lens start
        offset: u64,
        /// Requested length
        length: usize,
        /// Range the lens was opened on
        range: AddressRange,
    },

    /// A lens read would need more than two backing regions
    #[error("Read of {span} spans {regions} regions, at most 2 are supported")]
    UnsupportedSpan
    {
        /// Absolute span of the read
        span: AddressRange,
        /// Number of regions the span touches
        regions: usize,
    },

    /// I/O error outside of a specific region
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, BlackhawkError>`
///
/// ```rust
/// use blackhawk_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, BlackhawkError>;

impl BlackhawkError
{
    /// Whether the error only affects a single catalog entry or region.
    ///
    /// Recoverable errors are logged and skipped during listing and scanning;
    /// everything else aborts the call that produced it.
    pub fn is_recoverable(&self) -> bool
    {
        matches!(
            self,
            BlackhawkError::MalformedRegionIdentifier(_) | BlackhawkError::RegionReadFailed { .. }
        )
    }

    /// Whether the error was raised by input validation, before any I/O.
    pub fn is_validation(&self) -> bool
    {
        matches!(
            self,
            BlackhawkError::EmptyPattern
                | BlackhawkError::PatternTooLarge { .. }
                | BlackhawkError::ByteOutOfRange { .. }
                | BlackhawkError::InvalidPattern(_)
        )
    }

    pub(crate) fn region_read(range: AddressRange, source: std::io::Error) -> Self
    {
        BlackhawkError::RegionReadFailed { range, source }
    }
}
