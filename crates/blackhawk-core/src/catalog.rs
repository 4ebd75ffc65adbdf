//! # Region Catalog
//!
//! Turns the raw identifiers a [`RegionSource`] lists into an ordered
//! snapshot of [`RegionDescriptor`]s.
//!
//! ## Identifier format
//!
//! Each identifier encodes a half-open range as two hexadecimal numbers
//! separated by one non-hex character, the way procfs names the entries of
//! `/proc/<pid>/map_files`:
//!
//! ```text
//! 55d4c3a00000-55d4c3a21000
//! ```
//!
//! Parsing is strict. Anything else is a `MalformedRegionIdentifier`, which
//! the catalog logs and skips: entries can vanish or change between listing a
//! directory and reading it, and one odd entry should not hide the rest of the
//! address space.

use tracing::{debug, warn};

use crate::error::{BlackhawkError, Result};
use crate::source::RegionSource;
use crate::types::{AddressRange, ProcessId, RegionDescriptor, RegionId};

/// Parse a region identifier such as `"7f00-7f10"` into its address range.
///
/// ## Errors
///
/// `MalformedRegionIdentifier` unless the identifier is exactly
/// `<hex><delimiter><hex>` with a single non-hex delimiter, both numbers fit in
/// a `u64`, and start does not exceed end.
///
/// ## Example
///
/// ```rust
/// use blackhawk_core::catalog::parse_region_identifier;
/// use blackhawk_core::types::AddressRange;
///
/// let range = parse_region_identifier("1000-2000")?;
/// assert_eq!(range, AddressRange::new(0x1000, 0x2000));
/// assert!(parse_region_identifier("1000").is_err());
/// # Ok::<(), blackhawk_core::error::BlackhawkError>(())
/// ```
pub fn parse_region_identifier(identifier: &str) -> Result<AddressRange>
{
    let malformed = || BlackhawkError::MalformedRegionIdentifier(identifier.to_string());

    let split = identifier
        .char_indices()
        .find(|(_, c)| !c.is_ascii_hexdigit())
        .ok_or_else(malformed)?;
    let (start_hex, rest) = identifier.split_at(split.0);
    let end_hex = &rest[split.1.len_utf8()..];

    if start_hex.is_empty() || end_hex.is_empty() || !end_hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(malformed());
    }

    let start = u64::from_str_radix(start_hex, 16).map_err(|_| malformed())?;
    let end = u64::from_str_radix(end_hex, 16).map_err(|_| malformed())?;
    if start > end {
        return Err(malformed());
    }

    Ok(AddressRange::new(start, end))
}

/// Enumerates the mapped regions of target processes
///
/// The catalog owns its region source so that the scanner and lenses can
/// borrow the same source to open the regions it lists.
///
/// ## Example
///
/// ```rust,no_run
/// use blackhawk_core::catalog::RegionCatalog;
/// use blackhawk_core::config::Config;
/// use blackhawk_core::platform::procfs::ProcFs;
/// use blackhawk_core::types::ProcessId;
///
/// let catalog = RegionCatalog::new(ProcFs::new(Config::default()));
/// for region in catalog.list_regions(ProcessId(1234))? {
///     println!("{} {}", region.id.value(), region.range);
/// }
/// # Ok::<(), blackhawk_core::error::BlackhawkError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RegionCatalog<S>
{
    source: S,
}

impl<S: RegionSource> RegionCatalog<S>
{
    /// Create a catalog over `source`.
    pub fn new(source: S) -> Self
    {
        Self { source }
    }

    /// The region source used to list and open regions.
    pub fn source(&self) -> &S
    {
        &self.source
    }

    /// List the regions mapped by `pid`, sorted by start address.
    ///
    /// The result is a point-in-time snapshot. Malformed identifiers are
    /// skipped with a warning, as are entries overlapping an earlier region,
    /// so the returned ranges are always pairwise disjoint. A process with no
    /// readable regions yields an empty list.
    ///
    /// ## Errors
    ///
    /// - `TargetUnavailable`: the process cannot be enumerated
    pub fn list_regions(&self, pid: ProcessId) -> Result<Vec<RegionDescriptor>>
    {
        let identifiers = self.source.list_identifiers(pid)?;

        let mut parsed: Vec<(AddressRange, String)> = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            match parse_region_identifier(&identifier) {
                Ok(range) => parsed.push((range, identifier)),
                Err(e) => warn!(pid = %pid, error = %e, "skipping region identifier"),
            }
        }
        parsed.sort_by_key(|(range, _)| *range);

        let mut regions: Vec<RegionDescriptor> = Vec::with_capacity(parsed.len());
        for (range, identifier) in parsed {
            if let Some(previous) = regions.last() {
                if range.start < previous.range.end {
                    warn!(
                        pid = %pid,
                        region = %range,
                        previous = %previous.range,
                        "skipping region overlapping its predecessor"
                    );
                    continue;
                }
            }
            regions.push(RegionDescriptor::new(RegionId(regions.len()), pid, range, identifier));
        }

        debug!(pid = %pid, count = regions.len(), "listed regions");
        Ok(regions)
    }
}
