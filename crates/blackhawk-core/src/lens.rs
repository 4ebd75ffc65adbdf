//! # Memory Lens
//!
//! A live, re-readable view onto an address range of the target.
//!
//! A lens is opened on a range, usually around a match found by the scanner,
//! and then polled. At construction it resolves which regions of a catalog
//! snapshot cover the range and keeps one open handle per region; every
//! [`MemoryLens::read`] goes straight to those handles, so it observes the
//! target's current memory.
//!
//! ## Limits
//!
//! - The covering regions are fixed when the lens is opened. If the target
//!   unmaps one of them, reads through it fail with `RegionReadFailed`; the
//!   lens never re-resolves its regions.
//! - A single read may touch one region, or two contiguous regions. A read
//!   that would need three or more regions fails with `UnsupportedSpan`
//!   rather than returning partial data.

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::error::{BlackhawkError, Result};
use crate::source::{read_from_handle, RegionHandle, RegionSource};
use crate::types::{AddressRange, RegionDescriptor};

/// Largest number of regions a single lens read may span
pub const MAX_READ_REGIONS: usize = 2;

/// Open view over a possibly multi-region address range
///
/// Owns one handle per covering region. Dropping the lens releases them.
///
/// ## Example
///
/// ```rust,no_run
/// use blackhawk_core::catalog::RegionCatalog;
/// use blackhawk_core::config::Config;
/// use blackhawk_core::lens::MemoryLens;
/// use blackhawk_core::platform::procfs::ProcFs;
/// use blackhawk_core::types::{AddressRange, ProcessId};
///
/// let catalog = RegionCatalog::new(ProcFs::new(Config::default()));
/// let regions = catalog.list_regions(ProcessId(1234))?;
/// let lens = MemoryLens::open(catalog.source(), &regions, AddressRange::new(0x5000, 0x5010))?;
/// let first_word = lens.read(0, 8)?;
/// # Ok::<(), blackhawk_core::error::BlackhawkError>(())
/// ```
pub struct MemoryLens<H: RegionHandle>
{
    range: AddressRange,
    loaded: AddressRange,
    regions: Vec<RegionDescriptor>,
    handles: Vec<H>,
}

impl<H: RegionHandle> MemoryLens<H>
{
    /// Open a lens on `range` over a sorted catalog snapshot.
    ///
    /// Reversed bounds are swapped; the range is never clamped.
    ///
    /// ## Errors
    ///
    /// - `RangeUnderflow`: `range` starts below the lowest region
    /// - `RangeOverflow`: `range` ends above the highest region
    /// - `RangeUnmapped`: no region intersects `range` (including an empty snapshot)
    /// - `RegionReadFailed`: a covering region could not be opened; handles
    ///   already opened are released
    pub fn open<S>(source: &S, regions: &[RegionDescriptor], range: AddressRange) -> Result<Self>
    where
        S: RegionSource<Handle = H> + ?Sized,
    {
        let range = AddressRange::normalized(range.start, range.end);

        let (Some(lowest), Some(highest)) = (regions.first(), regions.last()) else {
            return Err(BlackhawkError::RangeUnmapped(range));
        };
        if range.start < lowest.range.start {
            return Err(BlackhawkError::RangeUnderflow {
                requested: range,
                lowest: lowest.range.start,
            });
        }
        if range.end > highest.range.end {
            return Err(BlackhawkError::RangeOverflow {
                requested: range,
                highest: highest.range.end,
            });
        }

        let covering: Vec<RegionDescriptor> = regions
            .iter()
            .filter(|region| region.range.intersects(&range))
            .cloned()
            .collect();
        let (Some(first), Some(last)) = (covering.first(), covering.last()) else {
            return Err(BlackhawkError::RangeUnmapped(range));
        };
        let loaded = AddressRange::new(first.range.start, last.range.end);

        let handles = covering
            .iter()
            .map(|region| {
                source
                    .open(region)
                    .map_err(|e| BlackhawkError::region_read(region.range, e))
            })
            .collect::<Result<Vec<H>>>()?;

        debug!(range = %range, loaded = %loaded, regions = covering.len(), "opened lens");
        Ok(Self {
            range,
            loaded,
            regions: covering,
            handles,
        })
    }

    /// The normalized range the lens was opened on.
    pub fn range(&self) -> AddressRange
    {
        self.range
    }

    /// The span of the covering regions, from the first region's start to the
    /// last region's end.
    pub fn loaded_range(&self) -> AddressRange
    {
        self.loaded
    }

    /// The covering regions, in address order.
    pub fn regions(&self) -> &[RegionDescriptor]
    {
        &self.regions
    }

    /// Read `length` bytes starting `offset` bytes after the lens start.
    ///
    /// ## Errors
    ///
    /// - `ReadOutOfBounds`: the span leaves the lens range
    /// - `UnsupportedSpan`: the span touches more than [`MAX_READ_REGIONS`] regions
    /// - `RangeUnmapped`: part of the span falls between covering regions
    /// - `RegionReadFailed`: a backing read failed (for example the region was unmapped)
    pub fn read(&self, offset: u64, length: usize) -> Result<Vec<u8>>
    {
        let out_of_bounds = || BlackhawkError::ReadOutOfBounds {
            offset,
            length,
            range: self.range,
        };
        let span = self
            .range
            .start
            .checked_add(offset)
            .and_then(|start| AddressRange::from_start_len(start, length as u64))
            .filter(|span| self.range.contains_range(span))
            .ok_or_else(out_of_bounds)?;
        if span.is_empty() {
            return Ok(Vec::new());
        }

        let touched: SmallVec<[usize; MAX_READ_REGIONS]> = self
            .regions
            .iter()
            .enumerate()
            .filter(|(_, region)| region.range.intersects(&span))
            .map(|(index, _)| index)
            .collect();
        if touched.len() > MAX_READ_REGIONS {
            return Err(BlackhawkError::UnsupportedSpan {
                span,
                regions: touched.len(),
            });
        }

        trace!(span = %span, regions = touched.len(), "lens read");
        match touched.as_slice() {
            [only] => {
                let region = &self.regions[*only];
                if !region.range.contains_range(&span) {
                    return Err(BlackhawkError::RangeUnmapped(span));
                }
                read_from_handle(&self.handles[*only], region.range, span.start - region.range.start, length)
            }
            [first, second] => {
                let (low, high) = (&self.regions[*first], &self.regions[*second]);
                if span.start < low.range.start || !low.is_contiguous_with(high) || span.end > high.range.end {
                    return Err(BlackhawkError::RangeUnmapped(span));
                }
                let tail_len = (low.range.end - span.start) as usize;
                let head_len = (span.end - high.range.start) as usize;

                let mut bytes = read_from_handle(
                    &self.handles[*first],
                    low.range,
                    span.start - low.range.start,
                    tail_len,
                )?;
                bytes.extend(read_from_handle(&self.handles[*second], high.range, 0, head_len)?);
                Ok(bytes)
            }
            _ => Err(BlackhawkError::RangeUnmapped(span)),
        }
    }

    /// Read `length` bytes at an absolute target address inside the lens.
    pub fn read_address(&self, address: u64, length: usize) -> Result<Vec<u8>>
    {
        let offset = address
            .checked_sub(self.range.start)
            .ok_or(BlackhawkError::ReadOutOfBounds {
                offset: 0,
                length,
                range: self.range,
            })?;
        self.read(offset, length)
    }

    /// Re-read the whole lens range.
    pub fn read_all(&self) -> Result<Vec<u8>>
    {
        let length = usize::try_from(self.range.len()).map_err(|_| BlackhawkError::ReadOutOfBounds {
            offset: 0,
            length: usize::MAX,
            range: self.range,
        })?;
        self.read(0, length)
    }
}

impl<H: RegionHandle> Drop for MemoryLens<H>
{
    fn drop(&mut self)
    {
        trace!(range = %self.range, handles = self.handles.len(), "releasing lens handles");
    }
}

impl<H: RegionHandle> std::fmt::Debug for MemoryLens<H>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct("MemoryLens")
            .field("range", &self.range)
            .field("loaded", &self.loaded)
            .field("regions", &self.regions.len())
            .finish()
    }
}
