//! Process, region, and match types.

use std::fmt;

use super::AddressRange;

/// Process identifier (PID)
///
/// Using a newtype instead of a raw `u32` prevents passing an unrelated number
/// where a PID is expected.
///
/// ## Example
///
/// ```rust
/// use blackhawk_core::types::ProcessId;
///
/// let pid = ProcessId::from(12345);
/// assert_eq!(pid.to_string(), "12345");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(pub u32);

impl From<u32> for ProcessId
{
    fn from(pid: u32) -> Self
    {
        ProcessId(pid)
    }
}

impl From<ProcessId> for u32
{
    fn from(pid: ProcessId) -> Self
    {
        pid.0
    }
}

impl fmt::Display for ProcessId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// Position of a region within one catalog listing
///
/// IDs are assigned sequentially after sorting (0, 1, 2, ...). They are only
/// meaningful within the listing that produced them; the target's layout can
/// change between listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(pub usize);

impl RegionId
{
    /// Get the raw index.
    pub fn value(self) -> usize
    {
        self.0
    }
}

/// One mapped region of a target process
///
/// A descriptor pairs the parsed address range with the identifier the
/// region source listed it under, which is what the source needs to open the
/// backing resource again. Descriptors are immutable snapshots.
///
/// ## Example
///
/// ```rust
/// use blackhawk_core::types::{AddressRange, ProcessId, RegionDescriptor, RegionId};
///
/// let region = RegionDescriptor::new(
///     RegionId(0),
///     ProcessId(42),
///     AddressRange::new(0x1000, 0x2000),
///     "1000-2000".to_string(),
/// );
/// assert_eq!(region.size(), 0x1000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionDescriptor
{
    /// Position in the sorted listing
    pub id: RegionId,
    /// Process the region belongs to
    pub pid: ProcessId,
    /// Virtual address range covered by the region
    pub range: AddressRange,
    /// Identifier the region source listed this region under
    ///
    /// For procfs this is the `map_files` entry name, e.g. `"7f12a000-7f12c000"`.
    pub identifier: String,
}

impl RegionDescriptor
{
    /// Create a descriptor.
    pub fn new(id: RegionId, pid: ProcessId, range: AddressRange, identifier: String) -> Self
    {
        Self {
            id,
            pid,
            range,
            identifier,
        }
    }

    /// Size of the region in bytes.
    pub fn size(&self) -> u64
    {
        self.range.len()
    }

    /// Whether `next` starts exactly where this region ends.
    pub fn is_contiguous_with(&self, next: &RegionDescriptor) -> bool
    {
        self.range.is_followed_by(&next.range)
    }
}

/// A window of target memory that satisfied a search predicate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Match
{
    /// Absolute span of the match; `range.len()` equals the window length
    pub range: AddressRange,
    /// The bytes that were matched
    pub bytes: Vec<u8>,
}

impl Match
{
    /// Absolute start address of the match.
    pub fn address(&self) -> u64
    {
        self.range.start
    }
}

/// Drop repeated reports of the same absolute range, keeping the first.
///
/// The scanner reports a boundary match once per region whose overhang
/// contains it. Call this when each location should appear once. The result is
/// sorted by address.
///
/// ```rust
/// use blackhawk_core::types::{dedup_matches, AddressRange, Match};
///
/// let m = Match { range: AddressRange::new(0x1fff, 0x2001), bytes: vec![0xab, 0xcd] };
/// assert_eq!(dedup_matches(vec![m.clone(), m.clone()]), vec![m]);
/// ```
pub fn dedup_matches(mut matches: Vec<Match>) -> Vec<Match>
{
    matches.sort_by_key(|m| m.range);
    matches.dedup_by_key(|m| m.range);
    matches
}
