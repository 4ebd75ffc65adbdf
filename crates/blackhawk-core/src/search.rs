//! # Pattern Search
//!
//! Boundary-aware scanning of a target's regions for a fixed-length window.
//!
//! Regions are read one at a time. A pattern can start near the end of one
//! region and finish at the beginning of the next, so each region is scanned
//! as an *overhang* buffer:
//!
//! ```text
//!   tail(i-1)          region i              head(i+1)
//! [ w-1 bytes ][ ..................... ][ w-1 bytes ]
//! ```
//!
//! where `w` is the window length. A window crossing a boundary can protrude
//! into the neighbour by at most `w - 1` bytes, so that much context is both
//! sufficient and necessary. Context is only taken from neighbours that are
//! contiguous with the region being scanned.
//!
//! ## Duplicate reports
//!
//! A window that lies entirely inside the overlap of two overhangs (for
//! example a short match just before a boundary) is reported once for each
//! region whose overhang contains it. Regions are scanned independently with no
//! shared state; use [`ScanReport::deduplicated`] or
//! [`dedup_matches`](crate::types::dedup_matches) when each location should
//! appear once.
//!
//! ## Failure policy
//!
//! Pattern validation happens before any region is opened. A region that
//! cannot be read is skipped and recorded in [`ScanReport::skipped`]; the scan
//! carries on with the remaining regions.

use std::ops::ControlFlow;

use memchr::memmem;
use tracing::{debug, info, instrument, warn};

use crate::error::{BlackhawkError, Result};
use crate::source::{read_region, RegionSource};
use crate::types::{dedup_matches, AddressRange, Match, RegionDescriptor};

/// Longest window the scanner accepts (1 MiB)
///
/// This bounds the overhang context read from each neighbour.
pub const MAX_PATTERN_LEN: usize = 1024 * 1024;

fn validate_window_len(length: usize) -> Result<()>
{
    if length == 0 {
        return Err(BlackhawkError::EmptyPattern);
    }
    if length > MAX_PATTERN_LEN {
        return Err(BlackhawkError::PatternTooLarge {
            length,
            max: MAX_PATTERN_LEN,
        });
    }
    Ok(())
}

/// Check that a matcher's window length is usable by the scanner.
///
/// ## Errors
///
/// - `EmptyPattern`: window length 0
/// - `PatternTooLarge`: window length above [`MAX_PATTERN_LEN`]
pub fn validate_matcher<M: WindowMatcher + ?Sized>(matcher: &M) -> Result<()>
{
    validate_window_len(matcher.window_len())
}

/// Decides which fixed-length windows of memory count as matches
///
/// The scanner owns the sliding; a matcher only judges windows. Implement this
/// for custom comparisons (masks, value ranges, ...) or use [`Predicate`] to
/// wrap a closure.
pub trait WindowMatcher
{
    /// Length of every window passed to [`WindowMatcher::matches`].
    fn window_len(&self) -> usize;

    /// Whether `window` (exactly `window_len()` bytes) is a match.
    fn matches(&self, window: &[u8]) -> bool;

    /// Push the offset of every matching window in `haystack` onto `out`.
    ///
    /// Overlapping matches are all reported. The default slides a window over
    /// every offset; implementations may override it with a faster search
    /// that reports the same offsets.
    fn find_in(&self, haystack: &[u8], out: &mut Vec<usize>)
    {
        let len = self.window_len();
        if len == 0 || haystack.len() < len {
            return;
        }
        out.extend(
            haystack
                .windows(len)
                .enumerate()
                .filter(|(_, window)| self.matches(window))
                .map(|(offset, _)| offset),
        );
    }
}

impl<M: WindowMatcher + ?Sized> WindowMatcher for &M
{
    fn window_len(&self) -> usize
    {
        (**self).window_len()
    }

    fn matches(&self, window: &[u8]) -> bool
    {
        (**self).matches(window)
    }

    fn find_in(&self, haystack: &[u8], out: &mut Vec<usize>)
    {
        (**self).find_in(haystack, out);
    }
}

/// Literal byte pattern, matched by equality
///
/// ## Example
///
/// ```rust
/// use blackhawk_core::search::Pattern;
///
/// let pattern = Pattern::from_hex("de ad be ef")?;
/// assert_eq!(pattern.as_bytes(), &[0xde, 0xad, 0xbe, 0xef]);
///
/// // Integer values are range-checked
/// assert!(Pattern::from_values(&[0x41, 256]).is_err());
/// # Ok::<(), blackhawk_core::error::BlackhawkError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern
{
    bytes: Vec<u8>,
}

impl Pattern
{
    /// Create a pattern from raw bytes.
    ///
    /// ## Errors
    ///
    /// - `EmptyPattern`: no bytes
    /// - `PatternTooLarge`: more than [`MAX_PATTERN_LEN`] bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self>
    {
        let bytes = bytes.into();
        validate_window_len(bytes.len())?;
        Ok(Self { bytes })
    }

    /// Create a pattern from integer values, each of which must fit in a byte.
    ///
    /// ## Errors
    ///
    /// - `EmptyPattern` / `PatternTooLarge`: as for [`Pattern::new`]
    /// - `ByteOutOfRange`: a value is below 0 or above 255
    pub fn from_values(values: &[i64]) -> Result<Self>
    {
        validate_window_len(values.len())?;
        let bytes = values
            .iter()
            .enumerate()
            .map(|(index, &value)| u8::try_from(value).map_err(|_| BlackhawkError::ByteOutOfRange { index, value }))
            .collect::<Result<Vec<u8>>>()?;
        Ok(Self { bytes })
    }

    /// Parse a pattern written as hexadecimal bytes.
    ///
    /// Whitespace separates groups; each group is an even number of hex digits
    /// with an optional `0x` prefix. `"dead beef"`, `"deadbeef"` and
    /// `"0xde 0xad 0xbe 0xef"` are the same pattern.
    ///
    /// ## Errors
    ///
    /// - `InvalidPattern`: a group has an odd length or a non-hex digit
    /// - `EmptyPattern` / `PatternTooLarge`: as for [`Pattern::new`]
    pub fn from_hex(text: &str) -> Result<Self>
    {
        let mut bytes = Vec::new();
        for group in text.split_whitespace() {
            let digits = group
                .strip_prefix("0x")
                .or_else(|| group.strip_prefix("0X"))
                .unwrap_or(group);
            if digits.len() % 2 != 0 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(BlackhawkError::InvalidPattern(format!(
                    "{group:?} is not a sequence of hex byte pairs"
                )));
            }
            for pair in digits.as_bytes().chunks(2) {
                // Both digits were checked above.
                let pair = std::str::from_utf8(pair).map_err(|e| BlackhawkError::InvalidPattern(e.to_string()))?;
                let byte = u8::from_str_radix(pair, 16).map_err(|e| BlackhawkError::InvalidPattern(e.to_string()))?;
                bytes.push(byte);
            }
        }
        Self::new(bytes)
    }

    /// The pattern bytes.
    pub fn as_bytes(&self) -> &[u8]
    {
        &self.bytes
    }

    /// Number of bytes in the pattern.
    pub fn len(&self) -> usize
    {
        self.bytes.len()
    }

    /// Always false; patterns are non-empty by construction.
    pub fn is_empty(&self) -> bool
    {
        self.bytes.is_empty()
    }
}

impl WindowMatcher for Pattern
{
    fn window_len(&self) -> usize
    {
        self.bytes.len()
    }

    fn matches(&self, window: &[u8]) -> bool
    {
        window == self.bytes.as_slice()
    }

    fn find_in(&self, haystack: &[u8], out: &mut Vec<usize>)
    {
        let finder = memmem::Finder::new(&self.bytes);
        let mut pos = 0;
        while pos + self.bytes.len() <= haystack.len() {
            match finder.find(&haystack[pos..]) {
                Some(relative) => {
                    out.push(pos + relative);
                    // Step one byte so overlapping occurrences are kept.
                    pos += relative + 1;
                }
                None => break,
            }
        }
    }
}

/// A closure over fixed-length windows, used as a [`WindowMatcher`]
///
/// ## Example
///
/// ```rust
/// use blackhawk_core::search::{Predicate, WindowMatcher};
///
/// // Any little-endian u32 between 1000 and 2000
/// let in_range = Predicate::new(4, |w: &[u8]| {
///     let value = u32::from_le_bytes([w[0], w[1], w[2], w[3]]);
///     (1000..2000).contains(&value)
/// })?;
/// assert!(in_range.matches(&1500u32.to_le_bytes()));
/// # Ok::<(), blackhawk_core::error::BlackhawkError>(())
/// ```
pub struct Predicate<F>
{
    window_len: usize,
    predicate: F,
}

impl<F> Predicate<F>
where
    F: Fn(&[u8]) -> bool,
{
    /// Wrap `predicate`, which will be called with windows of `window_len` bytes.
    ///
    /// ## Errors
    ///
    /// - `EmptyPattern` / `PatternTooLarge`: `window_len` is 0 or above [`MAX_PATTERN_LEN`]
    pub fn new(window_len: usize, predicate: F) -> Result<Self>
    {
        validate_window_len(window_len)?;
        Ok(Self { window_len, predicate })
    }
}

impl<F> WindowMatcher for Predicate<F>
where
    F: Fn(&[u8]) -> bool,
{
    fn window_len(&self) -> usize
    {
        self.window_len
    }

    fn matches(&self, window: &[u8]) -> bool
    {
        (self.predicate)(window)
    }
}

/// Progress after one region has been scanned
///
/// Advisory telemetry only; it carries no correctness guarantees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress
{
    /// Zero-based position of the region among the regions being scanned
    pub region_index: usize,
    /// Number of regions being scanned
    pub total_regions: usize,
    /// Range of the region that just completed
    pub range: AddressRange,
}

/// Outcome of a scan
#[derive(Debug, Default)]
pub struct ScanReport
{
    /// Every match, in region order, including repeated boundary reports
    pub matches: Vec<Match>,
    /// One `RegionReadFailed` per region that was skipped
    pub skipped: Vec<BlackhawkError>,
    /// Number of regions whose scan completed
    pub regions_scanned: usize,
    /// Whether the progress callback stopped the scan early
    pub cancelled: bool,
}

impl ScanReport
{
    /// Matches with repeated reports of the same range removed, sorted by address.
    pub fn deduplicated(&self) -> Vec<Match>
    {
        dedup_matches(self.matches.clone())
    }
}

/// Scans region lists for windows satisfying a [`WindowMatcher`]
///
/// The engine borrows the region source used to open regions; regions are
/// opened, read, and closed within a single iteration.
///
/// ## Example
///
/// ```rust,no_run
/// use blackhawk_core::catalog::RegionCatalog;
/// use blackhawk_core::config::Config;
/// use blackhawk_core::platform::procfs::ProcFs;
/// use blackhawk_core::search::{Pattern, PatternSearchEngine};
/// use blackhawk_core::types::ProcessId;
///
/// let catalog = RegionCatalog::new(ProcFs::new(Config::default()));
/// let regions = catalog.list_regions(ProcessId(1234))?;
/// let engine = PatternSearchEngine::new(catalog.source());
/// let report = engine.search(&regions, &Pattern::from_hex("de ad be ef")?, None)?;
/// for m in report.deduplicated() {
///     println!("match at 0x{:x}", m.address());
/// }
/// # Ok::<(), blackhawk_core::error::BlackhawkError>(())
/// ```
#[derive(Debug)]
pub struct PatternSearchEngine<'s, S: ?Sized>
{
    source: &'s S,
}

impl<'s, S: RegionSource + ?Sized> PatternSearchEngine<'s, S>
{
    /// Create an engine reading regions through `source`.
    pub fn new(source: &'s S) -> Self
    {
        Self { source }
    }

    /// Scan `regions` for exact occurrences of `pattern`.
    ///
    /// When `target` is given, only regions intersecting it are scanned.
    pub fn search(&self, regions: &[RegionDescriptor], pattern: &Pattern, target: Option<AddressRange>) -> Result<ScanReport>
    {
        self.search_with(regions, pattern, target, |_| ControlFlow::Continue(()))
    }

    /// Scan for a pattern given as integer values.
    ///
    /// ## Errors
    ///
    /// Fails with `ByteOutOfRange`, `EmptyPattern` or `PatternTooLarge` before
    /// any region is opened.
    pub fn search_values(
        &self,
        regions: &[RegionDescriptor],
        values: &[i64],
        target: Option<AddressRange>,
    ) -> Result<ScanReport>
    {
        let pattern = Pattern::from_values(values)?;
        self.search(regions, &pattern, target)
    }

    /// Scan `regions` with an arbitrary matcher, reporting progress.
    ///
    /// `progress` runs after each region completes. Returning
    /// `ControlFlow::Break(())` stops the scan before the next region; the
    /// report then has `cancelled` set and holds the matches found so far.
    ///
    /// ## Errors
    ///
    /// - `EmptyPattern` / `PatternTooLarge`: invalid `matcher.window_len()`,
    ///   raised before any I/O
    ///
    /// Region read failures are not errors of the scan; see
    /// [`ScanReport::skipped`].
    #[instrument(level = "debug", skip_all, fields(regions = regions.len(), window = matcher.window_len()))]
    pub fn search_with<M, P>(
        &self,
        regions: &[RegionDescriptor],
        matcher: &M,
        target: Option<AddressRange>,
        mut progress: P,
    ) -> Result<ScanReport>
    where
        M: WindowMatcher + ?Sized,
        P: FnMut(&ScanProgress) -> ControlFlow<()>,
    {
        validate_matcher(matcher)?;

        let selected: Vec<usize> = regions
            .iter()
            .enumerate()
            .filter(|(_, region)| target.map_or(true, |t| region.range.intersects(&t)))
            .map(|(index, _)| index)
            .collect();

        let mut report = ScanReport::default();
        for (position, &index) in selected.iter().enumerate() {
            let region = &regions[index];
            match self.scan_region(regions, index, matcher) {
                Ok(mut found) => {
                    debug!(region = %region.range, matches = found.len(), "scanned region");
                    report.matches.append(&mut found);
                }
                Err(e) => {
                    warn!(region = %region.range, error = %e, "skipping unreadable region");
                    report.skipped.push(e);
                }
            }
            report.regions_scanned += 1;

            let step = ScanProgress {
                region_index: position,
                total_regions: selected.len(),
                range: region.range,
            };
            if progress(&step).is_break() {
                report.cancelled = position + 1 < selected.len();
                break;
            }
        }

        info!(
            scanned = report.regions_scanned,
            skipped = report.skipped.len(),
            matches = report.matches.len(),
            cancelled = report.cancelled,
            "scan finished"
        );
        Ok(report)
    }

    /// Scan one region through its overhang buffer.
    fn scan_region<M>(&self, regions: &[RegionDescriptor], index: usize, matcher: &M) -> Result<Vec<Match>>
    where
        M: WindowMatcher + ?Sized,
    {
        let region = &regions[index];
        let window = matcher.window_len();
        let size = usize::try_from(region.size()).map_err(|_| {
            BlackhawkError::region_read(
                region.range,
                std::io::Error::new(std::io::ErrorKind::OutOfMemory, "region does not fit in memory"),
            )
        })?;
        let current = read_region(self.source, region, 0, size)?;

        let context = window - 1;
        let tail = index
            .checked_sub(1)
            .map(|i| &regions[i])
            .filter(|prev| prev.is_contiguous_with(region))
            .map(|prev| self.read_context(prev, context, Edge::Tail))
            .unwrap_or_default();
        let head = regions
            .get(index + 1)
            .filter(|next| region.is_contiguous_with(next))
            .map(|next| self.read_context(next, context, Edge::Head))
            .unwrap_or_default();

        let mut overhang = Vec::with_capacity(tail.len() + current.len() + head.len());
        overhang.extend_from_slice(&tail);
        overhang.extend_from_slice(&current);
        overhang.extend_from_slice(&head);

        let mut offsets = Vec::new();
        matcher.find_in(&overhang, &mut offsets);

        // Contiguity guarantees region.start >= tail.len().
        let base = region.range.start - tail.len() as u64;
        Ok(offsets
            .into_iter()
            .map(|offset| {
                let start = base + offset as u64;
                Match {
                    range: AddressRange::new(start, start + window as u64),
                    bytes: overhang[offset..offset + window].to_vec(),
                }
            })
            .collect())
    }

    /// Read up to `context` bytes from one edge of a neighbouring region.
    ///
    /// An unreadable neighbour contributes no context; its own iteration
    /// reports the failure.
    fn read_context(&self, neighbour: &RegionDescriptor, context: usize, edge: Edge) -> Vec<u8>
    {
        let len = usize::try_from(neighbour.size()).map_or(context, |size| size.min(context));
        if len == 0 {
            return Vec::new();
        }
        let offset = match edge {
            Edge::Tail => neighbour.size() - len as u64,
            Edge::Head => 0,
        };
        read_region(self.source, neighbour, offset, len).unwrap_or_else(|e| {
            debug!(region = %neighbour.range, error = %e, "neighbour context unavailable");
            Vec::new()
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Edge
{
    Tail,
    Head,
}
