//! Half-open address range type.

use std::fmt;

/// Half-open virtual address range `[start, end)`
///
/// Every region, match, and lens in Blackhawk is described by one of these.
/// The constructor does not validate `start <= end`; use
/// [`AddressRange::normalized`] when the bounds come from user input and may
/// be reversed.
///
/// Ordering compares `start` first, so a sorted list of disjoint ranges is
/// sorted by start address.
///
/// ## Example
///
/// ```rust
/// use blackhawk_core::types::AddressRange;
///
/// let range = AddressRange::new(0x1000, 0x2000);
/// assert_eq!(range.len(), 0x1000);
/// assert!(range.contains(0x1fff));
/// assert!(!range.contains(0x2000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddressRange
{
    /// First address in the range (inclusive)
    pub start: u64,
    /// First address past the range (exclusive)
    pub end: u64,
}

impl AddressRange
{
    /// Create a range from its bounds as given.
    pub const fn new(start: u64, end: u64) -> Self
    {
        Self { start, end }
    }

    /// Create a range, swapping the bounds if they are reversed.
    ///
    /// The range is never clamped, only reordered.
    ///
    /// ```rust
    /// use blackhawk_core::types::AddressRange;
    ///
    /// assert_eq!(AddressRange::normalized(0x3000, 0x1000), AddressRange::new(0x1000, 0x3000));
    /// ```
    pub fn normalized(a: u64, b: u64) -> Self
    {
        if a <= b {
            Self::new(a, b)
        } else {
            Self::new(b, a)
        }
    }

    /// Create a range from a start address and a length, or `None` on overflow.
    pub fn from_start_len(start: u64, len: u64) -> Option<Self>
    {
        start.checked_add(len).map(|end| Self::new(start, end))
    }

    /// Number of bytes covered (0 if the bounds are reversed).
    pub fn len(&self) -> u64
    {
        self.end.saturating_sub(self.start)
    }

    /// Whether the range covers no bytes.
    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }

    /// Whether `address` lies inside the range.
    pub fn contains(&self, address: u64) -> bool
    {
        address >= self.start && address < self.end
    }

    /// Whether `other` lies entirely inside this range.
    pub fn contains_range(&self, other: &AddressRange) -> bool
    {
        other.start >= self.start && other.end <= self.end
    }

    /// Whether the two ranges share at least one address.
    ///
    /// An empty range intersects a range that strictly contains its position,
    /// so zero-length lenses still resolve to the region they sit in.
    pub fn intersects(&self, other: &AddressRange) -> bool
    {
        if other.is_empty() {
            return self.contains(other.start);
        }
        if self.is_empty() {
            return other.contains(self.start);
        }
        self.start < other.end && other.start < self.end
    }

    /// Whether `next` begins exactly where this range ends.
    pub fn is_followed_by(&self, next: &AddressRange) -> bool
    {
        self.end == next.start
    }

    /// The overlapping part of the two ranges, if any.
    pub fn intersection(&self, other: &AddressRange) -> Option<AddressRange>
    {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(AddressRange::new(start, end))
    }
}

impl fmt::Display for AddressRange
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "[0x{:x}, 0x{:x})", self.start, self.end)
    }
}

impl From<std::ops::Range<u64>> for AddressRange
{
    fn from(range: std::ops::Range<u64>) -> Self
    {
        Self::new(range.start, range.end)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_intersects_half_open()
    {
        let a = AddressRange::new(0x1000, 0x2000);
        assert!(a.intersects(&AddressRange::new(0x1fff, 0x3000)));
        assert!(!a.intersects(&AddressRange::new(0x2000, 0x3000)));
        assert!(!a.intersects(&AddressRange::new(0x0, 0x1000)));
    }

    #[test]
    fn test_intersects_empty_range()
    {
        let a = AddressRange::new(0x1000, 0x2000);
        assert!(a.intersects(&AddressRange::new(0x1800, 0x1800)));
        assert!(!a.intersects(&AddressRange::new(0x2000, 0x2000)));
    }

    #[test]
    fn test_intersection()
    {
        let a = AddressRange::new(0x1000, 0x2000);
        let b = AddressRange::new(0x1800, 0x2800);
        assert_eq!(a.intersection(&b), Some(AddressRange::new(0x1800, 0x2000)));
        assert_eq!(a.intersection(&AddressRange::new(0x2000, 0x2100)), None);
    }

    #[test]
    fn test_display()
    {
        assert_eq!(AddressRange::new(0x1fff, 0x2001).to_string(), "[0x1fff, 0x2001)");
    }
}
