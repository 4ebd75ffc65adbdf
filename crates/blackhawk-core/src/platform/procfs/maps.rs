//! Parsing of `/proc/<pid>/maps`.
//!
//! Each line looks like
//!
//! ```text
//! 7f3b1c000000-7f3b1c021000 rw-p 00000000 00:00 0          [heap]
//! ```
//!
//! Only the first two columns matter here: the address range, which is
//! already in region identifier form, and the permissions.

/// Identifiers of the readable mappings listed in a maps file.
///
/// Lines without a permission column are kept so the catalog can reject them
/// as malformed instead of having them vanish silently.
pub(crate) fn readable_identifiers(maps: &str) -> Vec<String>
{
    maps.lines()
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let range = columns.next()?;
            match columns.next() {
                Some(perms) if !perms.starts_with('r') => None,
                _ => Some(range.to_string()),
            }
        })
        .collect()
}
