//! # Region Sources
//!
//! The boundary between the core and the operating system.
//!
//! A [`RegionSource`] does two things: list the identifiers of a process's
//! mapped regions, and open a positioned-read handle onto one region. The
//! catalog, the scanner, and the lens only ever talk to a target through this
//! trait, so they can be driven by procfs in production and by in-memory
//! fixtures in tests.
//!
//! ## Why use a trait?
//!
//! - The procfs layout differs between backings (`map_files` versus `mem`)
//! - Tests need to count and fail reads deterministically
//! - The core never has to know how a region is actually backed

use std::io;

use crate::error::{BlackhawkError, Result};
use crate::types::{AddressRange, ProcessId, RegionDescriptor};

/// Random-access read handle onto one region
///
/// Offsets are relative to the start of the region: offset 0 is the byte at
/// `region.range.start`. Implementations must not keep a cursor that reads can
/// disturb, in the manner of `pread(2)`.
pub trait RegionHandle
{
    /// Read up to `buf.len()` bytes at `offset`, returning how many were read.
    ///
    /// A return of 0 for a non-empty buffer means the end of the backing
    /// resource was reached.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Fill `buf` completely from `offset`.
    ///
    /// Fails with `UnexpectedEof` if the resource ends first. Interrupted reads
    /// are retried; every other error is returned immediately.
    fn read_exact_at(&self, mut buf: &mut [u8], mut offset: u64) -> io::Result<()>
    {
        while !buf.is_empty() {
            match self.read_at(buf, offset) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("region ended with {} bytes left to read", buf.len()),
                    ));
                }
                Ok(n) => {
                    buf = &mut buf[n..];
                    offset += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Lists and opens the mapped regions of target processes
pub trait RegionSource
{
    /// Handle type returned by [`RegionSource::open`]
    type Handle: RegionHandle;

    /// List the raw identifiers of every region mapped by `pid`.
    ///
    /// Identifiers encode two hexadecimal bounds separated by a non-hex
    /// delimiter, e.g. `"7f12a000-7f12c000"`. Order is not significant.
    ///
    /// ## Errors
    ///
    /// - `TargetUnavailable`: the process cannot be enumerated
    fn list_identifiers(&self, pid: ProcessId) -> Result<Vec<String>>;

    /// Open a read handle onto `region`.
    fn open(&self, region: &RegionDescriptor) -> io::Result<Self::Handle>;
}

impl<S: RegionSource + ?Sized> RegionSource for &S
{
    type Handle = S::Handle;

    fn list_identifiers(&self, pid: ProcessId) -> Result<Vec<String>>
    {
        (**self).list_identifiers(pid)
    }

    fn open(&self, region: &RegionDescriptor) -> io::Result<Self::Handle>
    {
        (**self).open(region)
    }
}

/// Read `len` bytes of `region` starting `offset` bytes into it.
///
/// Opens a fresh handle, reads, and drops the handle before returning. Any
/// failure, including a span reaching past the region's end, is reported as
/// `RegionReadFailed` for that region.
pub(crate) fn read_region<S: RegionSource + ?Sized>(
    source: &S,
    region: &RegionDescriptor,
    offset: u64,
    len: usize,
) -> Result<Vec<u8>>
{
    let handle = source
        .open(region)
        .map_err(|e| BlackhawkError::region_read(region.range, e))?;
    read_from_handle(&handle, region.range, offset, len)
}

/// Read `len` bytes at region-relative `offset` through an open handle.
pub(crate) fn read_from_handle<H: RegionHandle + ?Sized>(
    handle: &H,
    range: AddressRange,
    offset: u64,
    len: usize,
) -> Result<Vec<u8>>
{
    let within = offset
        .checked_add(len as u64)
        .is_some_and(|end| end <= range.len());
    if !within {
        return Err(BlackhawkError::region_read(
            range,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("read of {len} bytes at offset 0x{offset:x} exceeds region size 0x{:x}", range.len()),
            ),
        ));
    }

    let mut buffer = vec![0u8; len];
    handle
        .read_exact_at(&mut buffer, offset)
        .map_err(|e| BlackhawkError::region_read(range, e))?;
    Ok(buffer)
}
