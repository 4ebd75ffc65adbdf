//! In-memory region source shared by the integration tests.
//!
//! `FakeProcess` holds a set of regions as byte vectors and counts every
//! open and read, so tests can assert that validation failures perform no
//! I/O and that lenses release their handles.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;

use blackhawk_core::error::{BlackhawkError, Result};
use blackhawk_core::source::{RegionHandle, RegionSource};
use blackhawk_core::types::{ProcessId, RegionDescriptor};

pub const PID: ProcessId = ProcessId(4242);

type Memory = Rc<RefCell<Option<Vec<u8>>>>;

#[derive(Debug)]
struct FakeRegion
{
    start: u64,
    identifier: String,
    memory: Memory,
}

#[derive(Debug, Default)]
struct Counters
{
    opens: Cell<usize>,
    reads: Cell<usize>,
    live: Cell<usize>,
}

/// A process made of in-memory regions
#[derive(Debug, Default)]
pub struct FakeProcess
{
    regions: Vec<FakeRegion>,
    extra_identifiers: Vec<String>,
    unavailable: bool,
    counters: Rc<Counters>,
}

impl FakeProcess
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// A process whose region listing fails.
    pub fn unavailable() -> Self
    {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Add a region starting at `start` holding `data`.
    pub fn with_region(mut self, start: u64, data: Vec<u8>) -> Self
    {
        let end = start + data.len() as u64;
        self.regions.push(FakeRegion {
            start,
            identifier: format!("{start:x}-{end:x}"),
            memory: Rc::new(RefCell::new(Some(data))),
        });
        self
    }

    /// Add a region of `len` bytes filled with `fill`.
    pub fn with_filled_region(self, start: u64, len: usize, fill: u8) -> Self
    {
        self.with_region(start, vec![fill; len])
    }

    /// List an identifier that has no backing region.
    pub fn with_identifier(mut self, identifier: &str) -> Self
    {
        self.extra_identifiers.push(identifier.to_string());
        self
    }

    /// Overwrite target memory at an absolute address inside one region.
    pub fn write(&self, address: u64, bytes: &[u8])
    {
        let region = self.region_at(address);
        let mut memory = region.memory.borrow_mut();
        let data = memory.as_mut().expect("region is unmapped");
        let offset = (address - region.start) as usize;
        data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Unmap the region containing `address`; later opens and reads fail.
    pub fn unmap(&self, address: u64)
    {
        *self.region_at(address).memory.borrow_mut() = None;
    }

    pub fn opens(&self) -> usize
    {
        self.counters.opens.get()
    }

    pub fn reads(&self) -> usize
    {
        self.counters.reads.get()
    }

    /// Handles opened and not yet dropped.
    pub fn live_handles(&self) -> usize
    {
        self.counters.live.get()
    }

    fn region_at(&self, address: u64) -> &FakeRegion
    {
        self.regions
            .iter()
            .find(|r| {
                let len = r.memory.borrow().as_ref().map_or(0, Vec::len) as u64;
                address >= r.start && address < r.start + len.max(1)
            })
            .expect("no region at address")
    }
}

impl RegionSource for FakeProcess
{
    type Handle = FakeHandle;

    fn list_identifiers(&self, pid: ProcessId) -> Result<Vec<String>>
    {
        if self.unavailable {
            return Err(BlackhawkError::TargetUnavailable {
                pid,
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }
        // Reverse so the catalog has to sort.
        let mut identifiers: Vec<String> = self.regions.iter().rev().map(|r| r.identifier.clone()).collect();
        identifiers.extend(self.extra_identifiers.iter().cloned());
        Ok(identifiers)
    }

    fn open(&self, region: &RegionDescriptor) -> io::Result<FakeHandle>
    {
        self.counters.opens.set(self.counters.opens.get() + 1);
        let fake = self
            .regions
            .iter()
            .find(|r| r.identifier == region.identifier)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        if fake.memory.borrow().is_none() {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        self.counters.live.set(self.counters.live.get() + 1);
        Ok(FakeHandle {
            memory: Rc::clone(&fake.memory),
            counters: Rc::clone(&self.counters),
        })
    }
}

#[derive(Debug)]
pub struct FakeHandle
{
    memory: Memory,
    counters: Rc<Counters>,
}

impl RegionHandle for FakeHandle
{
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>
    {
        self.counters.reads.set(self.counters.reads.get() + 1);
        let memory = self.memory.borrow();
        let data = memory
            .as_ref()
            .ok_or_else(|| io::Error::from(io::ErrorKind::InvalidInput))?;
        let offset = offset as usize;
        if offset >= data.len() {
            return Ok(0);
        }
        let n = buf.len().min(data.len() - offset);
        buf[..n].copy_from_slice(&data[offset..offset + n]);
        Ok(n)
    }
}

impl Drop for FakeHandle
{
    fn drop(&mut self)
    {
        self.counters.live.set(self.counters.live.get() - 1);
    }
}

/// `len` bytes counting up from `seed`, wrapping, so no short pattern repeats nearby.
pub fn ramp(len: usize, seed: u8) -> Vec<u8>
{
    (0..len).map(|i| seed.wrapping_add(i as u8)).collect()
}
