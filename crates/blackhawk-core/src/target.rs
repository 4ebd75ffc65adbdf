//! # Target
//!
//! The top-level handle on a process being inspected.
//!
//! A [`Target`] ties a process id to a region source after checking the
//! caller's privilege once. Every operation takes a fresh catalog snapshot,
//! since the target keeps running and its layout may change between calls.
//!
//! ## Lifecycle
//!
//! 1. Attach: `Target::attach(pid, Privilege::current())`
//! 2. Scan: `search()`, `search_within()`, `search_with()`
//! 3. Poll: `lens()` around a match, then `read()` on the lens as often as needed

use std::ops::ControlFlow;
#[cfg(unix)]
use std::path::PathBuf;

use tracing::info;

use crate::catalog::RegionCatalog;
use crate::error::Result;
use crate::lens::MemoryLens;
#[cfg(unix)]
use crate::platform::procfs::ProcFs;
use crate::privilege::Privilege;
use crate::search::{validate_matcher, Pattern, PatternSearchEngine, ScanProgress, ScanReport, WindowMatcher};
use crate::source::RegionSource;
use crate::types::{AddressRange, ProcessId, RegionDescriptor};

/// A process whose memory can be scanned and polled
///
/// ## Example
///
/// ```rust,no_run
/// use blackhawk_core::privilege::Privilege;
/// use blackhawk_core::search::Pattern;
/// use blackhawk_core::types::ProcessId;
/// use blackhawk_core::Target;
///
/// let target = Target::attach(ProcessId(1234), Privilege::current())?;
/// let report = target.search(&Pattern::from_hex("de ad be ef")?)?;
/// if let Some(found) = report.deduplicated().first() {
///     let lens = target.lens(found.range)?;
///     println!("{:02x?}", lens.read_all()?);
/// }
/// # Ok::<(), blackhawk_core::error::BlackhawkError>(())
/// ```
#[derive(Debug)]
pub struct Target<S>
{
    pid: ProcessId,
    catalog: RegionCatalog<S>,
}

#[cfg(unix)]
impl Target<ProcFs>
{
    /// Attach to `pid` through procfs, configured from the environment.
    ///
    /// ## Errors
    ///
    /// - `InsufficientPrivilege`: `privilege` is not the superuser
    pub fn attach(pid: ProcessId, privilege: Privilege) -> Result<Self>
    {
        Self::with_source(pid, privilege, ProcFs::from_env())
    }

    /// `<proc_root>/<pid>`
    pub fn proc_path(&self) -> PathBuf
    {
        self.source().pid_dir(self.pid)
    }
}

impl<S: RegionSource> Target<S>
{
    /// Attach to `pid` through an explicit region source.
    ///
    /// Privilege is checked here and not again by later operations.
    ///
    /// ## Errors
    ///
    /// - `InsufficientPrivilege`: `privilege` is not the superuser
    pub fn with_source(pid: ProcessId, privilege: Privilege, source: S) -> Result<Self>
    {
        privilege.require()?;
        info!(pid = %pid, privilege = %privilege, "attached to target");
        Ok(Self {
            pid,
            catalog: RegionCatalog::new(source),
        })
    }

    /// The target's process id.
    pub fn pid(&self) -> ProcessId
    {
        self.pid
    }

    /// The catalog used to enumerate regions.
    pub fn catalog(&self) -> &RegionCatalog<S>
    {
        &self.catalog
    }

    /// The region source.
    pub fn source(&self) -> &S
    {
        self.catalog.source()
    }

    /// A fresh snapshot of the target's regions, sorted by start address.
    pub fn regions(&self) -> Result<Vec<RegionDescriptor>>
    {
        self.catalog.list_regions(self.pid)
    }

    /// Scan the whole address space for `pattern`.
    pub fn search(&self, pattern: &Pattern) -> Result<ScanReport>
    {
        self.search_with(pattern, None, |_| ControlFlow::Continue(()))
    }

    /// Scan the regions intersecting `range` for `pattern`.
    pub fn search_within(&self, pattern: &Pattern, range: AddressRange) -> Result<ScanReport>
    {
        self.search_with(pattern, Some(range), |_| ControlFlow::Continue(()))
    }

    /// Scan with any matcher, optionally restricted to `range`, reporting progress.
    ///
    /// The matcher's window length is validated before the regions are listed.
    pub fn search_with<M, P>(&self, matcher: &M, range: Option<AddressRange>, progress: P) -> Result<ScanReport>
    where
        M: WindowMatcher + ?Sized,
        P: FnMut(&ScanProgress) -> ControlFlow<()>,
    {
        validate_matcher(matcher)?;
        let regions = self.regions()?;
        PatternSearchEngine::new(self.source()).search_with(&regions, matcher, range, progress)
    }

    /// Open a lens on `range` over a fresh region snapshot.
    pub fn lens(&self, range: AddressRange) -> Result<MemoryLens<S::Handle>>
    {
        let regions = self.regions()?;
        MemoryLens::open(self.source(), &regions, range)
    }
}
