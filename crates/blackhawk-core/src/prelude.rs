//! Common module for library exports

pub use crate::catalog::RegionCatalog;
pub use crate::error::{BlackhawkError, Result};
pub use crate::lens::MemoryLens;
#[cfg(unix)]
pub use crate::platform::procfs::ProcFs;
pub use crate::privilege::Privilege;
pub use crate::search::{Pattern, PatternSearchEngine, Predicate, ScanReport, WindowMatcher};
pub use crate::target::Target;
pub use crate::types::{AddressRange, Match, ProcessId, RegionDescriptor};
