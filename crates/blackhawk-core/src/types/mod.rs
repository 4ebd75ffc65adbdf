//! # Types
//!
//! Plain data types shared by the catalog, the scanner, and the lens.
//!
//! These types carry no I/O. Everything that touches the target process goes
//! through a [`RegionSource`](crate::source::RegionSource).

pub mod address;
pub mod process;

// Re-export all public types
pub use address::AddressRange;
pub use process::{dedup_matches, Match, ProcessId, RegionDescriptor, RegionId};
