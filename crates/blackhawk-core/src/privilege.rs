//! # Privilege
//!
//! The privilege precondition checked when attaching to a target.
//!
//! Opening `/proc/<pid>/map_files` entries of another process needs
//! `CAP_SYS_ADMIN`, so Blackhawk requires the caller to be the superuser. The
//! caller's privilege is passed in explicitly as a [`Privilege`] value rather
//! than looked up behind the caller's back, which keeps attachment testable.
//! [`Privilege::current`] reads the effective uid for the common case.

use std::fmt;

use crate::error::{BlackhawkError, Result};

/// Effective privilege of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privilege
{
    /// Effective uid 0
    Superuser,
    /// Any other effective uid
    User(u32),
}

impl Privilege
{
    /// The privilege of the current process, from its effective uid.
    #[cfg(unix)]
    pub fn current() -> Self
    {
        // SAFETY: geteuid takes no arguments, cannot fail, and touches no memory.
        let euid = unsafe { libc::geteuid() };
        Self::from_uid(euid)
    }

    /// Classify an effective uid.
    pub fn from_uid(uid: u32) -> Self
    {
        if uid == 0 {
            Privilege::Superuser
        } else {
            Privilege::User(uid)
        }
    }

    /// Whether this privilege can read other processes' memory maps.
    pub fn is_sufficient(self) -> bool
    {
        matches!(self, Privilege::Superuser)
    }

    /// Fail with `InsufficientPrivilege` unless [`Privilege::is_sufficient`].
    pub fn require(self) -> Result<()>
    {
        if self.is_sufficient() {
            Ok(())
        } else {
            Err(BlackhawkError::InsufficientPrivilege(format!(
                "reading another process's memory maps requires superuser, running as {self}"
            )))
        }
    }
}

impl fmt::Display for Privilege
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Privilege::Superuser => write!(f, "uid 0"),
            Privilege::User(uid) => write!(f, "uid {uid}"),
        }
    }
}
