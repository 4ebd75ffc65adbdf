//! # Platform-Specific Implementations
//!
//! Region sources backed by operating system interfaces.
//!
//! - **procfs** (Linux and other Unix systems with a Linux-compatible
//!   `/proc`): lists regions from `/proc/<pid>/map_files` or `/proc/<pid>/maps`
//!   and reads them with positioned reads.
//!   - See: [proc_pid_map_files(5)](https://man7.org/linux/man-pages/man5/proc_pid_map_files.5.html)
//!   - See: [proc_pid_mem(5)](https://man7.org/linux/man-pages/man5/proc_pid_mem.5.html)

#[cfg(unix)]
pub mod procfs;
