//! Build script for blackhawk-core
//!
//! This script checks system requirements before compilation:
//! - Minimum Rust version (let-else and `Option::is_some_and` need Rust 1.70.0+)
//! - Platform support (procfs is only present on Linux-like systems)

fn main()
{
    println!("cargo:rerun-if-changed=build.rs");

    // Check minimum Rust version
    if let Ok(rustc_version) = rustc_version::version() {
        let min_rust_version = rustc_version::Version::new(1, 70, 0);

        if rustc_version < min_rust_version {
            panic!(
                "blackhawk-core requires Rust {} or newer, found {}",
                min_rust_version, rustc_version
            );
        }
    } else {
        // If we can't get version (e.g., in some build environments), just warn
        println!("cargo:warning=could not verify Rust version");
    }

    check_platform();
}

fn check_platform()
{
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let target_family = std::env::var("CARGO_CFG_TARGET_FAMILY").unwrap_or_default();

    if target_family != "unix" {
        println!("cargo:warning=blackhawk-core has no region source for {target_os}; only the core types will build");
    } else if target_os != "linux" && target_os != "android" {
        // FreeBSD and friends can mount a Linux-compatible procfs (linprocfs)
        println!("cargo:warning=blackhawk-core on {target_os} needs a Linux-compatible procfs, set BLACKHAWK_PROC_ROOT");
    }
}
