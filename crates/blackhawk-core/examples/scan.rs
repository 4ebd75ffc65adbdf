//! Scan Example
//!
//! Scans a running process for a byte pattern and watches the first match.
//!
//! ## What this example does:
//!
//! 1. Attaches to the target through procfs (requires root)
//! 2. Scans every mapped region for the pattern, including across region boundaries
//! 3. Opens a lens on the first match
//! 4. Polls the lens and prints the bytes whenever they change
//!
//! ## Usage:
//!
//! ```bash
//! sudo cargo run --example scan -- <PID> "<hex pattern>" [polls]
//! sudo cargo run --example scan -- 12345 "de ad be ef" 20
//! ```
//!
//! `BLACKHAWK_BACKING=mem` switches to `/proc/<pid>/mem` when `map_files` is
//! not available. Logging is configured with `RUST_LOG` and `BLACKHAWK_LOG_*`.

#[cfg(not(unix))]
fn main()
{
    eprintln!("This example needs a procfs mount.");
    std::process::exit(1);
}

#[cfg(unix)]
mod unix_impl
{
    use std::process;
    use std::thread;
    use std::time::Duration;

    use blackhawk_core::prelude::*;
    use blackhawk_utils::init_logging;

    const POLL_INTERVAL: Duration = Duration::from_millis(500);

    pub fn main()
    {
        let args: Vec<String> = std::env::args().collect();

        if args.len() < 3 {
            eprintln!("Usage: {} <PID> <hex pattern> [polls]", args[0]);
            eprintln!("Example: {} 12345 \"de ad be ef\" 20", args[0]);
            process::exit(1);
        }

        let pid: u32 = match args[1].parse() {
            Ok(pid) => pid,
            Err(e) => {
                eprintln!("Error: Invalid PID '{}': {}", args[1], e);
                process::exit(1);
            }
        };
        let polls: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(10);

        let _guard = match init_logging() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        };

        if let Err(e) = run(ProcessId(pid), &args[2], polls) {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }

    fn run(pid: ProcessId, hex: &str, polls: usize) -> Result<()>
    {
        let pattern = Pattern::from_hex(hex)?;
        let target = Target::attach(pid, Privilege::current())?;
        println!("Blackhawk scan of {} ({} bytes)", target.proc_path().display(), pattern.len());

        let report = target.search_with(&pattern, None, |progress| {
            if progress.region_index % 64 == 0 {
                eprintln!("  region {}/{}", progress.region_index + 1, progress.total_regions);
            }
            std::ops::ControlFlow::Continue(())
        })?;

        let matches = report.deduplicated();
        println!(
            "Scanned {} regions, skipped {}, found {} matches",
            report.regions_scanned,
            report.skipped.len(),
            matches.len()
        );
        for found in matches.iter().take(20) {
            println!("  0x{:016x}", found.address());
        }

        let Some(first) = matches.first() else {
            return Ok(());
        };

        let lens = target.lens(first.range)?;
        println!("\nWatching {} across {} region(s)", lens.range(), lens.regions().len());
        let mut last = Vec::new();
        for _ in 0..polls {
            let bytes = lens.read_all()?;
            if bytes != last {
                println!("  {}", hex_string(&bytes));
                last = bytes;
            }
            thread::sleep(POLL_INTERVAL);
        }
        Ok(())
    }

    fn hex_string(bytes: &[u8]) -> String
    {
        bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
    }
}

#[cfg(unix)]
fn main()
{
    unix_impl::main();
}
