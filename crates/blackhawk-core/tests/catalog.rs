//! Tests for region enumeration

mod common;

use blackhawk_core::catalog::RegionCatalog;
use blackhawk_core::error::BlackhawkError;
use blackhawk_core::types::{AddressRange, RegionId};
use common::{FakeProcess, PID};

#[test]
fn test_list_regions_sorted_by_start()
{
    let process = FakeProcess::new()
        .with_filled_region(0x1000, 0x1000, 0)
        .with_filled_region(0x5000, 0x800, 0)
        .with_filled_region(0x2000, 0x1000, 0);
    let catalog = RegionCatalog::new(&process);

    let regions = catalog.list_regions(PID).unwrap();
    let ranges: Vec<AddressRange> = regions.iter().map(|r| r.range).collect();
    assert_eq!(
        ranges,
        vec![
            AddressRange::new(0x1000, 0x2000),
            AddressRange::new(0x2000, 0x3000),
            AddressRange::new(0x5000, 0x5800),
        ]
    );
    let ids: Vec<RegionId> = regions.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![RegionId(0), RegionId(1), RegionId(2)]);
    assert!(regions.iter().all(|r| r.pid == PID));
}

#[test]
fn test_list_regions_empty_process()
{
    let process = FakeProcess::new();
    let catalog = RegionCatalog::new(&process);

    let regions = catalog.list_regions(PID).unwrap();
    assert!(regions.is_empty());
}

#[test]
fn test_list_regions_skips_malformed_identifiers()
{
    let process = FakeProcess::new()
        .with_filled_region(0x1000, 0x100, 0)
        .with_identifier("not-a-range")
        .with_identifier("3000")
        .with_identifier("4000-3000");
    let catalog = RegionCatalog::new(&process);

    let regions = catalog.list_regions(PID).unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].range, AddressRange::new(0x1000, 0x1100));
    assert_eq!(regions[0].identifier, "1000-1100");
}

#[test]
fn test_list_regions_drops_overlapping_entries()
{
    let process = FakeProcess::new()
        .with_filled_region(0x1000, 0x1000, 0)
        .with_identifier("1800-2800")
        .with_filled_region(0x2000, 0x1000, 0);
    let catalog = RegionCatalog::new(&process);

    let regions = catalog.list_regions(PID).unwrap();
    let ranges: Vec<AddressRange> = regions.iter().map(|r| r.range).collect();
    assert_eq!(
        ranges,
        vec![AddressRange::new(0x1000, 0x2000), AddressRange::new(0x2000, 0x3000)]
    );
    for pair in regions.windows(2) {
        assert!(pair[0].range.end <= pair[1].range.start);
    }
}

#[test]
fn test_list_regions_target_unavailable()
{
    let process = FakeProcess::unavailable();
    let catalog = RegionCatalog::new(&process);

    match catalog.list_regions(PID) {
        Err(BlackhawkError::TargetUnavailable { pid, .. }) => assert_eq!(pid, PID),
        other => panic!("expected TargetUnavailable, got {other:?}"),
    }
}

#[test]
fn test_list_regions_performs_no_reads()
{
    let process = FakeProcess::new().with_filled_region(0x1000, 0x100, 0);
    let catalog = RegionCatalog::new(&process);

    catalog.list_regions(PID).unwrap();
    assert_eq!(process.opens(), 0);
    assert_eq!(process.reads(), 0);
}
