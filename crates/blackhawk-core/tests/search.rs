//! Tests for boundary-aware pattern scanning

mod common;

use std::ops::ControlFlow;

use blackhawk_core::catalog::RegionCatalog;
use blackhawk_core::error::BlackhawkError;
use blackhawk_core::search::{Pattern, PatternSearchEngine, Predicate, ScanProgress, WindowMatcher, MAX_PATTERN_LEN};
use blackhawk_core::types::{AddressRange, Match, RegionDescriptor};
use common::{ramp, FakeProcess, PID};

fn regions_of(process: &FakeProcess) -> Vec<RegionDescriptor>
{
    RegionCatalog::new(process).list_regions(PID).unwrap()
}

fn two_adjacent_regions() -> FakeProcess
{
    FakeProcess::new()
        .with_filled_region(0x1000, 0x1000, 0)
        .with_filled_region(0x2000, 0x1000, 0)
}

#[test]
fn test_match_straddling_boundary_example()
{
    let process = two_adjacent_regions();
    process.write(0x1fff, &[0xab]);
    process.write(0x2000, &[0xcd]);
    let regions = regions_of(&process);

    let report = PatternSearchEngine::new(&process)
        .search_values(&regions, &[0xab, 0xcd], None)
        .unwrap();

    let expected = Match {
        range: AddressRange::new(0x1fff, 0x2001),
        bytes: vec![0xab, 0xcd],
    };
    // Found once by each region's overhang pass
    assert_eq!(report.matches, vec![expected.clone(), expected.clone()]);
    assert_eq!(report.deduplicated(), vec![expected]);
    assert!(report.skipped.is_empty());
    assert_eq!(report.regions_scanned, 2);
}

#[test]
fn test_match_inside_one_region()
{
    let process = FakeProcess::new()
        .with_filled_region(0x1000, 0x1000, 0)
        .with_filled_region(0x2000, 0x1000, 0)
        .with_filled_region(0x8000, 0x1000, 0);
    process.write(0x2345, &[1, 2, 3, 4, 5]);
    let regions = regions_of(&process);

    let pattern = Pattern::new(vec![1, 2, 3, 4, 5]).unwrap();
    let report = PatternSearchEngine::new(&process).search(&regions, &pattern, None).unwrap();

    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].address(), 0x2345);
    assert_eq!(report.matches[0].range, AddressRange::new(0x2345, 0x234a));
    assert_eq!(report.matches[0].bytes, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_match_at_address_space_edges()
{
    let process = two_adjacent_regions();
    process.write(0x1000, &[7, 8, 9]);
    process.write(0x2ffd, &[7, 8, 9]);
    let regions = regions_of(&process);

    let pattern = Pattern::new(vec![7, 8, 9]).unwrap();
    let report = PatternSearchEngine::new(&process).search(&regions, &pattern, None).unwrap();

    let addresses: Vec<u64> = report.matches.iter().map(Match::address).collect();
    assert_eq!(addresses, vec![0x1000, 0x2ffd]);
}

#[test]
fn test_every_split_point_is_found()
{
    for length in [2usize, 3, 7, 64] {
        let pattern_bytes: Vec<u8> = (0..length).map(|i| 0x80 + (i % 0x7f) as u8).collect();
        let pattern = Pattern::new(pattern_bytes.clone()).unwrap();

        for split in 1..length {
            let process = two_adjacent_regions();
            let start = 0x2000 - split as u64;
            process.write(start, &pattern_bytes[..split]);
            process.write(0x2000, &pattern_bytes[split..]);
            let regions = regions_of(&process);

            let report = PatternSearchEngine::new(&process).search(&regions, &pattern, None).unwrap();

            assert_eq!(
                report.matches.len(),
                2,
                "length {length} split {split}: expected one report per overhang pass"
            );
            for found in &report.matches {
                assert_eq!(found.range, AddressRange::new(start, start + length as u64));
                assert_eq!(found.bytes, pattern_bytes);
            }
            assert_eq!(report.deduplicated().len(), 1);
        }
    }
}

#[test]
fn test_largest_pattern_straddling_boundary()
{
    let process = FakeProcess::new()
        .with_filled_region(0x10_0000, MAX_PATTERN_LEN, 0)
        .with_filled_region(0x20_0000, MAX_PATTERN_LEN, 0);
    let pattern_bytes = ramp(MAX_PATTERN_LEN, 1);
    let split = MAX_PATTERN_LEN / 3;
    let start = 0x20_0000 - split as u64;
    process.write(start, &pattern_bytes[..split]);
    process.write(0x20_0000, &pattern_bytes[split..]);
    let regions = regions_of(&process);

    let pattern = Pattern::new(pattern_bytes).unwrap();
    let report = PatternSearchEngine::new(&process).search(&regions, &pattern, None).unwrap();

    let deduplicated = report.deduplicated();
    assert_eq!(deduplicated.len(), 1);
    assert_eq!(deduplicated[0].address(), start);
}

#[test]
fn test_no_match_across_gap()
{
    let process = FakeProcess::new()
        .with_filled_region(0x1000, 0x1000, 0)
        .with_filled_region(0x3000, 0x1000, 0);
    process.write(0x1fff, &[0xab]);
    process.write(0x3000, &[0xcd]);
    let regions = regions_of(&process);

    let report = PatternSearchEngine::new(&process)
        .search_values(&regions, &[0xab, 0xcd], None)
        .unwrap();

    assert!(report.matches.is_empty());
    assert!(report.skipped.is_empty());
}

#[test]
fn test_byte_out_of_range_before_any_io()
{
    let process = two_adjacent_regions();
    let regions = regions_of(&process);
    let engine = PatternSearchEngine::new(&process);

    match engine.search_values(&regions, &[0x41, 256], None) {
        Err(BlackhawkError::ByteOutOfRange { index, value }) => {
            assert_eq!(index, 1);
            assert_eq!(value, 256);
        }
        other => panic!("expected ByteOutOfRange, got {other:?}"),
    }
    assert!(matches!(
        engine.search_values(&regions, &[-1], None),
        Err(BlackhawkError::ByteOutOfRange { index: 0, value: -1 })
    ));

    assert_eq!(process.opens(), 0);
    assert_eq!(process.reads(), 0);
}

#[test]
fn test_pattern_too_large_before_any_io()
{
    let process = two_adjacent_regions();
    let regions = regions_of(&process);
    let engine = PatternSearchEngine::new(&process);

    let values = vec![0i64; MAX_PATTERN_LEN + 1];
    assert!(matches!(
        engine.search_values(&regions, &values, None),
        Err(BlackhawkError::PatternTooLarge { .. })
    ));

    /// Matcher that bypasses constructor validation.
    struct Oversized;

    impl WindowMatcher for Oversized
    {
        fn window_len(&self) -> usize
        {
            MAX_PATTERN_LEN + 1
        }

        fn matches(&self, _window: &[u8]) -> bool
        {
            true
        }
    }

    assert!(matches!(
        engine.search_with(&regions, &Oversized, None, |_| ControlFlow::Continue(())),
        Err(BlackhawkError::PatternTooLarge { .. })
    ));

    assert_eq!(process.opens(), 0);
    assert_eq!(process.reads(), 0);
}

#[test]
fn test_empty_pattern_rejected()
{
    let process = two_adjacent_regions();
    let regions = regions_of(&process);

    assert!(matches!(
        PatternSearchEngine::new(&process).search_values(&regions, &[], None),
        Err(BlackhawkError::EmptyPattern)
    ));
    assert_eq!(process.opens(), 0);
}

#[test]
fn test_unreadable_region_is_skipped()
{
    let process = FakeProcess::new()
        .with_filled_region(0x1000, 0x1000, 0)
        .with_filled_region(0x2000, 0x1000, 0)
        .with_filled_region(0x3000, 0x1000, 0);
    process.write(0x1100, &[0xfe, 0xed]);
    process.write(0x3100, &[0xfe, 0xed]);
    let regions = regions_of(&process);
    // Unmapped between listing and scanning
    process.unmap(0x2000);

    let report = PatternSearchEngine::new(&process)
        .search_values(&regions, &[0xfe, 0xed], None)
        .unwrap();

    let addresses: Vec<u64> = report.matches.iter().map(Match::address).collect();
    assert_eq!(addresses, vec![0x1100, 0x3100]);
    assert_eq!(report.skipped.len(), 1);
    match &report.skipped[0] {
        BlackhawkError::RegionReadFailed { range, .. } => assert_eq!(*range, AddressRange::new(0x2000, 0x3000)),
        other => panic!("expected RegionReadFailed, got {other:?}"),
    }
    assert_eq!(report.regions_scanned, 3);
}

#[test]
fn test_target_range_limits_regions()
{
    let process = FakeProcess::new()
        .with_filled_region(0x1000, 0x1000, 0)
        .with_filled_region(0x4000, 0x1000, 0)
        .with_filled_region(0x8000, 0x1000, 0);
    for base in [0x1000u64, 0x4000, 0x8000] {
        process.write(base + 0x10, &[0x11, 0x22, 0x33]);
    }
    let regions = regions_of(&process);

    let pattern = Pattern::new(vec![0x11, 0x22, 0x33]).unwrap();
    let report = PatternSearchEngine::new(&process)
        .search(&regions, &pattern, Some(AddressRange::new(0x4800, 0x4900)))
        .unwrap();

    assert_eq!(report.regions_scanned, 1);
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].address(), 0x4010);
}

#[test]
fn test_predicate_search()
{
    let process = two_adjacent_regions();
    process.write(0x1ffe, &[0xff, 0xff]);
    process.write(0x2000, &[0xff, 0xff, 0xff]);
    let regions = regions_of(&process);

    let all_ones = Predicate::new(4, |window: &[u8]| window.iter().all(|&b| b == 0xff)).unwrap();
    let report = PatternSearchEngine::new(&process)
        .search_with(&regions, &all_ones, None, |_| ControlFlow::Continue(()))
        .unwrap();

    let addresses: Vec<u64> = report.deduplicated().iter().map(Match::address).collect();
    assert_eq!(addresses, vec![0x1ffe, 0x1fff]);
}

#[test]
fn test_progress_reports_each_region()
{
    let process = FakeProcess::new()
        .with_filled_region(0x1000, 0x100, 0)
        .with_filled_region(0x2000, 0x100, 0)
        .with_filled_region(0x3000, 0x100, 0);
    let regions = regions_of(&process);

    let mut seen: Vec<ScanProgress> = Vec::new();
    let pattern = Pattern::new(vec![1]).unwrap();
    PatternSearchEngine::new(&process)
        .search_with(&regions, &pattern, None, |progress| {
            seen.push(*progress);
            ControlFlow::Continue(())
        })
        .unwrap();

    assert_eq!(seen.len(), 3);
    for (i, progress) in seen.iter().enumerate() {
        assert_eq!(progress.region_index, i);
        assert_eq!(progress.total_regions, 3);
        assert_eq!(progress.range, regions[i].range);
    }
}

#[test]
fn test_cancellation_at_region_boundary()
{
    let process = FakeProcess::new()
        .with_filled_region(0x1000, 0x100, 0x5a)
        .with_filled_region(0x2000, 0x100, 0x5a)
        .with_filled_region(0x3000, 0x100, 0x5a);
    let regions = regions_of(&process);

    let pattern = Pattern::new(vec![0x5a]).unwrap();
    let report = PatternSearchEngine::new(&process)
        .search_with(&regions, &pattern, None, |_| ControlFlow::Break(()))
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.regions_scanned, 1);
    assert_eq!(report.matches.len(), 0x100);
    assert!(report.matches.iter().all(|m| m.range.start < 0x1100));
}

#[test]
fn test_no_regions_no_matches()
{
    let process = FakeProcess::new();
    let pattern = Pattern::new(vec![0]).unwrap();

    let report = PatternSearchEngine::new(&process).search(&[], &pattern, None).unwrap();

    assert!(report.matches.is_empty());
    assert_eq!(report.regions_scanned, 0);
    assert!(!report.cancelled);
}
