//! Property-based tests for AlignmentMapper
//!
//! Prefix-sum invariants, gap detection, identity alignments and range
//! boundaries.

use cigarmap::core::{
    prefix_sums, AlignmentMapper, Axis, CigarParser, CompatMode, Direction, MapperConfig,
};
use proptest::prelude::*;

/// Strategy for a random M/I/D operation string
fn cigar_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec((1u64..50, prop::sample::select(vec!['M', 'I', 'D'])), 0..12)
        .prop_map(|groups| {
            groups
                .into_iter()
                .map(|(len, op)| format!("{}{}", len, op))
                .collect()
        })
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Forward), Just(Direction::Reverse)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Prefix sums start at 0, step by the list values and never decrease
    #[test]
    fn prop_prefix_sum_invariants(values in prop::collection::vec(0u64..1000, 0..64)) {
        let sums = prefix_sums(&values);
        prop_assert_eq!(sums.len(), values.len() + 1);
        prop_assert_eq!(sums[0], 0);
        for k in 1..sums.len() {
            prop_assert_eq!(sums[k] - sums[k - 1], values[k - 1]);
            prop_assert!(sums[k] >= sums[k - 1]);
        }
    }

    /// Consumption lists have one entry per group plus the padding
    #[test]
    fn prop_consumption_totals(
        cigar in cigar_strategy(),
        direction in direction_strategy(),
        offset in 0u64..1000,
    ) {
        let parser = CigarParser::new(&cigar, direction, offset);
        let read = parser.consumption(Axis::Read);
        let reference = parser.consumption(Axis::Reference);

        prop_assert_eq!(read.len(), reference.len());
        prop_assert_eq!(read.len(), parser.groups().len());
        prop_assert_eq!(read[0], 0);
        prop_assert_eq!(reference[0], offset);

        let forward = CigarParser::new(&cigar, Direction::Forward, offset);
        let read_total: u64 = forward.consumption(Axis::Read).iter().sum();
        let ref_total: u64 = forward.consumption(Axis::Reference).iter().sum();
        prop_assert_eq!(read.iter().sum::<u64>(), read_total);
        prop_assert_eq!(reference.iter().sum::<u64>(), ref_total);
    }

    /// Reversal keeps the padding first and mirrors everything after it
    #[test]
    fn prop_reverse_mirrors_groups(cigar in cigar_strategy(), offset in 0u64..100) {
        let forward = CigarParser::new(&cigar, Direction::Forward, offset).consumption(Axis::Reference);
        let reverse = CigarParser::new(&cigar, Direction::Reverse, offset).consumption(Axis::Reference);

        prop_assert_eq!(forward[0], reverse[0]);
        let mut tail: Vec<u64> = forward[1..].to_vec();
        tail.reverse();
        prop_assert_eq!(&reverse[1..], &tail[..]);
    }

    /// A single match group is a pure shift by the start offset
    #[test]
    fn prop_single_match_is_shift(len in 1u64..500, offset in 0u64..500, q in 0u64..500) {
        prop_assume!(q < len);
        let config = MapperConfig::new(Direction::Forward).with_start_offset(offset);
        let mapper = AlignmentMapper::new(&format!("{}M", len), config);
        prop_assert_eq!(mapper.align(q), Some(q + offset));
    }

    /// Read coordinates inside an insertion have no reference position
    #[test]
    fn prop_insertion_is_unmapped(a in 1u64..100, b in 1u64..100, c in 1u64..100) {
        let mapper = AlignmentMapper::new(&format!("{}M{}I{}M", a, b, c), MapperConfig::default());
        for q in 0..a {
            prop_assert_eq!(mapper.align(q), Some(q));
        }
        for q in a..a + b {
            prop_assert_eq!(mapper.align(q), None);
        }
        for q in a + b..a + b + c {
            prop_assert_eq!(mapper.align(q), Some(q - b));
        }
        prop_assert_eq!(mapper.align(a + b + c), None);
    }

    /// Reference coordinates inside a deletion have no read position
    #[test]
    fn prop_deletion_is_unmapped_when_inverted(a in 1u64..100, b in 1u64..100, c in 1u64..100) {
        let config = MapperConfig::new(Direction::Forward).with_inverted(true);
        let mapper = AlignmentMapper::new(&format!("{}M{}D{}M", a, b, c), config);
        for q in 0..=a {
            prop_assert_eq!(mapper.align(q), Some(q));
        }
        for q in a + 1..=a + b {
            prop_assert_eq!(mapper.align(q), None);
        }
        for q in a + b + 1..=a + b + c {
            prop_assert_eq!(mapper.align(q), Some(q - b));
        }
    }

    /// No query maps past the end of the destination axis
    #[test]
    fn prop_align_stays_in_bounds(
        cigar in cigar_strategy(),
        direction in direction_strategy(),
        inverted in any::<bool>(),
        offset in 0u64..50,
        q in 0u64..1000,
    ) {
        let config = MapperConfig::new(direction).with_start_offset(offset).with_inverted(inverted);
        let mapper = AlignmentMapper::new(&cigar, config);
        let pair = mapper.paired_strands();
        let query_max = pair.query_axis.last().copied().unwrap_or(0);

        if let Some(mapped) = mapper.align(q) {
            prop_assert!(mapped <= query_max, "{} -> {} exceeds {}", q, mapped, query_max);
        }
        if q > pair.target_max() {
            prop_assert_eq!(mapper.align(q), None);
        }
        prop_assert_eq!(mapper.align(q), mapper.align(q));
    }

    /// Range output is the ascending, clipped, inclusive run of align()
    #[test]
    fn prop_map_range_matches_align(
        cigar in cigar_strategy(),
        direction in direction_strategy(),
        inverted in any::<bool>(),
        start in 0u64..200,
        span in 0u64..200,
    ) {
        let config = MapperConfig::new(direction).with_start_offset(3).with_inverted(inverted);
        let mapper = AlignmentMapper::new(&cigar, config);
        let max = mapper.paired_strands().target_max();
        let end = start + span;

        let out = mapper.map_range(Some(start), Some(end));
        let expected_last = end.min(max);
        if start > expected_last {
            prop_assert!(out.is_empty());
        } else {
            prop_assert_eq!(out.len() as u64, expected_last - start + 1);
            prop_assert_eq!(out.first().map(|p| p.0), Some(start));
            prop_assert_eq!(out.last().map(|p| p.0), Some(expected_last));
        }
        for (q, mapped) in &out {
            prop_assert!(*q <= max);
            prop_assert_eq!(*mapped, mapper.align(*q));
        }
    }

    /// Omitted bounds cover [0, max]
    #[test]
    fn prop_map_range_defaults(cigar in cigar_strategy(), inverted in any::<bool>()) {
        let mapper = AlignmentMapper::new(&cigar, MapperConfig::default().with_inverted(inverted));
        let max = mapper.paired_strands().target_max();
        let out = mapper.map_range(None, None);
        prop_assert_eq!(out.len() as u64, max + 1);
        prop_assert_eq!(out[0].0, 0);
        prop_assert_eq!(out[out.len() - 1].0, max);
    }

    /// Strict mode adds exactly one coordinate unless clipped
    #[test]
    fn prop_strict_range_scans_one_further(len in 2u64..200, start in 0u64..100, span in 0u64..100) {
        let cigar = format!("{}M", len);
        let improved = AlignmentMapper::new(&cigar, MapperConfig::default());
        let strict = AlignmentMapper::new(
            &cigar,
            MapperConfig::default().with_compat_mode(CompatMode::Strict),
        );
        let end = start + span;
        let a = improved.map_range(Some(start), Some(end));
        let b = strict.map_range(Some(start), Some(end));

        if end < len && start <= end {
            prop_assert_eq!(b.len(), a.len() + 1);
            prop_assert_eq!(&b[..a.len()], &a[..]);
        } else {
            prop_assert!(b.len() <= a.len() + 1);
        }
    }
}

#[test]
fn test_identity_alignment_twenty_matches() {
    let mapper = AlignmentMapper::new("20M", MapperConfig::default());
    for q in 0..20 {
        assert_eq!(mapper.align(q), Some(q));
    }
    assert_eq!(mapper.align(20), None);
    assert_eq!(mapper.map_range(None, None).len(), 21);
}

#[test]
fn test_worked_example_both_orientations() {
    let config = MapperConfig::new(Direction::Forward).with_start_offset(3);
    assert_eq!(AlignmentMapper::new("8M7D6M2I2M11D7M", config).align(4), Some(7));
    assert_eq!(
        AlignmentMapper::new("8M7D6M2I2M11D7M", config.with_inverted(true)).align(4),
        Some(1)
    );
}

#[test]
fn test_mapper_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AlignmentMapper>();
}
