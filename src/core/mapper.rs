//! Coordinate mapping algorithm
//!
//! Maps coordinates between the read and reference axes of one alignment.
//!
//! The mapping algorithm:
//! 1. Parse the operation string into read and reference consumption lists
//! 2. Turn each list into a prefix-sum array
//! 3. Order the pair by the inversion flag (query axis, target axis)
//! 4. Scan the target axis for the first group whose end passes the query,
//!    then shift the query by the offset between the two axes at that group
//!
//! The scan comparison depends on direction and inversion:
//!
//! | inverted | direction | condition                 |
//! |----------|-----------|---------------------------|
//! | false    | Forward   | `target_axis[i] >  query` |
//! | false    | Reverse   | `target_axis[i] >= query` |
//! | true     | either    | `target_axis[i] >= query` |

use crate::core::cigar::{Axis, CigarParser, Direction};
use crate::core::error::CigarResult;
use std::sync::OnceLock;

/// Compatibility mode for range mapping
///
/// Controls how an explicit range end is interpreted by [`AlignmentMapper::map_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompatMode {
    /// Default mode: an explicit end is inclusive, `[start, end]`
    #[default]
    Improved,
    /// Strict mode: reproduce the legacy range builder
    /// - An explicit end scans `[start, end + 1]`
    /// - Still clipped to the target-axis maximum
    Strict,
}

impl CompatMode {
    /// Check if strict mode is enabled
    pub fn is_strict(&self) -> bool {
        matches!(self, CompatMode::Strict)
    }
}

/// Construction-time settings for an [`AlignmentMapper`]
///
/// `Default` is Forward, start offset 0, not inverted, [`CompatMode::Improved`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapperConfig {
    pub direction: Direction,
    /// Reference-only padding placed before the first group
    pub start_offset: u64,
    /// Swap which axis the query coordinate lives on
    pub inverted: bool,
    pub compat_mode: CompatMode,
}

impl MapperConfig {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }

    pub fn with_start_offset(mut self, start_offset: u64) -> Self {
        self.start_offset = start_offset;
        self
    }

    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    pub fn with_compat_mode(mut self, compat_mode: CompatMode) -> Self {
        self.compat_mode = compat_mode;
        self
    }

    /// Build a config from raw record fields
    ///
    /// A missing start offset means 0. Fails when `direction` is not `F`/`R`.
    ///
    /// # Examples
    /// ```
    /// use cigarmap::core::{Direction, MapperConfig};
    ///
    /// let config = MapperConfig::parse("R", None, true).unwrap();
    /// assert_eq!(config.direction, Direction::Reverse);
    /// assert_eq!(config.start_offset, 0);
    /// assert!(MapperConfig::parse("X", Some(3), false).is_err());
    /// ```
    pub fn parse(direction: &str, start_offset: Option<u64>, inverted: bool) -> CigarResult<Self> {
        Ok(Self::new(direction.parse()?)
            .with_start_offset(start_offset.unwrap_or(0))
            .with_inverted(inverted))
    }
}

/// Prefix sums of a consumption list
///
/// The result has `values.len() + 1` entries, entry 0 is always 0 and
/// entry k is the sum of the first k values, saturating at `u64::MAX`.
///
/// # Examples
/// ```
/// use cigarmap::core::prefix_sums;
/// assert_eq!(prefix_sums(&[3, 8, 0, 6]), vec![0, 3, 11, 11, 17]);
/// assert_eq!(prefix_sums(&[]), vec![0]);
/// ```
pub fn prefix_sums(values: &[u64]) -> Vec<u64> {
    let mut sums = Vec::with_capacity(values.len() + 1);
    let mut acc = 0u64;
    sums.push(acc);
    for &v in values {
        acc = acc.saturating_add(v);
        sums.push(acc);
    }
    sums
}

/// Prefix-sum arrays ordered for the scan
///
/// The query coordinate is compared against `target_axis`; the mapped
/// coordinate is read off `query_axis`. Non-inverted mappers put the
/// reference sums in `query_axis` and the read sums in `target_axis`, so a
/// read coordinate maps to a reference coordinate. Inverted mappers do the
/// opposite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrandPair {
    pub query_axis: Vec<u64>,
    pub target_axis: Vec<u64>,
}

impl StrandPair {
    /// Largest value on the target axis
    #[inline]
    pub fn target_max(&self) -> u64 {
        // Prefix sums are non-decreasing, so the last entry is the maximum
        self.target_axis.last().copied().unwrap_or(0)
    }
}

/// Coordinate mapper for a single alignment
///
/// Immutable after construction. The strand pair is computed on first use
/// and kept for the lifetime of the instance.
#[derive(Debug, Clone)]
pub struct AlignmentMapper {
    parser: CigarParser,
    inverted: bool,
    compat_mode: CompatMode,
    strands: OnceLock<StrandPair>,
}

impl AlignmentMapper {
    pub fn new(cigar: &str, config: MapperConfig) -> Self {
        Self {
            parser: CigarParser::new(cigar, config.direction, config.start_offset),
            inverted: config.inverted,
            compat_mode: config.compat_mode,
            strands: OnceLock::new(),
        }
    }

    /// Build a mapper straight from record fields
    ///
    /// See [`MapperConfig::parse`] for the field rules.
    pub fn from_record(
        cigar: &str,
        direction: &str,
        start_offset: Option<u64>,
        inverted: bool,
    ) -> CigarResult<Self> {
        Ok(Self::new(cigar, MapperConfig::parse(direction, start_offset, inverted)?))
    }

    pub fn parser(&self) -> &CigarParser {
        &self.parser
    }

    pub fn direction(&self) -> Direction {
        self.parser.direction()
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn compat_mode(&self) -> CompatMode {
        self.compat_mode
    }

    /// Prefix sums of both axes, ordered by the inversion flag
    ///
    /// Inverted: `(read, reference)`. Not inverted: `(reference, read)`.
    pub fn paired_strands(&self) -> &StrandPair {
        self.strands.get_or_init(|| {
            let read = prefix_sums(&self.parser.consumption(Axis::Read));
            let reference = prefix_sums(&self.parser.consumption(Axis::Reference));
            if self.inverted {
                StrandPair {
                    query_axis: read,
                    target_axis: reference,
                }
            } else {
                StrandPair {
                    query_axis: reference,
                    target_axis: read,
                }
            }
        })
    }

    #[inline]
    fn map_condition(&self, target: u64, query: u64) -> bool {
        match (self.inverted, self.direction()) {
            (false, Direction::Forward) => target > query,
            (false, Direction::Reverse) => target >= query,
            (true, _) => target >= query,
        }
    }

    /// Map a single coordinate
    ///
    /// Returns `None` when the coordinate falls in a gap of the other axis,
    /// lies past the end of the alignment, or would map below 0.
    ///
    /// # Examples
    /// ```
    /// use cigarmap::core::{AlignmentMapper, Direction, MapperConfig};
    ///
    /// let config = MapperConfig::new(Direction::Forward).with_start_offset(3);
    /// let mapper = AlignmentMapper::new("8M7D6M2I2M11D7M", config);
    /// assert_eq!(mapper.align(4), Some(7));
    ///
    /// let mapper = AlignmentMapper::new("8M7D6M2I2M11D7M", config.with_inverted(true));
    /// assert_eq!(mapper.align(4), Some(1));
    /// ```
    pub fn align(&self, query: u64) -> Option<u64> {
        let pair = self.paired_strands();
        let (from, to) = (&pair.target_axis, &pair.query_axis);

        let i = (1..from.len()).find(|&i| self.map_condition(from[i], query))?;

        // A stalled prefix sum means this group consumed nothing on the
        // destination axis
        if to[i] > 0 && to[i] == to[i - 1] {
            return None;
        }

        if to[i] >= from[i] {
            query.checked_add(to[i] - from[i])
        } else {
            query.checked_sub(from[i] - to[i])
        }
    }

    /// Map every coordinate of a range
    ///
    /// `start` defaults to 0 and `end` to the target-axis maximum. The range
    /// is inclusive of `end` and never extends past the target-axis maximum.
    /// Under [`CompatMode::Strict`] an explicit `end` scans one further.
    pub fn map_range(&self, start: Option<u64>, end: Option<u64>) -> Vec<(u64, Option<u64>)> {
        let max = self.paired_strands().target_max();
        let start = start.unwrap_or(0);
        let last = match end {
            None => max,
            Some(end) if self.compat_mode.is_strict() => end.saturating_add(1).min(max),
            Some(end) => end.min(max),
        };

        if start > last {
            return Vec::new();
        }

        (start..=last).map(|q| (q, self.align(q))).collect()
    }
}
