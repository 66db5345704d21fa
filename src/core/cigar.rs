//! Operation string parsing
//!
//! Turns a CIGAR-style operation string into per-axis consumption lists.
//!
//! # Operation String Format
//!
//! ```text
//! 8M7D6M2I2M11D7M
//! ```
//!
//! - Each group is one or more ASCII digits followed by a single op code
//! - Recognised codes: `M` (match), `I` (insertion), `D` (deletion)
//! - Any other text contributes nothing: `5S10M` parses as `10M`
//!
//! A synthetic start-padding group carrying the reference start offset is
//! always placed at index 0, after any direction-based reversal.

use crate::core::error::CigarMapError;
use std::fmt;
use std::str::FromStr;

/// Strand direction of an alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Direction {
    /// Groups are processed in string order
    #[default]
    Forward,
    /// Groups are processed in reverse string order
    Reverse,
}

impl Direction {
    /// Convert to char
    pub fn to_char(&self) -> char {
        match self {
            Direction::Forward => 'F',
            Direction::Reverse => 'R',
        }
    }

    pub fn is_reverse(&self) -> bool {
        matches!(self, Direction::Reverse)
    }
}

impl FromStr for Direction {
    type Err = CigarMapError;

    /// Accepts exactly `F` or `R`, plus the long forms `forward`/`reverse`.
    /// Only the long forms are case-insensitive: `Reverse` parses, `f` does not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "F" => Ok(Direction::Forward),
            "R" => Ok(Direction::Reverse),
            _ if s.eq_ignore_ascii_case("forward") => Ok(Direction::Forward),
            _ if s.eq_ignore_ascii_case("reverse") => Ok(Direction::Reverse),
            _ => Err(CigarMapError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Coordinate axis of an alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Read,
    Reference,
}

impl FromStr for Axis {
    type Err = CigarMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Axis::Read),
            "reference" => Ok(Axis::Reference),
            _ => Err(CigarMapError::InvalidAxis(s.to_string())),
        }
    }
}

/// Alignment operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CigarOp {
    /// `M`: consumes both axes
    Match,
    /// `I`: consumes the read axis only
    Insertion,
    /// `D`: consumes the reference axis only
    Deletion,
    /// Synthetic leading group for the reference start offset
    StartPadding,
}

impl CigarOp {
    /// Parse an op code byte. `StartPadding` has no textual form.
    #[inline]
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'M' => Some(CigarOp::Match),
            b'I' => Some(CigarOp::Insertion),
            b'D' => Some(CigarOp::Deletion),
            _ => None,
        }
    }

    pub fn consumes_read(&self) -> bool {
        matches!(self, CigarOp::Match | CigarOp::Insertion)
    }

    pub fn consumes_reference(&self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Deletion | CigarOp::StartPadding
        )
    }

    #[inline]
    pub fn consumes(&self, axis: Axis) -> bool {
        match axis {
            Axis::Read => self.consumes_read(),
            Axis::Reference => self.consumes_reference(),
        }
    }
}

/// One run-length group of an operation string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationGroup {
    pub len: u64,
    pub op: CigarOp,
}

impl OperationGroup {
    pub fn new(len: u64, op: CigarOp) -> Self {
        Self { len, op }
    }
}

/// Tokenize an operation string into groups, in source order.
///
/// Only maximal digit runs directly followed by `M`, `I` or `D` produce a
/// group. Unrecognised text and lengths that overflow `u64` are dropped.
///
/// # Examples
/// ```
/// use cigarmap::core::{tokenize, CigarOp, OperationGroup};
///
/// let groups = tokenize("5S10M2I");
/// assert_eq!(groups, vec![
///     OperationGroup::new(10, CigarOp::Match),
///     OperationGroup::new(2, CigarOp::Insertion),
/// ]);
/// ```
pub fn tokenize(cigar: &str) -> Vec<OperationGroup> {
    let bytes = cigar.as_bytes();
    let mut groups = Vec::with_capacity(bytes.len() / 2);
    let mut consumed = 0usize;
    let mut pos = 0usize;

    while pos < bytes.len() {
        if !bytes[pos].is_ascii_digit() {
            pos += 1;
            continue;
        }

        let run_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }

        let Some(op) = bytes.get(pos).and_then(|&b| CigarOp::from_byte(b)) else {
            continue;
        };

        match cigar[run_start..pos].parse::<u64>() {
            Ok(len) => {
                groups.push(OperationGroup::new(len, op));
                consumed += pos + 1 - run_start;
            }
            Err(_) => {
                log::debug!(
                    "Dropping group with oversized length '{}' in operation string",
                    &cigar[run_start..pos]
                );
            }
        }
        pos += 1;
    }

    if consumed < bytes.len() {
        log::debug!(
            "Ignored {} unrecognised byte(s) in operation string '{}'",
            bytes.len() - consumed,
            cigar
        );
    }

    groups
}

/// Parsed operation string with the start padding in place
///
/// Groups are stored in processing order: padding first, then the parsed
/// groups in string order (Forward) or reversed (Reverse). A group that
/// would push either axis total past `u64::MAX` is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CigarParser {
    groups: Vec<OperationGroup>,
    direction: Direction,
}

impl CigarParser {
    pub fn new(cigar: &str, direction: Direction, start_offset: u64) -> Self {
        let mut parsed = tokenize(cigar);
        if direction.is_reverse() {
            parsed.reverse();
        }

        let mut groups = Vec::with_capacity(parsed.len() + 1);
        groups.push(OperationGroup::new(start_offset, CigarOp::StartPadding));

        // Axis totals must fit in u64 for the prefix sums downstream
        let mut read_total = 0u64;
        let mut ref_total = start_offset;
        for group in parsed {
            let read = if group.op.consumes_read() { group.len } else { 0 };
            let reference = if group.op.consumes_reference() { group.len } else { 0 };
            match (read_total.checked_add(read), ref_total.checked_add(reference)) {
                (Some(r), Some(f)) => {
                    read_total = r;
                    ref_total = f;
                    groups.push(group);
                }
                _ => {
                    log::debug!(
                        "Dropping group {}{:?} that overflows the axis total in '{}'",
                        group.len,
                        group.op,
                        cigar
                    );
                }
            }
        }

        Self { groups, direction }
    }

    /// All groups in processing order, padding at index 0
    pub fn groups(&self) -> &[OperationGroup] {
        &self.groups
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of entries in each consumption list (padding included)
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Always false: the padding group is always present
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Per-group consumption along one axis
    ///
    /// # Examples
    /// ```
    /// use cigarmap::core::{Axis, CigarParser, Direction};
    ///
    /// let parser = CigarParser::new("4M2I3D", Direction::Forward, 5);
    /// assert_eq!(parser.consumption(Axis::Read), vec![0, 4, 2, 0]);
    /// assert_eq!(parser.consumption(Axis::Reference), vec![5, 4, 0, 3]);
    /// ```
    pub fn consumption(&self, axis: Axis) -> Vec<u64> {
        self.groups
            .iter()
            .map(|g| if g.op.consumes(axis) { g.len } else { 0 })
            .collect()
    }
}
