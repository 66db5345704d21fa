//! cigarmap - coordinate mapping through CIGAR alignments
//!
//! Translates a coordinate on the read axis of an alignment into the
//! reference axis (or back, for inverted alignments), given the alignment's
//! operation string, strand direction and reference start offset.
//!
//! # Features
//!
//! - Forward and reversed operation strings
//! - Inverted (reference to read) mapping
//! - Single coordinates or whole ranges
//! - Tab-delimited batch conversion with gzip/bzip2 inputs and rayon
//!
//! # Example
//!
//! ```
//! use cigarmap::{AlignmentMapper, Direction, MapperConfig};
//!
//! let config = MapperConfig::new(Direction::Forward).with_start_offset(3);
//! let mapper = AlignmentMapper::new("8M7D6M2I2M11D7M", config);
//!
//! assert_eq!(mapper.align(4), Some(7));
//! assert_eq!(mapper.align(14), None); // inside the 2I insertion
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use self::core::{
    AlignmentMapper, Axis, CigarMapError, CigarOp, CigarParser, CompatMode, Direction, Error,
    MapperConfig, OperationGroup, Result, StrandPair, TableError, prefix_sums, tokenize,
};
pub use formats::table;
