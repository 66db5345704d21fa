//! Core coordinate mapping functionality
//!
//! This module contains the operation string parser, the prefix-sum
//! alignment mapper and the input helpers used by the table adapter.

mod cigar;
mod error;
pub mod io;
mod mapper;

pub use cigar::{tokenize, Axis, CigarOp, CigarParser, Direction, OperationGroup};
pub use error::{
    CigarMapError, CigarResult, Error, Result, TableError, TableResult,
};
pub use io::{detect_compression, open_reader, CompressionFormat, LineIterator, DEFAULT_BUFFER_SIZE};
pub use mapper::{prefix_sums, AlignmentMapper, CompatMode, MapperConfig, StrandPair};
