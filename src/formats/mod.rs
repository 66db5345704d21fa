//! File format adapters
//!
//! Adapters that feed tab-delimited alignment/query tables through the mapper.

pub mod table;

pub use table::{
    convert_table, read_alignments, AlignmentRecord, ConversionStats, FailureReason, MappedRow,
    QueryMode, QueryRecord, RowOutput, TableMapper,
};
