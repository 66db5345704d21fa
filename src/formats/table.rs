//! Tab-delimited table adapter
//!
//! Joins a query table onto an alignment table by id and runs each query
//! through an [`AlignmentMapper`].
//!
//! Alignments (no header): `id  chrom  start_offset  operation_string`
//!
//! Queries (no header), either plain or extended:
//!
//! ```text
//! id  query
//! id  query  end  direction  inverted
//! ```
//!
//! Output: `id  query  chrom  output`. Unmapped values are written as `.`;
//! range output is a comma-separated list of `query:mapped` pairs.

use crate::core::{
    open_reader, AlignmentMapper, CigarMapError, CompatMode, Direction, LineIterator,
    MapperConfig, TableError, TableResult,
};
use memchr::memchr_iter;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Chunk size for parallel processing
const CHUNK_SIZE: usize = 10000;

/// Placeholder written for a coordinate with no mapping
pub const UNMAPPED: &str = ".";

/// Split a line on tabs
pub fn split_fields(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut fields = Vec::with_capacity(5);
    let mut start = 0;
    for tab in memchr_iter(b'\t', bytes) {
        fields.push(&line[start..tab]);
        start = tab + 1;
    }
    fields.push(&line[start..]);
    fields
}

fn parse_u64(value: &str, field: &'static str, line: usize) -> TableResult<u64> {
    value.trim().parse().map_err(|_| TableError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}

fn parse_optional_u64(value: &str, field: &'static str, line: usize) -> TableResult<Option<u64>> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_u64(value, field, line).map(Some)
    }
}

/// Parse a boolean column: `true/t/1` or `false/f/0`, any case
pub fn parse_bool(value: &str, line: usize) -> TableResult<bool> {
    let v = value.trim();
    if v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("t") || v == "1" {
        Ok(true)
    } else if v.eq_ignore_ascii_case("false") || v.eq_ignore_ascii_case("f") || v == "0" {
        Ok(false)
    } else {
        Err(TableError::InvalidBool {
            line,
            value: value.to_string(),
        })
    }
}

/// One row of the alignments table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub id: String,
    pub chrom: String,
    /// Empty column means no offset
    pub start_offset: Option<u64>,
    pub cigar: String,
}

impl AlignmentRecord {
    pub fn parse(line: &str, line_number: usize) -> TableResult<Self> {
        let fields = split_fields(line);
        if fields.len() < 4 {
            return Err(TableError::TooFewFields {
                line: line_number,
                expected: 4,
                found: fields.len(),
            });
        }

        Ok(Self {
            id: fields[0].to_string(),
            chrom: fields[1].to_string(),
            start_offset: parse_optional_u64(fields[2], "start_offset", line_number)?,
            cigar: fields[3].to_string(),
        })
    }
}

/// One row of the queries table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord {
    pub id: String,
    pub query: u64,
    pub end: Option<u64>,
    pub direction: Direction,
    pub inverted: bool,
}

impl QueryRecord {
    /// Parse a plain (2-column) or extended (5-column) query row
    ///
    /// Plain rows map Forward and non-inverted.
    pub fn parse(line: &str, line_number: usize) -> TableResult<Self> {
        let fields = split_fields(line);
        match fields.len() {
            0 | 1 => Err(TableError::TooFewFields {
                line: line_number,
                expected: 2,
                found: fields.len(),
            }),
            3 | 4 => Err(TableError::TooFewFields {
                line: line_number,
                expected: 5,
                found: fields.len(),
            }),
            2 => Ok(Self {
                id: fields[0].to_string(),
                query: parse_u64(fields[1], "query", line_number)?,
                end: None,
                direction: Direction::Forward,
                inverted: false,
            }),
            _ => Ok(Self {
                id: fields[0].to_string(),
                query: parse_u64(fields[1], "query", line_number)?,
                end: parse_optional_u64(fields[2], "end", line_number)?,
                direction: fields[3].trim().parse()?,
                inverted: parse_bool(fields[4], line_number)?,
            }),
        }
    }
}

/// Which mapper operation to run per query row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// `align(query)`
    #[default]
    Single,
    /// `map_range(query, end)`
    Range,
}

impl QueryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Single => "single",
            QueryMode::Range => "range",
        }
    }
}

/// Mapper output for one query row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutput {
    Single(Option<u64>),
    Range(Vec<(u64, Option<u64>)>),
}

impl RowOutput {
    /// True when at least one coordinate mapped
    pub fn is_mapped(&self) -> bool {
        match self {
            RowOutput::Single(value) => value.is_some(),
            RowOutput::Range(pairs) => pairs.iter().any(|(_, m)| m.is_some()),
        }
    }
}

impl fmt::Display for RowOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowOutput::Single(Some(v)) => write!(f, "{}", v),
            RowOutput::Single(None) => f.write_str(UNMAPPED),
            RowOutput::Range(pairs) => {
                for (i, (q, m)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    match m {
                        Some(v) => write!(f, "{}:{}", q, v)?,
                        None => write!(f, "{}:{}", q, UNMAPPED)?,
                    }
                }
                Ok(())
            }
        }
    }
}

/// A joined and mapped output row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRow {
    pub id: String,
    pub query: u64,
    pub chrom: String,
    pub output: RowOutput,
}

impl fmt::Display for MappedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t{}", self.id, self.query, self.chrom, self.output)
    }
}

/// Failure reason for a query row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// No alignment row with this id
    NoAlignment,
    /// Direction column is not F or R
    InvalidDirection,
    InvalidFormat,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NoAlignment => "NoAlignment",
            FailureReason::InvalidDirection => "InvalidDirection",
            FailureReason::InvalidFormat => "InvalidFormat",
        }
    }
}

impl From<&TableError> for FailureReason {
    fn from(e: &TableError) -> Self {
        match e {
            TableError::Cigar(CigarMapError::InvalidDirection(_)) => FailureReason::InvalidDirection,
            _ => FailureReason::InvalidFormat,
        }
    }
}

/// Conversion statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub total: usize,
    /// Rows written with at least one mapped coordinate
    pub mapped: usize,
    /// Rows written with no mapped coordinate
    pub unmapped: usize,
    /// Rows sent to the unmap file
    pub failed: usize,
}

/// Per-line result of a conversion
enum LineOutcome {
    Mapped(String),
    Unmapped(String),
    Failed(String),
    Skipped,
}

/// Read the alignments table into an id-keyed index
///
/// Blank lines and `#` comments are skipped. A malformed row or a repeated
/// id fails the whole table.
pub fn read_alignments<R: BufRead>(reader: R) -> TableResult<HashMap<String, AlignmentRecord>> {
    let mut alignments = HashMap::new();
    let mut lines = LineIterator::new(reader);

    while let Some(line) = lines.next_numbered() {
        let (line_number, line) = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let record = AlignmentRecord::parse(line, line_number)?;
        if alignments.contains_key(&record.id) {
            return Err(TableError::DuplicateId {
                line: line_number,
                id: record.id,
            });
        }
        alignments.insert(record.id.clone(), record);
    }

    log::debug!("Loaded {} alignment record(s)", alignments.len());
    Ok(alignments)
}

/// Joins query rows onto an alignment index and maps them
pub struct TableMapper {
    alignments: HashMap<String, AlignmentRecord>,
    mode: QueryMode,
    compat_mode: CompatMode,
}

impl TableMapper {
    pub fn new(alignments: HashMap<String, AlignmentRecord>, mode: QueryMode) -> Self {
        Self {
            alignments,
            mode,
            compat_mode: CompatMode::default(),
        }
    }

    /// Load the alignment index from a (possibly compressed) file
    pub fn from_file<P: AsRef<Path>>(path: P, mode: QueryMode) -> TableResult<Self> {
        Ok(Self::new(read_alignments(open_reader(path)?)?, mode))
    }

    pub fn with_compat_mode(mut self, compat_mode: CompatMode) -> Self {
        self.compat_mode = compat_mode;
        self
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub fn alignment_count(&self) -> usize {
        self.alignments.len()
    }

    /// Map one parsed query against its alignment
    pub fn map_query(&self, query: &QueryRecord) -> Result<MappedRow, FailureReason> {
        let Some(alignment) = self.alignments.get(&query.id) else {
            log::warn!("No alignment record for id '{}'", query.id);
            return Err(FailureReason::NoAlignment);
        };

        let config = MapperConfig::new(query.direction)
            .with_start_offset(alignment.start_offset.unwrap_or(0))
            .with_inverted(query.inverted)
            .with_compat_mode(self.compat_mode);
        let mapper = AlignmentMapper::new(&alignment.cigar, config);

        let output = match self.mode {
            QueryMode::Single => RowOutput::Single(mapper.align(query.query)),
            QueryMode::Range => RowOutput::Range(mapper.map_range(Some(query.query), query.end)),
        };

        Ok(MappedRow {
            id: query.id.clone(),
            query: query.query,
            chrom: alignment.chrom.clone(),
            output,
        })
    }

    /// Parse and map one raw query line
    pub fn map_line(&self, line: &str, line_number: usize) -> Result<MappedRow, FailureReason> {
        let query = QueryRecord::parse(line, line_number).map_err(|e| {
            log::debug!("Rejecting query line {}: {}", line_number, e);
            FailureReason::from(&e)
        })?;
        self.map_query(&query)
    }

    fn process_line(&self, line: &str, line_number: usize) -> LineOutcome {
        let trimmed = line.trim_end();
        if trimmed.trim().is_empty() || trimmed.starts_with('#') {
            return LineOutcome::Skipped;
        }

        match self.map_line(trimmed, line_number) {
            Ok(row) if row.output.is_mapped() => LineOutcome::Mapped(row.to_string()),
            Ok(row) => LineOutcome::Unmapped(row.to_string()),
            Err(reason) => LineOutcome::Failed(format!("{}\tFail\t{}", trimmed, reason.as_str())),
        }
    }
}

/// Convert a query table
///
/// # Arguments
/// * `mapper` - Table mapper with the loaded alignment index
/// * `queries` - Input query table path
/// * `output` - Output table path
/// * `unmap` - Output path for rows that could not be joined or parsed
/// * `threads` - Number of threads for parallel processing (1 = sequential)
///
/// # Returns
/// Conversion statistics
pub fn convert_table<P: AsRef<Path>>(
    mapper: &TableMapper,
    queries: P,
    output: P,
    unmap: P,
    threads: usize,
) -> TableResult<ConversionStats> {
    if threads > 1 {
        convert_table_parallel(mapper, queries, output, unmap, threads)
    } else {
        convert_table_sequential(mapper, queries, output, unmap)
    }
}

/// Sequential conversion (single-threaded)
fn convert_table_sequential<P: AsRef<Path>>(
    mapper: &TableMapper,
    queries: P,
    output: P,
    unmap: P,
) -> TableResult<ConversionStats> {
    let mut lines = LineIterator::new(open_reader(queries)?);
    let mut output_file = BufWriter::with_capacity(128 * 1024, File::create(output.as_ref())?);
    let mut unmap_file = BufWriter::with_capacity(64 * 1024, File::create(unmap.as_ref())?);
    let mut stats = ConversionStats::default();

    while let Some(line) = lines.next_numbered() {
        let (line_number, line) = line?;
        match mapper.process_line(line, line_number) {
            LineOutcome::Mapped(out) => {
                writeln!(output_file, "{}", out)?;
                stats.mapped += 1;
            }
            LineOutcome::Unmapped(out) => {
                writeln!(output_file, "{}", out)?;
                stats.unmapped += 1;
            }
            LineOutcome::Failed(out) => {
                writeln!(unmap_file, "{}", out)?;
                stats.failed += 1;
            }
            LineOutcome::Skipped => continue,
        }
        stats.total += 1;
    }

    output_file.flush()?;
    unmap_file.flush()?;
    Ok(stats)
}

/// Parallel conversion using rayon
///
/// Reads all lines into memory, processes in parallel chunks, then writes
/// output in input order.
fn convert_table_parallel<P: AsRef<Path>>(
    mapper: &TableMapper,
    queries: P,
    output: P,
    unmap: P,
    threads: usize,
) -> TableResult<ConversionStats> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| TableError::ThreadPool(e.to_string()))?;

    let mut lines = LineIterator::new(open_reader(queries)?);
    let mut data_lines = Vec::new();
    while let Some(line) = lines.next_numbered() {
        let (line_number, line) = line?;
        data_lines.push((line_number, line.to_string()));
    }

    let total = AtomicUsize::new(0);
    let mapped = AtomicUsize::new(0);
    let unmapped = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    let results: Vec<(Vec<String>, Vec<String>)> = pool.install(|| {
        data_lines
            .par_chunks(CHUNK_SIZE)
            .map(|chunk| {
                let mut output_lines = Vec::with_capacity(chunk.len());
                let mut failed_lines = Vec::new();

                for (line_number, line) in chunk {
                    match mapper.process_line(line, *line_number) {
                        LineOutcome::Mapped(out) => {
                            output_lines.push(out);
                            mapped.fetch_add(1, Ordering::Relaxed);
                        }
                        LineOutcome::Unmapped(out) => {
                            output_lines.push(out);
                            unmapped.fetch_add(1, Ordering::Relaxed);
                        }
                        LineOutcome::Failed(out) => {
                            failed_lines.push(out);
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                        LineOutcome::Skipped => continue,
                    }
                    total.fetch_add(1, Ordering::Relaxed);
                }

                (output_lines, failed_lines)
            })
            .collect()
    });

    let mut output_file = BufWriter::with_capacity(128 * 1024, File::create(output.as_ref())?);
    let mut unmap_file = BufWriter::with_capacity(64 * 1024, File::create(unmap.as_ref())?);

    // Write results (maintaining chunk order)
    for (output_lines, failed_lines) in results {
        for line in output_lines {
            writeln!(output_file, "{}", line)?;
        }
        for line in failed_lines {
            writeln!(unmap_file, "{}", line)?;
        }
    }
    output_file.flush()?;
    unmap_file.flush()?;

    Ok(ConversionStats {
        total: total.load(Ordering::Relaxed),
        mapped: mapped.load(Ordering::Relaxed),
        unmapped: unmapped.load(Ordering::Relaxed),
        failed: failed.load(Ordering::Relaxed),
    })
}
