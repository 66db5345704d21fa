//! cigarmap CLI entry point
//!
//! Maps query coordinates through CIGAR alignments listed in a table.

use clap::{Parser, Subcommand, ValueEnum};
use cigarmap::core::CompatMode;
use cigarmap::formats::{self, QueryMode, TableMapper};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Compatibility mode for range mapping (CLI enum)
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum CompatModeArg {
    /// Explicit range ends are inclusive
    #[default]
    #[value(name = "improved")]
    Improved,
    /// Reproduce the legacy range builder (scans one past an explicit end)
    #[value(name = "strict")]
    Strict,
}

impl From<CompatModeArg> for CompatMode {
    fn from(arg: CompatModeArg) -> Self {
        match arg {
            CompatModeArg::Improved => CompatMode::Improved,
            CompatModeArg::Strict => CompatMode::Strict,
        }
    }
}

#[derive(Parser)]
#[command(name = "cigarmap")]
#[command(about = "Map coordinates between read and reference through CIGAR alignments")]
#[command(version)]
#[command(author = "cigarmap Contributors")]
struct Cli {
    /// Compatibility mode: 'strict' for legacy range output, 'improved' for inclusive ranges
    #[arg(long = "compat-mode", global = true, default_value = "improved")]
    compat_mode: CompatModeArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map one coordinate per query row
    Single {
        /// Alignment table: id, chrom, start_offset, operation_string
        alignments: PathBuf,
        /// Query table: id, query[, end, direction, inverted]
        queries: PathBuf,
        /// Output file (default: output_single.tsv)
        output: Option<PathBuf>,
        /// Number of threads
        #[arg(short = 't', long, default_value = "1")]
        threads: usize,
    },
    /// Map every coordinate from query to end per query row
    Range {
        /// Alignment table: id, chrom, start_offset, operation_string
        alignments: PathBuf,
        /// Query table: id, query[, end, direction, inverted]
        queries: PathBuf,
        /// Output file (default: output_range.tsv)
        output: Option<PathBuf>,
        /// Number of threads
        #[arg(short = 't', long, default_value = "1")]
        threads: usize,
    },
}

fn load_alignments(path: &Path, mode: QueryMode, compat_mode: CompatModeArg) -> anyhow::Result<TableMapper> {
    let start = Instant::now();
    eprintln!("Loading alignment table: {:?}", path);

    let mapper = TableMapper::from_file(path, mode)
        .map_err(|e| anyhow::anyhow!("Failed to load alignment table: {}", e))?
        .with_compat_mode(compat_mode.into());

    eprintln!(
        "Loaded {} alignment(s) in {:.2}s",
        mapper.alignment_count(),
        start.elapsed().as_secs_f64()
    );
    Ok(mapper)
}

fn run(
    mode: QueryMode,
    alignments: PathBuf,
    queries: PathBuf,
    output: Option<PathBuf>,
    threads: usize,
    compat_mode: CompatModeArg,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let mapper = load_alignments(&alignments, mode, compat_mode)?;
    let output_path =
        output.unwrap_or_else(|| PathBuf::from(format!("output_{}.tsv", mode.as_str())));
    let unmap_path = PathBuf::from(format!("{}.unmap", output_path.display()));

    eprintln!("Mapping {} queries: {:?} -> {:?}", mode.as_str(), queries, output_path);
    let stats = formats::convert_table(&mapper, &queries, &output_path, &unmap_path, threads)?;

    eprintln!("\n=== Conversion Statistics ===");
    eprintln!("Total records:   {}", stats.total);
    eprintln!("Mapped:          {}", stats.mapped);
    eprintln!("Unmapped:        {}", stats.unmapped);
    eprintln!("Failed:          {}", stats.failed);
    eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.compat_mode {
        CompatModeArg::Strict => eprintln!("Compatibility mode: strict (legacy range ends)"),
        CompatModeArg::Improved => {}
    }

    match cli.command {
        Commands::Single { alignments, queries, output, threads } => {
            run(QueryMode::Single, alignments, queries, output, threads, cli.compat_mode)
        }
        Commands::Range { alignments, queries, output, threads } => {
            run(QueryMode::Range, alignments, queries, output, threads, cli.compat_mode)
        }
    }
}
