//! msastat - alignment statistics from the command line
//!
//! ## Usage
//!
//! ```bash
//! msastat stats alignment.aln                      # per-column entropy and gaps
//! msastat stats -a dna --reference ref aln.fasta   # positions relative to a reference
//! msastat summary linsi/ muscle/ --keep-going      # one row per alignment file
//! msastat convert alignment.aln -o out.fasta       # CLUSTAL -> FASTA
//! ```
//!
//! ## Supported Formats
//!
//! - FASTA (.fasta, .fa, .fna, .faa, .fas)
//! - CLUSTAL (.aln, .clustal, .clw)

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use msastat::analysis::{summarize_paths, write_summary_table, ErrorPolicy, SummaryConfig};
use msastat::formats::{
    detect_format_from_extension, format_alignment, read_alignment, write_alignment, FileFormat,
};
use msastat::model::{Alignment, Alphabet};

/// File format specification for command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// FASTA format
    Fasta,
    /// CLUSTAL format
    Clustal,
    /// Auto-detect from extension and content
    Auto,
}

impl From<FormatArg> for Option<FileFormat> {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Fasta => Some(FileFormat::Fasta),
            FormatArg::Clustal => Some(FileFormat::Clustal),
            FormatArg::Auto => None,
        }
    }
}

/// Alphabet used for entropy and profiles
#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlphabetArg {
    /// The 20 standard amino acids
    Protein,
    /// A, C, G, T
    Dna,
    /// A, C, G, U
    Rna,
}

impl From<AlphabetArg> for Alphabet {
    fn from(arg: AlphabetArg) -> Self {
        match arg {
            AlphabetArg::Protein => Alphabet::protein(),
            AlphabetArg::Dna => Alphabet::dna(),
            AlphabetArg::Rna => Alphabet::rna(),
        }
    }
}

/// Options shared by the commands that read alignments.
#[derive(Args, Debug)]
struct InputArgs {
    /// Force a specific file format (overrides auto-detection)
    #[arg(short = 'f', long = "format", value_enum, default_value = "auto")]
    format: FormatArg,

    /// Symbol alphabet of the sequences
    #[arg(short = 'a', long = "alphabet", value_enum, default_value = "protein")]
    alphabet: AlphabetArg,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print entropy, gap fraction and the most frequent symbol of every column
    Stats {
        /// Alignment file (FASTA or CLUSTAL)
        file: PathBuf,

        #[command(flatten)]
        input: InputArgs,

        /// Logarithm base for entropy (natural log by default)
        #[arg(short = 'b', long = "base")]
        base: Option<f64>,

        /// Drop columns where this sequence has a gap first
        #[arg(short = 'r', long = "reference")]
        reference: Option<String>,

        /// Pseudo-count added to every symbol of the profile
        #[arg(short = 'p', long = "pseudo", default_value = "0")]
        pseudo: f64,
    },

    /// Summarise alignment files (directories are expanded to their files)
    Summary {
        /// Alignment files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        input: InputArgs,

        /// Logarithm base for entropy (natural log by default)
        #[arg(short = 'b', long = "base")]
        base: Option<f64>,

        /// Drop columns where this sequence has a gap before computing entropies
        #[arg(short = 'r', long = "reference")]
        reference: Option<String>,

        /// 1-based positions (after trimming) whose entropy is reported
        #[arg(short = 'P', long = "positions", value_delimiter = ',')]
        positions: Vec<usize>,

        /// Skip unreadable files instead of stopping at the first one
        #[arg(short = 'k', long = "keep-going")]
        keep_going: bool,
    },

    /// Rewrite an alignment, optionally without gappy columns
    Convert {
        /// Alignment file (FASTA or CLUSTAL)
        file: PathBuf,

        #[command(flatten)]
        input: InputArgs,

        /// Output file. Use "-" for stdout.
        #[arg(short = 'o', long = "output")]
        output: String,

        /// Output format (defaults to the output extension, then FASTA)
        #[arg(short = 't', long = "to", value_enum)]
        to: Option<FormatArg>,

        /// Drop every column containing a gap
        #[arg(short = 'u', long = "ungapped", conflicts_with = "reference")]
        ungapped: bool,

        /// Drop the columns where this sequence has a gap
        #[arg(short = 'r', long = "reference")]
        reference: Option<String>,
    },
}

/// msastat - statistics for multiple sequence alignments
///
/// Reads FASTA and CLUSTAL alignments and reports per-column entropy,
/// gap fraction and summaries across many alignment files.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace)
    #[arg(short = 'l', long = "log-level", default_value = "warn", global = true)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

fn load(file: &Path, input: &InputArgs) -> Result<Alignment> {
    let alphabet: Alphabet = input.alphabet.into();
    let alignment = read_alignment(file, Some(&alphabet), input.format.into())?;
    info!(
        "Loaded {} sequences of length {} from {:?}",
        alignment.sequence_count(),
        alignment.alignment_length(),
        file
    );
    Ok(alignment)
}

/// Prints one row per column.
fn run_stats(
    file: &Path,
    input: &InputArgs,
    base: Option<f64>,
    reference: Option<&str>,
    pseudo: f64,
) -> Result<()> {
    let mut alignment = load(file, input)?;
    if let Some(reference) = reference {
        alignment = alignment.ungapped_using_reference(reference)?;
        info!("{} columns left after trimming on {}", alignment.alignment_length(), reference);
    }

    let profile = alignment.profile(pseudo)?;
    let symbols = profile.alphabet().symbols();

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "Position\tEntropy\tGapFraction\tTopSymbol\tTopProb")?;
    for position in 0..alignment.alignment_length() {
        let entropy = alignment.shannon_entropy(position, base)?;
        let gaps = alignment.gap_fraction(position)?;
        let probs = profile.probabilities(position)?;
        // First symbol in alphabet order wins ties.
        let (top, prob) = probs
            .iter()
            .enumerate()
            .fold((None, 0.0), |best, (i, &p)| if p > best.1 { (Some(i), p) } else { best });
        let top = top.map_or('-', |i| symbols[i] as char);
        writeln!(
            handle,
            "{}\t{:.4}\t{:.4}\t{}\t{:.4}",
            position + 1,
            entropy,
            gaps,
            top,
            prob
        )?;
    }
    Ok(())
}

fn run_convert(
    file: &Path,
    input: &InputArgs,
    output: &str,
    to: Option<FormatArg>,
    ungapped: bool,
    reference: Option<&str>,
) -> Result<()> {
    let mut alignment = load(file, input)?;
    if ungapped {
        alignment = alignment.ungapped();
    } else if let Some(reference) = reference {
        alignment = alignment.ungapped_using_reference(reference)?;
    }

    let format = to
        .and_then(Option::<FileFormat>::from)
        .or_else(|| detect_format_from_extension(output))
        .unwrap_or(FileFormat::Fasta);

    if output == "-" {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(format_alignment(&alignment, format).as_bytes())?;
    } else {
        write_alignment(output, &alignment, format)?;
        eprintln!(
            "Wrote {} sequences of length {} to {} ({})",
            alignment.sequence_count(),
            alignment.alignment_length(),
            output,
            format
        );
    }
    Ok(())
}

fn check_base(base: Option<f64>) -> Result<()> {
    if let Some(base) = base {
        if !base.is_finite() || base <= 0.0 || base == 1.0 {
            anyhow::bail!("Logarithm base must be positive and different from 1 (got {})", base);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    TermLogger::init(
        cli.log_level,
        Default::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    match cli.command {
        Command::Stats {
            file,
            input,
            base,
            reference,
            pseudo,
        } => {
            if pseudo < 0.0 || !pseudo.is_finite() {
                anyhow::bail!("Pseudo-count must be a non-negative number (got {})", pseudo);
            }
            check_base(base)?;
            run_stats(&file, &input, base, reference.as_deref(), pseudo)?;
        }
        Command::Summary {
            paths,
            input,
            base,
            reference,
            positions,
            keep_going,
        } => {
            check_base(base)?;
            let config = SummaryConfig {
                reference,
                positions,
                entropy_base: base,
                error_policy: if keep_going {
                    ErrorPolicy::CollectErrors
                } else {
                    ErrorPolicy::FailFast
                },
            };
            let alphabet: Alphabet = input.alphabet.into();
            let report = summarize_paths(&paths, &alphabet, input.format.into(), &config)?;
            write_summary_table(io::stdout().lock(), &report.summaries, &config.positions)?;
            if !report.failures.is_empty() {
                eprintln!("Skipped {} file(s):", report.failures.len());
                for failure in &report.failures {
                    eprintln!("  {}", failure);
                }
            }
        }
        Command::Convert {
            file,
            input,
            output,
            to,
            ungapped,
            reference,
        } => run_convert(&file, &input, &output, to, ungapped, reference.as_deref())?,
    }

    Ok(())
}
