//! Batch summaries of alignment files.
//!
//! Each alignment is reduced to one row: number of sequences, number of
//! columns, mean column entropy, entropy at selected positions and the ratio
//! of sequences to columns. When a reference sequence is configured the
//! statistics are computed on the reference-trimmed alignment, so positions
//! are counted on the reference.
//!
//! Unreadable files abort the batch unless [`ErrorPolicy::CollectErrors`] is
//! chosen, in which case each failure is recorded next to the summaries.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

use crate::formats::{read_alignment, FileFormat, ParseError};
use crate::model::{Alignment, AlignmentError, Alphabet};

/// Errors raised while summarising alignments.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to list {path:?}: {source}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("{0}")]
    Alignment(#[from] AlignmentError),

    #[error("Positions are 1-based, got 0")]
    ZeroPosition,
}

/// Result type for batch analysis.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// What to do when one file of a batch cannot be summarised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop at the first failure and return it.
    #[default]
    FailFast,
    /// Record the failure and continue with the next file.
    CollectErrors,
}

/// Settings shared by every alignment of a batch.
#[derive(Debug, Clone, Default)]
pub struct SummaryConfig {
    /// Trim columns where this sequence has a gap before computing entropies.
    pub reference: Option<String>,
    /// 1-based positions whose entropy is reported individually.
    pub positions: Vec<usize>,
    /// Logarithm base for entropies (natural log when `None`).
    pub entropy_base: Option<f64>,
    pub error_policy: ErrorPolicy,
}

/// One summarised alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentSummary {
    pub source: String,
    pub sequence_count: usize,
    /// Columns of the untrimmed alignment.
    pub alignment_length: usize,
    /// Columns after reference trimming (equal to `alignment_length` without reference).
    pub analysed_length: usize,
    /// Mean entropy over the analysed columns, `None` without columns.
    pub mean_entropy: Option<f64>,
    /// Entropy at each configured position.
    pub position_entropies: Vec<f64>,
    /// Sequences per analysed column, `None` without columns.
    pub length_ratio: Option<f64>,
}

impl AlignmentSummary {
    /// Mean of the position entropies, `None` without positions.
    pub fn mean_position_entropy(&self) -> Option<f64> {
        mean(&self.position_entropies)
    }
}

/// Summaries of a batch plus the files that were skipped.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub summaries: Vec<AlignmentSummary>,
    pub failures: Vec<AnalysisError>,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Summarises one alignment.
pub fn summarize_alignment(
    source: impl Into<String>,
    alignment: &Alignment,
    config: &SummaryConfig,
) -> AnalysisResult<AlignmentSummary> {
    let trimmed;
    let analysed = match &config.reference {
        Some(reference) => {
            trimmed = alignment.ungapped_using_reference(reference)?;
            &trimmed
        }
        None => alignment,
    };

    let entropies = analysed.column_entropies(config.entropy_base)?;
    let position_entropies = config
        .positions
        .iter()
        .map(|&p| {
            let index = p.checked_sub(1).ok_or(AnalysisError::ZeroPosition)?;
            entropies.get(index).copied().ok_or(AnalysisError::Alignment(
                AlignmentError::IndexOutOfBounds {
                    index,
                    len: entropies.len(),
                },
            ))
        })
        .collect::<AnalysisResult<Vec<f64>>>()?;

    let analysed_length = analysed.alignment_length();
    Ok(AlignmentSummary {
        source: source.into(),
        sequence_count: alignment.sequence_count(),
        alignment_length: alignment.alignment_length(),
        analysed_length,
        mean_entropy: mean(&entropies),
        position_entropies,
        length_ratio: (analysed_length > 0)
            .then(|| alignment.sequence_count() as f64 / analysed_length as f64),
    })
}

/// Reads and summarises one alignment file.
pub fn summarize_file(
    path: &Path,
    alphabet: &Alphabet,
    format: Option<FileFormat>,
    config: &SummaryConfig,
) -> AnalysisResult<AlignmentSummary> {
    let alignment =
        read_alignment(path, Some(alphabet), format).map_err(|source| AnalysisError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    summarize_alignment(path.display().to_string(), &alignment, config)
}

/// Expands directories into their visible files, sorted by name.
///
/// Plain files are kept as given, in order.
pub fn collect_inputs(paths: &[PathBuf]) -> AnalysisResult<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        if !path.is_dir() {
            inputs.push(path.clone());
            continue;
        }
        let listing_error = |source| AnalysisError::ListDirectory {
            path: path.clone(),
            source,
        };
        let mut files = Vec::new();
        for entry in fs::read_dir(path).map_err(listing_error)? {
            let entry = entry.map_err(listing_error)?;
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !hidden && entry.path().is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        debug!("{} alignment files in {:?}", files.len(), path);
        inputs.extend(files);
    }
    Ok(inputs)
}

/// Summarises every input (directories expanded) according to `config.error_policy`.
pub fn summarize_paths(
    paths: &[PathBuf],
    alphabet: &Alphabet,
    format: Option<FileFormat>,
    config: &SummaryConfig,
) -> AnalysisResult<BatchReport> {
    let mut report = BatchReport::default();
    for path in collect_inputs(paths)? {
        match summarize_file(&path, alphabet, format, config) {
            Ok(summary) => report.summaries.push(summary),
            Err(error) if config.error_policy == ErrorPolicy::CollectErrors => {
                warn!("Skipping {:?}: {}", path, error);
                report.failures.push(error);
            }
            Err(error) => return Err(error),
        }
    }
    Ok(report)
}

/// Writes the summaries as a tab-separated table with a header row.
pub fn write_summary_table<W: Write>(
    mut out: W,
    summaries: &[AlignmentSummary],
    positions: &[usize],
) -> io::Result<()> {
    let mut header = vec!["Source".to_string(), "Seqs".into(), "Length".into(), "MeanEnt".into()];
    if !positions.is_empty() {
        header.push("MeanPosEnt".into());
        header.extend(positions.iter().map(|p| format!("P{}_Ent", p)));
    }
    header.push("Lratio".into());
    writeln!(out, "{}", header.join("\t"))?;

    let fmt = |value: Option<f64>| value.map_or_else(|| "NA".to_string(), |v| format!("{:.3}", v));
    for summary in summaries {
        let mut row = vec![
            summary.source.clone(),
            summary.sequence_count.to_string(),
            summary.alignment_length.to_string(),
            fmt(summary.mean_entropy),
        ];
        if !positions.is_empty() {
            row.push(fmt(summary.mean_position_entropy()));
            row.extend(summary.position_entropies.iter().map(|&e| fmt(Some(e))));
        }
        row.push(fmt(summary.length_ratio));
        writeln!(out, "{}", row.join("\t"))?;
    }
    Ok(())
}
