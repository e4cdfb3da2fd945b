//! Multi-format alignment file reader and writer.
//!
//! Supports automatic format detection for:
//! - FASTA (.fasta, .fa, .fna, .faa, .fas)
//! - CLUSTAL (.aln, .clustal, .clw)
//!
//! Format detection priority:
//! 1. Explicit format specification (-f option)
//! 2. File extension
//! 3. Content-based detection

pub mod clustal;
pub mod fasta;

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::model::{Alignment, AlignmentError, Alphabet};

/// Detected file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Fasta,
    Clustal,
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Fasta => write!(f, "FASTA"),
            FileFormat::Clustal => write!(f, "CLUSTAL"),
        }
    }
}

/// Errors that can occur while reading or writing alignment files.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to access file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Empty file")]
    EmptyFile,

    #[error("Could not determine file format.\n\
             Hint: Use -f/--format to specify the format explicitly:\n  \
             msastat stats -f fasta <file>    # FASTA format\n  \
             msastat stats -f clustal <file>  # CLUSTAL format")]
    UnknownFormat,

    #[error("FASTA error: {0}")]
    FastaError(#[from] fasta::FastaError),

    #[error("CLUSTAL error: {0}")]
    ClustalError(#[from] clustal::ClustalError),

    #[error("Invalid alignment: {0}")]
    AlignmentError(#[from] AlignmentError),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Detects format from file extension.
pub fn detect_format_from_extension<P: AsRef<Path>>(path: P) -> Option<FileFormat> {
    let ext = path.as_ref().extension().and_then(OsStr::to_str)?;
    match ext.to_lowercase().as_str() {
        "fa" | "fas" | "fasta" | "fna" | "faa" | "ffn" | "frn" => Some(FileFormat::Fasta),
        "aln" | "clustal" | "clw" => Some(FileFormat::Clustal),
        _ => None,
    }
}

/// Detects the file format by examining the first non-empty line.
pub fn detect_format_from_content(content: &str) -> Option<FileFormat> {
    let first = content.lines().map(str::trim).find(|l| !l.is_empty())?;
    if first.starts_with('>') {
        Some(FileFormat::Fasta)
    } else if first.starts_with("CLUSTAL") {
        Some(FileFormat::Clustal)
    } else {
        None
    }
}

/// Parses content with a specific format.
pub fn parse_content(
    content: &str,
    format: FileFormat,
    alphabet: Option<&Alphabet>,
) -> ParseResult<Alignment> {
    match format {
        FileFormat::Fasta => {
            let sequences = fasta::parse_fasta_str(content, alphabet)?;
            Ok(Alignment::new(sequences)?)
        }
        FileFormat::Clustal => Ok(clustal::parse_clustal_str(content, alphabet)?),
    }
}

/// Reads an alignment file with optional format specification.
///
/// Detection priority:
/// 1. Explicit format (if provided)
/// 2. File extension
/// 3. Content-based detection
///
/// FASTA records must all have the same length to form an alignment.
pub fn read_alignment<P: AsRef<Path>>(
    path: P,
    alphabet: Option<&Alphabet>,
    forced_format: Option<FileFormat>,
) -> ParseResult<Alignment> {
    let file = File::open(&path)?;
    let file_size = file.metadata()?.len() as usize;
    if file_size == 0 {
        return Err(ParseError::EmptyFile);
    }

    let mut reader = BufReader::new(file);
    let mut content = String::with_capacity(file_size);
    reader.read_to_string(&mut content)?;

    let format = forced_format
        .or_else(|| detect_format_from_extension(&path))
        .or_else(|| detect_format_from_content(&content))
        .ok_or(ParseError::UnknownFormat)?;
    debug!("Reading {:?} as {}", path.as_ref(), format);
    parse_content(&content, format, alphabet)
}

/// Writes an alignment in the given format.
pub fn write_alignment<P: AsRef<Path>>(
    path: P,
    alignment: &Alignment,
    format: FileFormat,
) -> ParseResult<()> {
    match format {
        FileFormat::Fasta => fasta::write_fasta_file(path, alignment)?,
        FileFormat::Clustal => clustal::write_clustal_file(path, alignment)?,
    }
    Ok(())
}

/// Renders an alignment in the given format, as it would be written to a file.
pub fn format_alignment(alignment: &Alignment, format: FileFormat) -> String {
    match format {
        FileFormat::Fasta => fasta::format_fasta(alignment),
        FileFormat::Clustal => format!(
            "{}\n\n\n{}",
            clustal::CLUSTAL_HEADER,
            clustal::format_clustal(alignment)
        ),
    }
}
