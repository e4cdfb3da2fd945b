//! FASTA reader and writer.
//!
//! This module handles reading and writing FASTA format files.
//! It supports both single-line and multi-line sequences.
//!
//! ## FASTA Format
//!
//! ```text
//! >sequence_identifier optional description
//! ACGTACGTACGT...
//! >another_sequence
//! TGCATGCATGCA...
//! ```
//!
//! The identifier becomes the sequence name and the description its
//! annotation. Records are written back wrapped at 60 symbols per line.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::model::{AlignmentError, Alphabet, Sequence};

/// Errors that can occur during FASTA parsing.
#[derive(Error, Debug)]
pub enum FastaError {
    #[error("Failed to access file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Empty FASTA file")]
    EmptyFile,

    #[error("Invalid FASTA format: {0}")]
    InvalidFormat(String),

    #[error("Sequence without header at line {0}")]
    SequenceWithoutHeader(usize),

    #[error("Invalid sequence: {0}")]
    Sequence(#[from] AlignmentError),
}

/// Result type for FASTA operations.
pub type FastaResult<T> = Result<T, FastaError>;

/// Reads a FASTA file and returns its records in file order.
///
/// # Arguments
///
/// * `path` - Path to the FASTA file
/// * `alphabet` - Alphabet attached to every sequence
///
/// # Examples
///
/// ```no_run
/// use msastat::formats::fasta::read_fasta_file;
/// use msastat::model::Alphabet;
///
/// let sequences = read_fasta_file("sequences.fasta", Some(&Alphabet::protein())).unwrap();
/// println!("Loaded {} sequences", sequences.len());
/// ```
pub fn read_fasta_file<P: AsRef<Path>>(
    path: P,
    alphabet: Option<&Alphabet>,
) -> FastaResult<Vec<Sequence>> {
    debug!("Reading FASTA file {:?}", path.as_ref());
    let file = File::open(&path)?;
    parse_fasta(BufReader::new(file), alphabet)
}

/// Parses FASTA content from a string.
pub fn parse_fasta_str(content: &str, alphabet: Option<&Alphabet>) -> FastaResult<Vec<Sequence>> {
    parse_fasta(content.as_bytes(), alphabet)
}

/// Parses FASTA content from a reader.
///
/// A header without data lines yields an empty sequence.
pub fn parse_fasta<R: BufRead>(reader: R, alphabet: Option<&Alphabet>) -> FastaResult<Vec<Sequence>> {
    let mut sequences = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut current_seq = String::new();
    let mut line_number = 0;

    let finish = |(name, annotation): (String, String),
                  data: String,
                  sequences: &mut Vec<Sequence>|
     -> FastaResult<()> {
        sequences.push(
            Sequence::new(name, data)?
                .with_alphabet(alphabet.cloned())
                .with_annotation(annotation),
        );
        Ok(())
    };

    for line_result in reader.lines() {
        line_number += 1;
        let line = line_result?;
        let line = line.trim();

        // Skip empty lines
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            if let Some(record) = current.take() {
                finish(record, std::mem::take(&mut current_seq), &mut sequences)?;
            }

            let header = header.trim_start();
            let (id, annotation) = match header.split_once(char::is_whitespace) {
                Some((id, rest)) => (id, rest.trim()),
                None => (header, ""),
            };
            if id.is_empty() {
                return Err(FastaError::InvalidFormat(format!(
                    "Empty sequence identifier at line {}",
                    line_number
                )));
            }
            current = Some((id.to_string(), annotation.to_string()));
        } else {
            if current.is_none() {
                return Err(FastaError::SequenceWithoutHeader(line_number));
            }
            if !line.is_ascii() {
                return Err(FastaError::InvalidFormat(format!(
                    "Non-ASCII sequence data at line {}",
                    line_number
                )));
            }
            current_seq.extend(line.chars().filter(|c| !c.is_ascii_whitespace()));
        }
    }

    // Don't forget the last sequence
    if let Some(record) = current {
        finish(record, current_seq, &mut sequences)?;
    }

    if sequences.is_empty() {
        return Err(FastaError::EmptyFile);
    }
    debug!("Parsed {} FASTA records", sequences.len());
    Ok(sequences)
}

/// Renders sequences as FASTA text, in order.
pub fn format_fasta<'a, I>(sequences: I) -> String
where
    I: IntoIterator<Item = &'a Sequence>,
{
    sequences.into_iter().map(Sequence::to_fasta).collect()
}

/// Writes sequences to a FASTA file, in order.
pub fn write_fasta_file<'a, P, I>(path: P, sequences: I) -> FastaResult<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a Sequence>,
{
    debug!("Writing FASTA file {:?}", path.as_ref());
    let mut writer = BufWriter::new(File::create(&path)?);
    for seq in sequences {
        writer.write_all(seq.to_fasta().as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}
