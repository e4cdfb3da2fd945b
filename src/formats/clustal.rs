//! CLUSTAL reader and writer.
//!
//! ## CLUSTAL Format
//!
//! ```text
//! CLUSTAL O(1.2.0) multiple sequence alignment
//!
//!
//! seq1      ACGTACGTAC
//! seq2      TGCA--GTAC
//!           *    * ***
//!
//! seq1      GGGG
//! seq2      GG-G
//! ```
//!
//! Blocks are interleaved: each row carries a name and a chunk of symbols,
//! and chunks are concatenated per name across blocks.
//!
//! ## Relaxed Parsing
//!
//! The reader ignores:
//! - header lines (`CLUSTAL ...`) and `#` comments
//! - blank lines
//! - conservation lines (indented, or containing `*` or `:`)
//! - a trailing residue counter (`seq1  ACGT  40`)

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::model::{Alignment, AlignmentError, Alphabet, Sequence, SYMBOLS_PER_LINE};

/// Header line written before the blocks, so tools that sniff it accept the file.
pub const CLUSTAL_HEADER: &str = "CLUSTAL O(1.2.0) multiple sequence alignment";

/// Errors that can occur during CLUSTAL parsing.
#[derive(Error, Debug)]
pub enum ClustalError {
    #[error("Failed to access file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Empty CLUSTAL file")]
    EmptyFile,

    #[error("No sequence data found")]
    NoSequenceData,

    #[error("Line {line}: expected a name followed by symbols, got '{content}'")]
    MalformedLine { line: usize, content: String },

    #[error("Sequence '{name}' has length {found}, expected {expected}")]
    SequenceLengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid alignment: {0}")]
    Alignment(#[from] AlignmentError),
}

/// Result type for CLUSTAL operations.
pub type ClustalResult<T> = Result<T, ClustalError>;

/// Reads a CLUSTAL alignment file.
pub fn read_clustal_file<P: AsRef<Path>>(
    path: P,
    alphabet: Option<&Alphabet>,
) -> ClustalResult<Alignment> {
    debug!("Reading CLUSTAL file {:?}", path.as_ref());
    let mut content = String::new();
    File::open(&path)?.read_to_string(&mut content)?;
    parse_clustal_str(&content, alphabet)
}

/// Returns true for lines that carry no sequence data.
fn is_skipped_line(line: &str) -> bool {
    line.starts_with("CLUSTAL")
        || line.starts_with('#')
        || line.trim().is_empty()
        || line.starts_with(char::is_whitespace)
        || line.contains('*')
        || line.contains(':')
}

/// Parses CLUSTAL content from a string.
///
/// Sequences come out in the order their names first appear.
pub fn parse_clustal_str(content: &str, alphabet: Option<&Alphabet>) -> ClustalResult<Alignment> {
    if content.trim().is_empty() {
        return Err(ClustalError::EmptyFile);
    }

    let mut rows: Vec<(String, String)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, line) in content.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if is_skipped_line(line) {
            continue;
        }

        let mut tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() > 2 && tokens.last().is_some_and(|t| t.bytes().all(|b| b.is_ascii_digit())) {
            tokens.pop();
        }
        let (name, chunks) = match tokens.split_first() {
            Some((name, chunks)) if !chunks.is_empty() => (*name, chunks),
            _ => {
                return Err(ClustalError::MalformedLine {
                    line: i + 1,
                    content: line.to_string(),
                })
            }
        };
        if chunks.iter().any(|c| !c.is_ascii()) {
            return Err(ClustalError::MalformedLine {
                line: i + 1,
                content: line.to_string(),
            });
        }

        let row = match index.get(name) {
            Some(&row) => row,
            None => {
                index.insert(name.to_string(), rows.len());
                rows.push((name.to_string(), String::new()));
                rows.len() - 1
            }
        };
        for chunk in chunks {
            rows[row].1.push_str(chunk);
        }
    }

    let expected = match rows.first() {
        Some((_, data)) => data.len(),
        None => return Err(ClustalError::NoSequenceData),
    };
    if let Some((name, data)) = rows.iter().find(|(_, data)| data.len() != expected) {
        return Err(ClustalError::SequenceLengthMismatch {
            name: name.clone(),
            expected,
            found: data.len(),
        });
    }

    debug!("Parsed {} CLUSTAL rows of length {}", rows.len(), expected);
    let sequences = rows
        .into_iter()
        .map(|(name, data)| Ok(Sequence::new(name, data)?.with_alphabet(alphabet.cloned())))
        .collect::<ClustalResult<Vec<_>>>()?;
    Ok(Alignment::new(sequences)?)
}

/// Renders the alignment blocks, without the CLUSTAL header.
///
/// Each block holds [`SYMBOLS_PER_LINE`] columns and each row is the name
/// left-aligned to the longest name, one space, then the symbols. Full
/// blocks are followed by a blank line; a final partial block is not.
pub fn format_clustal(alignment: &Alignment) -> String {
    let name_width = alignment.max_name_length();
    let length = alignment.alignment_length();
    let whole_blocks = length / SYMBOLS_PER_LINE;
    let mut out = String::new();

    let push_block = |out: &mut String, start: usize, end: usize| {
        for seq in alignment {
            if name_width > 0 {
                out.push_str(&format!("{:<width$} ", seq.name(), width = name_width));
            }
            out.push_str(&seq.as_str()[start..end]);
            out.push('\n');
        }
    };

    for block in 0..whole_blocks {
        let start = block * SYMBOLS_PER_LINE;
        push_block(&mut out, start, start + SYMBOLS_PER_LINE);
        out.push('\n');
    }
    if length > whole_blocks * SYMBOLS_PER_LINE {
        push_block(&mut out, whole_blocks * SYMBOLS_PER_LINE, length);
    }
    out
}

/// Writes the alignment as a CLUSTAL file (header, two blank lines, blocks).
pub fn write_clustal_file<P: AsRef<Path>>(path: P, alignment: &Alignment) -> ClustalResult<()> {
    debug!("Writing CLUSTAL file {:?}", path.as_ref());
    let mut writer = BufWriter::new(File::create(&path)?);
    write!(writer, "{}\n\n\n", CLUSTAL_HEADER)?;
    writer.write_all(format_clustal(alignment).as_bytes())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interleaved_blocks() {
        let content = "CLUSTAL W (1.83) multiple sequence alignment

seq1      ACGTACGTAC
seq2      TGCA--GTAC
          *    * ***

seq1      GGGG
seq2      GG-G
          ** *
";
        let alignment = parse_clustal_str(content, Some(&Alphabet::dna())).unwrap();
        assert_eq!(alignment.sequence_count(), 2);
        assert_eq!(alignment.alignment_length(), 14);
        assert_eq!(alignment.get(0).unwrap().name(), "seq1");
        assert_eq!(alignment.get(0).unwrap().as_str(), "ACGTACGTACGGGG");
        assert_eq!(alignment.get(1).unwrap().as_str(), "TGCA--GTACGG-G");
        assert_eq!(alignment.alphabet(), Some(&Alphabet::dna()));
    }

    #[test]
    fn test_first_seen_order() {
        let content = "zeta AC\nalpha GT\nmid --\n\nzeta GG\nalpha TT\nmid AA\n";
        let alignment = parse_clustal_str(content, None).unwrap();
        let names: Vec<&str> = alignment.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(alignment.get_sequence("mid").unwrap().as_str(), "--AA");
    }

    #[test]
    fn test_chunks_and_counters() {
        let content = "# comment\nseq1 ACGTA CGTAC 10\nseq2 TTTTT TTTTT 10\n";
        let alignment = parse_clustal_str(content, None).unwrap();
        assert_eq!(alignment.get(0).unwrap().as_str(), "ACGTACGTAC");
        assert_eq!(alignment.alignment_length(), 10);
    }

    #[test]
    fn test_length_mismatch() {
        let content = "seq1 ACGT\nseq2 ACG\n";
        let result = parse_clustal_str(content, None);
        assert!(matches!(
            result,
            Err(ClustalError::SequenceLengthMismatch { ref name, expected: 4, found: 3 }) if name == "seq2"
        ));
    }

    #[test]
    fn test_malformed_line() {
        let result = parse_clustal_str("seq1 ACGT\nlonely\n", None);
        assert!(matches!(result, Err(ClustalError::MalformedLine { line: 2, .. })));
    }

    #[test]
    fn test_empty_and_header_only() {
        assert!(matches!(parse_clustal_str("", None), Err(ClustalError::EmptyFile)));
        assert!(matches!(
            parse_clustal_str("CLUSTAL O(1.2.0) multiple sequence alignment\n\n\n", None),
            Err(ClustalError::NoSequenceData)
        ));
    }

    #[test]
    fn test_format_partial_block_only() {
        let alignment = Alignment::new(vec![
            Sequence::new("a", "AC-G").unwrap(),
            Sequence::new("long", "ACCG").unwrap(),
        ])
        .unwrap();
        assert_eq!(format_clustal(&alignment), "a    AC-G\nlong ACCG\n");
    }

    #[test]
    fn test_format_blocks() {
        let row = format!("{}{}", "A".repeat(60), "C".repeat(5));
        let alignment = Alignment::new(vec![Sequence::new("x", row.clone()).unwrap(), Sequence::new("yy", row).unwrap()])
            .unwrap();
        let expected = format!(
            "x  {a}\nyy {a}\n\nx  CCCCC\nyy CCCCC\n",
            a = "A".repeat(60)
        );
        assert_eq!(format_clustal(&alignment), expected);
    }

    #[test]
    fn test_format_pads_names_by_characters() {
        let alignment = Alignment::new(vec![
            Sequence::new("é", "AC").unwrap(),
            Sequence::new("ab", "GT").unwrap(),
        ])
        .unwrap();
        assert_eq!(format_clustal(&alignment), "é  AC\nab GT\n");
    }

    #[test]
    fn test_non_ascii_symbols_rejected() {
        let result = parse_clustal_str("seq1 ACé\nseq2 ACG\n", None);
        assert!(matches!(result, Err(ClustalError::MalformedLine { line: 1, .. })));
        let row = format!("{}é{}", "A".repeat(59), "C".repeat(10));
        assert!(Sequence::new("x", row).is_err());
    }

    #[test]
    fn test_format_exact_block_ends_with_blank_line() {
        let alignment = Alignment::new(vec![Sequence::new("x", "G".repeat(60)).unwrap()]).unwrap();
        assert_eq!(format_clustal(&alignment), format!("x {}\n\n", "G".repeat(60)));
    }
}
