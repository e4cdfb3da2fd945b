//! Data model for multiple sequence alignments.
//!
//! This module contains the data structures for representing:
//! - Alphabets (ordered sets of valid symbols)
//! - Sequences (named, immutable symbol strings)
//! - Alignments (rectangular, column-addressable collections of sequences)
//!
//! Symbols are single ASCII bytes. Column statistics live in [`crate::stats`].

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use thiserror::Error;

/// The gap symbol used by alignment tools.
pub const GAP: u8 = b'-';

/// Number of symbols per line when writing FASTA and per block when writing CLUSTAL.
pub const SYMBOLS_PER_LINE: usize = 60;

/// Errors raised by the alignment model and the statistics engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignmentError {
    #[error("Sequence '{0}' was not found in the alignment")]
    NotFound(String),

    #[error("Index {index} is out of bounds (length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Range {start}..{end} is out of bounds (length {len})")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    #[error("An alignment needs at least one sequence")]
    EmptyAlignment,

    #[error("Sequence '{name}' has length {found}, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate sequence name: '{0}'")]
    DuplicateName(String),

    #[error("Duplicate symbol '{0}' in alphabet")]
    DuplicateSymbol(char),

    #[error("Symbol '{0}' is not a single ASCII byte")]
    NonAsciiSymbol(char),

    #[error("The alignment has no alphabet")]
    MissingAlphabet,

    #[error("Invalid logarithm base {0} (must be finite, positive and not 1)")]
    InvalidBase(f64),

    #[error("Invalid pseudo-count {0} (must be finite and non-negative)")]
    InvalidPseudoCount(f64),
}

/// Result type for model operations.
pub type AlignmentResult<T> = Result<T, AlignmentError>;

fn check_ascii(symbols: &str) -> AlignmentResult<()> {
    match symbols.chars().find(|c| !c.is_ascii()) {
        Some(c) => Err(AlignmentError::NonAsciiSymbol(c)),
        None => Ok(()),
    }
}

/// An ordered set of distinct symbols.
///
/// The order only fixes iteration order (e.g. the columns of a [`crate::stats::Profile`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<u8>,
}

impl Alphabet {
    /// Creates an alphabet from the bytes of `symbols`, rejecting repeats.
    pub fn new(symbols: &str) -> AlignmentResult<Self> {
        check_ascii(symbols)?;
        let mut seen = [false; 256];
        for &sym in symbols.as_bytes() {
            if seen[sym as usize] {
                return Err(AlignmentError::DuplicateSymbol(sym as char));
            }
            seen[sym as usize] = true;
        }
        Ok(Self {
            symbols: symbols.as_bytes().to_vec(),
        })
    }

    /// The 20 standard amino acids.
    pub fn protein() -> Self {
        Self {
            symbols: b"ACDEFGHIKLMNPQRSTVWY".to_vec(),
        }
    }

    /// The four DNA nucleotides.
    pub fn dna() -> Self {
        Self {
            symbols: b"ACGT".to_vec(),
        }
    }

    /// The four RNA nucleotides.
    pub fn rna() -> Self {
        Self {
            symbols: b"ACGU".to_vec(),
        }
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true if the alphabet has no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The symbols in alphabet order.
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// Returns true if `symbol` belongs to the alphabet.
    pub fn contains(&self, symbol: u8) -> bool {
        self.symbols.contains(&symbol)
    }

    /// Position of `symbol` in alphabet order.
    pub fn index_of(&self, symbol: u8) -> Option<usize> {
        self.symbols.iter().position(|&s| s == symbol)
    }

    /// Iterates over the symbols in alphabet order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.symbols.iter().copied()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.symbols))
    }
}

/// A named symbol string.
///
/// Sequences are immutable once built. Equality compares symbols only;
/// name, alphabet and annotation are ignored.
#[derive(Debug, Clone)]
pub struct Sequence {
    name: String,
    data: String,
    alphabet: Option<Alphabet>,
    annotation: String,
}

impl Sequence {
    /// Creates a new sequence without alphabet or annotation.
    ///
    /// Every symbol must be a single ASCII byte, so that positions, lengths
    /// and columns all count bytes. Names may hold any text.
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> AlignmentResult<Self> {
        let data = data.into();
        check_ascii(&data)?;
        Ok(Self {
            name: name.into(),
            data,
            alphabet: None,
            annotation: String::new(),
        })
    }

    /// Sets the alphabet.
    pub fn with_alphabet(mut self, alphabet: Option<Alphabet>) -> Self {
        self.alphabet = alphabet;
        self
    }

    /// Sets the free-text annotation written after the name in FASTA headers.
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = annotation.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    pub fn alphabet(&self) -> Option<&Alphabet> {
        self.alphabet.as_ref()
    }

    /// The symbols as a string slice.
    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// The symbols as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Returns the length of the sequence.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if `pattern` occurs in the symbols.
    pub fn contains(&self, pattern: &str) -> bool {
        self.data.contains(pattern)
    }

    /// First index of `pattern`, or `None` if it does not occur.
    pub fn find(&self, pattern: &str) -> Option<usize> {
        self.data.find(pattern)
    }

    /// Gets the symbol at a specific position.
    pub fn symbol_at(&self, pos: usize) -> AlignmentResult<u8> {
        self.as_bytes()
            .get(pos)
            .copied()
            .ok_or(AlignmentError::IndexOutOfBounds {
                index: pos,
                len: self.len(),
            })
    }

    /// Gets a slice of the sequence data.
    pub fn slice(&self, range: Range<usize>) -> AlignmentResult<&str> {
        self.data
            .get(range.clone())
            .ok_or(AlignmentError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len: self.len(),
            })
    }

    /// Renders the sequence as a FASTA record.
    ///
    /// The header is always `>name annotation` (the space is written even
    /// when the annotation is empty) and the data is wrapped at
    /// [`SYMBOLS_PER_LINE`] symbols.
    pub fn to_fasta(&self) -> String {
        let mut fasta = String::with_capacity(
            self.name.len() + self.annotation.len() + self.len() + self.len() / SYMBOLS_PER_LINE + 4,
        );
        fasta.push('>');
        fasta.push_str(&self.name);
        fasta.push(' ');
        fasta.push_str(&self.annotation);
        fasta.push('\n');
        for start in (0..self.len()).step_by(SYMBOLS_PER_LINE) {
            let end = (start + SYMBOLS_PER_LINE).min(self.len());
            fasta.push_str(&self.data[start..end]);
            fasta.push('\n');
        }
        fasta
    }

    /// Builds a new sequence keeping only the columns for which `keep` is true.
    pub(crate) fn filter_columns(&self, keep: &[bool]) -> Self {
        let data: String = self
            .as_bytes()
            .iter()
            .zip(keep)
            .filter(|&(_, &k)| k)
            .map(|(&b, _)| b as char)
            .collect();
        Self {
            name: self.name.clone(),
            data,
            alphabet: self.alphabet.clone(),
            annotation: self.annotation.clone(),
        }
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Sequence {}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.data)
    }
}

/// Represents an alignment of multiple sequences.
///
/// All sequences share one length and names are unique; both are checked
/// whenever a sequence enters the alignment.
#[derive(Debug, Clone)]
pub struct Alignment {
    sequences: Vec<Sequence>,
    by_name: HashMap<String, usize>,
    alignment_length: usize,
}

impl Alignment {
    /// Creates a new alignment from a non-empty vector of equal-length sequences.
    pub fn new(sequences: Vec<Sequence>) -> AlignmentResult<Self> {
        let first = sequences.first().ok_or(AlignmentError::EmptyAlignment)?;
        let mut alignment = Self {
            alignment_length: first.len(),
            by_name: HashMap::with_capacity(sequences.len()),
            sequences: Vec::with_capacity(sequences.len()),
        };
        for seq in sequences {
            alignment.add_sequence(seq)?;
        }
        Ok(alignment)
    }

    /// Appends a sequence, keeping the length and name invariants.
    pub fn add_sequence(&mut self, sequence: Sequence) -> AlignmentResult<()> {
        if sequence.len() != self.alignment_length {
            return Err(AlignmentError::LengthMismatch {
                name: sequence.name.clone(),
                expected: self.alignment_length,
                found: sequence.len(),
            });
        }
        if self.by_name.contains_key(&sequence.name) {
            return Err(AlignmentError::DuplicateName(sequence.name.clone()));
        }
        self.by_name
            .insert(sequence.name.clone(), self.sequences.len());
        self.sequences.push(sequence);
        Ok(())
    }

    /// Returns the number of sequences.
    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// Returns the number of columns.
    pub fn alignment_length(&self) -> usize {
        self.alignment_length
    }

    /// The alphabet of the first sequence.
    pub fn alphabet(&self) -> Option<&Alphabet> {
        self.sequences.first().and_then(Sequence::alphabet)
    }

    /// Returns the maximum name width in characters (for CLUSTAL padding).
    pub fn max_name_length(&self) -> usize {
        self.sequences
            .iter()
            .map(|s| s.name.chars().count())
            .max()
            .unwrap_or(0)
    }

    /// Gets a sequence by row index.
    pub fn get(&self, index: usize) -> Option<&Sequence> {
        self.sequences.get(index)
    }

    /// All sequences in insertion order.
    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sequence> {
        self.sequences.iter()
    }

    /// Returns true if a row has the same symbols as `sequence`.
    pub fn contains(&self, sequence: &Sequence) -> bool {
        self.sequences.iter().any(|s| s == sequence)
    }

    /// Looks a sequence up by name.
    pub fn get_sequence(&self, name: &str) -> AlignmentResult<&Sequence> {
        self.by_name
            .get(name)
            .map(|&i| &self.sequences[i])
            .ok_or_else(|| AlignmentError::NotFound(name.to_string()))
    }

    fn check_position(&self, position: usize) -> AlignmentResult<()> {
        if position < self.alignment_length {
            Ok(())
        } else {
            Err(AlignmentError::IndexOutOfBounds {
                index: position,
                len: self.alignment_length,
            })
        }
    }

    /// The symbols of every sequence at `position`, in row order.
    pub fn column(&self, position: usize) -> AlignmentResult<Vec<u8>> {
        self.check_position(position)?;
        Ok(self
            .sequences
            .iter()
            .map(|s| s.as_bytes()[position])
            .collect())
    }

    /// New alignment without the columns that hold a gap in any sequence.
    pub fn ungapped(&self) -> Self {
        let mut keep = vec![true; self.alignment_length];
        for seq in &self.sequences {
            for (k, &b) in keep.iter_mut().zip(seq.as_bytes()) {
                if b == GAP {
                    *k = false;
                }
            }
        }
        self.retain_columns(&keep)
    }

    /// New alignment without the columns where the sequence `reference` has a gap.
    ///
    /// Symbols of other sequences in those columns are dropped too.
    pub fn ungapped_using_reference(&self, reference: &str) -> AlignmentResult<Self> {
        let keep: Vec<bool> = self
            .get_sequence(reference)?
            .as_bytes()
            .iter()
            .map(|&b| b != GAP)
            .collect();
        Ok(self.retain_columns(&keep))
    }

    fn retain_columns(&self, keep: &[bool]) -> Self {
        let sequences: Vec<Sequence> = self
            .sequences
            .iter()
            .map(|s| s.filter_columns(keep))
            .collect();
        log::debug!(
            "Kept {} of {} columns",
            keep.iter().filter(|&&k| k).count(),
            self.alignment_length
        );
        Self {
            alignment_length: sequences.first().map_or(0, Sequence::len),
            by_name: self.by_name.clone(),
            sequences,
        }
    }
}

impl<'a> IntoIterator for &'a Alignment {
    type Item = &'a Sequence;
    type IntoIter = std::slice::Iter<'a, Sequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.iter()
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seq in &self.sequences {
            writeln!(f, "{}\t{}", seq.name, seq.data)?;
        }
        Ok(())
    }
}
