//! # msastat - Multiple Sequence Alignment Statistics
//!
//! Reads alignments produced by external aligners and computes per-column
//! statistics.
//!
//! ## Architecture
//!
//! - `model`: Alphabets, sequences and alignments (column views, trimming)
//! - `stats`: Symbol distributions, Shannon entropy, gap fraction, profiles
//! - `formats`: FASTA and CLUSTAL reading/writing with format detection
//! - `analysis`: Batch summaries of alignment files with an explicit error policy
//!
//! ## Example
//!
//! ```
//! use msastat::model::{Alignment, Alphabet, Sequence};
//!
//! let alphabet = Alphabet::new("ACG").unwrap();
//! let alignment = Alignment::new(vec![
//!     Sequence::new("A", "AC-G").unwrap().with_alphabet(Some(alphabet.clone())),
//!     Sequence::new("B", "ACCG").unwrap().with_alphabet(Some(alphabet.clone())),
//!     Sequence::new("C", "A--G").unwrap().with_alphabet(Some(alphabet)),
//! ])
//! .unwrap();
//!
//! assert_eq!(alignment.column(2).unwrap(), b"-C-".to_vec());
//! let trimmed = alignment.ungapped_using_reference("A").unwrap();
//! assert_eq!(trimmed.get_sequence("C").unwrap().as_str(), "A-G");
//! ```

pub mod analysis;
pub mod formats;
pub mod model;
pub mod stats;
