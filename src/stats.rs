//! Column statistics over an [`Alignment`].
//!
//! Everything here is computed on demand from the alignment rows:
//! - symbol distributions with additive pseudo-counts
//! - Shannon entropy (natural log by default)
//! - gap fraction
//! - a positional [`Profile`] that treats columns as independent

use std::collections::BTreeMap;

use crate::model::{AlignmentError, AlignmentResult, Alignment, Alphabet, GAP};

/// Symbol counts or probabilities for one column, ordered by symbol.
pub type Distribution = BTreeMap<u8, f64>;

fn check_pseudo(pseudo: f64) -> AlignmentResult<()> {
    if pseudo.is_finite() && pseudo >= 0.0 {
        Ok(())
    } else {
        Err(AlignmentError::InvalidPseudoCount(pseudo))
    }
}

fn check_base(base: f64) -> AlignmentResult<()> {
    if base.is_finite() && base > 0.0 && base != 1.0 {
        Ok(())
    } else {
        Err(AlignmentError::InvalidBase(base))
    }
}

impl Alignment {
    fn require_alphabet(&self) -> AlignmentResult<&Alphabet> {
        self.alphabet().ok_or(AlignmentError::MissingAlphabet)
    }

    /// Symbol distribution of the column at `position`.
    ///
    /// Every symbol in the column is counted, gaps included. Each alphabet
    /// symbol then receives `pseudo`: added to its count when observed, or
    /// set as its count when absent. Absent symbols are reported even when
    /// `pseudo` is zero. With `normalise`, counts are divided by their total.
    ///
    /// `pseudo` must be finite and non-negative.
    pub fn probabilities(
        &self,
        position: usize,
        pseudo: f64,
        normalise: bool,
    ) -> AlignmentResult<Distribution> {
        check_pseudo(pseudo)?;
        let alphabet = self.require_alphabet()?;
        let mut counts = Distribution::new();
        for sym in self.column(position)? {
            *counts.entry(sym).or_insert(0.0) += 1.0;
        }
        for sym in alphabet.iter() {
            match counts.get_mut(&sym) {
                Some(count) => *count += pseudo,
                None if pseudo != 0.0 => {
                    counts.insert(sym, pseudo);
                }
                None => {
                    counts.insert(sym, 0.0);
                }
            }
        }
        if !normalise {
            return Ok(counts);
        }

        // At least one row was counted, so the total is positive.
        let total: f64 = counts.values().sum();
        for count in counts.values_mut() {
            *count /= total;
        }
        Ok(counts)
    }

    /// Shannon entropy of the column at `position`.
    ///
    /// Sums `p * log(p)` over alphabet symbols, where `p` is the symbol count
    /// divided by the full column length (gaps and foreign symbols only
    /// enlarge the denominator). Uses the natural log unless `base` is given,
    /// which must be finite, positive and different from 1.
    pub fn shannon_entropy(&self, position: usize, base: Option<f64>) -> AlignmentResult<f64> {
        if let Some(b) = base {
            check_base(b)?;
        }
        let alphabet = self.require_alphabet()?;
        let column = self.column(position)?;
        let mut counts = [0usize; 256];
        for &sym in &column {
            counts[sym as usize] += 1;
        }

        let total = column.len() as f64;
        let mut entropy = 0.0;
        for sym in alphabet.iter() {
            let prob = counts[sym as usize] as f64 / total;
            if prob > 0.0 {
                entropy += match base {
                    Some(b) => prob * prob.log(b),
                    None => prob * prob.ln(),
                };
            }
        }
        // Negating an empty sum would give -0.0.
        if entropy == 0.0 {
            Ok(0.0)
        } else {
            Ok(-entropy)
        }
    }

    /// Fraction of the column at `position` that is a gap.
    pub fn gap_fraction(&self, position: usize) -> AlignmentResult<f64> {
        let column = self.column(position)?;
        let gaps = column.iter().filter(|&&b| b == GAP).count();
        Ok(gaps as f64 / column.len() as f64)
    }

    /// Entropy of every column, in column order.
    pub fn column_entropies(&self, base: Option<f64>) -> AlignmentResult<Vec<f64>> {
        (0..self.alignment_length())
            .map(|p| self.shannon_entropy(p, base))
            .collect()
    }

    /// Gap fraction of every column, in column order.
    pub fn column_gap_fractions(&self) -> AlignmentResult<Vec<f64>> {
        (0..self.alignment_length())
            .map(|p| self.gap_fraction(p))
            .collect()
    }

    /// Positional profile of the alignment, assuming independent columns.
    ///
    /// Every alphabet symbol starts at `pseudo` in every column; symbols
    /// outside the alphabet (gaps included) are not observed.
    pub fn profile(&self, pseudo: f64) -> AlignmentResult<Profile> {
        let alphabet = self.require_alphabet()?.clone();
        let mut profile = Profile::new(alphabet, self.alignment_length(), pseudo)?;
        for seq in self {
            profile.observe(seq.as_bytes());
        }
        Ok(profile)
    }
}

/// Per-column symbol counts over a fixed alphabet.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    alphabet: Alphabet,
    /// One row per column, one count per alphabet symbol.
    counts: Vec<Vec<f64>>,
}

impl Profile {
    /// Empty profile of `length` columns, every count starting at `pseudo`.
    pub fn new(alphabet: Alphabet, length: usize, pseudo: f64) -> AlignmentResult<Self> {
        check_pseudo(pseudo)?;
        let counts = vec![vec![pseudo; alphabet.len()]; length];
        Ok(Self { alphabet, counts })
    }

    /// Adds one observation per alphabet symbol of `row`.
    ///
    /// `row` is expected to be as long as the profile; extra symbols are ignored.
    pub fn observe(&mut self, row: &[u8]) {
        for (column, &sym) in self.counts.iter_mut().zip(row) {
            if let Some(i) = self.alphabet.index_of(sym) {
                column[i] += 1.0;
            }
        }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn column_counts(&self, position: usize) -> AlignmentResult<&[f64]> {
        self.counts
            .get(position)
            .map(Vec::as_slice)
            .ok_or(AlignmentError::IndexOutOfBounds {
                index: position,
                len: self.counts.len(),
            })
    }

    /// Count of `symbol` at `position`; zero for symbols outside the alphabet.
    pub fn count(&self, position: usize, symbol: u8) -> AlignmentResult<f64> {
        let column = self.column_counts(position)?;
        Ok(self.alphabet.index_of(symbol).map_or(0.0, |i| column[i]))
    }

    /// Probabilities at `position` in alphabet order.
    ///
    /// A column without any count yields all zeros.
    pub fn probabilities(&self, position: usize) -> AlignmentResult<Vec<f64>> {
        let column = self.column_counts(position)?;
        let total: f64 = column.iter().sum();
        if total == 0.0 {
            return Ok(vec![0.0; column.len()]);
        }
        Ok(column.iter().map(|c| c / total).collect())
    }

    /// Probability of `symbol` at `position`.
    pub fn probability(&self, position: usize, symbol: u8) -> AlignmentResult<f64> {
        let total: f64 = self.column_counts(position)?.iter().sum();
        if total == 0.0 {
            return Ok(0.0);
        }
        Ok(self.count(position, symbol)? / total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sequence;

    const EPS: f64 = 1e-9;

    fn aligned(rows: &[(&str, &str)], alphabet: &str) -> Alignment {
        let alphabet = Alphabet::new(alphabet).unwrap();
        Alignment::new(
            rows.iter()
                .map(|(name, data)| Sequence::new(*name, *data).unwrap().with_alphabet(Some(alphabet.clone())))
                .collect(),
        )
        .unwrap()
    }

    fn example() -> Alignment {
        aligned(&[("A", "AC-G"), ("B", "ACCG"), ("C", "A--G")], "ACG")
    }

    #[test]
    fn test_gap_fraction() {
        let alignment = example();
        assert!((alignment.gap_fraction(2).unwrap() - 2.0 / 3.0).abs() < EPS);
        assert_eq!(alignment.gap_fraction(0).unwrap(), 0.0);
        let all_gaps = aligned(&[("x", "-A"), ("y", "-C")], "AC");
        assert_eq!(all_gaps.gap_fraction(0).unwrap(), 1.0);
    }

    #[test]
    fn test_entropy_counts_gaps_in_denominator() {
        let alignment = example();
        let expected = -((1.0f64 / 3.0) * (1.0f64 / 3.0).ln());
        assert!((alignment.shannon_entropy(2, None).unwrap() - expected).abs() < EPS);
        assert!((expected - 0.366).abs() < 1e-3);
    }

    #[test]
    fn test_entropy_conserved_column_is_positive_zero() {
        let alignment = example();
        let entropy = alignment.shannon_entropy(0, None).unwrap();
        assert_eq!(entropy, 0.0);
        assert!(entropy.is_sign_positive());

        let gaps = aligned(&[("x", "-"), ("y", "-")], "AC");
        let entropy = gaps.shannon_entropy(0, None).unwrap();
        assert!(entropy.is_sign_positive());
        assert_eq!(entropy, 0.0);
    }

    #[test]
    fn test_entropy_maximal_for_uniform_column() {
        let alignment = aligned(
            &[("a", "A"), ("b", "C"), ("c", "G"), ("d", "T"), ("e", "A"), ("f", "C"), ("g", "G"), ("h", "T")],
            "ACGT",
        );
        let entropy = alignment.shannon_entropy(0, None).unwrap();
        assert!((entropy - 4.0f64.ln()).abs() < EPS);
        let bits = alignment.shannon_entropy(0, Some(2.0)).unwrap();
        assert!((bits - 2.0).abs() < EPS);
    }

    #[test]
    fn test_entropy_out_of_bounds() {
        assert_eq!(
            example().shannon_entropy(9, None),
            Err(AlignmentError::IndexOutOfBounds { index: 9, len: 4 })
        );
    }

    #[test]
    fn test_probabilities_sum_to_one_with_gaps() {
        let alignment = example();
        let probs = alignment.probabilities(2, 0.0, true).unwrap();
        let total: f64 = probs.values().sum();
        assert!((total - 1.0).abs() < EPS);
        assert!((probs[&GAP] - 2.0 / 3.0).abs() < EPS);
        assert!((probs[&b'C'] - 1.0 / 3.0).abs() < EPS);
        // Unobserved alphabet symbols are still reported.
        assert_eq!(probs[&b'A'], 0.0);
        assert_eq!(probs[&b'G'], 0.0);
    }

    #[test]
    fn test_probabilities_pseudo_count_set_versus_add() {
        // Observed symbols get count + pseudo, absent ones get exactly pseudo.
        let alignment = example();
        let counts = alignment.probabilities(1, 0.5, false).unwrap();
        assert_eq!(counts[&b'C'], 2.5);
        assert_eq!(counts[&b'A'], 0.5);
        assert_eq!(counts[&b'G'], 0.5);
        assert_eq!(counts[&GAP], 1.0);

        let probs = alignment.probabilities(1, 0.5, true).unwrap();
        assert!((probs[&b'C'] - 2.5 / 4.5).abs() < EPS);
    }

    #[test]
    fn test_entropy_rejects_invalid_base() {
        let alignment = aligned(&[("x", "A"), ("y", "C")], "ACGT");
        for base in [1.0, 0.0, -2.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                alignment.shannon_entropy(0, Some(base)),
                Err(AlignmentError::InvalidBase(_))
            ));
        }
        assert!(alignment.column_entropies(Some(1.0)).is_err());
        let bits = alignment.shannon_entropy(0, Some(2.0)).unwrap();
        assert!((bits - 1.0).abs() < EPS);
    }

    #[test]
    fn test_rejects_invalid_pseudo_count() {
        let alignment = example();
        assert_eq!(
            alignment.probabilities(0, -3.0, true),
            Err(AlignmentError::InvalidPseudoCount(-3.0))
        );
        assert!(alignment.probabilities(0, f64::INFINITY, false).is_err());
        assert_eq!(
            alignment.profile(-1.0),
            Err(AlignmentError::InvalidPseudoCount(-1.0))
        );
        assert!(Profile::new(Alphabet::dna(), 3, f64::NAN).is_err());
    }

    #[test]
    fn test_profile_probability_matches_vector() {
        let profile = example().profile(0.5).unwrap();
        for position in 0..profile.len() {
            let probs = profile.probabilities(position).unwrap();
            for (i, sym) in profile.alphabet().iter().enumerate() {
                assert!((profile.probability(position, sym).unwrap() - probs[i]).abs() < EPS);
            }
            assert_eq!(profile.probability(position, GAP).unwrap(), 0.0);
        }
        let empty = Profile::new(Alphabet::dna(), 1, 0.0).unwrap();
        assert_eq!(empty.probability(0, b'A').unwrap(), 0.0);
        assert!(empty.probability(1, b'A').is_err());
    }

    #[test]
    fn test_missing_alphabet() {
        let alignment = Alignment::new(vec![Sequence::new("x", "AC").unwrap()]).unwrap();
        assert_eq!(alignment.shannon_entropy(0, None), Err(AlignmentError::MissingAlphabet));
        assert_eq!(alignment.probabilities(0, 0.0, true), Err(AlignmentError::MissingAlphabet));
        assert_eq!(alignment.gap_fraction(0), Ok(0.0));
    }

    #[test]
    fn test_profile() {
        let alignment = example();
        let profile = alignment.profile(0.0).unwrap();
        assert_eq!(profile.len(), 4);
        assert_eq!(profile.count(1, b'C').unwrap(), 2.0);
        assert_eq!(profile.count(2, GAP).unwrap(), 0.0);
        assert_eq!(profile.probabilities(2).unwrap(), vec![0.0, 1.0, 0.0]);
        assert_eq!(profile.probability(3, b'G').unwrap(), 1.0);
        assert!(profile.probabilities(4).is_err());

        let smoothed = alignment.profile(1.0).unwrap();
        assert_eq!(smoothed.count(0, b'A').unwrap(), 4.0);
        assert!((smoothed.probability(0, b'C').unwrap() - 1.0 / 6.0).abs() < EPS);
    }

    #[test]
    fn test_column_vectors() {
        let alignment = example();
        assert_eq!(alignment.column_entropies(None).unwrap().len(), 4);
        assert_eq!(alignment.column_gap_fractions().unwrap()[3], 0.0);
    }
}
