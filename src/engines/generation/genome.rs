use serde::{Deserialize, Serialize};
use std::fmt;

/// Genome representation for knockout and landscape analysis
///
/// A genome is a fixed-length sequence of single-character instruction codes,
/// one per site, as written in the simulator's `genome_sequence` column.
/// Genomes are never edited in place: substitutions and knockouts build a new
/// sequence.
///
/// # Example
///
/// ```
/// use kolandscape::engines::generation::Genome;
///
/// let genome = Genome::from("abcd");
/// let knocked_out = genome.with_knockouts(&[1], 'X');
/// assert_eq!(knocked_out.to_string(), "aXcd");
/// assert_eq!(genome.to_string(), "abcd");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Genome {
    symbols: Vec<char>,
}

impl Genome {
    pub fn new(symbols: Vec<char>) -> Self {
        Self { symbols }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn get(&self, pos: usize) -> Option<char> {
        self.symbols.get(pos).copied()
    }

    /// Copy of this genome with `pos` replaced by `symbol`.
    pub fn with_substitution(&self, pos: usize, symbol: char) -> Genome {
        let mut symbols = self.symbols.clone();
        symbols[pos] = symbol;
        Genome { symbols }
    }

    /// Copy of this genome with every site in `positions` replaced by `noop`.
    pub fn with_knockouts(&self, positions: &[usize], noop: char) -> Genome {
        let mut symbols = self.symbols.clone();
        for &pos in positions {
            symbols[pos] = noop;
        }
        Genome { symbols }
    }

    /// Sites at which two equal-length genomes differ.
    pub fn differing_sites(&self, other: &Genome) -> Vec<usize> {
        self.symbols
            .iter()
            .zip(&other.symbols)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect()
    }
}

impl From<&str> for Genome {
    fn from(sequence: &str) -> Self {
        Self {
            symbols: sequence.trim().chars().collect(),
        }
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.symbols {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}
