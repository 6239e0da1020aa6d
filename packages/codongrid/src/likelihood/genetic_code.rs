use itertools::Itertools;

/// Nucleotide order used for codon indexing
pub const NUCLEOTIDES: [u8; 4] = *b"TCAG";

/// Standard genetic code (NCBI table 1), codons enumerated in TCAG order. Stop codons are `*`.
const STANDARD_AMINO_ACIDS: &[u8; 64] = b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

pub fn nucleotide_index(nuc: u8) -> Option<usize> {
  match nuc.to_ascii_uppercase() {
    b'T' | b'U' => Some(0),
    b'C' => Some(1),
    b'A' => Some(2),
    b'G' => Some(3),
    _ => None,
  }
}

/// Sense codons of a genetic code and the amino acids they encode
#[derive(Clone, Debug)]
pub struct GeneticCode {
  codons: Vec<[usize; 3]>,
  amino_acids: Vec<u8>,
  state_of_codon: [Option<usize>; 64],
}

impl GeneticCode {
  pub fn standard() -> Self {
    let mut state_of_codon = [None; 64];
    let mut codons = vec![];
    let mut amino_acids = vec![];

    for (i, &aa) in STANDARD_AMINO_ACIDS.iter().enumerate() {
      if aa == b'*' {
        continue;
      }
      state_of_codon[i] = Some(codons.len());
      codons.push([i / 16, (i / 4) % 4, i % 4]);
      amino_acids.push(aa);
    }

    Self {
      codons,
      amino_acids,
      state_of_codon,
    }
  }

  /// Number of sense codons, i.e. the size of the state space
  #[inline]
  pub fn num_states(&self) -> usize {
    self.codons.len()
  }

  /// Nucleotide indices (into [`NUCLEOTIDES`]) of a sense codon
  #[inline]
  pub fn codon(&self, state: usize) -> [usize; 3] {
    self.codons[state]
  }

  #[inline]
  pub fn is_synonymous(&self, a: usize, b: usize) -> bool {
    self.amino_acids[a] == self.amino_acids[b]
  }

  /// State index of a codon given as 3 nucleotide letters. `None` for stop codons, gaps and ambiguity codes.
  pub fn state(&self, codon: &[u8]) -> Option<usize> {
    let [a, b, c] = codon else { return None };
    let (a, b, c) = (nucleotide_index(*a)?, nucleotide_index(*b)?, nucleotide_index(*c)?);
    self.state_of_codon[a * 16 + b * 4 + c]
  }

  /// Codon as a string, for diagnostics
  pub fn codon_str(&self, state: usize) -> String {
    self.codons[state].iter().map(|&n| NUCLEOTIDES[n] as char).join("")
  }

  /// If two codons differ at exactly one position, returns that position with the nucleotide before and after
  pub fn single_substitution(&self, from: usize, to: usize) -> Option<(usize, usize, usize)> {
    let (x, y) = (self.codons[from], self.codons[to]);
    let mut diffs = (0..3).filter(|&p| x[p] != y[p]);
    match (diffs.next(), diffs.next()) {
      (Some(p), None) => Some((p, x[p], y[p])),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_standard_code_has_61_sense_codons() {
    let code = GeneticCode::standard();
    assert_eq!(61, code.num_states());
    assert_eq!(None, code.state(b"TAA"));
    assert_eq!(None, code.state(b"TGA"));
    assert_eq!(None, code.state(b"A-G"));
    assert_eq!(None, code.state(b"ANG"));
  }

  #[test]
  fn test_standard_code_synonymy() {
    let code = GeneticCode::standard();
    let state = |s: &[u8]| code.state(s).unwrap();
    assert!(code.is_synonymous(state(b"CTT"), state(b"TTA")));
    assert!(!code.is_synonymous(state(b"ATG"), state(b"ATA")));
    assert_eq!("ATG", code.codon_str(state(b"atg")));
    assert_eq!(state(b"TTT"), state(b"UUU"));
  }

  #[test]
  fn test_single_substitution() {
    let code = GeneticCode::standard();
    let state = |s: &[u8]| code.state(s).unwrap();
    assert_eq!(Some((2, 3, 2)), code.single_substitution(state(b"ATG"), state(b"ATA")));
    assert_eq!(None, code.single_substitution(state(b"ATG"), state(b"ACA")));
    assert_eq!(None, code.single_substitution(state(b"ATG"), state(b"ATG")));
  }
}
