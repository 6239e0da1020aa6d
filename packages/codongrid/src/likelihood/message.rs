use crate::likelihood::genetic_code::GeneticCode;
use crate::tree::tree::TreeMessage;
use ndarray::prelude::*;

/// Partial likelihoods of the subtree below a node, per site and codon state.
///
/// The partials of every site are rescaled so that their maximum is 1; the logarithms of the removed factors,
/// summed over the subtree, are kept in `log_scale`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CodonMessage {
  pub partials: Array2<f64>,
  pub log_scale: Array1<f64>,
}

impl CodonMessage {
  pub fn uninformative(num_sites: usize, num_states: usize) -> Self {
    Self {
      partials: Array2::ones((num_sites, num_states)),
      log_scale: Array1::zeros(num_sites),
    }
  }

  /// Leaf message of a coding sequence. Codons which are ambiguous, gapped or stops are uninformative; a trailing
  /// incomplete codon is ignored.
  pub fn from_sequence(code: &GeneticCode, seq: &str) -> Self {
    let codons = seq.as_bytes().chunks_exact(3).collect::<Vec<_>>();
    let mut partials = Array2::<f64>::zeros((codons.len(), code.num_states()));
    for (mut row, codon) in partials.rows_mut().into_iter().zip(codons) {
      match code.state(codon) {
        Some(state) => row[state] = 1.0,
        None => row.fill(1.0),
      }
    }
    Self {
      log_scale: Array1::zeros(partials.nrows()),
      partials,
    }
  }

  /// Divides each site by its largest partial and accumulates the logarithm of the factor
  pub fn rescale(&mut self) {
    for (mut row, scale) in self.partials.rows_mut().into_iter().zip(self.log_scale.iter_mut()) {
      let max = row.fold(0.0_f64, |acc, &x| acc.max(x));
      if max > 0.0 && max.is_finite() {
        row /= max;
        *scale += max.ln();
      }
    }
  }
}

impl TreeMessage for CodonMessage {
  fn num_sites(&self) -> usize {
    self.partials.nrows()
  }

  fn size_bytes(&self) -> usize {
    std::mem::size_of::<Self>() + (self.partials.len() + self.log_scale.len()) * std::mem::size_of::<f64>()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_abs_diff_eq;
  use ndarray::array;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_codon_message_from_sequence() {
    let code = GeneticCode::standard();
    let msg = CodonMessage::from_sequence(&code, "ATGTAGNNNTT");

    assert_eq!(3, msg.num_sites());
    assert_eq!(1.0, msg.partials.row(0).sum());
    assert_eq!(Some(1.0), code.state(b"ATG").map(|state| msg.partials[[0, state]]));
    assert_eq!(61.0, msg.partials.row(1).sum());
    assert_eq!(61.0, msg.partials.row(2).sum());
  }

  #[test]
  fn test_codon_message_rescale_accumulates_log_factors() {
    let mut msg = CodonMessage {
      partials: array![[0.5, 0.25], [2.0, 1.0], [0.0, 0.0]],
      log_scale: array![1.0, 0.0, 0.0],
    };
    msg.rescale();
    assert_abs_diff_eq!(array![[1.0, 0.5], [1.0, 0.5], [0.0, 0.0]], msg.partials);
    assert_abs_diff_eq!(array![1.0 + 0.5_f64.ln(), 2.0_f64.ln(), 0.0], msg.log_scale, epsilon = 1e-15);
  }
}
