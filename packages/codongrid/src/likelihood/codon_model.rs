use crate::likelihood::genetic_code::{nucleotide_index, GeneticCode};
use crate::utils::ndarray::clamp_min;
use crate::{make_error, make_internal_error};
use eyre::Report;
use ndarray::prelude::*;
use ndarray_linalg::Eigh;
use ndarray_linalg::UPLO::Lower;
use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Nucleotide-level parameters shared by all codon models of a run: the nucleotide exchangeabilities and the
/// per-codon-position nucleotide frequencies (F3x4), from which the codon equilibrium frequencies follow.
///
/// Exchangeabilities are symmetrized and frequencies must be positive, so that every codon model built from these
/// parameters is reversible with respect to `codon_freqs`.
#[derive(Clone, Debug)]
pub struct CodonModelParams {
  nuc_matrix: Array2<f64>,
  f3x4: Array2<f64>,
  codon_freqs: Array1<f64>,
  fingerprint: u64,
}

impl CodonModelParams {
  pub fn new(code: &GeneticCode, nuc_matrix: Array2<f64>, f3x4: Array2<f64>) -> Result<Self, Report> {
    if nuc_matrix.dim() != (4, 4) {
      return make_error!("Nucleotide rate matrix must be 4x4, but found {:?}", nuc_matrix.dim());
    }
    if f3x4.dim() != (3, 4) {
      return make_error!("F3x4 frequencies must be 3x4, but found {:?}", f3x4.dim());
    }
    if nuc_matrix.iter().any(|&x| !x.is_finite() || x < 0.0) {
      return make_error!("Nucleotide exchangeabilities must be finite and non-negative");
    }
    if f3x4.iter().any(|&x| !x.is_finite() || x <= 0.0) {
      return make_error!("Nucleotide frequencies must be finite and positive");
    }

    let nuc_matrix = {
      let mut nuc_matrix = 0.5 * (&nuc_matrix.view() + &nuc_matrix.t());
      nuc_matrix.diag_mut().fill(0.0);
      nuc_matrix
    };

    let mut f3x4 = f3x4;
    for mut row in f3x4.rows_mut() {
      let sum = row.sum();
      row /= sum;
    }

    let mut codon_freqs = Array1::from_iter((0..code.num_states()).map(|state| {
      let codon = code.codon(state);
      (0..3).map(|pos| f3x4[[pos, codon[pos]]]).product::<f64>()
    }));
    let total = codon_freqs.sum();
    if total <= 0.0 {
      return make_error!("All sense codons have zero frequency");
    }
    codon_freqs /= total;

    let mut hasher = DefaultHasher::new();
    for x in nuc_matrix.iter().chain(f3x4.iter()) {
      OrderedFloat(*x).hash(&mut hasher);
    }
    let fingerprint = hasher.finish();

    Ok(Self {
      nuc_matrix,
      f3x4,
      codon_freqs,
      fingerprint,
    })
  }

  /// Equal nucleotide exchangeabilities and frequencies
  pub fn uniform(code: &GeneticCode) -> Result<Self, Report> {
    Self::new(code, Array2::ones((4, 4)), Array2::ones((3, 4)))
  }

  /// F3x4 frequencies counted from the sense codons of the given sequences, with one pseudocount per cell
  pub fn from_alignment<'a>(
    code: &GeneticCode,
    nuc_matrix: Array2<f64>,
    sequences: impl IntoIterator<Item = &'a str>,
  ) -> Result<Self, Report> {
    let mut counts = Array2::<f64>::ones((3, 4));
    for seq in sequences {
      for codon in seq.as_bytes().chunks_exact(3) {
        if code.state(codon).is_none() {
          continue;
        }
        for (pos, &nuc) in codon.iter().enumerate() {
          if let Some(n) = nucleotide_index(nuc) {
            counts[[pos, n]] += 1.0;
          }
        }
      }
    }
    Self::new(code, nuc_matrix, counts)
  }

  #[inline]
  pub fn nuc_matrix(&self) -> &Array2<f64> {
    &self.nuc_matrix
  }

  #[inline]
  pub fn f3x4(&self) -> &Array2<f64> {
    &self.f3x4
  }

  #[inline]
  pub fn codon_freqs(&self) -> &Array1<f64> {
    &self.codon_freqs
  }

  /// Hash of the parameter values, used as part of model cache keys
  #[inline]
  pub const fn fingerprint(&self) -> u64 {
    self.fingerprint
  }
}

/// Symmetric nucleotide exchangeability matrix from the 6 rates `AC, AG, AT, CG, CT, GT`, in codon nucleotide order
pub fn nuc_matrix_from_exchangeabilities(rates: &[f64]) -> Result<Array2<f64>, Report> {
  const PAIRS: [(u8, u8); 6] = [(b'A', b'C'), (b'A', b'G'), (b'A', b'T'), (b'C', b'G'), (b'C', b'T'), (b'G', b'T')];
  if rates.len() != PAIRS.len() {
    return make_error!("Expected 6 nucleotide exchangeabilities (AC, AG, AT, CG, CT, GT), but found {}", rates.len());
  }
  let mut matrix = Array2::<f64>::zeros((4, 4));
  for (&(a, b), &rate) in PAIRS.iter().zip(rates) {
    let (Some(i), Some(j)) = (nucleotide_index(a), nucleotide_index(b)) else {
      return make_internal_error!("Unknown nucleotide pair {}{}", a as char, b as char);
    };
    matrix[[i, j]] = rate;
    matrix[[j, i]] = rate;
  }
  Ok(matrix)
}

/// MG94-style codon substitution model.
///
/// The rate from codon `i` to codon `j`, differing by a single nucleotide `a -> b` at position `p`, is
/// `nuc[a, b] * f3x4[p, b]` times `alpha` for synonymous and `beta` for nonsynonymous changes.
///
/// The rate matrix is decomposed once, through the eigendecomposition of its symmetrized form
/// `diag(sqrt(pi)) Q diag(1/sqrt(pi))`, so that `P(t) = v exp(lambda t) v_inv`.
#[derive(Debug)]
pub struct CodonModel {
  alpha: f64,
  beta: f64,
  q: Array2<f64>,
  eigvals: Array1<f64>,
  v: Array2<f64>,
  v_inv: Array2<f64>,
  transitions: RwLock<HashMap<OrderedFloat<f64>, Arc<Array2<f64>>>>,
}

impl CodonModel {
  pub fn new(code: &GeneticCode, params: &CodonModelParams, alpha: f64, beta: f64) -> Result<Self, Report> {
    if !(alpha >= 0.0 && beta >= 0.0 && alpha.is_finite() && beta.is_finite()) {
      return make_error!("Codon model rates must be finite and non-negative, but found alpha={alpha}, beta={beta}");
    }

    let n = code.num_states();
    let mut q = Array2::<f64>::zeros((n, n));
    for i in 0..n {
      for j in 0..n {
        if let Some((pos, from, to)) = code.single_substitution(i, j) {
          let selection = if code.is_synonymous(i, j) { alpha } else { beta };
          q[[i, j]] = selection * params.nuc_matrix[[from, to]] * params.f3x4[[pos, to]];
        }
      }
      q[[i, i]] = -q.row(i).sum();
    }

    let (eigvals, v, v_inv) = eig_reversible(&q, params.codon_freqs())?;

    Ok(Self {
      alpha,
      beta,
      q,
      eigvals,
      v,
      v_inv,
      transitions: RwLock::new(HashMap::new()),
    })
  }

  #[inline]
  pub const fn alpha(&self) -> f64 {
    self.alpha
  }

  #[inline]
  pub const fn beta(&self) -> f64 {
    self.beta
  }

  #[inline]
  pub fn rate_matrix(&self) -> &Array2<f64> {
    &self.q
  }

  #[inline]
  pub fn eigvals(&self) -> &Array1<f64> {
    &self.eigvals
  }

  /// Transition probabilities `P(t) = exp(Q t)` along a branch of length `t`, memoized per branch length
  pub fn transition(&self, t: f64) -> Arc<Array2<f64>> {
    let key = OrderedFloat(t);
    if let Some(p) = self.transitions.read().get(&key) {
      return Arc::clone(p);
    }
    let p = Arc::new(self.exp_qt(t));
    Arc::clone(self.transitions.write().entry(key).or_insert(p))
  }

  fn exp_qt(&self, t: f64) -> Array2<f64> {
    let exp_lt = (t * &self.eigvals).mapv(f64::exp);
    let p = (&self.v * &exp_lt).dot(&self.v_inv);
    clamp_min(&p, 0.0)
  }
}

/// Eigendecomposition of a rate matrix `q` which is reversible under `pi`. Returns the eigenvalues and the left and
/// right transforms `v = diag(1/sqrt(pi)) U`, `v_inv = U^T diag(sqrt(pi))`, where `U` holds the eigenvectors of the
/// symmetrized matrix in columns.
#[allow(clippy::type_complexity)]
fn eig_reversible(q: &Array2<f64>, pi: &Array1<f64>) -> Result<(Array1<f64>, Array2<f64>, Array2<f64>), Report> {
  if q.dim() != (pi.len(), pi.len()) {
    return make_internal_error!("Rate matrix of shape {:?} for {} equilibrium frequencies", q.dim(), pi.len());
  }

  let sqrt_pi = pi.mapv(f64::sqrt);
  let sym_q = {
    let sym_q = q * &sqrt_pi.view().insert_axis(Axis(1)) / &sqrt_pi;
    0.5 * (&sym_q.view() + &sym_q.t())
  };

  let (eigvals, eigvecs) = sym_q.eigh(Lower)?;

  let v = &eigvecs / &sqrt_pi.view().insert_axis(Axis(1));
  let v_inv = eigvecs.t().to_owned() * &sqrt_pi;

  Ok((eigvals, v, v_inv))
}

type ModelKey = (OrderedFloat<f64>, OrderedFloat<f64>, u64);

/// Memoizing constructor of codon models for one genetic code. Not shared between threads: every worker owns one.
#[derive(Debug)]
pub struct CodonModelCache {
  code: Arc<GeneticCode>,
  models: HashMap<ModelKey, Arc<CodonModel>>,
}

impl CodonModelCache {
  pub fn new(code: Arc<GeneticCode>) -> Self {
    Self {
      code,
      models: HashMap::new(),
    }
  }

  pub fn get(&mut self, alpha: f64, beta: f64, params: &CodonModelParams) -> Result<Arc<CodonModel>, Report> {
    let key = (OrderedFloat(alpha), OrderedFloat(beta), params.fingerprint());
    if let Some(model) = self.models.get(&key) {
      return Ok(Arc::clone(model));
    }
    let model = Arc::new(CodonModel::new(&self.code, params, alpha, beta)?);
    self.models.insert(key, Arc::clone(&model));
    Ok(model)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.models.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.models.is_empty()
  }
}
