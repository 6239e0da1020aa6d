use crate::make_error;
use eyre::Report;
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// One grid point: `[alpha, omega_1, ..., omega_G]`, optionally followed by the background omega.
///
/// The position of each omega is its group index, so the background omega (group `G + 1`) is last.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CodonParams {
  values: Vec<f64>,
}

impl CodonParams {
  pub fn new(values: Vec<f64>) -> Result<Self, Report> {
    if values.len() < 2 {
      return make_error!("A grid point needs an alpha and at least one omega, but found {values:?}");
    }
    Ok(Self { values })
  }

  #[inline]
  pub fn alpha(&self) -> f64 {
    self.values[0]
  }

  /// Omega of a group, 1-based. The background group is `num_groups + 1`.
  #[inline]
  pub fn omega(&self, group: usize) -> Option<f64> {
    (group >= 1).then(|| self.values.get(group).copied()).flatten()
  }

  /// Omegas in group order, background last when present
  #[inline]
  pub fn omegas(&self) -> &[f64] {
    &self.values[1..]
  }

  #[inline]
  pub fn values(&self) -> &[f64] {
    &self.values
  }
}

/// Label of a position in [`CodonParams`], for downstream reporting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
  Alpha,
  Omega(usize),
  OmegaBackground,
}

impl Display for ParamKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ParamKind::Alpha => write!(f, "Alpha"),
      ParamKind::Omega(group) => write!(f, "OmegaG{group}"),
      ParamKind::OmegaBackground => write!(f, "OmegaBackground"),
    }
  }
}

impl Serialize for ParamKind {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

pub fn param_kinds(num_groups: usize, has_background: bool) -> Vec<ParamKind> {
  std::iter::once(ParamKind::Alpha)
    .chain((1..=num_groups).map(ParamKind::Omega))
    .chain(has_background.then_some(ParamKind::OmegaBackground))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_codon_params_omega_by_group() -> Result<(), Report> {
    let params = CodonParams::new(vec![0.5, 1.0, 2.0, 3.0])?;
    assert_eq!(0.5, params.alpha());
    assert_eq!(Some(1.0), params.omega(1));
    assert_eq!(Some(3.0), params.omega(3));
    assert_eq!(None, params.omega(0));
    assert_eq!(None, params.omega(4));
    assert_eq!(&[1.0, 2.0, 3.0], params.omegas());
    Ok(())
  }

  #[test]
  fn test_codon_params_require_alpha_and_omega() {
    assert!(CodonParams::new(vec![0.5]).is_err());
    assert!(CodonParams::new(vec![]).is_err());
  }

  #[test]
  fn test_param_kinds_labels() {
    let kinds = param_kinds(2, true).iter().map(ToString::to_string).collect::<Vec<_>>();
    assert_eq!(vec!["Alpha", "OmegaG1", "OmegaG2", "OmegaBackground"], kinds);
    assert_eq!(vec![ParamKind::Alpha, ParamKind::Omega(1)], param_kinds(1, false));
  }
}
