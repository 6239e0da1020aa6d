use crate::make_error;
use crate::utils::ndarray::max_axis;
use eyre::Report;
use ndarray::{Array2, Axis, Zip};

/// Exponentiates the conditional log-likelihoods after subtracting the maximum of each site (column).
///
/// This only removes a per-site common factor to avoid underflow. Rows and columns do not sum to 1, but the largest
/// entry of every column is exactly 1.
pub fn normalize_conditionals(log_likelihoods: &Array2<f64>) -> Result<Array2<f64>, Report> {
  let site_max = max_axis(&log_likelihoods.view(), Axis(0));

  if let Some((site, max)) = site_max.iter().enumerate().find(|(_, max)| !max.is_finite()) {
    return make_error!("Conditional log-likelihoods of site {site} have no finite maximum (found {max})");
  }

  let mut normalized = log_likelihoods.clone();
  Zip::from(normalized.columns_mut())
    .and(&site_max)
    .for_each(|mut column, &max| column.mapv_inplace(|x| (x - max).exp()));
  Ok(normalized)
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  #[test]
  fn test_normalize_conditionals_column_max_is_one() -> Result<(), Report> {
    let raw = array![[-1000.0, -3.0], [-1001.0, -1.0], [-1002.5, -2.0]];
    let normalized = normalize_conditionals(&raw)?;

    for column in normalized.columns() {
      assert_eq!(1.0, column.fold(f64::MIN, |a, &b| a.max(b)));
      assert!(column.iter().all(|&x| x > 0.0 && x <= 1.0));
    }
    assert_abs_diff_eq!((-1.0_f64).exp(), normalized[[1, 0]], epsilon = 1e-15);
    assert_abs_diff_eq!((-2.0_f64).exp(), normalized[[0, 1]], epsilon = 1e-15);
    Ok(())
  }

  #[test]
  fn test_normalize_conditionals_rejects_non_finite_site() {
    let raw = array![[f64::NEG_INFINITY], [f64::NEG_INFINITY]];
    assert!(normalize_conditionals(&raw).is_err());
  }
}
