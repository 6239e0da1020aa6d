use ndarray::{Array, Array1, ArrayView2, Axis, Dimension};

/// Calculates max over given axis
#[inline]
pub fn max_axis(arr: &ArrayView2<f64>, axis: Axis) -> Array1<f64> {
  arr.fold_axis(axis, f64::NEG_INFINITY, |&a, &b| a.max(b))
}

/// Clamp each element to at least `lower`
pub fn clamp_min<D: Dimension>(arr: &Array<f64, D>, lower: f64) -> Array<f64, D> {
  arr.mapv(|x| x.max(lower))
}
