use crate::make_error;
use eyre::Report;
use serde::Serialize;
use smart_default::SmartDefault;

/// Shift that keeps the warped axis finite at zero
const WARP_OFFSET: f64 = 0.05;

/// Maps a point of the evenly spaced axis onto the parameter value. Even spacing in unwarped space yields a grid that
/// is dense near small values.
#[inline]
pub fn warp(x: f64) -> f64 {
  10.0_f64.powf(x) - WARP_OFFSET
}

/// Inverse of [`warp`]
#[inline]
pub fn unwarp(x: f64) -> f64 {
  (x + WARP_OFFSET).log10()
}

/// Ordered values of one grid parameter
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GridAxis {
  values: Vec<f64>,
}

impl GridAxis {
  #[inline]
  pub fn values(&self) -> &[f64] {
    &self.values
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.values.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

/// Builds an axis of `count + 1` values: evenly spaced in `unwarp` space between `unwarp(lower)` and `unwarp(upper)`,
/// then mapped back through `warp`.
pub fn build_axis(
  lower: f64,
  upper: f64,
  count: usize,
  warp: impl Fn(f64) -> f64,
  unwarp: impl Fn(f64) -> f64,
) -> Result<GridAxis, Report> {
  if count == 0 {
    return make_error!("Grid axis needs at least 1 interval, but 0 requested");
  }
  if !(lower < upper) {
    return make_error!("Grid axis bounds are inverted or empty: [{lower}, {upper}]");
  }

  let (from, to) = (unwarp(lower), unwarp(upper));
  if !from.is_finite() || !to.is_finite() || !(from < to) {
    return make_error!("Grid axis bounds [{lower}, {upper}] are outside of the domain of the axis transform");
  }

  let step = (to - from) / count as f64;
  let values = (0..=count)
    .map(|i| if i == count { to } else { from + step * i as f64 })
    .map(warp)
    .collect();

  Ok(GridAxis { values })
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AxisBounds {
  pub lower: f64,
  pub upper: f64,
}

impl AxisBounds {
  pub const fn new(lower: f64, upper: f64) -> Self {
    Self { lower, upper }
  }

  pub fn build(&self, count: usize) -> Result<GridAxis, Report> {
    build_axis(self.lower, self.upper, count, warp, unwarp)
  }
}

/// Value ranges of the grid axes
#[derive(Clone, Copy, Debug, PartialEq, Serialize, SmartDefault)]
pub struct GridBounds {
  #[default(AxisBounds::new(0.01, 13.0))]
  pub alpha: AxisBounds,

  #[default(AxisBounds::new(0.01, 13.0))]
  pub omega: AxisBounds,

  #[default(AxisBounds::new(0.05, 6.0))]
  pub background: AxisBounds,
}
