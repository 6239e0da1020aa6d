use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use strum_macros::Display;

/// How the grid points are evaluated. All strategies produce the same matrix.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum, SmartDefault, Display, Serialize, Deserialize)]
#[value(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationStrategy {
  /// One full likelihood pass per grid point, on a single thread
  Direct,
  /// Grid points split between workers, each with its own copy of the tree
  Parallel,
  /// Pure subclades are evaluated once per parameter pair and reused at every grid point
  Memoized,
  MemoizedParallel,
  /// Memoized when the tree has pure subclades, parallel when there is more than one job
  #[default]
  Auto,
}

impl EvaluationStrategy {
  /// Replaces `Auto` with a concrete strategy
  pub const fn resolve(self, has_subclades: bool, jobs: usize) -> Self {
    match self {
      Self::Auto => match (has_subclades, jobs > 1) {
        (true, true) => Self::MemoizedParallel,
        (true, false) => Self::Memoized,
        (false, true) => Self::Parallel,
        (false, false) => Self::Direct,
      },
      strategy => strategy,
    }
  }

  pub const fn is_memoized(self) -> bool {
    matches!(self, Self::Memoized | Self::MemoizedParallel)
  }

  pub const fn is_parallel(self) -> bool {
    matches!(self, Self::Parallel | Self::MemoizedParallel)
  }
}
