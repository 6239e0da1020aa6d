use crate::evaluate::evaluate_grid::{evaluate_grid, GridEvaluation};
use crate::evaluate::strategy::EvaluationStrategy;
use crate::grid::normalize::normalize_conditionals;
use crate::grid::prepare_grid::{prepare_grid, GridResolution, GridSetup};
use crate::likelihood::LikelihoodEngine;
use crate::tags::node_groups::TagAssignment;
use crate::tags::tag_resolver::TagResolver;
use crate::tree::tree::Tree;
use eyre::Report;
use ndarray::Array2;
use serde::Serialize;
use smart_default::SmartDefault;

#[derive(Clone, Debug, PartialEq, Serialize, SmartDefault)]
pub struct GridOptions {
  pub resolution: GridResolution,

  pub strategy: EvaluationStrategy,

  /// Number of worker threads
  #[default(num_cpus::get())]
  pub jobs: usize,
}

/// Grid and its evaluation
#[derive(Clone, Debug)]
pub struct GridRun {
  pub setup: GridSetup,
  pub evaluation: GridEvaluation,
}

impl GridRun {
  #[inline]
  pub fn conditionals(&self) -> &Array2<f64> {
    &self.evaluation.log_likelihoods
  }

  /// Conditional likelihoods scaled so that the largest of each site is 1
  pub fn normalized_conditionals(&self) -> Result<Array2<f64>, Report> {
    normalize_conditionals(&self.evaluation.log_likelihoods)
  }
}

/// Builds the parameter grid for the tagged tree and evaluates the per-site log-likelihood at every grid point
pub fn run_grid<E: LikelihoodEngine>(
  engine: &E,
  tree: &mut Tree<E::Message>,
  tags: &TagAssignment,
  resolver: &impl TagResolver,
  options: &GridOptions,
) -> Result<GridRun, Report> {
  let mut setup = prepare_grid(tree, tags, resolver, &options.resolution)?;
  let evaluation = evaluate_grid(engine, tree, &mut setup, options.strategy, options.jobs)?;
  Ok(GridRun { setup, evaluation })
}
