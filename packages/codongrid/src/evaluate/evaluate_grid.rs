use crate::evaluate::grid_worker::{GridWorker, Memo};
use crate::evaluate::partition::{build_thread_pool, chunk_size};
use crate::evaluate::strategy::EvaluationStrategy;
use crate::grid::prepare_grid::GridSetup;
use crate::likelihood::LikelihoodEngine;
use crate::subclades::detect::detect_pure_subclades;
use crate::subclades::message_cache::{evaluation_replica, CacheStats, SubcladeMessageCache};
use crate::tree::tree::Tree;
use eyre::{Report, WrapErr};
use itertools::Itertools;
use log::info;
use ndarray::{Array2, ArrayViewMut2, Axis};
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Wall time of the evaluation phases
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridTimings {
  pub subclade_cache: Duration,
  pub grid: Duration,
}

#[derive(Clone, Debug)]
pub struct GridEvaluation {
  /// Per-site conditional log-likelihoods, one row per grid point in canonical order
  pub log_likelihoods: Array2<f64>,
  /// Strategy actually used, with `Auto` resolved
  pub strategy: EvaluationStrategy,
  pub timings: GridTimings,
  pub cache_stats: CacheStats,
}

/// Evaluates every grid point of `setup`.
///
/// The output matrix is moved out of `setup` and returned only when all grid points succeeded. The structure of
/// `tree` is unchanged on return, including on failure.
pub fn evaluate_grid<E: LikelihoodEngine>(
  engine: &E,
  tree: &mut Tree<E::Message>,
  setup: &mut GridSetup,
  strategy: EvaluationStrategy,
  jobs: usize,
) -> Result<GridEvaluation, Report> {
  let mut log_likelihoods = std::mem::take(&mut setup.conditionals);
  let setup: &GridSetup = setup;

  let subclades = detect_pure_subclades(tree, &setup.node_groups);
  let strategy = strategy.resolve(!subclades.is_empty(), jobs);
  info!(
    "Evaluating {} grid points with strategy '{strategy}' ({} pure subclades, {jobs} jobs)",
    setup.codon_params.len(),
    subclades.len()
  );

  let pool = strategy.is_parallel().then(|| build_thread_pool(jobs)).transpose()?;

  let start = Instant::now();
  let cache = match (&pool, strategy.is_memoized() && !subclades.is_empty()) {
    (_, false) => SubcladeMessageCache::empty(),
    (Some(pool), true) => SubcladeMessageCache::build_parallel(engine, tree, &subclades, setup, pool)?,
    (None, true) => SubcladeMessageCache::build_sequential(engine, tree, &subclades, setup)?,
  };
  let subclade_cache = start.elapsed();

  let (replica, memo) = if strategy.is_memoized() {
    (evaluation_replica(tree, &subclades), Some((&cache, subclades.as_slice())))
  } else {
    (tree.clone(), None)
  };

  let start = Instant::now();
  let rows = log_likelihoods.view_mut();
  let result = match &pool {
    Some(pool) => evaluate_parallel(engine, setup, &replica, memo, rows, pool),
    None => GridWorker::new(engine, setup, replica, memo).evaluate_chunk(&setup.codon_params, rows),
  };
  result.wrap_err("When evaluating the parameter grid")?;
  let grid = start.elapsed();

  info!("Subclade cache built in {subclade_cache:.2?}, grid evaluated in {grid:.2?}");

  Ok(GridEvaluation {
    log_likelihoods,
    strategy,
    timings: GridTimings { subclade_cache, grid },
    cache_stats: cache.stats(),
  })
}

/// Splits the grid points into one contiguous chunk per worker. Each worker writes its own block of rows.
fn evaluate_parallel<E: LikelihoodEngine>(
  engine: &E,
  setup: &GridSetup,
  tree: &Tree<E::Message>,
  memo: Option<Memo<E::Message>>,
  mut rows: ArrayViewMut2<f64>,
  pool: &ThreadPool,
) -> Result<(), Report> {
  let chunk = chunk_size(setup.codon_params.len(), pool.current_num_threads());
  let blocks = rows.axis_chunks_iter_mut(Axis(0), chunk).collect_vec();

  pool.install(|| {
    blocks
      .into_par_iter()
      .zip(setup.codon_params.par_chunks(chunk))
      .map(|(block, params)| GridWorker::new(engine, setup, tree.clone(), memo).evaluate_chunk(params, block))
      .collect::<Result<Vec<()>, Report>>()
  })?;

  Ok(())
}
