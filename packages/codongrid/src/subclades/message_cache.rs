use crate::evaluate::partition::partition_chunks;
use crate::grid::prepare_grid::GridSetup;
use crate::likelihood::{LikelihoodEngine, ModelAssignment};
use crate::make_internal_error;
use crate::subclades::detect::PureSubclade;
use crate::tree::tree::{Tree, TreeMessage};
use eyre::{Report, WrapErr};
use itertools::Itertools;
use log::{debug, info};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::Serialize;
use std::collections::HashMap;

/// Subclade root index, alpha, omega of the subclade's group
pub type SubcladeKey = (usize, OrderedFloat<f64>, OrderedFloat<f64>);

fn subclade_key(node: usize, alpha: f64, omega: f64) -> SubcladeKey {
  (node, OrderedFloat(alpha), OrderedFloat(omega))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
  pub num_subclades: usize,
  pub num_entries: usize,
  pub size_bytes: usize,
}

/// Messages at the roots of pure subclades, computed with the subclade evaluated in isolation, for every
/// combination of alpha and of the omega of the subclade's group.
#[derive(Clone, Debug)]
pub struct SubcladeMessageCache<M> {
  entries: HashMap<SubcladeKey, M>,
  num_subclades: usize,
}

impl<M: TreeMessage> SubcladeMessageCache<M> {
  pub fn empty() -> Self {
    Self {
      entries: HashMap::new(),
      num_subclades: 0,
    }
  }

  /// Builds the cache on a single thread, evaluating each subclade in place on `tree` while it is detached from its
  /// parent. The tree structure is the same on return as on entry.
  pub fn build_sequential<E: LikelihoodEngine<Message = M>>(
    engine: &E,
    tree: &mut Tree<M>,
    subclades: &[PureSubclade],
    setup: &GridSetup,
  ) -> Result<Self, Report> {
    let mut cache = Self::empty();
    let mut model_cache = engine.new_model_cache();

    for subclade in subclades {
      let node = subclade.node;
      let pairs = subclade_params(setup, subclade);
      for &(alpha, omega) in &pairs {
        let model = engine.model(&mut model_cache, alpha, alpha * omega)?;
        let message = tree
          .with_detached(node, |tree| {
            engine.felsenstein(tree, node, &ModelAssignment::Uniform(model.as_ref()))?;
            Ok(tree.node(node).message.clone())
          })
          .wrap_err_with(|| format!("When evaluating subclade at node {node} (alpha={alpha}, omega={omega})"))?;
        cache.insert(subclade_key(node, alpha, omega), message)?;
      }
      cache.num_subclades += 1;
      debug!("Subclade at node {node}: cached {} parameter pairs", pairs.len());
    }

    info!("Subclade cache: {:?}", cache.stats());
    Ok(cache)
  }

  /// Builds the cache with the parameter pairs of each subclade split into one contiguous chunk per worker. Workers
  /// evaluate their own copy of the subclade and own their model caches; their results are merged after the join.
  pub fn build_parallel<E: LikelihoodEngine<Message = M>>(
    engine: &E,
    tree: &Tree<M>,
    subclades: &[PureSubclade],
    setup: &GridSetup,
    pool: &ThreadPool,
  ) -> Result<Self, Report> {
    let mut cache = Self::empty();
    let workers = pool.current_num_threads();

    for subclade in subclades {
      let node = subclade.node;
      let pairs = subclade_params(setup, subclade);
      let subtree = tree.clone_subtree(node);
      let chunks = partition_chunks(pairs.len(), workers);

      let partial_maps = pool.install(|| {
        chunks
          .into_par_iter()
          .map(|range| evaluate_subclade_chunk(engine, &subtree, node, &pairs[range]))
          .collect::<Result<Vec<_>, Report>>()
      })?;

      for map in partial_maps {
        for (key, message) in map {
          cache.insert(key, message)?;
        }
      }
      cache.num_subclades += 1;
      debug!("Subclade at node {node}: cached {} parameter pairs on {workers} workers", pairs.len());
    }

    info!("Subclade cache: {:?}", cache.stats());
    Ok(cache)
  }

  fn insert(&mut self, key: SubcladeKey, message: M) -> Result<(), Report> {
    if self.entries.insert(key, message).is_some() {
      let (node, alpha, omega) = key;
      return make_internal_error!(
        "Subclade cache entry for node {node} (alpha={alpha}, omega={omega}) is computed twice"
      );
    }
    Ok(())
  }

  pub fn get(&self, node: usize, alpha: f64, omega: f64) -> Option<&M> {
    self.entries.get(&subclade_key(node, alpha, omega))
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn stats(&self) -> CacheStats {
    CacheStats {
      num_subclades: self.num_subclades,
      num_entries: self.entries.len(),
      size_bytes: self.entries.values().map(TreeMessage::size_bytes).sum(),
    }
  }
}

/// All `(alpha, omega)` pairs of a subclade: the alpha axis times the omega axis of the subclade's group
fn subclade_params(setup: &GridSetup, subclade: &PureSubclade) -> Vec<(f64, f64)> {
  let alphas = setup.alpha_grid.values();
  let omegas = setup.axis_for_group(subclade.group).values();
  alphas
    .iter()
    .copied()
    .cartesian_product(omegas.iter().copied())
    .collect_vec()
}

/// Evaluates a standalone copy of a subclade (rooted at index 0) for a chunk of parameter pairs. Keys carry the
/// index of the subclade root in the full tree.
fn evaluate_subclade_chunk<E: LikelihoodEngine>(
  engine: &E,
  subtree: &Tree<E::Message>,
  node: usize,
  pairs: &[(f64, f64)],
) -> Result<HashMap<SubcladeKey, E::Message>, Report> {
  let mut subtree = subtree.clone();
  let mut model_cache = engine.new_model_cache();
  let root = subtree.root();

  pairs
    .iter()
    .map(|&(alpha, omega)| {
      let model = engine.model(&mut model_cache, alpha, alpha * omega)?;
      engine
        .felsenstein(&mut subtree, root, &ModelAssignment::Uniform(model.as_ref()))
        .wrap_err_with(|| format!("When evaluating subclade at node {node} (alpha={alpha}, omega={omega})"))?;
      Ok((subclade_key(node, alpha, omega), subtree.node(root).message.clone()))
    })
    .collect()
}

/// Copy of the tree in which every subclade root is a leaf, so that a likelihood pass stops there and uses the
/// message placed at the root. Node indices are those of `tree`.
pub fn evaluation_replica<M: TreeMessage>(tree: &Tree<M>, subclades: &[PureSubclade]) -> Tree<M> {
  let mut replica = tree.clone();
  for subclade in subclades {
    replica.prune_below(subclade.node);
  }
  replica
}
