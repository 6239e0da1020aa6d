use crate::grid::codon_params::CodonParams;
use crate::grid::prepare_grid::GridSetup;
use crate::likelihood::{LikelihoodEngine, ModelAssignment};
use crate::subclades::detect::PureSubclade;
use crate::subclades::message_cache::SubcladeMessageCache;
use crate::tree::tree::Tree;
use crate::{make_error, make_internal_error};
use eyre::{Report, WrapErr};
use ndarray::{Array1, ArrayViewMut2};

/// Cached subclade messages and the subclades they belong to. Subclade roots are arena indices, valid in every
/// replica of the canonical tree.
pub type Memo<'a, M> = (&'a SubcladeMessageCache<M>, &'a [PureSubclade]);

/// Evaluates grid points on a private tree replica, with a private model cache
pub struct GridWorker<'a, E: LikelihoodEngine> {
  engine: &'a E,
  setup: &'a GridSetup,
  tree: Tree<E::Message>,
  model_cache: E::ModelCache,
  memo: Option<Memo<'a, E::Message>>,
  root_parent_message: E::Message,
}

impl<'a, E: LikelihoodEngine> GridWorker<'a, E> {
  pub fn new(engine: &'a E, setup: &'a GridSetup, tree: Tree<E::Message>, memo: Option<Memo<'a, E::Message>>) -> Self {
    Self {
      engine,
      setup,
      tree,
      model_cache: engine.new_model_cache(),
      memo,
      root_parent_message: engine.root_parent_message(setup.num_sites),
    }
  }

  /// Per-site log-likelihoods of one grid point
  pub fn evaluate_point(&mut self, params: &CodonParams) -> Result<Array1<f64>, Report> {
    let alpha = params.alpha();
    let models = params
      .omegas()
      .iter()
      .map(|&omega| self.engine.model(&mut self.model_cache, alpha, alpha * omega))
      .collect::<Result<Vec<_>, Report>>()?;

    if let Some((cache, subclades)) = self.memo {
      for subclade in subclades {
        let Some(omega) = params.omega(subclade.group) else {
          return make_internal_error!(
            "Grid point has no omega for group {} of subclade {}",
            subclade.group,
            subclade.node
          );
        };
        let Some(message) = cache.get(subclade.node, alpha, omega) else {
          return make_internal_error!(
            "Subclade cache has no entry for node {} (alpha={alpha}, omega={omega})",
            subclade.node
          );
        };
        self.tree.node_mut(subclade.node).message = message.clone();
      }
    }

    let root = self.tree.root();
    let assignment = ModelAssignment::ByGroup {
      node_groups: &self.setup.node_groups,
      models: &models,
    };
    self.engine.felsenstein(&mut self.tree, root, &assignment)?;

    let mut message = self.tree.node(root).message.clone();
    self.engine.combine(&mut message, &self.root_parent_message)?;
    self.engine.site_log_likelihoods(&message)
  }

  /// Evaluates consecutive grid points into consecutive rows of `rows`
  pub fn evaluate_chunk(&mut self, params: &[CodonParams], mut rows: ArrayViewMut2<f64>) -> Result<(), Report> {
    if params.len() != rows.nrows() {
      return make_internal_error!("{} grid points for {} output rows", params.len(), rows.nrows());
    }
    for (params, mut row) in params.iter().zip(rows.rows_mut()) {
      let site_lls = self
        .evaluate_point(params)
        .wrap_err_with(|| format!("When evaluating grid point {:?}", params.values()))?;
      if site_lls.len() != row.len() {
        return make_error!("Likelihood engine returned {} sites, expected {}", site_lls.len(), row.len());
      }
      row.assign(&site_lls);
    }
    Ok(())
  }
}
