use crate::likelihood::codon_engine::CodonEngine;
use crate::likelihood::codon_model::{CodonModel, CodonModelCache};
use crate::likelihood::message::CodonMessage;
use crate::likelihood::{LikelihoodEngine, ModelAssignment};
use crate::make_error;
use crate::tree::tree::Tree;
use eyre::Report;
use ndarray::Array1;
use std::sync::Arc;

/// Where `FailingEngine` fails
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailIn {
  /// Passes over a single-model subtree, as in subclade cache construction
  Subclades,
  /// Passes over the whole tree with one model per group, as in grid point evaluation
  GridPoints,
}

/// `CodonEngine` whose likelihood pass fails for one value of alpha
pub struct FailingEngine {
  pub inner: CodonEngine,
  pub alpha: f64,
  pub fail_in: FailIn,
}

impl LikelihoodEngine for FailingEngine {
  type Message = CodonMessage;
  type Model = CodonModel;
  type ModelCache = CodonModelCache;

  fn new_model_cache(&self) -> Self::ModelCache {
    self.inner.new_model_cache()
  }

  fn model(&self, cache: &mut Self::ModelCache, alpha: f64, beta: f64) -> Result<Arc<Self::Model>, Report> {
    self.inner.model(cache, alpha, beta)
  }

  fn felsenstein(
    &self,
    tree: &mut Tree<Self::Message>,
    root: usize,
    models: &ModelAssignment<Self::Model>,
  ) -> Result<(), Report> {
    let fails = match models {
      ModelAssignment::Uniform(model) => self.fail_in == FailIn::Subclades && model.alpha() == self.alpha,
      ModelAssignment::ByGroup { models, .. } => {
        self.fail_in == FailIn::GridPoints && models.first().is_some_and(|model| model.alpha() == self.alpha)
      }
    };
    if fails {
      return make_error!("Likelihood pass failed at alpha={}", self.alpha);
    }
    self.inner.felsenstein(tree, root, models)
  }

  fn root_parent_message(&self, num_sites: usize) -> Self::Message {
    self.inner.root_parent_message(num_sites)
  }

  fn combine(&self, message: &mut Self::Message, parent_message: &Self::Message) -> Result<(), Report> {
    self.inner.combine(message, parent_message)
  }

  fn site_log_likelihoods(&self, message: &Self::Message) -> Result<Array1<f64>, Report> {
    self.inner.site_log_likelihoods(message)
  }
}
