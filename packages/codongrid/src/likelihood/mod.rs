pub mod codon_engine;
pub mod codon_model;
#[cfg(test)]
pub mod failing_engine;
pub mod genetic_code;
pub mod message;

use crate::make_internal_error;
use crate::tags::node_groups::NodeGroups;
use crate::tree::tree::{Tree, TreeMessage};
use eyre::Report;
use ndarray::Array1;
use std::fmt::Debug;
use std::sync::Arc;

/// Substitution model of each branch, looked up by the index of the node below the branch
#[derive(Debug)]
pub enum ModelAssignment<'a, Mo> {
  /// The same model on every branch
  Uniform(&'a Mo),
  /// Model by tag group: group `g` uses `models[g - 1]`, the background group comes last
  ByGroup {
    node_groups: &'a NodeGroups,
    models: &'a [Arc<Mo>],
  },
}

impl<'a, Mo> ModelAssignment<'a, Mo> {
  pub fn model_for(&self, node: usize) -> Result<&Mo, Report> {
    match self {
      ModelAssignment::Uniform(model) => Ok(*model),
      ModelAssignment::ByGroup { node_groups, models } => {
        let group = node_groups.group(node);
        match group.checked_sub(1).and_then(|i| models.get(i)) {
          Some(model) => Ok(model.as_ref()),
          None => make_internal_error!(
            "No model for group {group} of node {node}: only {} models are given",
            models.len()
          ),
        }
      }
    }
  }
}

/// Per-site likelihood computation on a tree, under models parameterized by synonymous (`alpha`) and
/// nonsynonymous (`beta`) rates.
pub trait LikelihoodEngine: Sync {
  type Message: TreeMessage;
  type Model: Debug + Send + Sync;
  type ModelCache: Send;

  /// A private memoizing model constructor. Each worker owns one.
  fn new_model_cache(&self) -> Self::ModelCache;

  fn model(&self, cache: &mut Self::ModelCache, alpha: f64, beta: f64) -> Result<Arc<Self::Model>, Report>;

  /// Computes and stores the messages of all nodes of the subtree rooted at `root`, children before parents.
  /// `root` must not have a parent. Nodes without children keep their current message.
  fn felsenstein(
    &self,
    tree: &mut Tree<Self::Message>,
    root: usize,
    models: &ModelAssignment<Self::Model>,
  ) -> Result<(), Report>;

  /// Message standing in for the parent of the tree root
  fn root_parent_message(&self, num_sites: usize) -> Self::Message;

  fn combine(&self, message: &mut Self::Message, parent_message: &Self::Message) -> Result<(), Report>;

  fn site_log_likelihoods(&self, message: &Self::Message) -> Result<Array1<f64>, Report>;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tags::node_groups::TagAssignment;
  use crate::tags::tag_resolver::SubstringTagResolver;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_model_assignment_by_group_uses_background_last() -> Result<(), Report> {
    let mut tree = Tree::new("root", ());
    tree.add_child(0, "a{G1}", 0.1, ())?;
    tree.add_child(0, "b", 0.1, ())?;
    let node_groups = NodeGroups::resolve(&tree, &TagAssignment::new(["{G1}"])?, &SubstringTagResolver)?;

    let models = [Arc::new("foreground"), Arc::new("background")];
    let assignment = ModelAssignment::ByGroup {
      node_groups: &node_groups,
      models: &models,
    };
    assert_eq!("foreground", *assignment.model_for(1)?);
    assert_eq!("background", *assignment.model_for(2)?);
    Ok(())
  }

  #[test]
  fn test_model_assignment_fails_on_missing_model() -> Result<(), Report> {
    let mut tree = Tree::new("root", ());
    tree.add_child(0, "b", 0.1, ())?;
    let node_groups = NodeGroups::resolve(&tree, &TagAssignment::new(["{G1}"])?, &SubstringTagResolver)?;

    let models = [Arc::new(1)];
    let assignment = ModelAssignment::ByGroup {
      node_groups: &node_groups,
      models: &models,
    };
    assert!(assignment.model_for(1).is_err());
    Ok(())
  }
}
