use crate::io::fasta::FastaRecord;
use crate::likelihood::codon_model::{CodonModel, CodonModelCache, CodonModelParams};
use crate::likelihood::genetic_code::GeneticCode;
use crate::likelihood::message::CodonMessage;
use crate::likelihood::{LikelihoodEngine, ModelAssignment};
use crate::tree::tree::{Tree, TreeMessage};
use crate::{make_error, make_internal_error};
use eyre::{Report, WrapErr};
use itertools::Itertools;
use log::warn;
use ndarray::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Felsenstein pruning over codon states with per-site rescaling
#[derive(Clone, Debug)]
pub struct CodonEngine {
  code: Arc<GeneticCode>,
  params: CodonModelParams,
}

impl CodonEngine {
  pub fn new(code: Arc<GeneticCode>, params: CodonModelParams) -> Self {
    Self { code, params }
  }

  /// Engine for the standard genetic code, with F3x4 frequencies counted from the alignment
  pub fn from_alignment(nuc_matrix: Array2<f64>, records: &[FastaRecord]) -> Result<Self, Report> {
    let code = Arc::new(GeneticCode::standard());
    let params = CodonModelParams::from_alignment(&code, nuc_matrix, records.iter().map(|r| r.seq.as_str()))
      .wrap_err("When estimating codon frequencies from the alignment")?;
    Ok(Self::new(code, params))
  }

  #[inline]
  pub fn code(&self) -> &GeneticCode {
    &self.code
  }

  #[inline]
  pub fn params(&self) -> &CodonModelParams {
    &self.params
  }

  /// Copies the tree, with leaf messages from the sequences of the same name. Internal nodes receive
  /// uninformative placeholders until the first likelihood pass.
  pub fn attach_alignment(&self, tree: &Tree<()>, records: &[FastaRecord]) -> Result<Tree<CodonMessage>, Report> {
    let seqs: HashMap<&str, &str> = records
      .iter()
      .map(|record| (record.seq_name.as_str(), record.seq.as_str()))
      .collect();

    let lengths = records.iter().map(|record| record.seq.len()).unique().collect_vec();
    let seq_len = match lengths.as_slice() {
      [len] => *len,
      [] => return make_error!("Alignment contains no sequences"),
      _ => return make_error!("Sequences of the alignment differ in length: {}", lengths.iter().join(", ")),
    };
    if seq_len % 3 != 0 {
      warn!("Alignment length {seq_len} is not a multiple of 3; the trailing incomplete codon is ignored");
    }
    let num_sites = seq_len / 3;

    tree.map_messages(|node| {
      if node.is_leaf() {
        match seqs.get(node.name()) {
          Some(seq) => Ok(CodonMessage::from_sequence(&self.code, seq)),
          None => make_error!("Sequence for leaf '{}' is not found in the alignment", node.name()),
        }
      } else {
        Ok(CodonMessage::uninformative(num_sites, self.code.num_states()))
      }
    })
  }
}

impl LikelihoodEngine for CodonEngine {
  type Message = CodonMessage;
  type Model = CodonModel;
  type ModelCache = CodonModelCache;

  fn new_model_cache(&self) -> Self::ModelCache {
    CodonModelCache::new(Arc::clone(&self.code))
  }

  fn model(&self, cache: &mut Self::ModelCache, alpha: f64, beta: f64) -> Result<Arc<Self::Model>, Report> {
    cache.get(alpha, beta, &self.params)
  }

  fn felsenstein(
    &self,
    tree: &mut Tree<Self::Message>,
    root: usize,
    models: &ModelAssignment<Self::Model>,
  ) -> Result<(), Report> {
    if let Some(parent) = tree.node(root).parent() {
      return make_internal_error!("Likelihood pass started at node {root}, which is attached to parent {parent}");
    }

    let num_states = self.code.num_states();
    for index in tree.postorder(root) {
      let node = tree.node(index);
      if node.is_leaf() {
        continue;
      }

      let num_sites = tree.node(node.children()[0]).message.num_sites();
      let mut message = CodonMessage {
        partials: Array2::ones((num_sites, num_states)),
        log_scale: Array1::zeros(num_sites),
      };
      for &child in node.children() {
        let child = tree.node(child);
        let CodonMessage { partials, log_scale } = &child.message;
        if partials.dim() != (num_sites, num_states) {
          return make_internal_error!(
            "Message of node '{}' has shape {:?}, expected {:?}",
            child.name(),
            partials.dim(),
            (num_sites, num_states)
          );
        }
        let transition = models.model_for(child.index())?.transition(child.branch_length());
        message.partials *= &partials.dot(&transition.t());
        message.log_scale += log_scale;
      }
      message.rescale();
      tree.node_mut(index).message = message;
    }
    Ok(())
  }

  fn root_parent_message(&self, num_sites: usize) -> Self::Message {
    let freqs = self.params.codon_freqs();
    CodonMessage {
      partials: Array2::from_shape_fn((num_sites, freqs.len()), |(_, state)| freqs[state]),
      log_scale: Array1::zeros(num_sites),
    }
  }

  fn combine(&self, message: &mut Self::Message, parent_message: &Self::Message) -> Result<(), Report> {
    if message.partials.dim() != parent_message.partials.dim() {
      return make_internal_error!(
        "Cannot combine messages of shapes {:?} and {:?}",
        message.partials.dim(),
        parent_message.partials.dim()
      );
    }
    message.partials *= &parent_message.partials;
    message.log_scale += &parent_message.log_scale;
    Ok(())
  }

  fn site_log_likelihoods(&self, message: &Self::Message) -> Result<Array1<f64>, Report> {
    Ok(
      message
        .partials
        .sum_axis(Axis(1))
        .mapv(f64::ln)
        + &message.log_scale,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::io::fasta::read_many_fasta_str;
  use approx::assert_abs_diff_eq;
  use indoc::indoc;
  use pretty_assertions::assert_eq;

  fn cherry() -> Result<Tree<()>, Report> {
    let mut tree = Tree::new("root", ());
    tree.add_child(0, "A", 0.1, ())?;
    tree.add_child(0, "B", 0.1, ())?;
    Ok(tree)
  }

  fn root_log_likelihoods(engine: &CodonEngine, tree: &mut Tree<CodonMessage>) -> Result<Array1<f64>, Report> {
    let mut cache = engine.new_model_cache();
    let model = engine.model(&mut cache, 1.0, 0.5)?;
    let root = tree.root();
    engine.felsenstein(tree, root, &ModelAssignment::Uniform(model.as_ref()))?;
    let mut message = tree.node(root).message.clone();
    engine.combine(&mut message, &engine.root_parent_message(tree.num_sites()))?;
    engine.site_log_likelihoods(&message)
  }

  #[test]
  fn test_codon_engine_identical_sequences_are_more_likely() -> Result<(), Report> {
    let records = read_many_fasta_str(indoc! {r#"
      >A
      ATGAAA
      >B
      ATGTGG
    "#})?;
    let engine = CodonEngine::new(
      Arc::new(GeneticCode::standard()),
      CodonModelParams::uniform(&GeneticCode::standard())?,
    );
    let mut tree = engine.attach_alignment(&cherry()?, &records)?;
    let ll = root_log_likelihoods(&engine, &mut tree)?;

    assert_eq!(2, ll.len());
    assert!(ll[0] > ll[1]);
    assert!(ll.iter().all(|x| x.is_finite() && *x < 0.0));
    Ok(())
  }

  #[test]
  fn test_codon_engine_uninformative_site_has_zero_log_likelihood() -> Result<(), Report> {
    let records = read_many_fasta_str(indoc! {r#"
      >A
      NNN
      >B
      ---
    "#})?;
    let engine = CodonEngine::from_alignment(Array2::ones((4, 4)), &records)?;
    let mut tree = engine.attach_alignment(&cherry()?, &records)?;
    let ll = root_log_likelihoods(&engine, &mut tree)?;
    assert_abs_diff_eq!(0.0, ll[0], epsilon = 1e-10);
    Ok(())
  }

  #[test]
  fn test_codon_engine_rescaling_keeps_deep_trees_finite() -> Result<(), Report> {
    let mut tree = Tree::new("root", ());
    let mut parent = 0;
    let mut fasta = String::new();
    for i in 0..200 {
      tree.add_child(parent, format!("leaf{i}"), 0.5, ())?;
      parent = tree.add_child(parent, format!("inner{i}"), 0.5, ())?;
      fasta += &format!(">leaf{i}\n{}\n", if i % 2 == 0 { "ATG" } else { "TGG" });
    }
    tree.add_child(parent, "last", 0.5, ())?;
    fasta += ">last\nATG\n";

    let records = read_many_fasta_str(&fasta)?;
    let engine = CodonEngine::from_alignment(Array2::ones((4, 4)), &records)?;
    let mut tree = engine.attach_alignment(&tree, &records)?;
    let ll = root_log_likelihoods(&engine, &mut tree)?;
    assert!(ll[0].is_finite());
    assert!(ll[0] < -50.0);
    Ok(())
  }

  #[test]
  fn test_codon_engine_rejects_attached_start_node() -> Result<(), Report> {
    let records = read_many_fasta_str(">A\nATG\n>B\nATG\n")?;
    let engine = CodonEngine::from_alignment(Array2::ones((4, 4)), &records)?;
    let mut tree = engine.attach_alignment(&cherry()?, &records)?;
    let model = engine.model(&mut engine.new_model_cache(), 1.0, 1.0)?;
    assert!(engine.felsenstein(&mut tree, 1, &ModelAssignment::Uniform(model.as_ref())).is_err());
    Ok(())
  }

  #[test]
  fn test_attach_alignment_requires_all_leaves() -> Result<(), Report> {
    let records = read_many_fasta_str(">A\nATG\n")?;
    let engine = CodonEngine::from_alignment(Array2::ones((4, 4)), &records)?;
    assert!(engine.attach_alignment(&cherry()?, &records).is_err());
    Ok(())
  }
}
