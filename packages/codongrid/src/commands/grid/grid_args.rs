use crate::evaluate::strategy::EvaluationStrategy;
use clap::{Parser, ValueHint};
use std::fmt::Debug;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct CodongridGridArgs {
  /// Path to a FASTA file with aligned coding sequences
  ///
  /// Sequence names must match the leaf names of the tree. Use "-" to read from standard input.
  #[clap(value_hint = ValueHint::FilePath)]
  #[clap(display_order = 1)]
  pub input_fasta: PathBuf,

  /// Path to the tree in Newick format
  #[clap(long, short = 't')]
  #[clap(value_hint = ValueHint::FilePath)]
  pub tree: PathBuf,

  /// Branch tags, comma-separated. A branch belongs to the group of the first tag contained in the name of the node
  /// below it, or to the background group if its name contains none.
  ///
  /// Example: '--tags {G1},{G2}'
  #[clap(long, required = true, value_delimiter = ',')]
  pub tags: Vec<String>,

  /// Number of intervals of the alpha axis and of each tagged omega axis
  #[clap(long, default_value_t = 6)]
  pub foreground_resolution: usize,

  /// Number of intervals of the background omega axis
  #[clap(long, default_value_t = 4)]
  pub background_resolution: usize,

  /// How to evaluate the grid
  #[clap(long, value_enum, default_value_t = EvaluationStrategy::default())]
  pub strategy: EvaluationStrategy,

  /// Nucleotide exchangeabilities AC,AG,AT,CG,CT,GT of the codon model. Equal rates if not specified.
  #[clap(long, value_delimiter = ',')]
  pub nuc_rates: Option<Vec<f64>>,

  /// Write normalized conditional likelihoods (largest value of each site is 1) instead of log-likelihoods
  #[clap(long)]
  pub normalized: bool,

  /// Path to output JSON file. Use "-" or omit to write to standard output.
  #[clap(long, short = 'o')]
  #[clap(value_hint = ValueHint::AnyPath)]
  pub output: Option<PathBuf>,
}
