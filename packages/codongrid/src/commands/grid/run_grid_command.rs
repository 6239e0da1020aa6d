use crate::commands::grid::grid_args::CodongridGridArgs;
use crate::evaluate::run_grid::{run_grid, GridOptions, GridRun};
use crate::evaluate::strategy::EvaluationStrategy;
use crate::grid::axis::GridAxis;
use crate::grid::codon_params::{CodonParams, ParamKind};
use crate::grid::prepare_grid::GridResolution;
use crate::io::fasta::read_many_fasta;
use crate::io::json::{json_write_file, JsonPretty};
use crate::likelihood::codon_engine::CodonEngine;
use crate::likelihood::codon_model::nuc_matrix_from_exchangeabilities;
use crate::subclades::message_cache::CacheStats;
use crate::tags::node_groups::TagAssignment;
use crate::tags::tag_resolver::SubstringTagResolver;
use crate::tree::create_tree_from_nwk::create_tree_from_nwk_file;
use eyre::{Report, WrapErr};
use log::info;
use ndarray::Array2;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridOutputTimings {
  pub subclade_cache_seconds: f64,
  pub grid_seconds: f64,
}

/// JSON document written by the `grid` command
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridOutput<'a> {
  pub param_kinds: &'a [ParamKind],
  pub alpha_grid: &'a GridAxis,
  pub omega_grid: &'a GridAxis,
  pub background_grid: &'a GridAxis,
  pub has_background: bool,
  pub codon_params: &'a [CodonParams],
  pub normalized: bool,
  /// One row per grid point, one column per codon site
  pub conditionals: Vec<Vec<f64>>,
  pub strategy: EvaluationStrategy,
  pub cache_stats: CacheStats,
  pub timings: GridOutputTimings,
}

impl<'a> GridOutput<'a> {
  pub fn new(run: &'a GridRun, normalized: bool) -> Result<Self, Report> {
    let conditionals = if normalized {
      run.normalized_conditionals()?
    } else {
      run.conditionals().clone()
    };
    let timings = &run.evaluation.timings;

    Ok(Self {
      param_kinds: &run.setup.param_kinds,
      alpha_grid: &run.setup.alpha_grid,
      omega_grid: &run.setup.omega_grid,
      background_grid: &run.setup.background_grid,
      has_background: run.setup.has_background,
      codon_params: &run.setup.codon_params,
      normalized,
      conditionals: conditionals.rows().into_iter().map(|row| row.to_vec()).collect(),
      strategy: run.evaluation.strategy,
      cache_stats: run.evaluation.cache_stats,
      timings: GridOutputTimings {
        subclade_cache_seconds: timings.subclade_cache.as_secs_f64(),
        grid_seconds: timings.grid.as_secs_f64(),
      },
    })
  }
}

pub fn run_grid_command(args: &CodongridGridArgs, jobs: usize) -> Result<(), Report> {
  let CodongridGridArgs {
    input_fasta,
    tree,
    tags,
    foreground_resolution,
    background_resolution,
    strategy,
    nuc_rates,
    normalized,
    output,
  } = args;

  let tags = TagAssignment::new(tags)?;
  let tree = create_tree_from_nwk_file(tree)?;
  let records = read_many_fasta(input_fasta)?;
  info!("Read {} sequences and a tree of {} nodes", records.len(), tree.len());

  let nuc_matrix = match nuc_rates {
    Some(rates) => nuc_matrix_from_exchangeabilities(rates)?,
    None => Array2::ones((4, 4)),
  };
  let engine = CodonEngine::from_alignment(nuc_matrix, &records)?;
  let mut tree = engine
    .attach_alignment(&tree, &records)
    .wrap_err("When matching tree leaves to sequences")?;

  let options = GridOptions {
    resolution: GridResolution {
      foreground: *foreground_resolution,
      background: *background_resolution,
      ..GridResolution::default()
    },
    strategy: *strategy,
    jobs,
  };
  let run = run_grid(&engine, &mut tree, &tags, &SubstringTagResolver, &options)?;

  let output = output.clone().unwrap_or_else(|| PathBuf::from("-"));
  json_write_file(&output, &GridOutput::new(&run, *normalized)?, JsonPretty(true))
}
