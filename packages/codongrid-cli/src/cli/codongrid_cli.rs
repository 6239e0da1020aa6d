use crate::cli::jobs::Jobs;
use crate::cli::verbosity::Verbosity;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use codongrid::commands::grid::grid_args::CodongridGridArgs;
use codongrid::utils::global_init::setup_logger;
use eyre::Report;
use std::fmt::Debug;
use std::io;

#[derive(Parser, Debug)]
#[clap(name = "codongrid")]
#[clap(author, version)]
#[clap(verbatim_doc_comment)]
/// Per-site conditional likelihoods on a grid of codon selection parameters, for trees with tagged branch groups
pub struct CodongridArgs {
  #[clap(subcommand)]
  pub command: CodongridCommands,

  #[clap(flatten)]
  pub jobs: Jobs,

  #[clap(flatten)]
  pub verbosity: Verbosity,
}

#[derive(Subcommand, Debug)]
#[clap(verbatim_doc_comment)]
pub enum CodongridCommands {
  /// Generate shell completions.
  ///
  /// This will print the completions file contents to the console. Refer to your shell's documentation on how to install the completions.
  ///
  /// Example for Ubuntu Linux:
  ///
  ///    codongrid completions bash > ~/.local/share/bash-completion/codongrid
  ///
  Completions {
    /// Name of the shell to generate appropriate completions
    #[clap(value_name = "SHELL", value_enum, default_value_t = Shell::Bash)]
    shell: Shell,
  },

  /// Evaluates per-site log-likelihoods at every point of a grid over alpha and the omega of each branch group. The output is a JSON document with the grid axes, the parameters of every grid point, and the (grid points x sites) matrix.
  Grid(CodongridGridArgs),
}

pub fn generate_shell_completions(shell: Shell) -> Result<(), Report> {
  let mut command = CodongridArgs::command();
  let bin_name = command.get_name().to_owned();
  generate(shell, &mut command, bin_name, &mut io::stdout());
  Ok(())
}

pub fn codongrid_parse_cli_args() -> Result<CodongridArgs, Report> {
  let args = CodongridArgs::parse();
  setup_logger(args.verbosity.filter_level());
  Ok(args)
}

#[cfg(test)]
mod tests {
  use super::*;
  use codongrid::evaluate::strategy::EvaluationStrategy;
  use log::LevelFilter;
  use pretty_assertions::assert_eq;

  fn parse(args: &[&str]) -> Result<CodongridArgs, Report> {
    Ok(CodongridArgs::try_parse_from(args)?)
  }

  #[test]
  fn test_cli_parses_grid_command() -> Result<(), Report> {
    let args = parse(&[
      "codongrid",
      "grid",
      "--tree",
      "tree.nwk",
      "--tags",
      "{G1},{G2}",
      "--strategy",
      "memoized-parallel",
      "-j",
      "3",
      "aln.fasta",
    ])?;
    let CodongridCommands::Grid(grid) = args.command else {
      panic!("expected grid command");
    };
    assert_eq!(vec!["{G1}".to_owned(), "{G2}".to_owned()], grid.tags);
    assert_eq!(EvaluationStrategy::MemoizedParallel, grid.strategy);
    assert_eq!(6, grid.foreground_resolution);
    assert_eq!(4, grid.background_resolution);
    assert_eq!(3, args.jobs.jobs);
    Ok(())
  }

  #[test]
  fn test_cli_verbosity_flags() -> Result<(), Report> {
    let base = ["codongrid", "completions"];
    assert_eq!(LevelFilter::Warn, parse(&base)?.verbosity.filter_level());
    assert_eq!(LevelFilter::Debug, parse(&[&base[..], &["-vv"]].concat())?.verbosity.filter_level());
    assert_eq!(LevelFilter::Trace, parse(&[&base[..], &["-vvvvv"]].concat())?.verbosity.filter_level());
    assert_eq!(LevelFilter::Off, parse(&[&base[..], &["-qqqq"]].concat())?.verbosity.filter_level());
    assert_eq!(LevelFilter::Off, parse(&[&base[..], &["--silent"]].concat())?.verbosity.filter_level());
    assert_eq!(
      LevelFilter::Info,
      parse(&[&base[..], &["--verbosity", "info"]].concat())?.verbosity.filter_level()
    );
    Ok(())
  }
}
