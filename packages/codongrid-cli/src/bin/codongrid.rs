use codongrid::commands::grid::run_grid_command::run_grid_command;
use codongrid::utils::global_init::global_init;
use codongrid_cli::cli::codongrid_cli::{codongrid_parse_cli_args, generate_shell_completions, CodongridCommands};
use ctor::ctor;
use eyre::Report;
use log::info;

#[ctor]
fn init() {
  global_init();
}

fn main() -> Result<(), Report> {
  let args = codongrid_parse_cli_args()?;

  info!("{:#?}", &args);

  match args.command {
    CodongridCommands::Grid(grid_args) => {
      run_grid_command(&grid_args, args.jobs.jobs)?;
    }
    CodongridCommands::Completions { shell } => {
      generate_shell_completions(shell)?;
    }
  }

  Ok(())
}
