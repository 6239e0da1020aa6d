pub mod grid_args;
pub mod run_grid_command;
