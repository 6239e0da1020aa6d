pub mod codongrid_cli;
pub mod jobs;
pub mod verbosity;
