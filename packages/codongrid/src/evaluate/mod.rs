pub mod evaluate_grid;
pub mod grid_worker;
pub mod partition;
pub mod run_grid;
pub mod strategy;
