pub mod commands;
pub mod evaluate;
pub mod grid;
pub mod io;
pub mod likelihood;
pub mod subclades;
pub mod tags;
pub mod tree;
pub mod utils;
