pub mod axis;
pub mod codon_params;
pub mod normalize;
pub mod prepare_grid;
