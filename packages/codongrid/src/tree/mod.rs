pub mod create_tree_from_nwk;
pub mod tree;
