use crate::io::fs::read_file_to_string;
use bio::io::newick;
use eyre::{Report, WrapErr};
use std::io::Read;
use std::path::Path;

pub type NwkTree = bio_types::phylogeny::Tree;

pub fn read_nwk_file(nwk_file_path: impl AsRef<Path>) -> Result<NwkTree, Report> {
  let nwk_file_path = nwk_file_path.as_ref();
  let nwk_str = read_file_to_string(nwk_file_path)?;
  read_nwk(nwk_str.as_bytes()).wrap_err_with(|| format!("When parsing Newick file {nwk_file_path:#?}"))
}

pub fn read_nwk(reader: impl Read) -> Result<NwkTree, Report> {
  let mut nwk_tree = newick::read(reader)?;

  // Unnamed nodes come out of the parser with a placeholder name
  nwk_tree.g.node_weights_mut().for_each(|weight| {
    if weight == "N/A" {
      *weight = String::new();
    }
  });

  Ok(nwk_tree)
}
