use crate::io::nwk::{read_nwk, read_nwk_file, NwkTree};
use crate::make_error;
use crate::tree::tree::Tree;
use eyre::{Report, WrapErr};
use std::io::Cursor;
use std::path::Path;

pub fn create_tree_from_nwk_file(filepath: impl AsRef<Path>) -> Result<Tree<()>, Report> {
  let filepath = filepath.as_ref();
  let nwk_tree = read_nwk_file(filepath)?;
  create_tree_from_nwk(&nwk_tree).wrap_err_with(|| format!("When reading tree from '{}'", filepath.display()))
}

pub fn create_tree_from_nwk_str(nwk_string: impl AsRef<str>) -> Result<Tree<()>, Report> {
  let nwk_string = nwk_string.as_ref();
  read_nwk(Cursor::new(nwk_string))
    .and_then(|nwk_tree| create_tree_from_nwk(&nwk_tree))
    .wrap_err_with(|| format!("When reading Newick string:\n    '{nwk_string}'"))
}

/// Converts a parsed Newick graph into the tree arena. Nodes are indexed in preorder, children keep the order in
/// which they appear in the Newick string.
pub fn create_tree_from_nwk(nwk_tree: &NwkTree) -> Result<Tree<()>, Report> {
  let g = &nwk_tree.g;

  // Outgoing edges of every node, in insertion order
  let mut children = vec![vec![]; g.node_count()];
  let mut has_parent = vec![false; g.node_count()];
  for edge in g.raw_edges() {
    let (source, target) = (edge.source(), edge.target());
    children[source.index()].push((target, f64::from(edge.weight)));
    if has_parent[target.index()] {
      return make_error!("Node '{}' has more than one parent", g[target]);
    }
    has_parent[target.index()] = true;
  }

  let roots = g.node_indices().filter(|idx| !has_parent[idx.index()]).collect::<Vec<_>>();
  let nwk_root = match roots.as_slice() {
    [root] => *root,
    [] => return make_error!("Tree has no root"),
    _ => return make_error!("Tree has {} roots, but exactly one is expected", roots.len()),
  };

  let mut tree = Tree::new(&g[nwk_root], ());
  let mut stack = children[nwk_root.index()]
    .iter()
    .rev()
    .map(|&(nwk_child, length)| (nwk_child, length, tree.root()))
    .collect::<Vec<_>>();

  while let Some((nwk_idx, length, parent)) = stack.pop() {
    let index = tree.add_child(parent, &g[nwk_idx], length, ())?;
    stack.extend(
      children[nwk_idx.index()]
        .iter()
        .rev()
        .map(|&(nwk_child, length)| (nwk_child, length, index)),
    );
  }

  tree.validate()?;
  Ok(tree)
}
