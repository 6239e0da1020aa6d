use crate::{make_error, make_internal_error};
use eyre::Report;
use itertools::Itertools;
use std::fmt::Debug;

/// Per-node state produced by a likelihood pass. Every node of a tree carries one.
pub trait TreeMessage: Clone + Debug + Send + Sync {
  /// Number of alignment sites the message covers
  fn num_sites(&self) -> usize;

  /// Approximate heap size, for cache diagnostics
  fn size_bytes(&self) -> usize {
    std::mem::size_of_val(self)
  }
}

impl TreeMessage for () {
  fn num_sites(&self) -> usize {
    0
  }
}

/// A node record in the tree arena. Parent and children are arena indices.
#[derive(Clone, Debug)]
pub struct TreeNode<M> {
  index: usize,
  name: String,
  branch_length: f64,
  parent: Option<usize>,
  children: Vec<usize>,
  pub message: M,
}

impl<M> TreeNode<M> {
  #[inline]
  pub const fn index(&self) -> usize {
    self.index
  }

  #[inline]
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Length of the branch above this node
  #[inline]
  pub const fn branch_length(&self) -> f64 {
    self.branch_length
  }

  #[inline]
  pub const fn parent(&self) -> Option<usize> {
    self.parent
  }

  #[inline]
  pub fn children(&self) -> &[usize] {
    &self.children
  }

  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }
}

/// Rooted tree stored as an arena of nodes.
///
/// Node indices are positions in the arena. They are assigned once, when a node is added, and `Clone` copies the
/// arena as is, so an index refers to the same node in every replica of a tree.
#[derive(Clone, Debug)]
pub struct Tree<M> {
  nodes: Vec<TreeNode<M>>,
  root: usize,
}

impl<M: TreeMessage> Tree<M> {
  pub fn new(root_name: impl AsRef<str>, root_message: M) -> Self {
    Self {
      nodes: vec![TreeNode {
        index: 0,
        name: root_name.as_ref().to_owned(),
        branch_length: 0.0,
        parent: None,
        children: vec![],
        message: root_message,
      }],
      root: 0,
    }
  }

  /// Appends a new node as the last child of `parent` and returns its index
  pub fn add_child(
    &mut self,
    parent: usize,
    name: impl AsRef<str>,
    branch_length: f64,
    message: M,
  ) -> Result<usize, Report> {
    if parent >= self.nodes.len() {
      return make_error!("When adding child '{}': parent node {parent} not found", name.as_ref());
    }
    let index = self.nodes.len();
    self.nodes.push(TreeNode {
      index,
      name: name.as_ref().to_owned(),
      branch_length,
      parent: Some(parent),
      children: vec![],
      message,
    });
    self.nodes[parent].children.push(index);
    Ok(index)
  }

  #[inline]
  pub const fn root(&self) -> usize {
    self.root
  }

  #[inline]
  pub fn node(&self, index: usize) -> &TreeNode<M> {
    &self.nodes[index]
  }

  #[inline]
  pub fn node_mut(&mut self, index: usize) -> &mut TreeNode<M> {
    &mut self.nodes[index]
  }

  #[inline]
  pub fn nodes(&self) -> &[TreeNode<M>] {
    &self.nodes
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn leaves(&self) -> impl Iterator<Item = &TreeNode<M>> {
    self.nodes.iter().filter(|node| node.is_leaf())
  }

  pub fn num_sites(&self) -> usize {
    self.nodes[self.root].message.num_sites()
  }

  /// Indices of the subtree rooted at `from`, children (left to right) before their parent
  pub fn postorder(&self, from: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(self.nodes.len());
    let mut stack = vec![(from, false)];
    while let Some((index, expanded)) = stack.pop() {
      if expanded {
        order.push(index);
      } else {
        stack.push((index, true));
        stack.extend(self.nodes[index].children.iter().rev().map(|&child| (child, false)));
      }
    }
    order
  }

  /// Runs `f` while `index` is detached from its parent.
  ///
  /// Only the back-reference of the node is cleared; the parent's child list is untouched. The link is restored
  /// before returning, whether `f` succeeded or not.
  pub fn with_detached<T>(
    &mut self,
    index: usize,
    f: impl FnOnce(&mut Self) -> Result<T, Report>,
  ) -> Result<T, Report> {
    let parent = self.nodes[index].parent.take();
    let result = f(self);
    self.nodes[index].parent = parent;
    result
  }

  /// Drops the child links of `index`, so that the node behaves as a leaf in subsequent passes. The nodes below stay
  /// in the arena and keep their indices.
  pub fn prune_below(&mut self, index: usize) {
    self.nodes[index].children.clear();
  }

  /// Deep copy of the subtree rooted at `index` as a standalone tree. The copy is re-indexed in preorder, with the
  /// subtree root at index 0 and without a parent.
  pub fn clone_subtree(&self, index: usize) -> Self {
    let mut nodes: Vec<TreeNode<M>> = Vec::new();
    let mut stack = vec![(index, None)];
    while let Some((original, parent)) = stack.pop() {
      let local = nodes.len();
      let source = &self.nodes[original];
      nodes.push(TreeNode {
        index: local,
        name: source.name.clone(),
        branch_length: source.branch_length,
        parent,
        children: vec![],
        message: source.message.clone(),
      });
      if let Some(parent) = parent {
        nodes[parent].children.push(local);
      }
      stack.extend(source.children.iter().rev().map(|&child| (child, Some(local))));
    }
    Self { nodes, root: 0 }
  }

  /// Creates a tree of the same shape with each node's message produced by `f`
  pub fn map_messages<N: TreeMessage>(
    &self,
    mut f: impl FnMut(&TreeNode<M>) -> Result<N, Report>,
  ) -> Result<Tree<N>, Report> {
    let nodes = self
      .nodes
      .iter()
      .map(|node| {
        Ok(TreeNode {
          index: node.index,
          name: node.name.clone(),
          branch_length: node.branch_length,
          parent: node.parent,
          children: node.children.clone(),
          message: f(node)?,
        })
      })
      .collect::<Result<Vec<_>, Report>>()?;
    Ok(Tree { nodes, root: self.root })
  }

  /// Parent and child links of every node, in arena order
  pub fn structure(&self) -> Vec<(Option<usize>, Vec<usize>)> {
    self
      .nodes
      .iter()
      .map(|node| (node.parent, node.children.clone()))
      .collect_vec()
  }

  /// Checks that parent and child links agree and that every node is reachable from the root exactly once
  pub fn validate(&self) -> Result<(), Report> {
    if self.nodes[self.root].parent.is_some() {
      return make_internal_error!("Root node {} has a parent", self.root);
    }
    for node in &self.nodes {
      for &child in &node.children {
        if self.nodes[child].parent != Some(node.index) {
          return make_internal_error!(
            "Node {child} is a child of {} but points to {:?}",
            node.index,
            self.nodes[child].parent
          );
        }
      }
    }
    let reachable = self.postorder(self.root).len();
    if reachable != self.nodes.len() {
      return make_error!("Tree has {} nodes, but only {reachable} are reachable from the root", self.nodes.len());
    }
    Ok(())
  }
}
