use crate::make_error;
use crate::tags::tag_resolver::TagResolver;
use crate::tree::tree::{Tree, TreeMessage};
use eyre::{Report, WrapErr};
use itertools::Itertools;

/// Ordered list of branch tags. The position of a tag (1-based) is its group index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagAssignment {
  tags: Vec<String>,
}

impl TagAssignment {
  pub fn new(tags: impl IntoIterator<Item = impl AsRef<str>>) -> Result<Self, Report> {
    let tags = tags.into_iter().map(|tag| tag.as_ref().to_owned()).collect_vec();
    if tags.is_empty() {
      return make_error!("At least one branch tag is required");
    }
    if let Some(tag) = tags.iter().find(|tag| tag.is_empty()) {
      return make_error!("Branch tags must not be empty, but found '{tag}'");
    }
    if let Some(dup) = tags.iter().duplicates().next() {
      return make_error!("Branch tag '{dup}' is given more than once");
    }
    Ok(Self { tags })
  }

  #[inline]
  pub fn tags(&self) -> &[String] {
    &self.tags
  }

  #[inline]
  pub fn num_groups(&self) -> usize {
    self.tags.len()
  }

  #[inline]
  pub fn background_group(&self) -> usize {
    self.tags.len() + 1
  }
}

/// Group index of every node of a tree, by arena index. Resolved once per tree and shared by all replicas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeGroups {
  groups: Vec<usize>,
  num_groups: usize,
  root: usize,
}

impl NodeGroups {
  /// Resolves the group of every node. A resolver answer outside of `1..=num_groups + 1` is an error: it means the
  /// tag assignment does not match the tree, and there is no sensible group to fall back to.
  pub fn resolve<M: TreeMessage>(
    tree: &Tree<M>,
    tags: &TagAssignment,
    resolver: &impl TagResolver,
  ) -> Result<Self, Report> {
    let num_groups = tags.num_groups();
    let groups = tree
      .nodes()
      .iter()
      .map(|node| {
        let group = resolver
          .resolve(node.name(), tags.tags())
          .wrap_err_with(|| format!("When resolving tag group of node '{}'", node.name()))?;
        if group == 0 || group > tags.background_group() {
          return make_error!(
            "Node '{}' resolved to group {group}, but groups must be within 1..={}",
            node.name(),
            tags.background_group()
          );
        }
        Ok(group)
      })
      .collect::<Result<Vec<_>, Report>>()?;

    Ok(Self {
      groups,
      num_groups,
      root: tree.root(),
    })
  }

  #[inline]
  pub fn group(&self, index: usize) -> usize {
    self.groups[index]
  }

  #[inline]
  pub const fn num_groups(&self) -> usize {
    self.num_groups
  }

  #[inline]
  pub fn as_slice(&self) -> &[usize] {
    &self.groups
  }

  #[inline]
  pub const fn is_background(&self, group: usize) -> bool {
    group > self.num_groups
  }

  /// Whether any branch is outside of all tagged groups. The root has no branch above it and is not considered.
  pub fn has_background(&self) -> bool {
    self
      .groups
      .iter()
      .enumerate()
      .any(|(index, &group)| index != self.root && self.is_background(group))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tags::tag_resolver::SubstringTagResolver;
  use pretty_assertions::assert_eq;

  struct RejectingResolver;

  impl TagResolver for RejectingResolver {
    fn resolve(&self, name: &str, _: &[String]) -> Result<usize, Report> {
      if name == "bad" {
        make_error!("Unknown tag in '{name}'")
      } else {
        Ok(1)
      }
    }
  }

  struct OutOfRangeResolver;

  impl TagResolver for OutOfRangeResolver {
    fn resolve(&self, _: &str, tags: &[String]) -> Result<usize, Report> {
      Ok(tags.len() + 2)
    }
  }

  fn small_tree() -> Result<Tree<()>, Report> {
    let mut tree = Tree::new("root", ());
    tree.add_child(0, "a{G1}", 0.1, ())?;
    tree.add_child(0, "bad", 0.1, ())?;
    Ok(tree)
  }

  #[test]
  fn test_node_groups_root_does_not_count_as_background() -> Result<(), Report> {
    let mut tree = Tree::new("root", ());
    tree.add_child(0, "a{G1}", 0.1, ())?;
    tree.add_child(0, "b{G1}", 0.1, ())?;
    let groups = NodeGroups::resolve(&tree, &TagAssignment::new(["{G1}"])?, &SubstringTagResolver)?;
    assert_eq!(&[2, 1, 1], groups.as_slice());
    assert!(!groups.has_background());
    Ok(())
  }

  #[test]
  fn test_node_groups_detects_background() -> Result<(), Report> {
    let tree = small_tree()?;
    let groups = NodeGroups::resolve(&tree, &TagAssignment::new(["{G1}"])?, &SubstringTagResolver)?;
    assert!(groups.has_background());
    Ok(())
  }

  #[test]
  fn test_node_groups_propagates_resolver_failure() -> Result<(), Report> {
    let tree = small_tree()?;
    let result = NodeGroups::resolve(&tree, &TagAssignment::new(["{G1}"])?, &RejectingResolver);
    assert!(result.is_err());
    Ok(())
  }

  #[test]
  fn test_node_groups_rejects_out_of_range_group() -> Result<(), Report> {
    let tree = small_tree()?;
    let result = NodeGroups::resolve(&tree, &TagAssignment::new(["{G1}"])?, &OutOfRangeResolver);
    assert!(result.is_err());
    Ok(())
  }

  #[test]
  fn test_tag_assignment_rejects_duplicates_and_empty() {
    assert!(TagAssignment::new(Vec::<String>::new()).is_err());
    assert!(TagAssignment::new(["{G1}", "{G1}"]).is_err());
    assert!(TagAssignment::new(["{G1}", ""]).is_err());
  }
}
