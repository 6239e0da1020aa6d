use crate::tags::node_groups::NodeGroups;
use crate::tree::tree::{Tree, TreeMessage};
use serde::Serialize;

/// Root of a maximal subtree in which every branch belongs to the same tag group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PureSubclade {
  pub node: usize,
  /// Group shared by all branches below `node`
  pub group: usize,
}

#[derive(Clone, Copy, Debug)]
struct Purity {
  is_pure: bool,
  group: usize,
}

/// Finds the roots of tag-homogeneous subtrees, in discovery order (post-order, children left to right).
///
/// A leaf is pure. An internal node whose children are all pure with the same group `t` is pure if its own group
/// is `t`; otherwise it is the top of a homogeneous region and is recorded. Any other internal node is impure, and
/// its pure non-leaf children are recorded. Single leaves are never recorded.
pub fn detect_pure_subclades<M: TreeMessage>(tree: &Tree<M>, groups: &NodeGroups) -> Vec<PureSubclade> {
  let mut purity: Vec<Option<Purity>> = vec![None; tree.len()];
  let mut subclades = vec![];

  for index in tree.postorder(tree.root()) {
    let node = tree.node(index);
    let own = groups.group(index);

    if node.is_leaf() {
      purity[index] = Some(Purity {
        is_pure: true,
        group: own,
      });
      continue;
    }

    let children = node
      .children()
      .iter()
      .map(|&child| (child, purity[child].unwrap_or(Purity { is_pure: false, group: 0 })))
      .collect::<Vec<_>>();

    let (_, first) = children[0];
    let homogeneous = children.iter().all(|(_, p)| p.is_pure && p.group == first.group);

    let is_pure = if homogeneous {
      if own == first.group {
        true
      } else {
        subclades.push(PureSubclade {
          node: index,
          group: first.group,
        });
        false
      }
    } else {
      subclades.extend(
        children
          .iter()
          .filter(|(child, p)| p.is_pure && !tree.node(*child).is_leaf())
          .map(|&(child, p)| PureSubclade {
            node: child,
            group: p.group,
          }),
      );
      false
    };

    purity[index] = Some(Purity { is_pure, group: own });
  }

  subclades
}
