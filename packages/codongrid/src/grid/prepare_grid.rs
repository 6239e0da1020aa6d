use crate::grid::axis::{GridAxis, GridBounds};
use crate::grid::codon_params::{param_kinds, CodonParams, ParamKind};
use crate::tags::node_groups::{NodeGroups, TagAssignment};
use crate::tags::tag_resolver::TagResolver;
use crate::tree::tree::{Tree, TreeMessage};
use eyre::{Report, WrapErr};
use itertools::Itertools;
use log::info;
use ndarray::Array2;
use serde::Serialize;
use smart_default::SmartDefault;

/// Resolution and value ranges of the parameter grid
#[derive(Clone, Copy, Debug, PartialEq, Serialize, SmartDefault)]
pub struct GridResolution {
  /// Number of intervals of the alpha axis and of each tagged omega axis
  #[default = 6]
  pub foreground: usize,

  /// Number of intervals of the background omega axis
  #[default = 4]
  pub background: usize,

  pub bounds: GridBounds,
}

/// Everything the grid evaluation needs, computed once per run
#[derive(Clone, Debug)]
pub struct GridSetup {
  /// Zero-filled (grid points × sites) output matrix
  pub conditionals: Array2<f64>,
  /// Grid points in canonical row order
  pub codon_params: Vec<CodonParams>,
  pub alpha_grid: GridAxis,
  pub omega_grid: GridAxis,
  pub background_grid: GridAxis,
  pub param_kinds: Vec<ParamKind>,
  pub has_background: bool,
  pub num_groups: usize,
  pub num_sites: usize,
  pub node_groups: NodeGroups,
}

impl GridSetup {
  /// Axis used for the omega of a group
  pub fn axis_for_group(&self, group: usize) -> &GridAxis {
    if self.node_groups.is_background(group) {
      &self.background_grid
    } else {
      &self.omega_grid
    }
  }
}

/// Cartesian product of the axes. The first axis is outermost, the last one varies fastest.
pub fn cartesian_params(axes: &[&GridAxis]) -> Result<Vec<CodonParams>, Report> {
  axes
    .iter()
    .map(|axis| axis.values().iter().copied())
    .multi_cartesian_product()
    .map(CodonParams::new)
    .collect()
}

pub fn prepare_grid<M: TreeMessage>(
  tree: &Tree<M>,
  tags: &TagAssignment,
  resolver: &impl TagResolver,
  resolution: &GridResolution,
) -> Result<GridSetup, Report> {
  let node_groups = NodeGroups::resolve(tree, tags, resolver).wrap_err("When assigning tree nodes to tag groups")?;
  let num_groups = tags.num_groups();
  let has_background = node_groups.has_background();
  let num_sites = tree.num_sites();

  let GridBounds {
    alpha,
    omega,
    background,
  } = &resolution.bounds;
  let alpha_grid = alpha.build(resolution.foreground).wrap_err("When building alpha grid")?;
  let omega_grid = omega.build(resolution.foreground).wrap_err("When building omega grid")?;
  let background_grid = background
    .build(resolution.background)
    .wrap_err("When building background omega grid")?;

  let axes = std::iter::once(&alpha_grid)
    .chain(std::iter::repeat(&omega_grid).take(num_groups))
    .chain(has_background.then_some(&background_grid))
    .collect_vec();
  let codon_params = cartesian_params(&axes)?;

  info!(
    "Grid: {} points ({} groups{}), {num_sites} sites",
    codon_params.len(),
    num_groups,
    if has_background { " + background" } else { "" }
  );

  Ok(GridSetup {
    conditionals: Array2::zeros((codon_params.len(), num_sites)),
    codon_params,
    alpha_grid,
    omega_grid,
    background_grid,
    param_kinds: param_kinds(num_groups, has_background),
    has_background,
    num_groups,
    num_sites,
    node_groups,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tags::tag_resolver::SubstringTagResolver;
  use approx::assert_abs_diff_eq;
  use pretty_assertions::assert_eq;

  fn tree_with_leaves(names: &[&str]) -> Result<Tree<()>, Report> {
    let mut tree = Tree::new("root", ());
    let inner = tree.add_child(0, "inner", 0.1, ())?;
    for (i, name) in names.iter().enumerate() {
      let parent = if i % 2 == 0 { 0 } else { inner };
      tree.add_child(parent, name, 0.1, ())?;
    }
    Ok(tree)
  }

  #[test]
  fn test_prepare_grid_two_groups_without_background() -> Result<(), Report> {
    let mut tree = Tree::new("root", ());
    let left = tree.add_child(0, "L{G1}", 0.1, ())?;
    tree.add_child(left, "A{G1}", 0.1, ())?;
    tree.add_child(left, "B{G1}", 0.1, ())?;
    let right = tree.add_child(0, "R{G2}", 0.1, ())?;
    tree.add_child(right, "C{G2}", 0.1, ())?;
    tree.add_child(right, "D{G2}", 0.1, ())?;

    let resolution = GridResolution {
      foreground: 1,
      ..GridResolution::default()
    };
    let setup = prepare_grid(&tree, &TagAssignment::new(["{G1}", "{G2}"])?, &SubstringTagResolver, &resolution)?;

    assert!(!setup.has_background);
    assert_eq!(2, setup.num_groups);
    assert_eq!(2, setup.alpha_grid.len());
    assert_eq!(8, setup.codon_params.len());
    assert_eq!((8, 0), setup.conditionals.dim());
    assert_eq!(
      vec![ParamKind::Alpha, ParamKind::Omega(1), ParamKind::Omega(2)],
      setup.param_kinds
    );

    let a = setup.alpha_grid.values();
    let w = setup.omega_grid.values();
    assert_eq!(&[a[0], w[0], w[0]], setup.codon_params[0].values());
    assert_eq!(&[a[0], w[0], w[1]], setup.codon_params[1].values());
    assert_eq!(&[a[0], w[1], w[0]], setup.codon_params[2].values());
    assert_eq!(&[a[1], w[1], w[1]], setup.codon_params[7].values());
    Ok(())
  }

  #[test]
  fn test_prepare_grid_appends_background_axis() -> Result<(), Report> {
    let tree = tree_with_leaves(&["a{G1}", "b{G1}", "c"])?;
    let resolution = GridResolution {
      foreground: 2,
      background: 3,
      ..GridResolution::default()
    };
    let setup = prepare_grid(&tree, &TagAssignment::new(["{G1}"])?, &SubstringTagResolver, &resolution)?;

    assert!(setup.has_background);
    assert_eq!(3 * 3 * 4, setup.codon_params.len());
    assert!(setup.codon_params.iter().all(|params| params.values().len() == 3));
    assert_eq!(Some(&ParamKind::OmegaBackground), setup.param_kinds.last());
    let last = setup.codon_params[setup.codon_params.len() - 1].values();
    assert_abs_diff_eq!(13.0, last[0], epsilon = 1e-9);
    assert_abs_diff_eq!(13.0, last[1], epsilon = 1e-9);
    assert_abs_diff_eq!(6.0, last[2], epsilon = 1e-9);
    Ok(())
  }

  #[test]
  fn test_prepare_grid_param_count_formula() -> Result<(), Report> {
    let tree = tree_with_leaves(&["a{G1}", "b{G2}", "c{G3}", "d"])?;
    let resolution = GridResolution {
      foreground: 2,
      background: 1,
      ..GridResolution::default()
    };
    let setup = prepare_grid(
      &tree,
      &TagAssignment::new(["{G1}", "{G2}", "{G3}"])?,
      &SubstringTagResolver,
      &resolution,
    )?;
    let expected = setup.alpha_grid.len() * setup.omega_grid.len().pow(3) * setup.background_grid.len();
    assert_eq!(expected, setup.codon_params.len());
    Ok(())
  }
}
