use eyre::Report;

/// Maps a node name onto a tag group.
///
/// Groups are 1-based: `1..=tags.len()` for the tagged groups, `tags.len() + 1` for background.
pub trait TagResolver: Sync {
  fn resolve(&self, name: &str, tags: &[String]) -> Result<usize, Report>;
}

/// Resolves a node to the first tag contained in its name, e.g. `"human{G1}"` with tags `["{G1}", "{G2}"]` is in
/// group 1. Names without any tag are background.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubstringTagResolver;

impl TagResolver for SubstringTagResolver {
  fn resolve(&self, name: &str, tags: &[String]) -> Result<usize, Report> {
    Ok(
      tags
        .iter()
        .position(|tag| name.contains(tag.as_str()))
        .map_or(tags.len() + 1, |i| i + 1),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rstest]
  #[case("human{G1}", 1)]
  #[case("mouse{G2}", 2)]
  #[case("both{G2}{G1}", 1)]
  #[case("rat", 3)]
  #[case("", 3)]
  fn test_substring_tag_resolver(#[case] name: &str, #[case] expected: usize) -> Result<(), Report> {
    let tags = vec!["{G1}".to_owned(), "{G2}".to_owned()];
    assert_eq!(expected, SubstringTagResolver.resolve(name, &tags)?);
    Ok(())
  }
}
