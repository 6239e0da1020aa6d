use eyre::Report;

/// Joins the chain of error contexts into a single line, outermost context first
pub fn report_to_string(report: &Report) -> String {
  report
    .chain()
    .map(std::string::ToString::to_string)
    .collect::<Vec<String>>()
    .join(": ")
}

#[macro_export(local_inner_macros)]
macro_rules! make_error {
  ($($arg:tt)*) => {
    {
      Err(eyre::eyre!(std::format!($($arg)*)))
    }
  };
}

pub use make_error;

#[macro_export(local_inner_macros)]
macro_rules! make_internal_error {
  ($($arg:tt)*) => {
    {
      let msg_external = std::format!($($arg)*);
      let msg = std::format!("{msg_external}. This is an internal error. Please report it to developers.");
      Err(eyre::eyre!(msg))
    }
  };
}

pub use make_internal_error;

#[macro_export(local_inner_macros)]
macro_rules! make_internal_report {
  ($($arg:tt)*) => {
    {
      let msg_external = std::format!($($arg)*);
      let msg = std::format!("{msg_external}. This is an internal error. Please report it to developers.");
      eyre::eyre!(msg)
    }
  };
}

pub use make_internal_report;

#[cfg(test)]
mod tests {
  use super::*;
  use eyre::WrapErr;
  use pretty_assertions::assert_eq;

  fn failing_grid_phase() -> Result<(), Report> {
    make_error!("Node 'X' does not resolve to any tag group")
  }

  #[test]
  fn test_report_to_string_joins_contexts() {
    let report = failing_grid_phase().wrap_err("When preparing the grid").unwrap_err();
    assert_eq!(
      "When preparing the grid: Node 'X' does not resolve to any tag group",
      report_to_string(&report)
    );
  }

  #[test]
  fn test_internal_report_mentions_developers() {
    let report = make_internal_report!("Cache key {} inserted twice", 3);
    assert!(report.to_string().ends_with("Please report it to developers."));
  }
}
