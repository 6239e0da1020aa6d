use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{ArgAction, Args};
use itertools::Itertools;
use log::LevelFilter;

const LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Args, Debug, Clone)]
pub struct Verbosity {
  /// Set verbosity level of console output
  #[clap(long, global = true, value_parser = PossibleValuesParser::new(LEVELS).try_map(|s| s.parse::<LevelFilter>()))]
  #[clap(conflicts_with_all = ["quiet", "verbose", "silent"])]
  #[clap(default_value = "warn")]
  #[clap(display_order = 95)]
  pub verbosity: LevelFilter,

  /// Disable all console output. Same as `--verbosity=off`
  #[clap(long, global = true)]
  #[clap(conflicts_with_all = ["quiet", "verbose", "verbosity"])]
  #[clap(display_order = 96)]
  pub silent: bool,

  /// Make console output more verbose. Repeat to increase verbosity further.
  #[clap(long, short = 'v', action = ArgAction::Count, global = true)]
  #[clap(conflicts_with_all = ["quiet", "verbosity", "silent"])]
  #[clap(display_order = 97)]
  pub verbose: u8,

  /// Make console output more quiet. Repeat to make output even more quiet.
  #[clap(long, short = 'q', action = ArgAction::Count, global = true)]
  #[clap(conflicts_with_all = ["verbose", "verbosity"])]
  #[clap(display_order = 98)]
  pub quiet: u8,
}

impl Verbosity {
  /// `--silent` wins; otherwise `--verbosity` shifted up by `-v` and down by `-q`, clamped to the known levels
  pub fn filter_level(&self) -> LevelFilter {
    if self.silent {
      return LevelFilter::Off;
    }
    let levels = LevelFilter::iter().collect_vec();
    let level = (self.verbosity as usize + usize::from(self.verbose)).saturating_sub(usize::from(self.quiet));
    levels[level.min(levels.len() - 1)]
  }
}
