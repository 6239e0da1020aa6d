use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Jobs {
  /// Number of worker threads for the parallel evaluation strategies. Defaults to all available CPU threads.
  #[clap(global = true, display_order = 90, long, short = 'j', default_value_t = num_cpus::get())]
  pub jobs: usize,
}
