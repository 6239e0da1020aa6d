pub mod cli;

#[cfg(test)]
mod tests {
  use codongrid::utils::global_init::global_init;
  use ctor::ctor;

  #[ctor]
  fn init() {
    global_init();
  }
}
