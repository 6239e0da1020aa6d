use crate::io::fs::filename_maybe;
use color_eyre::owo_colors::{OwoColorize, Style};
use env_logger::Env;
use log::{Level, LevelFilter, Record};
use std::io::Write;

fn get_file_line(record: &Record) -> String {
  let file = record.file().and_then(filename_maybe);
  match (file, record.line()) {
    (Some(file), None) => format!("{file}:"),
    (Some(file), Some(line)) => format!("{file}:{line}:"),
    _ => String::new(),
  }
  .dimmed()
  .to_string()
}

fn color_log_level(record: &Record) -> String {
  let mut letter = record.level().to_string();
  letter.truncate(1);
  let letter = match record.level() {
    Level::Error => letter.red().to_string(),
    Level::Warn => letter.yellow().to_string(),
    Level::Info => letter.cyan().dimmed().to_string(),
    Level::Debug => letter.green().dimmed().to_string(),
    Level::Trace => letter.dimmed().to_string(),
  };
  format!("{}{letter}{}", "[".dimmed(), "]".dimmed())
}

/// Installs the console logger. Records from worker threads carry their thread name, so that the output of
/// parallel grid phases can be told apart.
pub fn setup_logger(filter_level: LevelFilter) {
  // `try_init` because tests may call this more than once per process
  env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
    .filter_level(filter_level)
    .format(|buf, record| {
      let level = color_log_level(record);
      let file_line = get_file_line(record);
      let thread = std::thread::current();
      let thread = thread.name().unwrap_or("main").dimmed().to_string();
      writeln!(buf, "{level} {thread} {file_line} {}", record.args())
    })
    .try_init()
    .ok();
}

pub fn global_init() {
  color_eyre::config::HookBuilder::default()
    .theme(
      color_eyre::config::Theme::dark()
        .dependency_code(Style::new().dimmed())
        .file(Style::new().green())
        .line_number(Style::new().yellow())
        .panic_file(Style::new().green())
        .panic_line_number(Style::new().yellow())
        .panic_message(Style::new().bright_red().bold())
        .active_line(Style::new().cyan())
        .hidden_frames(Style::new().dimmed())
        .code_hash(Style::new().hidden()),
    )
    .panic_section(format!(
      "If you think it's a bug, consider reporting at: '{}/issues'",
      env!("CARGO_PKG_REPOSITORY"),
    ))
    .add_frame_filter(Box::new(|frames| {
      frames.retain(|frame| {
        let should_show_name = frame.name.as_ref().map_or(false, |name| {
          !HIDDEN_CRATE_NAME_PREFIXES
            .iter()
            .any(|&prefix| name.starts_with(prefix) || name.starts_with(&format!("<{prefix}")))
        });

        let should_show_file = !frame.filename.as_ref().map_or(false, |filename| {
          HIDDEN_CRATE_PATH_PREFIXES
            .iter()
            .any(|&prefix| filename.starts_with(prefix))
        });

        should_show_file && should_show_name
      });
    }))
    .install()
    .ok();
}

const HIDDEN_CRATE_NAME_PREFIXES: &[&str] = &[
  "__rust_try",
  "alloc::",
  "color_eyre::",
  "core::",
  "eyre::",
  "ndarray::",
  "rayon::",
  "rayon_core::",
  "rustc::",
  "std::",
];

const HIDDEN_CRATE_PATH_PREFIXES: &[&str] = &["/rustc/"];
