use crate::io::fs::ensure_dir;
use eyre::{Report, WrapErr};
use log::info;
use std::fs::File;
use std::io::{stdin, stdout, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const BUF_SIZE: usize = 32 * 1024;

/// Open stdin
pub fn open_stdin() -> Result<Box<dyn BufRead>, Report> {
  info!("Reading from standard input");
  Ok(Box::new(BufReader::new(stdin())))
}

/// Open file for reading given a filepath. If the filepath is None or `-`, then read from stdin.
pub fn open_file_or_stdin<P: AsRef<Path>>(filepath: &Option<P>) -> Result<Box<dyn BufRead>, Report> {
  match filepath {
    Some(filepath) if !is_path_stdin(filepath) => {
      let filepath = filepath.as_ref();
      let file = File::open(filepath).wrap_err_with(|| format!("When opening file '{}'", filepath.display()))?;
      Ok(Box::new(BufReader::with_capacity(BUF_SIZE, file)))
    }
    _ => open_stdin(),
  }
}

/// Open file for writing. Parent directories are created as needed. `-` writes to standard output.
pub fn create_file_or_stdout(filepath: impl AsRef<Path>) -> Result<Box<dyn Write + Send>, Report> {
  let filepath = filepath.as_ref();

  if is_path_stdout(filepath) {
    info!("File path is {filepath:?}. Writing to standard output.");
    return Ok(Box::new(BufWriter::with_capacity(BUF_SIZE, stdout())));
  }

  ensure_dir(filepath)?;
  let file = File::create(filepath).wrap_err_with(|| format!("When creating file: '{}'", filepath.display()))?;
  Ok(Box::new(BufWriter::with_capacity(BUF_SIZE, file)))
}

pub fn is_path_stdin(filepath: impl AsRef<Path>) -> bool {
  let filepath = filepath.as_ref();
  filepath == PathBuf::from("-") || filepath == PathBuf::from("/dev/stdin")
}

pub fn is_path_stdout(filepath: impl AsRef<Path>) -> bool {
  let filepath = filepath.as_ref();
  filepath == PathBuf::from("-") || filepath == PathBuf::from("/dev/stdout")
}
