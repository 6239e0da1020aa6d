use crate::make_error;
use eyre::Report;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::ops::Range;

/// Size of the contiguous chunks which split `n` items between `workers`. All chunks but the last have this size.
pub fn chunk_size(n: usize, workers: usize) -> usize {
  n.div_ceil(workers.max(1)).max(1)
}

/// Contiguous, near-equal index ranges covering `0..n`, at most one per worker, in order
pub fn partition_chunks(n: usize, workers: usize) -> Vec<Range<usize>> {
  let size = chunk_size(n, workers);
  (0..n).step_by(size).map(|start| start..(start + size).min(n)).collect()
}

pub fn build_thread_pool(jobs: usize) -> Result<ThreadPool, Report> {
  if jobs == 0 {
    return make_error!("Number of jobs must be at least 1");
  }
  Ok(
    ThreadPoolBuilder::new()
      .num_threads(jobs)
      .thread_name(|i| format!("worker-{i}"))
      .build()?,
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  #[rustfmt::skip]
  #[rstest]
  #[case(8,  1, vec![0..8])]
  #[case(8,  3, vec![0..3, 3..6, 6..8])]
  #[case(8,  4, vec![0..2, 2..4, 4..6, 6..8])]
  #[case(3,  8, vec![0..1, 1..2, 2..3])]
  #[case(10, 4, vec![0..3, 3..6, 6..9, 9..10])]
  #[case(0,  4, vec![])]
  #[trace]
  fn test_partition_chunks(#[case] n: usize, #[case] workers: usize, #[case] expected: Vec<Range<usize>>) {
    assert_eq!(expected, partition_chunks(n, workers));
  }

  #[test]
  fn test_partition_chunks_cover_all_items_in_order() {
    for n in 0..50 {
      for workers in 1..10 {
        let chunks = partition_chunks(n, workers);
        assert!(chunks.len() <= workers);
        assert_eq!((0..n).collect::<Vec<_>>(), chunks.into_iter().flatten().collect::<Vec<_>>());
      }
    }
  }

  #[test]
  fn test_build_thread_pool_rejects_zero_jobs() {
    assert!(build_thread_pool(0).is_err());
  }
}
