//! Parallel processing strategies

use canopy_core::{Error, Result};
use rayon::prelude::*;

/// Processing mode for tile execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Single-threaded processing
    Sequential,
    /// Parallel processing using all available cores
    #[default]
    Parallel,
    /// Parallel with specified number of threads
    ParallelWith(usize),
}

/// Strategy for parallel execution
pub trait ParallelStrategy {
    /// Map a function over items and collect results in input order
    fn par_map<I, T, F>(&self, items: Vec<I>, f: F) -> Result<Vec<T>>
    where
        I: Send,
        T: Send,
        F: Fn(I) -> T + Sync + Send;
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::Other(format!("Failed to build thread pool: {}", e)))
}

impl ParallelStrategy for ProcessingMode {
    fn par_map<I, T, F>(&self, items: Vec<I>, f: F) -> Result<Vec<T>>
    where
        I: Send,
        T: Send,
        F: Fn(I) -> T + Sync + Send,
    {
        match self {
            ProcessingMode::Sequential => Ok(items.into_iter().map(f).collect()),
            ProcessingMode::Parallel => Ok(items.into_par_iter().map(f).collect()),
            ProcessingMode::ParallelWith(threads) => {
                let pool = build_pool(*threads)?;
                Ok(pool.install(|| items.into_par_iter().map(f).collect()))
            }
        }
    }
}
