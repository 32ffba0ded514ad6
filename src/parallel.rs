use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How the per-descriptor and per-word work of one iteration is run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Execution {
    /// One item after another on the calling thread, in input order.
    Sequential,
    /// Fan out over the rayon pool (one worker per hardware thread).
    Parallel,
}

impl Default for Execution {
    fn default() -> Self {
        Execution::Sequential
    }
}

impl Execution {
    /// Apply `f` to every item and collect the results in input order.
    ///
    /// Result `i` always belongs to `items[i]`, whatever order the workers finish in.
    /// Returns only once every item has been processed.
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &T) -> R + Sync + Send,
    {
        match self {
            Execution::Sequential => items.iter().enumerate().map(|(i, t)| f(i, t)).collect(),
            Execution::Parallel => items
                .par_iter()
                .enumerate()
                .map(|(i, t)| f(i, t))
                .collect(),
        }
    }
}
