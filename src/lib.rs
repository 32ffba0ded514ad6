use thiserror::Error;

/// Distance metrics and the mean / nearest-word primitives the clustering is built on.
pub mod distance;
pub use distance::Distance;

/// Ordered map over descriptors, sequential or fanned out over a rayon pool.
pub mod parallel;
pub use parallel::Execution;

/// Knobs for codebook generation.
pub mod config;
pub use config::{Config, Convergence};

/// The iterate-to-convergence loop that turns descriptors into codewords.
pub mod cluster;
pub use cluster::{generate, generate_from, Generation};

/// Implementation of a visual codebook,
/// which provides the main functionality of this crate.
pub mod codebook;
pub use codebook::Codebook;

/// Nearest-neighbour voting over labelled BoW histograms.
pub mod knn;

/// A local feature descriptor (SIFT-like), stored as a dense float vector.
///
/// All descriptors handed to one codebook must share the same length.
pub type Desc = Vec<f32>;

/// Bag-of-Words representation of an image or descriptor set.
///
/// Index: word id in the codebook.
///
/// Value: share of the provided features that were assigned to that word.
pub type BoW = Vec<f32>;

/// Provides method(s) for computing the similarity score between bow vectors.
pub trait BoWTrait {
    /// Similarity score derived from the L1 norm of the difference. (Used in Galvez (Eq 2)).
    fn l1(&self, other: &Self) -> f32;
    /// Euclidean distance between the two histograms.
    fn l2(&self, other: &Self) -> f32;
}

impl BoWTrait for BoW {
    fn l1(&self, other: &Self) -> f32 {
        1. - 0.5 * distance::sad(self, other)
    }

    fn l2(&self, other: &Self) -> f32 {
        distance::euclidean(self, other)
    }
}

type CodebookResult<T> = std::result::Result<T, CodebookErr>;
#[derive(Error, Debug)]
pub enum CodebookErr {
    #[error("Io Error")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "bincode")]
    #[error("Codebook Serialization Error")]
    Bincode(#[from] bincode::Error),
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("No descriptors supplied")]
    EmptyInput,
    #[error("Requested {requested} words but only {available} descriptors are available")]
    TooManyWords { requested: usize, available: usize },
    #[error("Descriptor dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("Cannot take the mean of an empty cluster group")]
    EmptyGroup,
}

impl CodebookErr {
    /// True for errors caused by the caller's input or settings rather than I/O.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            CodebookErr::EmptyInput
                | CodebookErr::TooManyWords { .. }
                | CodebookErr::DimensionMismatch { .. }
                | CodebookErr::InvalidConfig(_)
                | CodebookErr::Config(_)
        )
    }
}

/// Check that every descriptor has length `dim`.
pub(crate) fn check_dims(features: &[Desc], dim: usize) -> CodebookResult<()> {
    match features.iter().find(|f| f.len() != dim) {
        Some(f) => Err(CodebookErr::DimensionMismatch {
            expected: dim,
            found: f.len(),
        }),
        None => Ok(()),
    }
}
