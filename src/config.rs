use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::*;

/// When to stop iterating.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Convergence {
    /// Reassign every descriptor, recompute every word as its group mean, and stop once
    /// no word changed at all.
    Exact,
    /// Pull the nearest word halfway towards each descriptor in turn, skipping moves where
    /// no component shifts by more than `delta`. Stop after a sweep with no move.
    Threshold { delta: f32 },
}

impl Default for Convergence {
    fn default() -> Self {
        Convergence::Exact
    }
}

/// Settings for one codebook generation run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Number of codewords to produce.
    pub num_words: usize,
    pub distance: Distance,
    pub convergence: Convergence,
    /// Hard cap on iterations, reached or not converged.
    pub max_iterations: usize,
    pub execution: Execution,
    /// Seed for picking the initial words. `None` draws from the thread rng.
    pub seed: Option<u64>,
    /// Where to write the codebook after every iteration. Overwritten each time.
    pub checkpoint: Option<PathBuf>,
}

pub const DEFAULT_NUM_WORDS: usize = 500;
pub const SMALL_NUM_WORDS: usize = 20;
pub const DEFAULT_MAX_ITERATIONS: usize = 10;
pub const THRESHOLD_MAX_ITERATIONS: usize = 100;
pub const DEFAULT_DELTA: f32 = 10.;

impl Default for Config {
    fn default() -> Self {
        Self {
            num_words: DEFAULT_NUM_WORDS,
            distance: Distance::Euclidean,
            convergence: Convergence::Exact,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            execution: Execution::Sequential,
            seed: None,
            checkpoint: None,
        }
    }
}

impl Config {
    /// Default settings with a 20 word codebook.
    pub fn small() -> Self {
        Self::default().with_num_words(SMALL_NUM_WORDS)
    }

    /// The incremental halfway-update variant: SAD matching, 100 iterations, delta of 10.
    pub fn threshold() -> Self {
        Self {
            distance: Distance::Sad,
            convergence: Convergence::Threshold {
                delta: DEFAULT_DELTA,
            },
            max_iterations: THRESHOLD_MAX_ITERATIONS,
            ..Self::default()
        }
    }

    /// Parse settings from TOML. Missing keys keep their defaults.
    ///
    /// ```toml
    /// num_words = 20
    /// distance = "sad"
    /// convergence = { threshold = { delta = 5.0 } }
    /// ```
    pub fn from_toml(text: &str) -> CodebookResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn with_num_words(mut self, num_words: usize) -> Self {
        self.num_words = num_words;
        self
    }

    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_convergence(mut self, convergence: Convergence) -> Self {
        self.convergence = convergence;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_checkpoint<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.checkpoint = Some(path.into());
        self
    }

    /// Check the settings against a descriptor set of size `available`.
    pub fn validate(&self, available: usize) -> CodebookResult<()> {
        if available == 0 {
            return Err(CodebookErr::EmptyInput);
        }
        if self.num_words == 0 {
            return Err(CodebookErr::InvalidConfig("num_words must be at least 1"));
        }
        if self.num_words > available {
            return Err(CodebookErr::TooManyWords {
                requested: self.num_words,
                available,
            });
        }
        if self.max_iterations == 0 {
            return Err(CodebookErr::InvalidConfig("max_iterations must be at least 1"));
        }
        if let Convergence::Threshold { delta } = self.convergence {
            if delta.is_nan() || delta < 0. {
                return Err(CodebookErr::InvalidConfig("delta must be a non-negative number"));
            }
            if self.execution == Execution::Parallel {
                return Err(CodebookErr::InvalidConfig(
                    "threshold convergence updates words in order and cannot run in parallel",
                ));
            }
        }
        if cfg!(not(feature = "bincode")) && self.checkpoint.is_some() {
            return Err(CodebookErr::InvalidConfig(
                "checkpointing requires the bincode feature",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.num_words, 500);
        assert_eq!(c.distance, Distance::Euclidean);
        assert_eq!(c.max_iterations, 10);
        assert_eq!(Config::small().num_words, 20);

        let t = Config::threshold();
        assert_eq!(t.convergence, Convergence::Threshold { delta: 10. });
        assert_eq!(t.distance, Distance::Sad);
        assert_eq!(t.max_iterations, 100);
    }

    #[test]
    fn parse_toml() {
        let c = Config::from_toml(
            r#"
            num_words = 20
            distance = "sad"
            execution = "parallel"
            seed = 7
            checkpoint = "codebook_small.bin"
            "#,
        )
        .unwrap();
        assert_eq!(c.num_words, 20);
        assert_eq!(c.distance, Distance::Sad);
        assert_eq!(c.execution, Execution::Parallel);
        assert_eq!(c.seed, Some(7));
        assert_eq!(c.checkpoint, Some(PathBuf::from("codebook_small.bin")));
        assert_eq!(c.convergence, Convergence::Exact);
        assert_eq!(c.max_iterations, 10);
    }

    #[test]
    fn parse_toml_threshold() {
        let c = Config::from_toml("convergence = { threshold = { delta = 2.5 } }").unwrap();
        assert_eq!(c.convergence, Convergence::Threshold { delta: 2.5 });
    }

    #[test]
    fn parse_toml_rejects_unknown_metric() {
        let err = Config::from_toml(r#"distance = "cosine""#).unwrap_err();
        assert!(matches!(err, CodebookErr::Config(_)));
    }

    #[test]
    fn validate_input_size() {
        let c = Config::default().with_num_words(3);
        assert!(matches!(c.validate(0), Err(CodebookErr::EmptyInput)));
        assert!(matches!(
            c.validate(2),
            Err(CodebookErr::TooManyWords {
                requested: 3,
                available: 2
            })
        ));
        assert!(c.validate(3).is_ok());
        assert!(c.clone().with_num_words(0).validate(3).is_err());
        assert!(c.with_max_iterations(0).validate(3).is_err());
    }

    #[test]
    fn threshold_is_sequential_only() {
        let c = Config::threshold()
            .with_num_words(1)
            .with_execution(Execution::Parallel);
        assert!(matches!(c.validate(4), Err(CodebookErr::InvalidConfig(_))));
    }
}
