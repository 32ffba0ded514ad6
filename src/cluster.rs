use log::{debug, info};
use rand::{rngs::StdRng, thread_rng, Rng, SeedableRng};

use crate::distance::{closest, mean};
use crate::*;

/// Outcome of a generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub codebook: Codebook,
    /// Iterations actually run, never more than `max_iterations`.
    pub iterations: usize,
    /// False when the run stopped on the iteration cap.
    pub converged: bool,
}

/// Build a codebook from `features`, starting from `num_words` descriptors drawn at random
/// (with replacement).
pub fn generate(features: &[Desc], config: &Config) -> CodebookResult<Generation> {
    config.validate(features.len())?;
    let initial = initialize_words(features, config);
    generate_from(features, initial, config)
}

/// Build a codebook from `features`, starting from the given words.
///
/// `config.num_words` must match `initial.len()`; the seed is not used.
pub fn generate_from(
    features: &[Desc],
    initial: Vec<Desc>,
    config: &Config,
) -> CodebookResult<Generation> {
    config.validate(features.len())?;
    if initial.len() != config.num_words {
        return Err(CodebookErr::InvalidConfig(
            "initial words must number exactly num_words",
        ));
    }
    let dim = features[0].len();
    check_dims(features, dim)?;
    check_dims(&initial, dim)?;

    info!(
        "Generating {} words from {} descriptors of dim {} ({:?}, {:?}, {:?})",
        config.num_words,
        features.len(),
        dim,
        config.distance,
        config.convergence,
        config.execution
    );

    let mut words = initial;
    let mut iterations = 0;
    let mut converged = false;
    while !converged && iterations < config.max_iterations {
        iterations += 1;
        converged = match config.convergence {
            Convergence::Exact => exact_step(features, &mut words, config),
            Convergence::Threshold { delta } => {
                threshold_step(features, &mut words, config.distance, delta)
            }
        };
        debug!("Iteration {}: converged = {}", iterations, converged);
        checkpoint(&words, config)?;
    }

    info!(
        "Finished after {} iterations (converged: {})",
        iterations, converged
    );
    Ok(Generation {
        codebook: Codebook::from_words(words, config.distance),
        iterations,
        converged,
    })
}

/// Draw `num_words` descriptors uniformly, with replacement. Duplicates are kept.
fn initialize_words(features: &[Desc], config: &Config) -> Vec<Desc> {
    let mut rng: Box<dyn rand::RngCore> = match config.seed {
        Some(s) => Box::new(StdRng::seed_from_u64(s)),
        None => Box::new(thread_rng()),
    };
    (0..config.num_words)
        .map(|_| features[rng.gen_range(0..features.len())].clone())
        .collect()
}

/// One full reassign-and-average pass. Returns true if no word changed.
///
/// Words are read-only while descriptors are being assigned and only replaced once every
/// group mean has been computed. A word that attracts no descriptors keeps its value.
fn exact_step(features: &[Desc], words: &mut Vec<Desc>, config: &Config) -> bool {
    let exec = config.execution;
    let metric = config.distance;

    let current: &[Desc] = words;
    let assignments = exec.map(features, |_, f| closest(f, current, metric));

    let mut groups: Vec<Vec<&Desc>> = vec![Vec::new(); current.len()];
    for (f, &w) in features.iter().zip(&assignments) {
        groups[w].push(f);
    }

    let updated: Vec<Desc> = exec.map(&groups, |w, group| {
        // Empty and ragged groups cannot occur past validation; fall back to the old word.
        mean(group).unwrap_or_else(|_| current[w].clone())
    });

    let unchanged = updated
        .iter()
        .zip(current)
        .all(|(new, old)| bitwise_eq(new, old));
    *words = updated;
    unchanged
}

/// One sweep of the incremental variant. Returns true if no word moved.
///
/// Each descriptor pulls its nearest word halfway towards itself, but only when some
/// component would shift by more than `delta`. The move is visible to the very next
/// descriptor, so the result depends on descriptor order.
fn threshold_step(features: &[Desc], words: &mut [Desc], metric: Distance, delta: f32) -> bool {
    let mut no_change = true;
    for f in features {
        let w = closest(f, words, metric);
        let word = &mut words[w];
        let moved: Desc = word.iter().zip(f).map(|(c, x)| (c + x) / 2.).collect();
        if word.iter().zip(&moved).any(|(c, m)| (c - m).abs() > delta) {
            *word = moved;
            no_change = false;
        }
    }
    no_change
}

#[inline]
fn bitwise_eq(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

#[cfg(feature = "bincode")]
fn checkpoint(words: &[Desc], config: &Config) -> CodebookResult<()> {
    if let Some(path) = &config.checkpoint {
        debug!("Checkpointing {} words to {:?}", words.len(), path);
        codebook::save_words(words, config.distance, path)?;
    }
    Ok(())
}

#[cfg(not(feature = "bincode"))]
fn checkpoint(_words: &[Desc], _config: &Config) -> CodebookResult<()> {
    Ok(())
}
