//! Classify an image by comparing its BoW histogram against labelled training histograms.

use crate::distance::{closest, rank_key};
use crate::*;

/// Label of the majority among the `k` training histograms closest to `candidate`.
///
/// Neighbours at equal distance keep their input order. If labels tie on votes, the label
/// that appears first in `neighbours` wins.
pub fn classify<C: PartialEq + Clone>(
    candidate: &[f32],
    neighbours: &[(C, BoW)],
    k: usize,
    metric: Distance,
) -> CodebookResult<C> {
    if neighbours.is_empty() {
        return Err(CodebookErr::EmptyInput);
    }
    if k == 0 || k > neighbours.len() {
        return Err(CodebookErr::InvalidConfig(
            "k must be between 1 and the number of neighbours",
        ));
    }
    check_hists(candidate, neighbours)?;

    let mut ranked: Vec<(usize, f32)> = neighbours
        .iter()
        .enumerate()
        .map(|(i, (_, hist))| (i, rank_key(metric.eval(candidate, hist))))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    // Every label starts at zero votes, in order of first appearance.
    let mut votes: Vec<(&C, usize)> = Vec::new();
    for (label, _) in neighbours {
        if !votes.iter().any(|(l, _)| *l == label) {
            votes.push((label, 0));
        }
    }
    for &(i, _) in ranked.iter().take(k) {
        let label = &neighbours[i].0;
        if let Some(v) = votes.iter_mut().find(|(l, _)| *l == label) {
            v.1 += 1;
        }
    }

    let mut best = votes[0];
    for &v in &votes[1..] {
        if v.1 > best.1 {
            best = v;
        }
    }
    Ok(best.0.clone())
}

/// Index of the single closest training histogram (lowest index on ties).
pub fn nearest_neighbour<C>(
    candidate: &[f32],
    neighbours: &[(C, BoW)],
    metric: Distance,
) -> CodebookResult<usize> {
    if neighbours.is_empty() {
        return Err(CodebookErr::EmptyInput);
    }
    check_hists(candidate, neighbours)?;
    let hists: Vec<&BoW> = neighbours.iter().map(|(_, h)| h).collect();
    Ok(closest(candidate, &hists, metric))
}

fn check_hists<C>(candidate: &[f32], neighbours: &[(C, BoW)]) -> CodebookResult<()> {
    match neighbours.iter().find(|(_, h)| h.len() != candidate.len()) {
        Some((_, h)) => Err(CodebookErr::DimensionMismatch {
            expected: candidate.len(),
            found: h.len(),
        }),
        None => Ok(()),
    }
}
