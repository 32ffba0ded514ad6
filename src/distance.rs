use serde::{Deserialize, Serialize};

use crate::*;

/// Dissimilarity measure used to match descriptors against codewords.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    /// Square root of the sum of squared component differences.
    Euclidean,
    /// Sum of absolute component differences (L1).
    Sad,
}

impl Default for Distance {
    fn default() -> Self {
        Distance::Euclidean
    }
}

impl Distance {
    #[inline]
    pub fn eval(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Distance::Euclidean => euclidean(a, b),
            Distance::Sad => sad(a, b),
        }
    }
}

#[inline]
/// Euclidean distance between two equal-length vectors.
pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .fold(0., |acc, (x, y)| acc + (x - y) * (x - y))
        .sqrt()
}

#[inline]
/// Sum of absolute differences between two equal-length vectors.
pub fn sad(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).fold(0., |acc, (x, y)| acc + (x - y).abs())
}

/// Component-wise arithmetic mean of a group of vectors.
///
/// Accumulates in f64 so that the mean of identical vectors is exactly that vector.
pub fn mean<V: AsRef<[f32]>>(vectors: &[V]) -> CodebookResult<Desc> {
    let first = vectors.first().ok_or(CodebookErr::EmptyGroup)?.as_ref();
    let mut sums = vec![0f64; first.len()];
    for v in vectors {
        let v = v.as_ref();
        if v.len() != sums.len() {
            return Err(CodebookErr::DimensionMismatch {
                expected: sums.len(),
                found: v.len(),
            });
        }
        for (s, &x) in sums.iter_mut().zip(v) {
            *s += x as f64;
        }
    }
    let n = vectors.len() as f64;
    Ok(sums.into_iter().map(|s| (s / n) as f32).collect())
}

/// Index of the centroid closest to `candidate`, or `None` if there are no centroids.
///
/// Ties go to the lowest index.
pub fn nearest<V: AsRef<[f32]>>(candidate: &[f32], centroids: &[V], metric: Distance) -> Option<usize> {
    if centroids.is_empty() {
        None
    } else {
        Some(closest(candidate, centroids, metric))
    }
}

/// `nearest` for callers that already guarantee a non-empty centroid set.
#[inline]
pub(crate) fn closest<V: AsRef<[f32]>>(candidate: &[f32], centroids: &[V], metric: Distance) -> usize {
    let mut best: (usize, f32) = (0, rank_key(metric.eval(candidate, centroids[0].as_ref())));
    for (i, c) in centroids.iter().enumerate().skip(1) {
        let d = rank_key(metric.eval(candidate, c.as_ref()));
        if d < best.1 {
            best = (i, d);
        }
    }
    best.0
}

/// Distance used for ranking: NaN counts as infinitely far.
#[inline]
pub(crate) fn rank_key(d: f32) -> f32 {
    if d.is_nan() {
        f32::INFINITY
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn pair(raw: Vec<(i16, i16)>) -> (Desc, Desc) {
        raw.into_iter().map(|(a, b)| (a as f32, b as f32)).unzip()
    }

    #[quickcheck]
    fn distance_to_self_is_zero(raw: Vec<i16>) -> bool {
        let a: Desc = raw.into_iter().map(f32::from).collect();
        euclidean(&a, &a) == 0. && sad(&a, &a) == 0.
    }

    #[quickcheck]
    fn distances_are_symmetric(raw: Vec<(i16, i16)>) -> bool {
        let (a, b) = pair(raw);
        euclidean(&a, &b) == euclidean(&b, &a) && sad(&a, &b) == sad(&b, &a)
    }

    #[quickcheck]
    fn distinct_vectors_are_apart(raw: Vec<(i16, i16)>) -> bool {
        let (a, b) = pair(raw);
        a == b || (euclidean(&a, &b) > 0. && sad(&a, &b) > 0.)
    }

    #[test]
    fn known_distances() {
        let a = [0., 0., 0.];
        let b = [1., 2., 2.];
        assert_eq!(Distance::Euclidean.eval(&a, &b), 3.);
        assert_eq!(Distance::Sad.eval(&a, &b), 5.);
    }

    #[test]
    fn mean_of_single_vector_is_itself() {
        let v = vec![0.1f32, -7.25, 3.3];
        assert_eq!(mean(&[v.clone()]).unwrap(), v);
    }

    #[test]
    fn mean_of_identical_vectors_is_exact() {
        let v = vec![0.1f32, 0.7, 1e-3];
        let group = vec![v.clone(); 7];
        assert_eq!(mean(&group).unwrap(), v);
    }

    #[test]
    fn mean_is_componentwise_average() {
        let group = vec![vec![1., 10.], vec![2., 20.], vec![6., 0.]];
        assert_eq!(mean(&group).unwrap(), vec![3., 10.]);
    }

    #[test]
    fn mean_of_nothing_fails() {
        let empty: Vec<Desc> = Vec::new();
        assert!(matches!(mean(&empty), Err(CodebookErr::EmptyGroup)));
    }

    #[test]
    fn mean_rejects_ragged_group() {
        let group = vec![vec![1., 2.], vec![1.]];
        assert!(matches!(
            mean(&group),
            Err(CodebookErr::DimensionMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn nearest_single_centroid() {
        let c = vec![vec![100., 100.]];
        assert_eq!(nearest(&[0., 0.], &c, Distance::Euclidean), Some(0));
        assert_eq!(nearest(&[0., 0.], &c, Distance::Sad), Some(0));
    }

    #[test]
    fn nearest_tie_takes_lowest_index() {
        let c = vec![vec![5., 0.], vec![-1., 0.], vec![1., 0.]];
        assert_eq!(nearest(&[0., 0.], &c, Distance::Euclidean), Some(1));
        assert_eq!(nearest(&[0., 0.], &c, Distance::Sad), Some(1));
    }

    #[test]
    fn nearest_skips_nan_centroids() {
        let c = vec![vec![f32::NAN], vec![3.], vec![-f32::NAN], vec![2.]];
        assert_eq!(nearest(&[0.], &c, Distance::Euclidean), Some(3));
        assert_eq!(nearest(&[0.], &c[..1], Distance::Sad), Some(0));
    }

    #[test]
    fn nearest_without_centroids() {
        let c: Vec<Desc> = Vec::new();
        assert_eq!(nearest(&[0.], &c, Distance::Euclidean), None);
    }

    #[test]
    fn metrics_can_disagree() {
        // L1 prefers the axis-aligned word, L2 the diagonal one.
        let c = vec![vec![3., 0.], vec![2., 2.]];
        assert_eq!(nearest(&[0., 0.], &c, Distance::Sad), Some(0));
        assert_eq!(nearest(&[0., 0.], &c, Distance::Euclidean), Some(1));
    }
}
