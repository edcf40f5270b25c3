//! Spherical k-means for the clustered index layout.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use crate::embeddings::{dot, normalize};

/// Training sample size per cluster.
const TRAINING_POINTS_PER_LIST: usize = 64;

#[derive(Debug)]
pub(super) struct Clustering {
    pub centroids: Vec<Vec<f32>>,
    /// Row indices assigned to each centroid, ascending.
    pub lists: Vec<Vec<usize>>,
}

fn row(vectors: &[f32], dim: usize, i: usize) -> &[f32] {
    &vectors[i * dim..(i + 1) * dim]
}

fn nearest(centroids: &[Vec<f32>], v: &[f32]) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (c, centroid) in centroids.iter().enumerate() {
        let score = dot(centroid, v);
        if score > best_score {
            best = c;
            best_score = score;
        }
    }
    best
}

/// Cluster unit-length rows of `vectors` into `nlist` groups by cosine
/// similarity. Deterministic for a given `seed`.
///
/// Centroids are trained on a sample of at most
/// `nlist * TRAINING_POINTS_PER_LIST` rows; every row is then assigned to
/// its nearest centroid. Empty clusters are re-seeded from a random
/// training row.
pub(super) fn spherical_kmeans(
    vectors: &[f32],
    dim: usize,
    nlist: usize,
    iterations: usize,
    seed: u64,
) -> Clustering {
    let n = vectors.len() / dim;
    let nlist = nlist.clamp(1, n.max(1));
    let mut rng = StdRng::seed_from_u64(seed);

    let max_training = nlist.saturating_mul(TRAINING_POINTS_PER_LIST);
    let training: Vec<usize> = if n > max_training {
        let mut sample = index::sample(&mut rng, n, max_training).into_vec();
        sample.sort_unstable();
        sample
    } else {
        (0..n).collect()
    };

    let mut centroids: Vec<Vec<f32>> = index::sample(&mut rng, training.len(), nlist)
        .into_iter()
        .map(|t| row(vectors, dim, training[t]).to_vec())
        .collect();

    for _ in 0..iterations {
        let mut sums = vec![vec![0.0_f32; dim]; nlist];
        let mut counts = vec![0_usize; nlist];

        for &i in &training {
            let v = row(vectors, dim, i);
            let c = nearest(&centroids, v);
            counts[c] += 1;
            for (acc, x) in sums[c].iter_mut().zip(v) {
                *acc += x;
            }
        }

        for (c, sum) in sums.iter_mut().enumerate() {
            if counts[c] > 0 && normalize(sum) {
                centroids[c] = std::mem::take(sum);
            } else {
                let pick = training[rng.random_range(0..training.len())];
                centroids[c] = row(vectors, dim, pick).to_vec();
            }
        }
    }

    let mut lists = vec![Vec::new(); nlist];
    for i in 0..n {
        lists[nearest(&centroids, row(vectors, dim, i))].push(i);
    }

    Clustering { centroids, lists }
}
