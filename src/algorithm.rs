use crate::distance::{
    centroids_converged, compute_centroid_shift, find_nearest_centroids, inertia,
};
use crate::types::{ClusteredPoint, Dataset, Point};
use ndarray::{Array2, ArrayView2};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

/// Result of Lloyd's algorithm on one dataset
#[derive(Debug, Clone)]
pub struct LloydResult {
    /// Final centroids, shape (k, 2)
    pub centroids: Array2<f64>,
    /// Cluster id per input row, from the last assignment step
    pub labels: Vec<usize>,
    /// Completed iterations, in `[1, max_iters]`
    pub n_iterations: usize,
    /// Whether the run stopped on the threshold rather than the cap
    pub converged: bool,
    /// Inertia of `labels` against `centroids`
    pub inertia: f64,
}

/// Output of [`cluster`]: final centroids, labelled points and iteration count
#[derive(Debug, Clone)]
pub struct ClusterOutput {
    pub centroids: Vec<Point>,
    pub points: Vec<ClusteredPoint>,
    pub iterations: usize,
}

/// Pick `k` distinct rows as initial centroids.
///
/// Shuffles the row indices and takes the first `k`, so every subset of
/// rows is equally likely.
pub fn initialize_centroids<R: Rng + ?Sized>(
    data: &ArrayView2<f64>,
    k: usize,
    rng: &mut R,
) -> Array2<f64> {
    let mut indices: Vec<usize> = (0..data.nrows()).collect();
    indices.shuffle(rng);

    let mut centroids = Array2::zeros((k, data.ncols()));
    for (centroid_idx, &data_idx) in indices.iter().take(k).enumerate() {
        centroids.row_mut(centroid_idx).assign(&data.row(data_idx));
    }

    centroids
}

/// Recompute each centroid as the mean of its assigned rows.
///
/// A cluster that received no rows keeps its previous position. Such a
/// centroid is never reseeded, so it can stay empty for the rest of the run.
pub fn update_centroids(
    data: &ArrayView2<f64>,
    labels: &[usize],
    previous: &ArrayView2<f64>,
) -> Array2<f64> {
    let k = previous.nrows();
    let n_features = data.ncols();

    let mut cluster_sums: Array2<f64> = Array2::zeros((k, n_features));
    let mut cluster_counts = vec![0usize; k];

    for (row, &label) in data.outer_iter().zip(labels.iter()) {
        cluster_counts[label] += 1;
        for j in 0..n_features {
            cluster_sums[[label, j]] += row[j];
        }
    }

    let mut centroids = previous.to_owned();
    for (cluster_idx, &count) in cluster_counts.iter().enumerate() {
        if count > 0 {
            for j in 0..n_features {
                centroids[[cluster_idx, j]] = cluster_sums[[cluster_idx, j]] / count as f64;
            }
        } else {
            debug!(cluster = cluster_idx, "cluster received no points, centroid frozen");
        }
    }

    centroids
}

/// One assignment step followed by one update step
pub fn lloyd_step(
    data: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
) -> (Vec<usize>, Array2<f64>) {
    let labels = find_nearest_centroids(data, centroids);
    let updated = update_centroids(data, &labels, centroids);
    (labels, updated)
}

/// Run Lloyd's k-means from the given initial centroids.
///
/// No randomness is involved, so the same data and initial centroids always
/// produce the same result.
pub fn lloyd_from(
    data: &ArrayView2<f64>,
    initial_centroids: Array2<f64>,
    max_iters: usize,
    tol: f64,
) -> LloydResult {
    debug_assert!(max_iters > 0, "max_iters must be greater than 0");

    let mut centroids = initial_centroids;
    let mut labels = vec![0usize; data.nrows()];

    for iteration in 0..max_iters {
        let (new_labels, new_centroids) = lloyd_step(data, &centroids.view());
        labels = new_labels;

        let converged = centroids_converged(&centroids.view(), &new_centroids.view(), tol);
        debug!(
            iteration = iteration + 1,
            max_iters,
            shift = compute_centroid_shift(&centroids.view(), &new_centroids.view()),
            "lloyd iteration"
        );
        centroids = new_centroids;

        if converged {
            debug!(iterations = iteration + 1, "k-means converged");
            let inertia = inertia(data, &centroids.view(), &labels);
            return LloydResult {
                centroids,
                labels,
                n_iterations: iteration + 1,
                converged: true,
                inertia,
            };
        }
    }

    warn!(max_iters, "k-means hit the iteration cap before converging");
    let inertia = inertia(data, &centroids.view(), &labels);
    LloydResult {
        centroids,
        labels,
        n_iterations: max_iters,
        converged: false,
        inertia,
    }
}

/// Run Lloyd's k-means with randomly chosen initial centroids.
///
/// Requires `1 <= k <= data.nrows()`. Callers are responsible for that
/// precondition; it is only checked in debug builds.
pub fn lloyd<R: Rng + ?Sized>(
    data: &ArrayView2<f64>,
    k: usize,
    max_iters: usize,
    tol: f64,
    rng: &mut R,
) -> LloydResult {
    debug_assert!(k > 0, "k must be greater than 0");
    debug_assert!(k <= data.nrows(), "k must not exceed the number of points");

    let centroids = initialize_centroids(data, k, rng);
    lloyd_from(data, centroids, max_iters, tol)
}

/// Cluster a dataset and label every point with its final cluster id.
pub fn cluster<R: Rng + ?Sized>(
    dataset: &Dataset,
    k: usize,
    max_iters: usize,
    tol: f64,
    rng: &mut R,
) -> ClusterOutput {
    let result = lloyd(&dataset.view(), k, max_iters, tol, rng);
    into_output(dataset, result)
}

pub(crate) fn into_output(dataset: &Dataset, result: LloydResult) -> ClusterOutput {
    let centroids = result
        .centroids
        .outer_iter()
        .map(|row| Point::new(row[0], row[1]))
        .collect();
    let points = dataset
        .points()
        .zip(result.labels.iter())
        .map(|(p, &cluster)| ClusteredPoint {
            x: p.x,
            y: p.y,
            cluster,
        })
        .collect();

    ClusterOutput {
        centroids,
        points,
        iterations: result.n_iterations,
    }
}
