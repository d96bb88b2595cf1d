use ndarray::{ArrayView1, ArrayView2};

/// Euclidean distance between two 2D rows
#[inline]
pub fn euclidean(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

/// Squared Euclidean distance between two 2D rows
#[inline]
pub fn squared_euclidean(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

/// Index of the centroid closest to `point`.
///
/// Ties go to the lowest index: a later centroid only wins when it is
/// strictly closer.
pub fn nearest_centroid(point: &ArrayView1<f64>, centroids: &ArrayView2<f64>) -> usize {
    let mut best_idx = 0;
    let mut best_dist = f64::MAX;

    for (j, centroid) in centroids.outer_iter().enumerate() {
        let dist = euclidean(point, &centroid);
        if dist < best_dist {
            best_dist = dist;
            best_idx = j;
        }
    }

    best_idx
}

/// Find the nearest centroid for every row of `data`
pub fn find_nearest_centroids(data: &ArrayView2<f64>, centroids: &ArrayView2<f64>) -> Vec<usize> {
    data.outer_iter()
        .map(|point| nearest_centroid(&point, centroids))
        .collect()
}

/// True when no centroid moved by more than `tol` on either axis
pub fn centroids_converged(old: &ArrayView2<f64>, new: &ArrayView2<f64>, tol: f64) -> bool {
    old.iter()
        .zip(new.iter())
        .all(|(a, b)| (a - b).abs() <= tol)
}

/// Largest single-axis movement of any centroid between two iterations
pub fn compute_centroid_shift(old: &ArrayView2<f64>, new: &ArrayView2<f64>) -> f64 {
    old.iter()
        .zip(new.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}

/// Total within-cluster sum of squared distances
pub fn inertia(data: &ArrayView2<f64>, centroids: &ArrayView2<f64>, labels: &[usize]) -> f64 {
    data.outer_iter()
        .zip(labels.iter())
        .map(|(point, &label)| squared_euclidean(&point, &centroids.row(label)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_euclidean() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        assert_relative_eq!(euclidean(&a.view(), &b.view()), 5.0, epsilon = 1e-12);
        assert_relative_eq!(squared_euclidean(&a.view(), &b.view()), 25.0, epsilon = 1e-12);
    }

    #[test]
    fn test_find_nearest_centroids() {
        let data = array![[0.0, 0.0], [10.0, 10.0], [5.0, 5.0]];
        let centroids = array![[0.0, 0.0], [10.0, 10.0]];

        let labels = find_nearest_centroids(&data.view(), &centroids.view());

        assert_eq!(labels[0], 0);
        assert_eq!(labels[1], 1);
        // (5,5) is equidistant; the first centroid wins
        assert_eq!(labels[2], 0);
    }

    #[test]
    fn test_tie_prefers_lowest_index_among_duplicates() {
        let point = array![1.0, 1.0];
        let centroids = array![[9.0, 9.0], [0.0, 0.0], [0.0, 0.0]];
        assert_eq!(nearest_centroid(&point.view(), &centroids.view()), 1);
    }

    #[test]
    fn test_convergence_threshold_is_inclusive() {
        let old = array![[0.0, 0.0], [1.0, 1.0]];
        let within = array![[0.0005, 0.0], [1.0, 0.9995]];
        let beyond = array![[0.0, 0.0], [1.0, 1.01]];

        assert!(centroids_converged(&old.view(), &within.view(), 1e-3));
        assert!(!centroids_converged(&old.view(), &beyond.view(), 1e-3));
    }

    #[test]
    fn test_centroid_shift() {
        let old = array![[0.0, 0.0], [1.0, 1.0]];
        let new = array![[1.0, 0.0], [1.0, 3.0]];

        let shift = compute_centroid_shift(&old.view(), &new.view());
        assert_relative_eq!(shift, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inertia() {
        let data = array![[0.0, 0.0], [2.0, 0.0], [10.0, 10.0]];
        let centroids = array![[1.0, 0.0], [10.0, 10.0]];

        let total = inertia(&data.view(), &centroids.view(), &[0, 0, 1]);
        assert_relative_eq!(total, 2.0, epsilon = 1e-12);
    }
}
