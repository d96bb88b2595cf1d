use crate::algorithm::{into_output, lloyd, LloydResult};
use crate::config::KMeansConfig;
use crate::distance::find_nearest_centroids;
use crate::error::KMeansError;
use crate::types::{ClusterResult, Dataset};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// K-means estimator over 2D datasets.
///
/// Unlike the free functions in the algorithm module, the estimator validates
/// its inputs and reports bad `k` or undersized datasets as errors.
///
/// # Example
///
/// ```
/// use kmeans_charts::{Dataset, KMeans, Point};
///
/// let dataset = Dataset::from_points(&[
///     Point::new(0.0, 0.0),
///     Point::new(0.2, 0.1),
///     Point::new(50.0, 50.0),
///     Point::new(50.1, 49.8),
/// ]);
///
/// let mut kmeans = KMeans::new(2);
/// let result = kmeans.cluster(&dataset).unwrap();
/// assert_eq!(result.points.len(), 4);
/// assert_ne!(result.points[0].cluster, result.points[2].cluster);
/// ```
pub struct KMeans {
    /// Model configuration
    config: KMeansConfig,

    /// Trained centroids (None if not yet fitted)
    centroids: Option<Array2<f64>>,

    /// Iterations used by the last fit
    n_iterations: usize,
}

impl KMeans {
    /// Create a new estimator with default configuration.
    ///
    /// # Panics
    ///
    /// Panics if `k` is 0.
    pub fn new(k: usize) -> Self {
        Self::with_config(KMeansConfig::new(k))
    }

    /// Create a new estimator with custom configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config.k` is 0.
    pub fn with_config(config: KMeansConfig) -> Self {
        assert!(config.k > 0, "k must be greater than 0");

        Self {
            config,
            centroids: None,
            n_iterations: 0,
        }
    }

    /// Fit the model using an RNG seeded from `config.seed`.
    pub fn fit(&mut self, dataset: &Dataset) -> Result<&mut Self, KMeansError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.fit_with_rng(dataset, &mut rng)
    }

    /// Fit the model drawing the initial centroids from `rng`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the dataset holds
    /// fewer than `k` points.
    pub fn fit_with_rng<R: Rng + ?Sized>(
        &mut self,
        dataset: &Dataset,
        rng: &mut R,
    ) -> Result<&mut Self, KMeansError> {
        self.run(dataset, rng)?;
        Ok(self)
    }

    /// Assign each point of `dataset` to its nearest fitted centroid.
    pub fn predict(&self, dataset: &Dataset) -> Result<Vec<usize>, KMeansError> {
        let centroids = self.centroids.as_ref().ok_or(KMeansError::NotFitted)?;
        Ok(find_nearest_centroids(&dataset.view(), &centroids.view()))
    }

    /// Fit the model and return the training assignments in one call.
    pub fn fit_predict(&mut self, dataset: &Dataset) -> Result<Vec<usize>, KMeansError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let labels = self.run(dataset, &mut rng)?.labels;
        Ok(labels)
    }

    /// Fit the model and return the labelled points.
    pub fn cluster(&mut self, dataset: &Dataset) -> Result<ClusterResult, KMeansError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.cluster_with_rng(dataset, &mut rng)
    }

    /// Fit the model with the given RNG and return the labelled points.
    pub fn cluster_with_rng<R: Rng + ?Sized>(
        &mut self,
        dataset: &Dataset,
        rng: &mut R,
    ) -> Result<ClusterResult, KMeansError> {
        let result = self.run(dataset, rng)?;
        let output = into_output(dataset, result);
        Ok(ClusterResult {
            k: self.config.k,
            iterations: output.iterations,
            points: output.points,
        })
    }

    fn run<R: Rng + ?Sized>(
        &mut self,
        dataset: &Dataset,
        rng: &mut R,
    ) -> Result<LloydResult, KMeansError> {
        self.config.validate()?;
        check_dataset_size(dataset, self.config.k)?;

        let result = lloyd(
            &dataset.view(),
            self.config.k,
            self.config.max_iters,
            self.config.tol,
            rng,
        );

        self.centroids = Some(result.centroids.clone());
        self.n_iterations = result.n_iterations;
        Ok(result)
    }

    /// Get the centroids of the fitted model.
    pub fn centroids(&self) -> Option<&Array2<f64>> {
        self.centroids.as_ref()
    }

    /// Iterations used by the last fit, 0 before fitting.
    pub fn n_iterations(&self) -> usize {
        self.n_iterations
    }

    /// Get the number of clusters.
    pub fn k(&self) -> usize {
        self.config.k
    }

    /// Get the configuration.
    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }
}

pub(crate) fn check_dataset_size(dataset: &Dataset, k: usize) -> Result<(), KMeansError> {
    if dataset.len() < k {
        return Err(KMeansError::InsufficientData(format!(
            "Number of points ({}) is less than k ({})",
            dataset.len(),
            k
        )));
    }
    Ok(())
}
