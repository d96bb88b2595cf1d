use crate::error::KMeansError;

/// Label attached to every job result produced by the chart service.
pub const DEFAULT_SOURCE_LABEL: &str = "KMeans Clustering";

/// Configuration for a single k-means run
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Number of clusters
    pub k: usize,

    /// Maximum number of Lloyd iterations
    pub max_iters: usize,

    /// Convergence threshold. The run stops once no centroid moves by more
    /// than this amount on either axis.
    pub tol: f64,

    /// Random seed for centroid initialization
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 3,
            max_iters: 100,
            tol: 1e-3,
            seed: 0,
        }
    }
}

impl KMeansConfig {
    /// Create a new configuration with the specified number of clusters
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    /// Set the maximum number of iterations
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the convergence threshold
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check that `k` and `max_iters` are positive and `tol` is a
    /// non-negative finite number
    pub fn validate(&self) -> Result<(), KMeansError> {
        if self.k == 0 {
            return Err(KMeansError::InvalidK(
                "k must be greater than 0".to_string(),
            ));
        }
        if self.max_iters == 0 {
            return Err(KMeansError::InvalidConfig(
                "max_iters must be greater than 0".to_string(),
            ));
        }
        if !self.tol.is_finite() || self.tol < 0.0 {
            return Err(KMeansError::InvalidConfig(format!(
                "tol must be a non-negative finite number, got {}",
                self.tol
            )));
        }
        Ok(())
    }
}

/// Shape of the synthetic chart data
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of independent datasets (one per chart)
    pub num_datasets: usize,

    /// Requested points per dataset. Blobs receive `points / clusters` each,
    /// so the emitted count may fall slightly short.
    pub points_per_dataset: usize,

    /// Lower bound (inclusive) of the blob count drawn per dataset
    pub min_clusters: usize,

    /// Upper bound (inclusive) of the blob count drawn per dataset
    pub max_clusters: usize,

    /// Standard deviation of the Gaussian noise around each blob center
    pub spread: f64,

    /// Blob centers are drawn uniformly from `[0, extent)` on both axes
    pub extent: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_datasets: 9,
            points_per_dataset: 100,
            min_clusters: 2,
            max_clusters: 6,
            spread: 5.0,
            extent: 100.0,
        }
    }
}

impl GeneratorConfig {
    /// Set how many datasets are generated
    pub fn with_num_datasets(mut self, num_datasets: usize) -> Self {
        self.num_datasets = num_datasets;
        self
    }

    /// Set the requested points per dataset
    pub fn with_points_per_dataset(mut self, points: usize) -> Self {
        self.points_per_dataset = points;
        self
    }

    /// Set the inclusive range the per-dataset blob count is drawn from
    pub fn with_cluster_range(mut self, min_clusters: usize, max_clusters: usize) -> Self {
        self.min_clusters = min_clusters;
        self.max_clusters = max_clusters;
        self
    }

    /// Set the standard deviation of the noise around blob centers
    pub fn with_spread(mut self, spread: f64) -> Self {
        self.spread = spread;
        self
    }

    /// Fewest points any generated dataset can contain, over every blob count
    /// in `[min_clusters, max_clusters]`.
    pub fn min_emitted_points(&self) -> usize {
        (self.min_clusters.max(1)..=self.max_clusters.max(1))
            .map(|clusters| clusters * (self.points_per_dataset / clusters))
            .min()
            .unwrap_or(0)
    }

    /// Check the blob range, spread and extent
    pub fn validate(&self) -> Result<(), KMeansError> {
        if self.min_clusters == 0 {
            return Err(KMeansError::InvalidConfig(
                "min_clusters must be at least 1".to_string(),
            ));
        }
        if self.min_clusters > self.max_clusters {
            return Err(KMeansError::InvalidConfig(format!(
                "min_clusters ({}) exceeds max_clusters ({})",
                self.min_clusters, self.max_clusters
            )));
        }
        if !self.spread.is_finite() || self.spread < 0.0 {
            return Err(KMeansError::InvalidConfig(format!(
                "spread must be a non-negative finite number, got {}",
                self.spread
            )));
        }
        if !self.extent.is_finite() || self.extent <= 0.0 {
            return Err(KMeansError::InvalidConfig(format!(
                "extent must be a positive finite number, got {}",
                self.extent
            )));
        }
        Ok(())
    }
}

/// Configuration for [`ChartService`](crate::ChartService)
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Smallest `k` a request may ask for
    pub k_min: usize,

    /// Largest `k` a request may ask for
    pub k_max: usize,

    /// `k` used when the request omits it or sends something unparseable
    pub k_default: usize,

    /// Iteration cap applied to every clustering job
    pub max_iters: usize,

    /// Convergence threshold applied to every clustering job
    pub tol: f64,

    /// Label reported as `source` on every job result
    pub source_label: String,

    /// Seed for the service RNG. `None` seeds from OS entropy.
    pub seed: Option<u64>,

    /// Shape of the working datasets
    pub generator: GeneratorConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            k_min: 2,
            k_max: 6,
            k_default: 3,
            max_iters: 100,
            tol: 1e-3,
            source_label: DEFAULT_SOURCE_LABEL.to_string(),
            seed: None,
            generator: GeneratorConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Seed the service RNG for reproducible data and clustering
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the iteration cap applied to every clustering job
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the accepted `k` range and the fallback `k`
    pub fn with_k_bounds(mut self, k_min: usize, k_max: usize, k_default: usize) -> Self {
        self.k_min = k_min;
        self.k_max = k_max;
        self.k_default = k_default;
        self
    }

    /// Set the shape of the working datasets
    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }

    /// Check the `k` bounds, the generator shape and the per-job settings.
    ///
    /// A generator whose smallest dataset could hold fewer than `k_max`
    /// points is rejected as [`KMeansError::InvalidConfig`].
    pub fn validate(&self) -> Result<(), KMeansError> {
        if self.k_min == 0 {
            return Err(KMeansError::InvalidK(
                "k_min must be greater than 0".to_string(),
            ));
        }
        if self.k_min > self.k_max {
            return Err(KMeansError::InvalidConfig(format!(
                "k_min ({}) exceeds k_max ({})",
                self.k_min, self.k_max
            )));
        }
        if !(self.k_min..=self.k_max).contains(&self.k_default) {
            return Err(KMeansError::InvalidConfig(format!(
                "k_default ({}) must lie in [{}, {}]",
                self.k_default, self.k_min, self.k_max
            )));
        }
        // Every dataset must hold at least k_max points.
        self.generator.validate()?;
        let min_points = self.generator.min_emitted_points();
        if min_points < self.k_max {
            return Err(KMeansError::InvalidConfig(format!(
                "datasets may hold only {} points, fewer than k_max ({})",
                min_points, self.k_max
            )));
        }
        KMeansConfig::new(self.k_min)
            .with_max_iters(self.max_iters)
            .with_tol(self.tol)
            .validate()
    }
}
