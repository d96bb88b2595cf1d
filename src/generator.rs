//! Synthetic chart data: Gaussian blobs scattered over a square.

use crate::config::GeneratorConfig;
use crate::error::KMeansError;
use crate::types::Dataset;
use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

/// Generate `n` points spread over `clusters` Gaussian blobs.
///
/// Each blob center is drawn uniformly from `[0, extent)` on both axes and
/// receives `n / clusters` points with independent normal noise of standard
/// deviation `spread` per axis. Integer division means up to `clusters - 1`
/// points may be dropped.
pub fn generate<R: Rng + ?Sized>(
    n: usize,
    clusters: usize,
    spread: f64,
    extent: f64,
    rng: &mut R,
) -> Result<Dataset, KMeansError> {
    if clusters == 0 {
        return Err(KMeansError::InvalidConfig(
            "clusters must be at least 1".to_string(),
        ));
    }
    let noise = Normal::new(0.0, spread)
        .map_err(|e| KMeansError::InvalidConfig(format!("invalid spread {}: {}", spread, e)))?;

    let per_cluster = n / clusters;
    let mut data = Array2::zeros((per_cluster * clusters, 2));

    for blob in 0..clusters {
        let center_x = rng.gen::<f64>() * extent;
        let center_y = rng.gen::<f64>() * extent;

        for i in 0..per_cluster {
            let row = blob * per_cluster + i;
            data[[row, 0]] = center_x + noise.sample(rng);
            data[[row, 1]] = center_y + noise.sample(rng);
        }
    }

    Ok(Dataset::from_array(data))
}

/// Generate the full set of chart datasets described by `config`.
///
/// The blob count of each dataset is drawn uniformly from
/// `[min_clusters, max_clusters]`.
pub fn generate_datasets<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    rng: &mut R,
) -> Result<Vec<Dataset>, KMeansError> {
    config.validate()?;

    (0..config.num_datasets)
        .map(|index| {
            let clusters = rng.gen_range(config.min_clusters..=config.max_clusters);
            debug!(index, clusters, "generating dataset");
            generate(
                config.points_per_dataset,
                clusters,
                config.spread,
                config.extent,
                rng,
            )
        })
        .collect()
}
