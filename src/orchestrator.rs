//! Runs one k-means job per dataset in parallel and joins the results.

use crate::algorithm::cluster;
use crate::config::KMeansConfig;
use crate::error::KMeansError;
use crate::kmeans::check_dataset_size;
use crate::types::{ClusterResult, Dataset, JobResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, info};

/// Iteration cap applied to every clustering job.
pub const DEFAULT_MAX_ITERS: usize = 100;

/// Fans a batch of datasets out to the rayon pool, one k-means job each.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    max_iters: usize,
    tol: f64,
    source: String,
}

impl Orchestrator {
    /// Create an orchestrator that labels every result with `source`.
    ///
    /// Jobs use [`DEFAULT_MAX_ITERS`] and a convergence threshold of `1e-3`.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            max_iters: DEFAULT_MAX_ITERS,
            tol: 1e-3,
            source: source.into(),
        }
    }

    /// Set the iteration cap for every job
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the per-axis convergence threshold for every job
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Label reported as `source` on each [`JobResult`]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Cluster every dataset with the same `k`.
    ///
    /// One seed per job is drawn from `rng` before anything runs, so a seeded
    /// `rng` gives the same output regardless of thread scheduling. The
    /// returned vector is index-aligned with `datasets`.
    ///
    /// # Errors
    ///
    /// Fails before launching any job if `k` is 0, the iteration cap or
    /// threshold is invalid, or any dataset holds fewer than `k` points.
    /// Fails after joining all jobs if one of them panicked.
    pub fn run_all<R: Rng + ?Sized>(
        &self,
        datasets: Vec<Dataset>,
        k: usize,
        rng: &mut R,
    ) -> Result<Vec<JobResult>, KMeansError> {
        KMeansConfig::new(k)
            .with_max_iters(self.max_iters)
            .with_tol(self.tol)
            .validate()?;
        for (index, dataset) in datasets.iter().enumerate() {
            check_dataset_size(dataset, k).map_err(|e| match e {
                KMeansError::InsufficientData(msg) => {
                    KMeansError::InsufficientData(format!("dataset {}: {}", index, msg))
                }
                other => other,
            })?;
        }

        let seeds: Vec<u64> = (0..datasets.len()).map(|_| rng.gen()).collect();
        let (max_iters, tol) = (self.max_iters, self.tol);

        self.run_jobs(datasets, |index, dataset| {
            let mut job_rng = ChaCha8Rng::seed_from_u64(seeds[index]);
            let output = cluster(dataset, k, max_iters, tol, &mut job_rng);
            ClusterResult {
                k,
                iterations: output.iterations,
                points: output.points,
            }
        })
    }

    /// Run `job` once per dataset on the rayon pool and wait for all of them.
    ///
    /// Each job is timed individually and writes into the slot matching its
    /// dataset index. A panicking job does not abort the others; the first
    /// panic by index is reported once every job has finished.
    pub fn run_jobs<F>(
        &self,
        datasets: Vec<Dataset>,
        job: F,
    ) -> Result<Vec<JobResult>, KMeansError>
    where
        F: Fn(usize, &Dataset) -> ClusterResult + Sync,
    {
        info!(jobs = datasets.len(), "starting clustering jobs");
        let batch_start = Instant::now();

        let mut slots: Vec<Result<JobResult, KMeansError>> = Vec::with_capacity(datasets.len());
        datasets
            .par_iter()
            .enumerate()
            .map(|(index, dataset)| -> Result<JobResult, KMeansError> {
                let start = Instant::now();
                let result = catch_unwind(AssertUnwindSafe(|| job(index, dataset)))
                    .map_err(|payload| KMeansError::JobPanicked {
                        index,
                        message: panic_message(payload.as_ref()),
                    })?;
                let delay = start.elapsed().as_millis() as u64;
                debug!(
                    index,
                    delay_ms = delay,
                    iterations = result.iterations,
                    "clustering job finished"
                );

                Ok(JobResult {
                    source: self.source.clone(),
                    delay,
                    result,
                })
            })
            .collect_into_vec(&mut slots);

        info!(
            jobs = slots.len(),
            elapsed_ms = batch_start.elapsed().as_millis() as u64,
            "all clustering jobs joined"
        );

        slots.into_iter().collect()
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_SOURCE_LABEL)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn tiny(value: f64) -> Dataset {
        Dataset::from_points(&[
            Point::new(value, value),
            Point::new(value + 1.0, value),
            Point::new(value + 50.0, value + 50.0),
        ])
    }

    #[test]
    fn test_run_all_empty_input() {
        let orchestrator = Orchestrator::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let results = orchestrator.run_all(Vec::new(), 3, &mut rng).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_run_all_rejects_zero_k() {
        let orchestrator = Orchestrator::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let result = orchestrator.run_all(vec![tiny(0.0)], 0, &mut rng);
        assert!(matches!(result, Err(KMeansError::InvalidK(_))));
    }

    #[test]
    fn test_run_all_rejects_zero_max_iters() {
        let orchestrator = Orchestrator::default().with_max_iters(0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let result = orchestrator.run_all(vec![tiny(0.0)], 2, &mut rng);
        match result {
            Err(KMeansError::InvalidConfig(msg)) => assert!(msg.contains("max_iters")),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_run_all_rejects_bad_tol() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        for tol in [-1.0, f64::NAN, f64::INFINITY] {
            let orchestrator = Orchestrator::default().with_tol(tol);
            let result = orchestrator.run_all(vec![tiny(0.0)], 2, &mut rng);
            assert!(matches!(result, Err(KMeansError::InvalidConfig(_))), "tol {}", tol);
        }
    }

    #[test]
    fn test_run_all_rejects_undersized_dataset() {
        let orchestrator = Orchestrator::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let result = orchestrator.run_all(vec![tiny(0.0), tiny(5.0)], 4, &mut rng);
        match result {
            Err(KMeansError::InsufficientData(msg)) => assert!(msg.starts_with("dataset 0")),
            other => panic!("expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn test_run_all_labels_source() {
        let orchestrator = Orchestrator::new("charts");
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let results = orchestrator
            .run_all(vec![tiny(0.0), tiny(10.0)], 2, &mut rng)
            .unwrap();

        assert_eq!(results.len(), 2);
        for job in &results {
            assert_eq!(job.source, "charts");
            assert_eq!(job.result.k, 2);
            assert_eq!(job.result.points.len(), 3);
        }
    }

    #[test]
    fn test_run_jobs_reports_panics() {
        let orchestrator = Orchestrator::default();

        let result = orchestrator.run_jobs(vec![tiny(0.0), tiny(1.0), tiny(2.0)], |index, _| {
            if index == 1 {
                panic!("job blew up");
            }
            ClusterResult {
                k: 1,
                iterations: 1,
                points: Vec::new(),
            }
        });

        match result {
            Err(KMeansError::JobPanicked { index, message }) => {
                assert_eq!(index, 1);
                assert_eq!(message, "job blew up");
            }
            other => panic!("expected JobPanicked, got {:?}", other),
        }
    }
}
