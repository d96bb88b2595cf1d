//! # kmeans-charts
//!
//! Parallel k-means clustering over a fixed collection of independent 2D
//! datasets, one chart each.
//!
//! ## Features
//!
//! - **Lloyd's k-means**: random distinct-point initialization, nearest
//!   centroid assignment with lowest-index tie breaking, mean update with
//!   frozen empty clusters, per-axis convergence threshold
//! - **Parallel fan-out/join**: one job per dataset on the rayon pool, timed
//!   individually, results index-aligned with the input
//! - **Injectable randomness**: every random draw goes through a caller
//!   supplied `rand::Rng`, so seeded runs are reproducible
//! - **Chart service**: transport-agnostic `/aggregate`, `/generate` and
//!   `/health` handlers over a swappable working set
//!
//! ## Example
//!
//! ```rust
//! use kmeans_charts::{generate_datasets, GeneratorConfig, Orchestrator};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let datasets = generate_datasets(&GeneratorConfig::default(), &mut rng).unwrap();
//!
//! let results = Orchestrator::default().run_all(datasets, 3, &mut rng).unwrap();
//! assert_eq!(results.len(), 9);
//! assert!(results.iter().all(|job| job.result.iterations <= 100));
//! ```
//!
//! ## Serving charts
//!
//! ```rust
//! use kmeans_charts::{ChartService, ServiceConfig};
//!
//! let service = ChartService::new(ServiceConfig::default().with_seed(7)).unwrap();
//!
//! let response = service.handle("GET", "/aggregate?k=4");
//! assert_eq!(response.status, 200);
//! assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
//! ```

pub mod algorithm;
mod api;
mod config;
pub mod distance;
mod error;
mod generator;
mod kmeans;
mod orchestrator;
mod store;
mod types;

pub use api::{ChartService, Response};
pub use config::{GeneratorConfig, KMeansConfig, ServiceConfig, DEFAULT_SOURCE_LABEL};
pub use error::KMeansError;
pub use generator::{generate, generate_datasets};
pub use kmeans::KMeans;
pub use orchestrator::{Orchestrator, DEFAULT_MAX_ITERS};
pub use store::{DatasetStore, InMemoryStore};
pub use types::{ClusterResult, ClusteredPoint, Dataset, JobResult, Point};
