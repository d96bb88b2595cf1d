//! Command-line front end for the chart service.
//!
//! Each invocation starts a service with freshly generated data (or data
//! reproducible from `--seed`) and runs one request against it.
//!
//! Usage: `kmeans-charts [--seed <SEED>] aggregate --k 4`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kmeans_charts::{ChartService, DatasetStore, GeneratorConfig, Point, ServiceConfig};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "kmeans-charts")]
#[command(about = "Cluster a set of synthetic 2D charts with parallel k-means")]
struct Args {
    /// Seed for data generation and centroid initialization.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of chart datasets.
    #[arg(long, default_value = "9")]
    datasets: usize,

    /// Points requested per dataset.
    #[arg(long, default_value = "100")]
    points: usize,

    /// Iteration cap per clustering job.
    #[arg(long, default_value = "100")]
    max_iters: usize,

    /// Log every iteration and job.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cluster every dataset and print the JSON payload.
    Aggregate {
        /// Cluster count; clamped to [2, 6], defaults to 3 when unparseable.
        #[arg(short, long)]
        k: Option<String>,
    },
    /// Print the generated working datasets as JSON point lists.
    Generate,
    /// Print the health check response.
    Health,
    /// Route a raw request target, e.g. "/aggregate?k=5".
    Request {
        target: String,
        #[arg(short, long, default_value = "GET")]
        method: String,
    },
    /// Cluster every dataset and print a per-chart summary.
    Demo {
        #[arg(short, long)]
        k: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    let mut config = ServiceConfig::default()
        .with_max_iters(args.max_iters)
        .with_generator(
            GeneratorConfig::default()
                .with_num_datasets(args.datasets)
                .with_points_per_dataset(args.points),
        );
    config.seed = args.seed;

    let service = ChartService::new(config).context("failed to start chart service")?;

    match args.command {
        Command::Aggregate { k } => {
            let results = service.aggregate(k.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Generate => {
            println!("{}", serde_json::to_string_pretty(&working_datasets(&service))?);
        }
        Command::Health => println!("{}", service.health()),
        Command::Request { target, method } => {
            let response = service.handle(&method, &target);
            println!("HTTP {}", response.status);
            for (name, value) in &response.headers {
                println!("{}: {}", name, value);
            }
            println!();
            println!("{}", response.body);
        }
        Command::Demo { k } => {
            let results = service.aggregate(k.as_deref())?;

            println!(
                "{:<6} {:>4} {:>6} {:>11} {:>9}",
                "chart", "k", "points", "iterations", "delay_ms"
            );
            for (index, job) in results.iter().enumerate() {
                println!(
                    "{:<6} {:>4} {:>6} {:>11} {:>9}",
                    index,
                    job.result.k,
                    job.result.points.len(),
                    job.result.iterations,
                    job.delay
                );
            }
        }
    }

    Ok(())
}

/// The service's current datasets as plain point lists
fn working_datasets<S: DatasetStore>(service: &ChartService<S>) -> Vec<Vec<Point>> {
    service
        .store()
        .snapshot()
        .iter()
        .map(|dataset| dataset.points().collect())
        .collect()
}
