//! Command-line front end for BiModalClust
//!
//! Reads a dataset from a .npy file, clusters it with one of the three search
//! variants, and saves the centers and the labels of every point as .npy files.
//! Degenerate centers are written as rows of NaN.
//!
//! Usage: `bimodal-clust <input.npy> <centers.npy> <labels.npy> <seq|hybrid|inner> <k> <sample_size> <max_iter> <seed> [--normalize]`
//!
//! Set `RUST_LOG=bimodal_clust=debug` to follow every accepted improvement.

use bimodal_clust::{
    bimodal_clust, bimodal_clust_hybrid, bimodal_clust_inner, preprocess, HybridBudget,
    SearchBudget, VnsConfig,
};
use ndarray::Array2;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "<input.npy> <centers.npy> <labels.npy> <seq|hybrid|inner> <k> <sample_size> <max_iter> <seed> [--normalize]";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() != 9 && !(args.len() == 10 && args[9] == "--normalize") {
        eprintln!("Usage: {} {}", args[0], USAGE);
        std::process::exit(1);
    }

    let input_path = &args[1];
    let centers_path = &args[2];
    let labels_path = &args[3];
    let variant = args[4].as_str();
    let k: usize = args[5].parse()?;
    let sample_size: usize = args[6].parse()?;
    let max_iter: usize = args[7].parse()?;
    let seed: u64 = args[8].parse()?;
    let normalize = args.len() == 10;

    // Read input data
    let reader = BufReader::new(File::open(input_path)?);
    let mut data: Array2<f64> = Array2::read_npy(reader)?;

    eprintln!(
        "Loaded data: {} samples x {} features",
        data.nrows(),
        data.ncols()
    );

    if normalize {
        data = preprocess::normalize(&data.view());
    }

    let config = VnsConfig::new(k)
        .with_sample_size(sample_size)
        .with_seed(seed)
        .with_verbose(true);

    eprintln!(
        "Running {} search with k={}, sample_size={}, max_iter={}, seed={}",
        variant, k, sample_size, max_iter, seed
    );

    let start = Instant::now();
    let result = match variant {
        "seq" => bimodal_clust(&data.view(), &config, &SearchBudget::iterations(max_iter))?,
        "inner" => bimodal_clust_inner(&data.view(), &config, &SearchBudget::iterations(max_iter))?,
        "hybrid" => {
            // Split the iterations evenly between the two phases
            let half = (max_iter / 2).max(1);
            let budget = HybridBudget::new(
                half,
                half,
                Duration::from_secs(3600),
                Duration::from_secs(3600),
            );
            bimodal_clust_hybrid(&data.view(), &config, &budget)?
        }
        other => {
            let message = format!("unknown variant '{}', expected seq, hybrid or inner", other);
            return Err(message.into());
        }
    };

    eprintln!("Objective: {:.6}", result.objective);
    eprintln!(
        "Iterations: {} (best at {}, {:.2}s)",
        result.n_iter,
        result.best_n_iter,
        result.best_time.as_secs_f64()
    );
    eprintln!("Distance evaluations: {}", result.n_dists);
    eprintln!("Cluster sizes: {:?}", result.cluster_sizes());
    eprintln!("Total time: {:.2}s", start.elapsed().as_secs_f64());

    let writer = File::create(centers_path)?;
    result.centers.to_array().write_npy(writer)?;
    eprintln!("Saved centers to {}", centers_path);

    let writer = File::create(labels_path)?;
    result.assignment.write_npy(writer)?;
    eprintln!("Saved labels to {}", labels_path);

    Ok(())
}
