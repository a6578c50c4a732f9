//! Basic example demonstrating bimodal-clust usage
//!
//! Run with: cargo run --example basic --release

use bimodal_clust::{BiModalClust, HybridBudget, SearchStrategy, VnsConfig};
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use std::time::Duration;

fn main() {
    println!("=== bimodal-clust example ===\n");

    // Generate synthetic data: 3 clusters in 2D for easy visualization
    let n_samples = 30_000;
    let n_features = 2;
    let n_clusters = 3;

    println!("Generating {} samples with {} features...", n_samples, n_features);

    let centers = [[-5.0, -5.0], [0.0, 5.0], [5.0, -5.0]];
    let noise = Array2::random((n_samples, n_features), Uniform::new(-1.0, 1.0));
    let data = Array2::from_shape_fn((n_samples, n_features), |(i, j)| {
        centers[i % n_clusters][j] + noise[[i, j]]
    });

    println!("True cluster centers:");
    for (i, center) in centers.iter().enumerate() {
        println!("  Cluster {}: ({:.2}, {:.2})", i, center[0], center[1]);
    }
    println!();

    // Cluster samples of 500 points, first competing then collaborating
    let config = VnsConfig::new(n_clusters)
        .with_sample_size(500)
        .with_p_max(2)
        .with_seed(42)
        .with_verbose(true);
    let budget = HybridBudget::new(
        100,
        100,
        Duration::from_secs(2),
        Duration::from_secs(2),
    );

    println!("Running hybrid VNS with k={}...\n", n_clusters);

    let mut model = BiModalClust::with_strategy(config, SearchStrategy::Hybrid(budget));
    let labels = model.fit_predict(&data.view()).expect("Clustering failed");

    let result = model.result().expect("Model was just fitted");
    println!("\nObjective on the full dataset: {:.4}", result.objective);
    println!(
        "Iterations: {} (best found at {} after {:.3}s)",
        result.n_iter,
        result.best_n_iter,
        result.best_time.as_secs_f64()
    );
    println!("Distance evaluations: {}", result.n_dists);

    println!("\nLearned centers:");
    let learned = result.centers.to_array();
    for i in 0..learned.nrows() {
        println!(
            "  Center {}: ({:.4}, {:.4})",
            i,
            learned[[i, 0]],
            learned[[i, 1]]
        );
    }
    println!();

    println!("Cluster distribution:");
    for (i, count) in result.cluster_sizes().iter().enumerate() {
        println!(
            "  Cluster {}: {} samples ({:.1}%)",
            i,
            count,
            (*count as f64 / n_samples as f64) * 100.0
        );
    }
    println!();

    println!("First 10 sample assignments:");
    for i in 0..10 {
        println!(
            "  Sample {} at ({:.2}, {:.2}) -> Cluster {}",
            i,
            data[[i, 0]],
            data[[i, 1]],
            labels[i]
        );
    }

    println!("\n=== Done! ===");
}
