use rand::{rngs::StdRng, Rng, SeedableRng};
use vcodebook::*;

/// Synthetic 128-d "SIFT" descriptors scattered around a few random centres.
fn synthetic_descriptors(n: usize, centres: usize, rng: &mut StdRng) -> Vec<Desc> {
    let centres: Vec<Desc> = (0..centres)
        .map(|_| (0..128).map(|_| rng.gen_range(0. ..255.)).collect())
        .collect();
    (0..n)
        .map(|i| {
            centres[i % centres.len()]
                .iter()
                .map(|c| c + rng.gen_range(-8. ..8.))
                .collect()
        })
        .collect()
}

fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let mut rng = StdRng::seed_from_u64(0);
    let features = synthetic_descriptors(5_000, 40, &mut rng);
    println!("Generated {} descriptors.", features.len());

    // Build a small codebook, checkpointing after every iteration
    let config = Config::small()
        .with_execution(Execution::Parallel)
        .with_max_iterations(30)
        .with_seed(1)
        .with_checkpoint("codebook_small.bin");
    let g = generate(&features, &config).unwrap();
    println!(
        "\nCodebook = {:#?}\niterations = {}, converged = {}",
        g.codebook, g.iterations, g.converged
    );

    // The last checkpoint is the final codebook
    let loaded = Codebook::load("codebook_small.bin").unwrap();
    assert_eq!(g.codebook, loaded);
}
