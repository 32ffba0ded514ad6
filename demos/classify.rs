use rand::{rngs::StdRng, Rng, SeedableRng};
use vcodebook::*;

const CLASSES: [&str; 5] = ["airplanes", "cars", "dog", "faces", "keyboard"];

/// Descriptors for one fake image of class `c`: each class favours its own region of space.
fn image(c: usize, rng: &mut StdRng) -> Vec<Desc> {
    (0..60)
        .map(|_| {
            (0..16)
                .map(|j| {
                    let centre = if j % CLASSES.len() == c { 200. } else { 20. };
                    centre + rng.gen_range(-15. ..15.)
                })
                .collect()
        })
        .collect()
}

fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let mut rng = StdRng::seed_from_u64(7);

    let training: Vec<(usize, Vec<Desc>)> = (0..CLASSES.len())
        .flat_map(|c| (0..8).map(move |_| c))
        .map(|c| (c, image(c, &mut rng)))
        .collect();
    let test: Vec<(usize, Vec<Desc>)> = (0..CLASSES.len())
        .flat_map(|c| (0..2).map(move |_| c))
        .map(|c| (c, image(c, &mut rng)))
        .collect();

    // Create codebook from all training descriptors
    let all: Vec<Desc> = training.iter().flat_map(|(_, d)| d.iter().cloned()).collect();
    let config = Config::small()
        .with_distance(Distance::Sad)
        .with_execution(Execution::Parallel)
        .with_seed(3);
    let codebook = Codebook::create(&all, &config).unwrap();
    println!("Codebook: {:#?}", codebook);

    let hists: Vec<(&str, BoW)> = training
        .iter()
        .map(|(c, d)| (CLASSES[*c], codebook.transform(d).unwrap()))
        .collect();

    let mut correct = 0;
    for (c, d) in test.iter() {
        let bow = codebook.transform(d).unwrap();
        let predicted = knn::classify(&bow, &hists, 3, Distance::Euclidean).unwrap();
        println!("{:>10} -> {}", CLASSES[*c], predicted);
        if predicted == CLASSES[*c] {
            correct += 1;
        }
    }
    println!("\nAccuracy: {}/{}", correct, test.len());
}
