use super::casper::{mean_squared_error, CasperConfig, CasperNetwork, Forward};
use crate::evaluation::{ConfusionMatrix, Equilateral};

use log::debug;
use rand::Rng;

/// How well a network's outputs match a set of targets.
#[derive(Clone, Debug)]
pub struct Score {
    /// Mean squared error over every output coordinate.
    pub loss: f32,
    /// Percentage of samples whose output decodes to
    /// the target's class.
    pub correctness: f32,
    pub confusion: ConfusionMatrix,
}

/// Grows and trains a fresh network on `inputs` and `targets`
/// until its unit budget is exhausted, then freezes it and
/// scores it on the training data.
///
/// The input width is taken from the first sample and the
/// output width from the codebook.
///
/// # Examples
/// ```
/// use oxicasper::evaluation::Equilateral;
/// use oxicasper::networks::{train, CasperConfig};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let codebook = Equilateral::new(3, 0.1, 0.9).unwrap();
/// let inputs = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
/// let targets: Vec<Vec<f32>> = (0..3)
///     .map(|c| codebook.encode(c).unwrap().to_vec())
///     .collect();
/// let config = CasperConfig {
///     unit_budget: 1,
///     patience: 1.0,
///     lr_1: 0.2,
///     lr_2: 0.01,
///     lr_3: 0.001,
/// };
///
/// let (network, score) = train(&inputs, &targets, config, &codebook, &mut ChaCha8Rng::seed_from_u64(0));
/// assert!(network.is_evaluating());
/// assert_eq!(network.hidden_count(), 1);
/// assert!((0.0..=100.0).contains(&score.correctness));
/// ```
pub fn train<R: Rng + ?Sized>(
    inputs: &[Vec<f32>],
    targets: &[Vec<f32>],
    config: CasperConfig,
    codebook: &Equilateral,
    rng: &mut R,
) -> (CasperNetwork, Score) {
    let input_size = inputs.first().map_or(0, Vec::len);
    let mut network = CasperNetwork::new(input_size, codebook.code_width(), config, rng);
    fit(&mut network, inputs, targets);
    network.set_evaluating(true);
    let score = score(&network, inputs, targets, codebook);
    (network, score)
}

/// Runs the growing training loop until the network
/// signals exhaustion. Returns the number of passes.
pub fn fit(network: &mut CasperNetwork, inputs: &[Vec<f32>], targets: &[Vec<f32>]) -> usize {
    let mut passes = 0;
    while let Forward::Output(pass) = network.forward(inputs) {
        network.record_loss(pass.mean_squared_error(targets));
        network.zero_grad();
        network.backward(&pass, targets);
        network.step();
        passes += 1;
    }
    debug!(
        "trained {} units over {} passes, final loss {:?}",
        network.hidden_count(),
        passes,
        network.losses().last()
    );
    passes
}

/// Scores a network's predictions for `inputs` against `targets`.
pub fn score(
    network: &CasperNetwork,
    inputs: &[Vec<f32>],
    targets: &[Vec<f32>],
    codebook: &Equilateral,
) -> Score {
    let outputs = network.predict(inputs);
    let confusion = ConfusionMatrix::tally(codebook, targets, &outputs);
    Score {
        loss: mean_squared_error(&outputs, targets),
        correctness: confusion.correctness(),
        confusion,
    }
}
