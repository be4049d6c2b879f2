use super::linear::Linear;
use super::rprop::{GroupTarget, ParamGroup};

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Passes a new unit is always given before
/// convergence is checked.
const MIN_UNIT_PASSES: f32 = 15.0;
/// Passes after which a unit is replaced regardless
/// of its convergence.
const MAX_UNIT_PASSES: usize = 100;
/// Relative RMS loss decrease between the last two
/// passes that requests a new unit.
const RMS_DECREASE_THRESHOLD: f32 = 0.01;

/// Settings controlling how a [`CasperNetwork`] grows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CasperConfig {
    /// Maximum number of hidden units. Training ends when
    /// another unit is requested after this many are installed.
    pub unit_budget: usize,
    /// Extra passes per installed unit before
    /// convergence is checked.
    pub patience: f32,
    /// Rate of the newest unit's hidden map, and of the
    /// input-to-output map before any unit exists.
    pub lr_1: f32,
    /// Rate of the newest unit's output map.
    pub lr_2: f32,
    /// Rate every older group falls back to once
    /// a newer unit is installed.
    pub lr_3: f32,
}

impl CasperConfig {
    /// Returns a "zero-valued" configuration: no hidden
    /// units and null learning rates.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::networks::CasperConfig;
    ///
    /// let config = CasperConfig {
    ///     unit_budget: 3,
    ///     lr_1: 0.2,
    ///     ..CasperConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> CasperConfig {
        CasperConfig {
            unit_budget: 0,
            patience: 0.0,
            lr_1: 0.0,
            lr_2: 0.0,
            lr_3: 0.0,
        }
    }
}

/// The result of a training forward pass.
#[derive(Clone, Debug)]
pub enum Forward {
    /// The network's outputs, with the activations
    /// needed for backpropagation.
    Output(Pass),
    /// A new unit was requested but the unit budget is spent.
    /// Training must stop.
    Exhausted,
}

/// The activations of one forward pass over a batch.
#[derive(Clone, Debug)]
pub struct Pass {
    // Per sample: the inputs followed by every unit's output.
    augmented: Vec<Vec<f32>>,
    outputs: Vec<Vec<f32>>,
}

impl Pass {
    /// Returns the network's outputs, one row per sample.
    pub fn outputs(&self) -> &[Vec<f32>] {
        &self.outputs
    }

    /// Consumes the pass, returning its outputs.
    pub fn into_outputs(self) -> Vec<Vec<f32>> {
        self.outputs
    }

    /// Returns the mean squared error of the outputs
    /// against `targets`, over all coordinates.
    pub fn mean_squared_error(&self, targets: &[Vec<f32>]) -> f32 {
        mean_squared_error(&self.outputs, targets)
    }
}

/// Returns the mean of the squared coordinate-wise
/// differences between two batches.
pub fn mean_squared_error(outputs: &[Vec<f32>], targets: &[Vec<f32>]) -> f32 {
    let (sum, count) = outputs
        .iter()
        .zip(targets)
        .flat_map(|(o, t)| o.iter().zip(t))
        .fold((0.0, 0usize), |(sum, count), (o, t)| {
            (sum + (o - t) * (o - t), count + 1)
        });
    sum / count as f32
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// An installed hidden unit.
#[derive(Clone, Debug)]
struct HiddenUnit {
    // From the inputs and every earlier unit to this unit.
    to_hidden: Linear,
    // From this unit to the outputs, without bias.
    to_output: Linear,
}

/// A CasPer network: a direct input-to-output map plus
/// hidden units installed one at a time during training.
///
/// Each unit sees the inputs and every earlier unit. The
/// output is the sigmoid of the direct map plus every
/// unit's output contribution.
///
/// Parameters are trained in groups, each at its own rate:
/// the direct map is group 0, and every unit adds its output
/// map and then its hidden map as two new groups. Installing
/// a unit demotes the previous newest groups to `lr_3`.
///
/// # Examples
/// ```
/// use oxicasper::networks::{CasperConfig, CasperNetwork, Forward};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let config = CasperConfig {
///     unit_budget: 2,
///     patience: 1.0,
///     lr_1: 0.2,
///     lr_2: 0.005,
///     lr_3: 0.001,
/// };
/// let mut network = CasperNetwork::new(3, 2, config, &mut ChaCha8Rng::seed_from_u64(0));
/// let inputs = vec![vec![0.0, 0.5, 1.0]];
/// let targets = vec![vec![1.0, 0.0]];
///
/// while let Forward::Output(pass) = network.forward(&inputs) {
///     network.record_loss(pass.mean_squared_error(&targets));
///     network.zero_grad();
///     network.backward(&pass, &targets);
///     network.step();
/// }
/// assert_eq!(network.hidden_count(), 2);
/// assert_eq!(network.group_count(), 5);
/// ```
#[derive(Clone, Debug)]
pub struct CasperNetwork {
    input_size: usize,
    output_size: usize,
    config: CasperConfig,
    input_to_output: Linear,
    units: Vec<HiddenUnit>,
    groups: Vec<ParamGroup>,
    losses: Vec<f32>,
    passes_since_installation: usize,
    evaluating: bool,
    rng: ChaCha8Rng,
}

impl CasperNetwork {
    /// Creates a network with no hidden units, its direct map
    /// initialized from `rng`. Units installed later draw their
    /// parameters from a generator seeded here.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        config: CasperConfig,
        rng: &mut R,
    ) -> CasperNetwork {
        let input_to_output = Linear::new(input_size, output_size, true, rng);
        let groups = vec![ParamGroup::new(
            GroupTarget::InputToOutput,
            config.lr_1,
            input_to_output.parameter_count(),
        )];
        CasperNetwork {
            input_size,
            output_size,
            config,
            input_to_output,
            units: vec![],
            groups,
            losses: vec![],
            passes_since_installation: 0,
            evaluating: false,
            rng: ChaCha8Rng::seed_from_u64(rng.gen()),
        }
    }

    /// Runs the installation policy, installs a unit if
    /// requested, and propagates `inputs` through the network.
    ///
    /// In evaluation mode no unit is ever installed and the
    /// result is always an output.
    pub fn forward(&mut self, inputs: &[Vec<f32>]) -> Forward {
        if self.wants_unit() && !self.evaluating {
            if self.units.len() >= self.config.unit_budget {
                return Forward::Exhausted;
            }
            self.install_unit();
        }
        let pass = self.propagate(inputs);
        self.passes_since_installation += 1;
        Forward::Output(pass)
    }

    /// Propagates `inputs` without touching the network's state.
    pub fn predict(&self, inputs: &[Vec<f32>]) -> Vec<Vec<f32>> {
        self.propagate(inputs).into_outputs()
    }

    /// Whether the installation policy asks for a new unit.
    fn wants_unit(&self) -> bool {
        let hidden = self.units.len();
        if hidden == 0 || self.losses.len() < 2 {
            return true;
        }
        let passes = self.passes_since_installation;
        if (passes as f32) < MIN_UNIT_PASSES + self.config.patience * hidden as f32 {
            return false;
        }
        if passes > MAX_UNIT_PASSES {
            return true;
        }
        let rms_last = self.losses[self.losses.len() - 1].sqrt();
        let rms_previous = self.losses[self.losses.len() - 2].sqrt();
        (rms_previous - rms_last) / rms_previous >= RMS_DECREASE_THRESHOLD
    }

    fn install_unit(&mut self) {
        let hidden = self.units.len();
        debug!(
            "installing unit [{}/{}] after {} passes, loss {:?}",
            hidden + 1,
            self.config.unit_budget,
            self.passes_since_installation,
            self.losses.last()
        );
        let to_hidden = Linear::new(self.input_size + hidden, 1, true, &mut self.rng);
        let to_output = Linear::new(1, self.output_size, false, &mut self.rng);

        // The newest two groups, or the initial one.
        let newest = self.groups.len().saturating_sub(2);
        for group in &mut self.groups[newest..] {
            group.set_learning_rate(self.config.lr_3);
        }
        self.groups.push(ParamGroup::new(
            GroupTarget::UnitOutput(hidden),
            self.config.lr_2,
            to_output.parameter_count(),
        ));
        self.groups.push(ParamGroup::new(
            GroupTarget::UnitHidden(hidden),
            self.config.lr_1,
            to_hidden.parameter_count(),
        ));
        self.units.push(HiddenUnit {
            to_hidden,
            to_output,
        });
        self.passes_since_installation = 0;
    }

    fn propagate(&self, inputs: &[Vec<f32>]) -> Pass {
        let mut augmented = Vec::with_capacity(inputs.len());
        let mut outputs = Vec::with_capacity(inputs.len());
        for input in inputs {
            let mut activations = Vec::with_capacity(self.input_size + self.units.len());
            activations.extend_from_slice(&input[..self.input_size]);
            for unit in &self.units {
                let mut h = [0.0];
                unit.to_hidden.accumulate(&activations, &mut h);
                activations.push(h[0]);
            }

            let mut logits = vec![0.0; self.output_size];
            self.input_to_output
                .accumulate(&activations[..self.input_size], &mut logits);
            for (i, unit) in self.units.iter().enumerate() {
                let at = self.input_size + i;
                unit.to_output.accumulate(&activations[at..at + 1], &mut logits);
            }
            outputs.push(logits.into_iter().map(sigmoid).collect());
            augmented.push(activations);
        }
        Pass { augmented, outputs }
    }

    /// Accumulates the gradients of the mean squared error
    /// of `pass` against `targets` into every parameter.
    pub fn backward(&mut self, pass: &Pass, targets: &[Vec<f32>]) {
        let scale = 2.0 / (pass.outputs.len() * self.output_size) as f32;
        let units = self.units.len().min(
            pass.augmented
                .first()
                .map_or(0, |a| a.len() - self.input_size),
        );
        for ((activations, output), target) in pass.augmented.iter().zip(&pass.outputs).zip(targets)
        {
            let logit_grads: Vec<f32> = output
                .iter()
                .zip(target)
                .map(|(o, t)| scale * (o - t) * o * (1.0 - o))
                .collect();
            self.input_to_output
                .backward(&activations[..self.input_size], &logit_grads, None);

            let mut activation_grads = vec![0.0; self.input_size + units];
            // Later units feed on earlier ones, so walk backwards.
            for i in (0..units).rev() {
                let at = self.input_size + i;
                let unit = &mut self.units[i];
                unit.to_output.backward(
                    &activations[at..at + 1],
                    &logit_grads,
                    Some(&mut activation_grads[at..at + 1]),
                );
                let (earlier, this) = activation_grads.split_at_mut(at);
                unit.to_hidden
                    .backward(&activations[..at], &this[..1], Some(earlier));
            }
        }
    }

    /// Clears the gradients of every parameter group.
    pub fn zero_grad(&mut self) {
        self.input_to_output.zero_grad();
        for unit in &mut self.units {
            unit.to_hidden.zero_grad();
            unit.to_output.zero_grad();
        }
    }

    /// Updates every parameter group at its current rate.
    pub fn step(&mut self) {
        let CasperNetwork {
            groups,
            units,
            input_to_output,
            ..
        } = self;
        for group in groups.iter_mut() {
            let linear = match group.target() {
                GroupTarget::InputToOutput => &mut *input_to_output,
                GroupTarget::UnitOutput(i) => &mut units[i].to_output,
                GroupTarget::UnitHidden(i) => &mut units[i].to_hidden,
            };
            group.step(linear.parameters_mut());
        }
    }

    /// Appends a training loss to the history
    /// the installation policy reads.
    pub fn record_loss(&mut self, loss: f32) {
        self.losses.push(loss);
    }

    /// Switches evaluation mode, in which the
    /// network's structure is frozen.
    pub fn set_evaluating(&mut self, evaluating: bool) {
        self.evaluating = evaluating;
    }

    pub fn is_evaluating(&self) -> bool {
        self.evaluating
    }

    /// Returns the number of installed hidden units.
    pub fn hidden_count(&self) -> usize {
        self.units.len()
    }

    /// Returns the number of optimizer groups,
    /// which is `1 + 2 * hidden_count()`.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Returns every group's current learning rate, in group order.
    pub fn learning_rates(&self) -> Vec<f32> {
        self.groups.iter().map(|g| g.learning_rate()).collect()
    }

    /// Returns what every group updates, in group order.
    pub fn group_targets(&self) -> Vec<GroupTarget> {
        self.groups.iter().map(|g| g.target()).collect()
    }

    /// Returns the recorded training losses.
    pub fn losses(&self) -> &[f32] {
        &self.losses
    }

    /// Returns the number of forward passes since
    /// the last unit was installed.
    pub fn passes_since_installation(&self) -> usize {
        self.passes_since_installation
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn config(&self) -> &CasperConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(unit_budget: usize, patience: f32) -> CasperConfig {
        CasperConfig {
            unit_budget,
            patience,
            lr_1: 0.1,
            lr_2: 0.01,
            lr_3: 0.001,
        }
    }

    fn batch() -> Vec<Vec<f32>> {
        (0..3)
            .map(|s| (0..20).map(|f| ((s * 20 + f) as f32 * 0.37).sin()).collect())
            .collect()
    }

    /// Drives the network with a constant loss, so units are
    /// only ever forced in, and returns the pass index of
    /// every installation.
    fn installations_with_flat_loss(network: &mut CasperNetwork) -> Vec<usize> {
        let inputs = batch();
        let mut installed_at = vec![];
        let mut pass = 0;
        while let Forward::Output(_) = network.forward(&inputs) {
            if network.passes_since_installation() == 1 {
                installed_at.push(pass);
            }
            network.record_loss(0.25);
            pass += 1;
        }
        installed_at
    }

    #[test]
    fn zero_budget_is_a_direct_sigmoid_map() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut network = CasperNetwork::new(20, 4, config(0, 1.0), &mut rng);
        assert!(matches!(network.forward(&batch()), Forward::Exhausted));
        assert_eq!(network.hidden_count(), 0);
        assert_eq!(network.group_count(), 1);

        network.set_evaluating(true);
        let outputs = match network.forward(&batch()) {
            Forward::Output(pass) => pass.into_outputs(),
            Forward::Exhausted => panic!("evaluation mode never exhausts"),
        };
        assert_eq!(outputs.len(), 3);
        for (input, output) in batch().iter().zip(&outputs) {
            assert_eq!(output.len(), 4);
            let mut logits = vec![0.0; 4];
            network.input_to_output.accumulate(input, &mut logits);
            for (o, l) in output.iter().zip(logits) {
                assert!(*o > 0.0 && *o < 1.0);
                assert!((o - sigmoid(l)).abs() < 1e-6);
            }
        }
        assert_eq!(network.hidden_count(), 0);
    }

    #[test]
    fn first_passes_install_immediately() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut network = CasperNetwork::new(20, 4, config(5, 1.0), &mut rng);
        let inputs = batch();
        assert!(matches!(network.forward(&inputs), Forward::Output(_)));
        assert_eq!(network.hidden_count(), 1);
        network.record_loss(0.3);
        assert!(matches!(network.forward(&inputs), Forward::Output(_)));
        assert_eq!(network.hidden_count(), 2);
        network.record_loss(0.2);
        assert!(matches!(network.forward(&inputs), Forward::Output(_)));
        assert_eq!(network.hidden_count(), 2);
    }

    #[test]
    fn installs_exactly_the_budget() {
        for budget in 1..6 {
            let mut rng = ChaCha8Rng::seed_from_u64(budget as u64);
            let mut network = CasperNetwork::new(20, 4, config(budget, 2.0), &mut rng);
            let installed_at = installations_with_flat_loss(&mut network);
            assert_eq!(installed_at.len(), budget);
            assert_eq!(network.hidden_count(), budget);
            assert_eq!(network.group_count(), 1 + 2 * budget);
        }
    }

    #[test]
    fn installation_spacing_respects_patience() {
        let patience = 3.0;
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut network = CasperNetwork::new(20, 4, config(6, patience), &mut rng);
        let installed_at = installations_with_flat_loss(&mut network);
        assert_eq!(&installed_at[..2], &[0, 1]);
        for (hidden, pair) in installed_at.windows(2).enumerate().skip(1) {
            let gap = (pair[1] - pair[0]) as f32;
            let window = MIN_UNIT_PASSES + patience * (hidden + 1) as f32;
            // A flat loss never converges, so every later unit is forced.
            assert!(gap >= window);
            assert_eq!(pair[1] - pair[0], MAX_UNIT_PASSES + 1);
        }
    }

    #[test]
    fn long_patience_window_outlasts_pass_ceiling() {
        // 15 + 60 * 2 = 135 passes, beyond the 100-pass ceiling.
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        let mut network = CasperNetwork::new(20, 4, config(3, 60.0), &mut rng);
        let installed_at = installations_with_flat_loss(&mut network);
        assert_eq!(installed_at, vec![0, 1, 1 + 135]);
    }

    #[test]
    fn decreasing_loss_installs_after_patience_window() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut network = CasperNetwork::new(20, 4, config(3, 1.0), &mut rng);
        let inputs = batch();
        let mut loss = 1.0;
        let mut installed_at = vec![];
        let mut pass = 0;
        while let Forward::Output(_) = network.forward(&inputs) {
            if network.passes_since_installation() == 1 {
                installed_at.push(pass);
            }
            // A 5% loss decrease every pass.
            loss *= 0.95;
            network.record_loss(loss);
            pass += 1;
        }
        // Units 1 and 2 at passes 0 and 1, unit 3 once 15 + 1 * 2 passes have elapsed.
        assert_eq!(installed_at, vec![0, 1, 18]);
    }

    #[test]
    fn installation_demotes_newest_groups() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut network = CasperNetwork::new(20, 4, config(4, 1.0), &mut rng);
        assert_eq!(network.learning_rates(), vec![0.1]);

        let inputs = batch();
        let mut seen_units = 0;
        while let Forward::Output(_) = network.forward(&inputs) {
            if network.hidden_count() > seen_units {
                seen_units = network.hidden_count();
                let rates = network.learning_rates();
                assert_eq!(rates.len(), 1 + 2 * seen_units);
                // Everything but the newest unit trains at lr_3.
                assert!(rates[..rates.len() - 2].iter().all(|r| *r == 0.001));
                assert_eq!(&rates[rates.len() - 2..], &[0.01, 0.1]);
                assert_eq!(
                    &network.group_targets()[rates.len() - 2..],
                    &[
                        GroupTarget::UnitOutput(seen_units - 1),
                        GroupTarget::UnitHidden(seen_units - 1)
                    ]
                );
            }
            network.record_loss(0.25);
        }
        assert_eq!(seen_units, 4);
    }

    #[test]
    fn units_see_inputs_and_earlier_units() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut network = CasperNetwork::new(20, 4, config(3, 1.0), &mut rng);
        installations_with_flat_loss(&mut network);
        for (i, unit) in network.units.iter().enumerate() {
            assert_eq!(unit.to_hidden.inputs(), 20 + i);
            assert_eq!(unit.to_output.inputs(), 1);
        }
    }

    #[test]
    fn evaluation_mode_freezes_structure() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut network = CasperNetwork::new(20, 4, config(3, 1.0), &mut rng);
        network.set_evaluating(true);
        for _ in 0..10 {
            assert!(matches!(network.forward(&batch()), Forward::Output(_)));
        }
        assert_eq!(network.hidden_count(), 0);
        assert_eq!(network.predict(&batch()).len(), 3);
    }

    #[test]
    fn backward_matches_finite_differences() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mut network = CasperNetwork::new(3, 2, config(2, 1.0), &mut rng);
        let inputs = vec![vec![0.2, -0.4, 0.9], vec![-0.7, 0.1, 0.3]];
        let targets = vec![vec![0.9, 0.1], vec![0.2, 0.7]];
        // Install both units.
        for _ in 0..2 {
            network.forward(&inputs);
            network.record_loss(0.5);
        }
        assert_eq!(network.hidden_count(), 2);
        network.set_evaluating(true);

        let pass = match network.forward(&inputs) {
            Forward::Output(pass) => pass,
            Forward::Exhausted => unreachable!(),
        };
        network.zero_grad();
        network.backward(&pass, &targets);

        let loss_at = |network: &CasperNetwork| {
            mean_squared_error(&network.predict(&inputs), &targets)
        };
        let analytic: Vec<f32> = network.units[0]
            .to_hidden
            .clone()
            .parameters_mut()
            .map(|(_, g)| g)
            .collect();
        const EPS: f32 = 1e-2;
        for (k, grad) in analytic.iter().enumerate() {
            let mut plus = network.clone();
            *plus.units[0].to_hidden.parameters_mut().nth(k).unwrap().0 += EPS;
            let mut minus = network.clone();
            *minus.units[0].to_hidden.parameters_mut().nth(k).unwrap().0 -= EPS;
            let numeric = (loss_at(&plus) - loss_at(&minus)) / (2.0 * EPS);
            assert!(
                (numeric - grad).abs() < 1e-3,
                "parameter {}: numeric {} analytic {}",
                k,
                numeric,
                grad
            );
        }
    }

    #[test]
    fn training_reduces_loss() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let mut network = CasperNetwork::new(20, 4, config(3, 1.0), &mut rng);
        let inputs = batch();
        let targets = vec![
            vec![0.1, 0.9, 0.1, 0.9],
            vec![0.9, 0.1, 0.9, 0.1],
            vec![0.5, 0.5, 0.1, 0.9],
        ];
        while let Forward::Output(pass) = network.forward(&inputs) {
            network.record_loss(pass.mean_squared_error(&targets));
            network.zero_grad();
            network.backward(&pass, &targets);
            network.step();
        }
        let losses = network.losses();
        assert!(losses.iter().all(|l| l.is_finite()));
        assert!(losses.last().unwrap() < losses.first().unwrap());
    }
}
