use rand::Rng;

/// A dense affine map `y = Wx + b`, with gradient
/// accumulators for every parameter.
#[derive(Clone, Debug)]
pub(crate) struct Linear {
    inputs: usize,
    outputs: usize,
    // Row-major, one row per output.
    weights: Vec<f32>,
    // Empty when the map has no bias.
    bias: Vec<f32>,
    weight_grads: Vec<f32>,
    bias_grads: Vec<f32>,
}

impl Linear {
    /// Creates a map with parameters drawn uniformly
    /// from `±1/sqrt(inputs)` (all zero for zero inputs).
    pub(crate) fn new<R: Rng + ?Sized>(
        inputs: usize,
        outputs: usize,
        bias: bool,
        rng: &mut R,
    ) -> Linear {
        let bound = if inputs > 0 {
            1.0 / (inputs as f32).sqrt()
        } else {
            0.0
        };
        let mut sample = |n: usize| -> Vec<f32> {
            (0..n)
                .map(|_| {
                    if bound > 0.0 {
                        rng.gen_range(-bound..bound)
                    } else {
                        0.0
                    }
                })
                .collect()
        };
        let weights = sample(inputs * outputs);
        let bias = if bias { sample(outputs) } else { vec![] };
        Linear {
            inputs,
            outputs,
            weight_grads: vec![0.0; weights.len()],
            bias_grads: vec![0.0; bias.len()],
            weights,
            bias,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_parameters(inputs: usize, weights: Vec<f32>, bias: Vec<f32>) -> Linear {
        let outputs = if inputs > 0 {
            weights.len() / inputs
        } else {
            bias.len()
        };
        Linear {
            inputs,
            outputs,
            weight_grads: vec![0.0; weights.len()],
            bias_grads: vec![0.0; bias.len()],
            weights,
            bias,
        }
    }

    #[cfg(test)]
    pub(crate) fn inputs(&self) -> usize {
        self.inputs
    }

    pub(crate) fn parameter_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }

    /// Adds `Wx + b` to `output`.
    pub(crate) fn accumulate(&self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), self.inputs);
        debug_assert_eq!(output.len(), self.outputs);
        for (o, out) in output.iter_mut().enumerate() {
            let row = &self.weights[o * self.inputs..(o + 1) * self.inputs];
            *out += row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>();
            if let Some(b) = self.bias.get(o) {
                *out += b;
            }
        }
    }

    /// Accumulates parameter gradients for one sample, given
    /// the loss gradient at the map's output. If `input_grads`
    /// is passed, the gradient at the map's input is added to it.
    pub(crate) fn backward(
        &mut self,
        input: &[f32],
        output_grads: &[f32],
        input_grads: Option<&mut [f32]>,
    ) {
        for (o, g) in output_grads.iter().enumerate() {
            let row = &mut self.weight_grads[o * self.inputs..(o + 1) * self.inputs];
            for (wg, x) in row.iter_mut().zip(input) {
                *wg += g * x;
            }
            if let Some(bg) = self.bias_grads.get_mut(o) {
                *bg += g;
            }
        }
        if let Some(input_grads) = input_grads {
            for (o, g) in output_grads.iter().enumerate() {
                let row = &self.weights[o * self.inputs..(o + 1) * self.inputs];
                for (ig, w) in input_grads.iter_mut().zip(row) {
                    *ig += g * w;
                }
            }
        }
    }

    pub(crate) fn zero_grad(&mut self) {
        self.weight_grads.fill(0.0);
        self.bias_grads.fill(0.0);
    }

    /// Pairs every parameter with its accumulated gradient,
    /// weights first, then biases.
    pub(crate) fn parameters_mut(&mut self) -> impl Iterator<Item = (&mut f32, f32)> + '_ {
        self.weights
            .iter_mut()
            .zip(self.weight_grads.iter().copied())
            .chain(self.bias.iter_mut().zip(self.bias_grads.iter().copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn initialization_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let linear = Linear::new(16, 4, true, &mut rng);
        assert_eq!(linear.parameter_count(), 16 * 4 + 4);
        assert!(linear
            .weights
            .iter()
            .chain(&linear.bias)
            .all(|p| p.abs() <= 0.25));

        let unbiased = Linear::new(1, 4, false, &mut rng);
        assert_eq!(unbiased.parameter_count(), 4);
    }

    #[test]
    fn zero_input_map_is_its_bias() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let linear = Linear::new(0, 3, true, &mut rng);
        let mut out = vec![0.0; 3];
        linear.accumulate(&[], &mut out);
        assert_eq!(out, vec![0.0; 3]);
    }

    #[test]
    fn accumulate_and_backward() {
        // W = [[1, 2], [3, 4]], b = [0.5, -0.5]
        let mut linear = Linear::from_parameters(2, vec![1.0, 2.0, 3.0, 4.0], vec![0.5, -0.5]);
        let mut out = vec![1.0, 1.0];
        linear.accumulate(&[1.0, -1.0], &mut out);
        assert_eq!(out, vec![1.0 + (1.0 - 2.0) + 0.5, 1.0 + (3.0 - 4.0) - 0.5]);

        let mut input_grads = vec![0.0, 0.0];
        linear.backward(&[1.0, -1.0], &[1.0, 2.0], Some(&mut input_grads));
        assert_eq!(input_grads, vec![1.0 + 6.0, 2.0 + 8.0]);
        let grads: Vec<f32> = linear.parameters_mut().map(|(_, g)| g).collect();
        assert_eq!(grads, vec![1.0, -1.0, 2.0, -2.0, 1.0, 2.0]);

        linear.zero_grad();
        assert!(linear.parameters_mut().all(|(_, g)| g == 0.0));
    }
}
