use serde::{Deserialize, Serialize};

const ETA_PLUS: f32 = 1.2;
const ETA_MINUS: f32 = 0.5;
const MIN_STEP: f32 = 1e-6;
const MAX_STEP: f32 = 50.0;

/// The part of a [`CasperNetwork`] an optimizer group updates.
///
/// [`CasperNetwork`]: crate::networks::CasperNetwork
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupTarget {
    /// The direct input-to-output map.
    InputToOutput,
    /// The output map of the hidden unit at this index.
    UnitOutput(usize),
    /// The hidden map of the hidden unit at this index.
    UnitHidden(usize),
}

/// A set of parameters trained by resilient backpropagation
/// at its own learning rate, which is the initial
/// per-parameter step size.
#[derive(Clone, Debug)]
pub(crate) struct ParamGroup {
    target: GroupTarget,
    learning_rate: f32,
    steps: Vec<f32>,
    previous_grads: Vec<f32>,
}

impl ParamGroup {
    pub(crate) fn new(target: GroupTarget, learning_rate: f32, parameters: usize) -> ParamGroup {
        ParamGroup {
            target,
            learning_rate,
            steps: vec![learning_rate; parameters],
            previous_grads: vec![0.0; parameters],
        }
    }

    pub(crate) fn target(&self) -> GroupTarget {
        self.target
    }

    pub(crate) fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Changes the group's rate. Step sizes restart
    /// from the new rate and the sign memory is cleared.
    pub(crate) fn set_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
        self.steps.fill(learning_rate);
        self.previous_grads.fill(0.0);
    }

    /// Applies one RPROP update to the passed
    /// `(parameter, gradient)` pairs.
    pub(crate) fn step<'a>(&mut self, parameters: impl Iterator<Item = (&'a mut f32, f32)>) {
        for ((parameter, grad), (step, previous)) in parameters.zip(
            self.steps
                .iter_mut()
                .zip(self.previous_grads.iter_mut()),
        ) {
            let mut grad = grad;
            let agreement = grad * *previous;
            if agreement > 0.0 {
                *step = (*step * ETA_PLUS).min(MAX_STEP);
            } else if agreement < 0.0 {
                *step = (*step * ETA_MINUS).max(MIN_STEP);
                grad = 0.0;
            }
            if grad > 0.0 {
                *parameter -= *step;
            } else if grad < 0.0 {
                *parameter += *step;
            }
            *previous = grad;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_once(group: &mut ParamGroup, parameter: &mut f32, grad: f32) {
        group.step(std::iter::once((parameter, grad)));
    }

    #[test]
    fn steps_against_gradient_sign() {
        let mut group = ParamGroup::new(GroupTarget::InputToOutput, 0.1, 1);
        let mut p = 1.0;
        step_once(&mut group, &mut p, 3.0);
        assert!((p - 0.9).abs() < 1e-6);
        // Same sign: step grows.
        step_once(&mut group, &mut p, 0.5);
        assert!((p - (0.9 - 0.12)).abs() < 1e-6);
        // Sign flip: step shrinks and the update is skipped.
        step_once(&mut group, &mut p, -1.0);
        assert!((p - 0.78).abs() < 1e-6);
        assert!((group.steps[0] - 0.06).abs() < 1e-6);
        // Sign memory was cleared, so the next step uses the shrunk size.
        step_once(&mut group, &mut p, -1.0);
        assert!((p - 0.84).abs() < 1e-6);
    }

    #[test]
    fn zero_gradient_leaves_parameter() {
        let mut group = ParamGroup::new(GroupTarget::UnitHidden(0), 0.1, 1);
        let mut p = 2.0;
        step_once(&mut group, &mut p, 0.0);
        assert_eq!(p, 2.0);
    }

    #[test]
    fn set_learning_rate_resets_steps() {
        let mut group = ParamGroup::new(GroupTarget::UnitOutput(3), 0.1, 2);
        let mut a = 0.0;
        let mut b = 0.0;
        group.step(vec![(&mut a, 1.0), (&mut b, 1.0)].into_iter());
        group.step(vec![(&mut a, 1.0), (&mut b, 1.0)].into_iter());
        group.set_learning_rate(0.001);
        assert_eq!(group.learning_rate(), 0.001);
        assert_eq!(group.steps, vec![0.001, 0.001]);
        assert_eq!(group.previous_grads, vec![0.0, 0.0]);
        assert_eq!(group.target(), GroupTarget::UnitOutput(3));
    }
}
