//! Model Trait - The Training Loop's Model Interface
//!
//! The contract the training loop drives: a forward pass producing
//! logits, a backward pass populating per-parameter gradient buffers, and
//! a stable parameter enumeration.
//!
//! The parameter order returned by `parameters` must be identical across
//! calls and across ranks: it is the order in which the training loop
//! issues collectives, and every rank must issue them in the same relative
//! order.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use crate::parameter::Parameter;

// =============================================================================
// Model Trait
// =============================================================================

/// Core trait for trainable models.
pub trait Model: Send {
    /// Performs the forward pass over a batch.
    ///
    /// `inputs` is row-major `[batch, features]`; the result is row-major
    /// `[batch, classes]` logits. Activations needed by the backward pass
    /// are cached internally.
    fn forward(&mut self, inputs: &[f32], batch: usize) -> Vec<f32>;

    /// Performs the backward pass, accumulating into the parameters'
    /// gradient buffers.
    ///
    /// `grad_output` is the loss gradient with respect to the logits of
    /// the most recent `forward` call.
    fn backward(&mut self, grad_output: &[f32], batch: usize);

    /// Returns the parameters in a stable, explicit enumeration order.
    fn parameters(&self) -> Vec<Parameter>;

    /// Zeros all parameter gradients.
    fn zero_grad(&self) {
        for param in self.parameters() {
            param.zero_grad();
        }
    }

    /// Returns the total number of trainable values.
    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(Parameter::numel).sum()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Scaler {
        weight: Parameter,
    }

    impl Model for Scaler {
        fn forward(&mut self, inputs: &[f32], _batch: usize) -> Vec<f32> {
            let w = self.weight.data()[0];
            inputs.iter().map(|x| x * w).collect()
        }

        fn backward(&mut self, grad_output: &[f32], _batch: usize) {
            self.weight.accumulate_grad(&[grad_output.iter().sum()]);
        }

        fn parameters(&self) -> Vec<Parameter> {
            vec![self.weight.clone()]
        }
    }

    #[test]
    fn test_default_zero_grad_and_count() {
        let mut model = Scaler {
            weight: Parameter::named("w", vec![2.0], &[1]),
        };
        assert_eq!(model.num_parameters(), 1);

        let out = model.forward(&[1.0, 2.0], 2);
        assert_eq!(out, vec![2.0, 4.0]);

        model.backward(&[1.0, 1.0], 2);
        assert_eq!(model.parameters()[0].grad(), vec![2.0]);

        model.zero_grad();
        assert_eq!(model.parameters()[0].grad(), vec![0.0]);
    }
}
