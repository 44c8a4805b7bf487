//! Linear - Fully-Connected Layer
//!
//! A fully-connected layer with explicit forward and backward passes. The
//! forward pass caches its input; the backward pass accumulates weight and
//! bias gradients into the parameter buffers and returns the gradient with
//! respect to the input.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use rand::rngs::StdRng;

use crate::init;
use crate::parameter::Parameter;

// =============================================================================
// Linear
// =============================================================================

/// A fully-connected layer: `y = x Wᵀ + b`.
///
/// Weight shape is `[out_features, in_features]` row-major, bias shape is
/// `[out_features]`.
pub struct Linear {
    weight: Parameter,
    bias: Parameter,
    in_features: usize,
    out_features: usize,
    cached_input: Vec<f32>,
}

impl Linear {
    /// Creates a layer with Xavier-uniform weights and zero bias.
    ///
    /// Parameter names are derived from the prefix (`{prefix}.weight`,
    /// `{prefix}.bias`) so the model's parameter enumeration is
    /// self-describing.
    #[must_use]
    pub fn new(in_features: usize, out_features: usize, prefix: &str, rng: &mut StdRng) -> Self {
        let weight = Parameter::named(
            format!("{prefix}.weight"),
            init::xavier_uniform(in_features, out_features, rng),
            &[out_features, in_features],
        );
        let bias = Parameter::named(
            format!("{prefix}.bias"),
            init::zeros(out_features),
            &[out_features],
        );
        Self {
            weight,
            bias,
            in_features,
            out_features,
            cached_input: Vec::new(),
        }
    }

    /// Returns the weight parameter.
    #[must_use]
    pub fn weight(&self) -> &Parameter {
        &self.weight
    }

    /// Returns the bias parameter.
    #[must_use]
    pub fn bias(&self) -> &Parameter {
        &self.bias
    }

    /// Forward pass over a `[batch, in_features]` input.
    pub fn forward(&mut self, input: &[f32], batch: usize) -> Vec<f32> {
        debug_assert_eq!(input.len(), batch * self.in_features);
        self.cached_input = input.to_vec();

        let weight = self.weight.data();
        let bias = self.bias.data();
        let mut output = vec![0.0; batch * self.out_features];
        for b in 0..batch {
            let row = &input[b * self.in_features..(b + 1) * self.in_features];
            for o in 0..self.out_features {
                let w_row = &weight[o * self.in_features..(o + 1) * self.in_features];
                let mut acc = bias[o];
                for (x, w) in row.iter().zip(w_row.iter()) {
                    acc += x * w;
                }
                output[b * self.out_features + o] = acc;
            }
        }
        output
    }

    /// Backward pass: accumulates parameter gradients and returns the
    /// gradient with respect to the cached input.
    pub fn backward(&mut self, grad_output: &[f32], batch: usize) -> Vec<f32> {
        debug_assert_eq!(grad_output.len(), batch * self.out_features);
        let input = &self.cached_input;
        let weight = self.weight.data();

        let mut grad_weight = vec![0.0; self.out_features * self.in_features];
        let mut grad_bias = vec![0.0; self.out_features];
        let mut grad_input = vec![0.0; batch * self.in_features];

        for b in 0..batch {
            let x = &input[b * self.in_features..(b + 1) * self.in_features];
            let g = &grad_output[b * self.out_features..(b + 1) * self.out_features];
            for o in 0..self.out_features {
                grad_bias[o] += g[o];
                let gw_row = &mut grad_weight[o * self.in_features..(o + 1) * self.in_features];
                let w_row = &weight[o * self.in_features..(o + 1) * self.in_features];
                for i in 0..self.in_features {
                    gw_row[i] += g[o] * x[i];
                    grad_input[b * self.in_features + i] += g[o] * w_row[i];
                }
            }
        }

        self.weight.accumulate_grad(&grad_weight);
        self.bias.accumulate_grad(&grad_bias);
        grad_input
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn fixed_layer() -> Linear {
        let mut rng = StdRng::seed_from_u64(0);
        let mut layer = Linear::new(2, 2, "fc", &mut rng);
        // Overwrite with known values: W = [[1, 2], [3, 4]], b = [0.5, -0.5]
        layer.weight.apply_update(|data, _| {
            data.copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        });
        layer.bias.apply_update(|data, _| {
            data.copy_from_slice(&[0.5, -0.5]);
        });
        layer
    }

    #[test]
    fn test_forward_known_values() {
        let mut layer = fixed_layer();
        // x = [1, 1]: y0 = 1 + 2 + 0.5, y1 = 3 + 4 - 0.5
        let out = layer.forward(&[1.0, 1.0], 1);
        assert_eq!(out, vec![3.5, 6.5]);
    }

    #[test]
    fn test_backward_known_values() {
        let mut layer = fixed_layer();
        layer.forward(&[1.0, 2.0], 1);
        let grad_in = layer.backward(&[1.0, 1.0], 1);

        // dW = gᵀ x = [[1, 2], [1, 2]], db = [1, 1]
        assert_eq!(layer.weight().grad(), vec![1.0, 2.0, 1.0, 2.0]);
        assert_eq!(layer.bias().grad(), vec![1.0, 1.0]);
        // dx = g W = [1 + 3, 2 + 4]
        assert_eq!(grad_in, vec![4.0, 6.0]);
    }

    #[test]
    fn test_backward_accumulates_over_batch() {
        let mut layer = fixed_layer();
        layer.forward(&[1.0, 0.0, 0.0, 1.0], 2);
        layer.backward(&[1.0, 0.0, 0.0, 1.0], 2);
        // Row 0 contributes to output 0, row 1 to output 1.
        assert_eq!(layer.weight().grad(), vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(layer.bias().grad(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_parameter_names() {
        let mut rng = StdRng::seed_from_u64(0);
        let layer = Linear::new(3, 2, "fc1", &mut rng);
        assert_eq!(layer.weight().name(), "fc1.weight");
        assert_eq!(layer.bias().name(), "fc1.bias");
        assert_eq!(layer.weight().shape(), &[2, 3]);
    }
}
