//! Parameter - Learnable Parameter Storage
//!
//! A named, fixed-shape parameter whose data and gradient live behind
//! shared buffers. The optimizer updates the data in place, the model
//! accumulates into the gradient, and the process group reduces the
//! gradient in place during synchronization, all against one allocation.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use axonsync_core::{buffer_from_vec, zero_buffer, Buffer};

// =============================================================================
// Parameter
// =============================================================================

/// A learnable parameter of a model.
///
/// Cloning a `Parameter` yields another view of the same storage.
#[derive(Clone)]
pub struct Parameter {
    name: String,
    shape: Vec<usize>,
    data: Buffer,
    grad: Buffer,
}

impl Parameter {
    /// Creates a named parameter from initial values.
    ///
    /// The value count must match the shape's element count.
    #[must_use]
    pub fn named(name: impl Into<String>, values: Vec<f32>, shape: &[usize]) -> Self {
        let numel: usize = shape.iter().product();
        assert_eq!(
            values.len(),
            numel,
            "parameter values must match shape element count"
        );
        Self {
            name: name.into(),
            shape: shape.to_vec(),
            grad: zero_buffer(values.len()),
            data: buffer_from_vec(values),
        }
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the shape of the parameter.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Returns a copy of the parameter data.
    #[must_use]
    pub fn data(&self) -> Vec<f32> {
        self.data.lock().clone()
    }

    /// Returns a copy of the gradient.
    #[must_use]
    pub fn grad(&self) -> Vec<f32> {
        self.grad.lock().clone()
    }

    /// Returns the shared data buffer.
    #[must_use]
    pub fn data_buffer(&self) -> Buffer {
        Buffer::clone(&self.data)
    }

    /// Returns the shared gradient buffer.
    ///
    /// This is the buffer handed to the process group for reduction.
    #[must_use]
    pub fn grad_buffer(&self) -> Buffer {
        Buffer::clone(&self.grad)
    }

    /// Zeros the gradient in place.
    pub fn zero_grad(&self) {
        for value in self.grad.lock().iter_mut() {
            *value = 0.0;
        }
    }

    /// Accumulates a delta into the gradient.
    pub fn accumulate_grad(&self, delta: &[f32]) {
        let mut grad = self.grad.lock();
        debug_assert_eq!(grad.len(), delta.len());
        for (slot, &value) in grad.iter_mut().zip(delta.iter()) {
            *slot += value;
        }
    }

    /// Scales the gradient in place.
    ///
    /// Used by the averaging step to turn a reduced sum into a mean.
    pub fn scale_grad(&self, factor: f32) {
        for value in self.grad.lock().iter_mut() {
            *value *= factor;
        }
    }

    /// Applies a function to the data and gradient together.
    ///
    /// Used by optimizers to update weights in place.
    pub fn apply_update<F>(&self, f: F)
    where
        F: FnOnce(&mut [f32], &[f32]),
    {
        let mut data = self.data.lock();
        let grad = self.grad.lock();
        f(&mut data, &grad);
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_creation() {
        let param = Parameter::named("weight", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        assert_eq!(param.name(), "weight");
        assert_eq!(param.shape(), &[2, 3]);
        assert_eq!(param.numel(), 6);
        assert_eq!(param.grad(), vec![0.0; 6]);
    }

    #[test]
    #[should_panic(expected = "match shape")]
    fn test_parameter_shape_checked() {
        let _ = Parameter::named("bad", vec![1.0, 2.0], &[3]);
    }

    #[test]
    fn test_grad_accumulate_and_zero() {
        let param = Parameter::named("bias", vec![0.0; 3], &[3]);
        param.accumulate_grad(&[1.0, 2.0, 3.0]);
        param.accumulate_grad(&[1.0, 1.0, 1.0]);
        assert_eq!(param.grad(), vec![2.0, 3.0, 4.0]);

        param.zero_grad();
        assert_eq!(param.grad(), vec![0.0; 3]);
    }

    #[test]
    fn test_scale_grad() {
        let param = Parameter::named("bias", vec![0.0; 2], &[2]);
        param.accumulate_grad(&[4.0, 8.0]);
        param.scale_grad(0.25);
        assert_eq!(param.grad(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_apply_update() {
        let param = Parameter::named("w", vec![1.0, 1.0], &[2]);
        param.accumulate_grad(&[0.5, 0.25]);
        param.apply_update(|data, grad| {
            for (d, g) in data.iter_mut().zip(grad.iter()) {
                *d -= g;
            }
        });
        assert_eq!(param.data(), vec![0.5, 0.75]);
    }

    #[test]
    fn test_clone_shares_storage() {
        let param = Parameter::named("w", vec![0.0], &[1]);
        let alias = param.clone();
        alias.accumulate_grad(&[1.0]);
        assert_eq!(param.grad(), vec![1.0]);
    }
}
