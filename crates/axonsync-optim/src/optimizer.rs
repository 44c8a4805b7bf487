//! Optimizer Trait - Core Optimizer Interface
//!
//! Defines the trait that all optimizers implement. The training loop
//! treats the update rule as an opaque step function over the parameters
//! and their (already averaged) gradients.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use axonsync_nn::Parameter;

// =============================================================================
// Optimizer Trait
// =============================================================================

/// Trait for all optimizers.
///
/// Optimizers update model parameters in place based on their gradients.
pub trait Optimizer {
    /// Performs a single optimization step.
    fn step(&mut self);

    /// Zeros all parameter gradients.
    fn zero_grad(&mut self);

    /// Returns the current learning rate.
    fn get_lr(&self) -> f32;

    /// Sets the learning rate.
    fn set_lr(&mut self, lr: f32);

    /// Returns the parameters being optimized.
    fn parameters(&self) -> &[Parameter];

    /// Returns the number of parameters.
    fn num_parameters(&self) -> usize {
        self.parameters().len()
    }
}

// =============================================================================
// Parameter State
// =============================================================================

/// Per-parameter optimizer state.
#[derive(Debug, Clone, Default)]
pub struct ParamState {
    /// Momentum buffer, allocated lazily on first use.
    pub momentum_buffer: Option<Vec<f32>>,
    /// Step count.
    pub step: usize,
}

impl ParamState {
    /// Creates a new empty parameter state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes the momentum buffer with zeros.
    pub fn init_momentum(&mut self, size: usize) {
        self.momentum_buffer = Some(vec![0.0; size]);
    }
}

// =============================================================================
// Tests
// =============================================================================
