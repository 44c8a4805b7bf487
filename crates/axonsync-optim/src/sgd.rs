//! SGD Optimizer - Stochastic Gradient Descent
//!
//! Implements SGD with optional momentum, weight decay, dampening, and
//! Nesterov acceleration, updating parameter buffers in place.
//!
//! Update rule (with momentum):
//! ```text
//! v_t = momentum * v_{t-1} + (1 - dampening) * grad
//! param = param - lr * v_t
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use axonsync_nn::Parameter;

use crate::optimizer::{Optimizer, ParamState};

// =============================================================================
// SGD
// =============================================================================

/// Stochastic Gradient Descent optimizer.
pub struct SGD {
    params: Vec<Parameter>,
    lr: f32,
    momentum: f32,
    weight_decay: f32,
    dampening: f32,
    nesterov: bool,
    state: Vec<ParamState>,
}

impl SGD {
    /// Creates a new SGD optimizer with default settings.
    #[must_use]
    pub fn new(params: Vec<Parameter>, lr: f32) -> Self {
        let num_params = params.len();
        Self {
            params,
            lr,
            momentum: 0.0,
            weight_decay: 0.0,
            dampening: 0.0,
            nesterov: false,
            state: vec![ParamState::new(); num_params],
        }
    }

    /// Builder method to set momentum.
    #[must_use]
    pub fn momentum(mut self, momentum: f32) -> Self {
        self.momentum = momentum;
        self
    }

    /// Builder method to set weight decay.
    #[must_use]
    pub fn weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Builder method to set dampening.
    #[must_use]
    pub fn dampening(mut self, dampening: f32) -> Self {
        self.dampening = dampening;
        self
    }

    /// Builder method to enable Nesterov momentum.
    #[must_use]
    pub fn nesterov(mut self, nesterov: bool) -> Self {
        self.nesterov = nesterov;
        self
    }
}

impl Optimizer for SGD {
    fn step(&mut self) {
        for (param, state) in self.params.iter().zip(self.state.iter_mut()) {
            let mut grad = param.grad();

            if self.weight_decay != 0.0 {
                for (g, p) in grad.iter_mut().zip(param.data().iter()) {
                    *g += self.weight_decay * p;
                }
            }

            if self.momentum != 0.0 {
                if state.momentum_buffer.is_none() {
                    state.init_momentum(grad.len());
                    state
                        .momentum_buffer
                        .as_mut()
                        .unwrap()
                        .copy_from_slice(&grad);
                } else {
                    let buffer = state.momentum_buffer.as_mut().unwrap();
                    for (v, g) in buffer.iter_mut().zip(grad.iter()) {
                        *v = self.momentum * *v + (1.0 - self.dampening) * *g;
                    }
                }

                let buffer = state.momentum_buffer.as_ref().unwrap();
                if self.nesterov {
                    for (g, v) in grad.iter_mut().zip(buffer.iter()) {
                        *g += self.momentum * *v;
                    }
                } else {
                    grad.copy_from_slice(buffer);
                }
            }

            state.step += 1;
            let lr = self.lr;
            param.apply_update(|data, _| {
                for (d, g) in data.iter_mut().zip(grad.iter()) {
                    *d -= lr * g;
                }
            });
        }
    }

    fn zero_grad(&mut self) {
        for param in &self.params {
            param.zero_grad();
        }
    }

    fn get_lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn parameters(&self) -> &[Parameter] {
        &self.params
    }
}

// =============================================================================
// Tests
// =============================================================================
