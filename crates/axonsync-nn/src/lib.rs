//! axonsync-nn - Model Interface and Reference Layers
//!
//! The training loop treats the model as an external collaborator behind
//! the [`Model`] trait: forward to logits, backward into per-parameter
//! gradient buffers, and a stable parameter enumeration. This crate
//! provides that trait, a seeded two-layer [`Mlp`] with hand-written
//! gradients that implements it, and the shared [`Parameter`] storage
//! the optimizer and the process group both operate on.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// ML allowances
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::many_single_char_names)]

// =============================================================================
// Module Declarations
// =============================================================================

pub mod init;
pub mod linear;
pub mod loss;
pub mod mlp;
pub mod module;
pub mod parameter;

// =============================================================================
// Re-exports
// =============================================================================

pub use linear::Linear;
pub use loss::{correct_predictions, cross_entropy};
pub use mlp::Mlp;
pub use module::Model;
pub use parameter::Parameter;

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for model code.
pub mod prelude {
    pub use crate::{correct_predictions, cross_entropy, Linear, Mlp, Model, Parameter};
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_reduces_loss() {
        // A few hand-rolled SGD steps on a fixed batch should reduce the
        // loss monotonically enough to prove the gradients point downhill.
        let mut model = Mlp::new(4, 8, 2, 3);
        let inputs = [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
        ];
        let targets = [0usize, 1usize];

        let logits = model.forward(&inputs, 2);
        let (initial_loss, _) = cross_entropy(&logits, &targets, 2);

        let mut last = initial_loss;
        for _ in 0..50 {
            let logits = model.forward(&inputs, 2);
            let (loss, grad) = cross_entropy(&logits, &targets, 2);
            last = loss;

            model.zero_grad();
            model.backward(&grad, 2);
            for param in model.parameters() {
                param.apply_update(|data, grad| {
                    for (d, g) in data.iter_mut().zip(grad.iter()) {
                        *d -= 0.1 * g;
                    }
                });
            }
        }
        assert!(last < initial_loss);
    }
}
