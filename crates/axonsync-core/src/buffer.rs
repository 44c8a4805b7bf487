//! Buffer - Shared Numeric Buffers
//!
//! The flat f32 buffer type passed into collective operations and mutated
//! in place. Gradients and parameters are stored behind the same type so
//! the optimizer, the model, and the process group's background worker all
//! operate on one allocation.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::sync::Arc;

use parking_lot::Mutex;

// =============================================================================
// Buffer Type
// =============================================================================

/// A shared, flat, fixed-shape buffer of f32 values.
///
/// Collective operations lock the buffer for the duration of the exchange
/// and overwrite its contents with the reduced result. Accesses are short
/// exclusive mutations, never held across a wait.
pub type Buffer = Arc<Mutex<Vec<f32>>>;

// =============================================================================
// Constructors
// =============================================================================

/// Creates a buffer from an existing vector.
#[must_use]
pub fn buffer_from_vec(data: Vec<f32>) -> Buffer {
    Arc::new(Mutex::new(data))
}

/// Creates a zero-filled buffer of the given length.
#[must_use]
pub fn zero_buffer(len: usize) -> Buffer {
    Arc::new(Mutex::new(vec![0.0; len]))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_from_vec() {
        let buf = buffer_from_vec(vec![1.0, 2.0, 3.0]);
        assert_eq!(*buf.lock(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_zero_buffer() {
        let buf = zero_buffer(4);
        assert_eq!(*buf.lock(), vec![0.0; 4]);
    }

    #[test]
    fn test_buffer_shared_mutation() {
        let buf = buffer_from_vec(vec![1.0, 1.0]);
        let alias = Arc::clone(&buf);
        for v in alias.lock().iter_mut() {
            *v *= 2.0;
        }
        assert_eq!(*buf.lock(), vec![2.0, 2.0]);
    }
}
