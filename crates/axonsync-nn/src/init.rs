//! Weight Initialization - Seeded Initialization Strategies
//!
//! All initializers draw from an explicit seeded generator. Distributed
//! data parallelism requires every rank to construct bit-identical initial
//! parameters from a shared seed before any divergence begins, so nothing
//! here touches the thread-local generator.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use rand::rngs::StdRng;
use rand::Rng;

// =============================================================================
// Basic Initializers
// =============================================================================

/// Creates a zero-filled value vector.
#[must_use]
pub fn zeros(numel: usize) -> Vec<f32> {
    vec![0.0; numel]
}

/// Creates values drawn uniformly from `[low, high)`.
#[must_use]
pub fn uniform_range(numel: usize, low: f32, high: f32, rng: &mut StdRng) -> Vec<f32> {
    (0..numel).map(|_| rng.gen_range(low..high)).collect()
}

// =============================================================================
// Xavier/Glorot Initialization
// =============================================================================

/// Xavier uniform initialization for a `[fan_out, fan_in]` weight matrix.
///
/// Samples from `U(-a, a)` where `a = sqrt(6 / (fan_in + fan_out))`.
#[must_use]
pub fn xavier_uniform(fan_in: usize, fan_out: usize, rng: &mut StdRng) -> Vec<f32> {
    let a = (6.0 / (fan_in + fan_out) as f32).sqrt();
    uniform_range(fan_in * fan_out, -a, a, rng)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_zeros() {
        assert_eq!(zeros(3), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_uniform_range_bounds() {
        let mut rng = StdRng::seed_from_u64(0);
        let values = uniform_range(1000, -0.25, 0.25, &mut rng);
        assert!(values.iter().all(|v| (-0.25..0.25).contains(v)));
    }

    #[test]
    fn test_same_seed_same_values() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(
            xavier_uniform(8, 4, &mut a),
            xavier_uniform(8, 4, &mut b)
        );
    }

    #[test]
    fn test_xavier_bound() {
        let mut rng = StdRng::seed_from_u64(1);
        let bound = (6.0f32 / 12.0).sqrt();
        let values = xavier_uniform(8, 4, &mut rng);
        assert_eq!(values.len(), 32);
        assert!(values.iter().all(|v| v.abs() <= bound));
    }
}
