//! Loss - Classification Criterion
//!
//! Fused cross-entropy over logits: log-softmax followed by negative
//! log-likelihood, returning both the mean loss and its gradient with
//! respect to the logits in one pass.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

// =============================================================================
// Cross-Entropy
// =============================================================================

/// Computes mean cross-entropy loss and its logit gradient.
///
/// `logits` is row-major `[batch, classes]`, `targets` holds one class
/// index per row. The gradient is `(softmax - onehot) / batch`, matching
/// the mean reduction of the loss.
#[must_use]
pub fn cross_entropy(logits: &[f32], targets: &[usize], classes: usize) -> (f32, Vec<f32>) {
    let batch = targets.len();
    debug_assert_eq!(logits.len(), batch * classes);

    let mut loss = 0.0;
    let mut grad = vec![0.0; logits.len()];
    for (b, &target) in targets.iter().enumerate() {
        let row = &logits[b * classes..(b + 1) * classes];
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let sum_exp: f32 = row.iter().map(|&v| (v - max).exp()).sum();
        let log_sum = sum_exp.ln() + max;

        loss -= row[target] - log_sum;
        let grad_row = &mut grad[b * classes..(b + 1) * classes];
        for (c, slot) in grad_row.iter_mut().enumerate() {
            let softmax = (row[c] - log_sum).exp();
            let onehot = if c == target { 1.0 } else { 0.0 };
            *slot = (softmax - onehot) / batch as f32;
        }
    }

    (loss / batch as f32, grad)
}

/// Counts rows whose argmax logit matches the target class.
#[must_use]
pub fn correct_predictions(logits: &[f32], targets: &[usize], classes: usize) -> usize {
    targets
        .iter()
        .enumerate()
        .filter(|&(b, &target)| {
            let row = &logits[b * classes..(b + 1) * classes];
            let mut best = 0;
            for (c, &value) in row.iter().enumerate() {
                if value > row[best] {
                    best = c;
                }
            }
            best == target
        })
        .count()
}

// =============================================================================
// Tests
// =============================================================================
