//! Trainer - The Synchronous Distributed Training Loop
//!
//! Drives the per-step state machine on one rank:
//!
//! ```text
//! Fetch → Forward → Backward → Synchronize → Average → Optimize
//! ```
//!
//! Synchronize issues one all-reduce per parameter gradient, in the
//! model's fixed parameter enumeration order, and blocks until every work
//! handle resolves: a synchronization barrier across ranks at every
//! step. Average divides each successfully-reduced gradient by the world
//! size, so every rank's optimizer steps with the same mean gradient and
//! the replicas stay numerically consistent over time.
//!
//! A failed or timed-out collective is logged and that parameter keeps
//! its unaveraged gradient for the step; a per-parameter counter
//! escalates to a fatal error after too many consecutive failures, so
//! silent divergence cannot run unbounded.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::time::Duration;

use tracing::{info, warn};

use axonsync_collective::{ProcessGroup, ReduceOp, WorkHandle};
use axonsync_core::{Error, Result};
use axonsync_data::{Batch, DataLoader, Dataset, DistributedSampler, SequentialSampler};
use axonsync_nn::{correct_predictions, cross_entropy, Model};
use axonsync_optim::Optimizer;

// =============================================================================
// Train Settings
// =============================================================================

/// Configuration for a training run.
#[derive(Debug, Clone)]
pub struct TrainSettings {
    /// Number of training epochs.
    pub epochs: usize,
    /// Total batch size across the group; each rank trains on
    /// `batch_size / world_size` samples per step.
    pub batch_size: usize,
    /// Learning rate.
    pub learning_rate: f32,
    /// Seed shared by every rank for init and shuffling.
    pub seed: u64,
    /// Whether to reshuffle the training partition each epoch.
    pub shuffle: bool,
    /// Bound on waiting for one gradient synchronization.
    pub sync_timeout: Duration,
    /// Consecutive per-parameter synchronization failures tolerated
    /// before training aborts.
    pub failure_threshold: usize,
}

impl Default for TrainSettings {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 64,
            learning_rate: 1e-2,
            seed: 0,
            shuffle: true,
            sync_timeout: Duration::from_secs(30),
            failure_threshold: 5,
        }
    }
}

impl TrainSettings {
    /// Creates settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the number of epochs.
    #[must_use]
    pub fn epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Builder: set the total batch size.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Builder: set the learning rate.
    #[must_use]
    pub fn learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Builder: set the shared seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder: enable or disable per-epoch shuffling.
    #[must_use]
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Builder: set the synchronization wait bound.
    #[must_use]
    pub fn sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = timeout;
        self
    }

    /// Builder: set the consecutive-failure threshold.
    #[must_use]
    pub fn failure_threshold(mut self, threshold: usize) -> Self {
        self.failure_threshold = threshold;
        self
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Per-epoch training statistics for one rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochStats {
    /// Epoch number, 1-indexed.
    pub epoch: usize,
    /// Correct predictions on this rank's partition.
    pub correct: usize,
    /// Samples seen on this rank.
    pub seen: usize,
}

impl EpochStats {
    /// Returns the training accuracy as a fraction.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.seen == 0 {
            0.0
        } else {
            self.correct as f64 / self.seen as f64
        }
    }
}

/// Result of the rank-0 evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalReport {
    /// Correct predictions over the held-out set.
    pub correct: usize,
    /// Size of the held-out set.
    pub total: usize,
}

impl EvalReport {
    /// Returns the test accuracy as a fraction.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

// =============================================================================
// Failure Tracking
// =============================================================================

/// Tracks consecutive synchronization failures per parameter.
struct FailureTracker {
    threshold: usize,
    consecutive: Vec<usize>,
}

impl FailureTracker {
    fn new(num_params: usize, threshold: usize) -> Self {
        Self {
            threshold,
            consecutive: vec![0; num_params],
        }
    }

    fn record_success(&mut self, index: usize) {
        self.consecutive[index] = 0;
    }

    fn record_failure(&mut self, index: usize, name: &str) -> Result<()> {
        self.consecutive[index] += 1;
        if self.consecutive[index] >= self.threshold {
            return Err(Error::transport(format!(
                "gradient for `{name}` failed {} consecutive synchronizations",
                self.consecutive[index]
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Trainer
// =============================================================================

/// The per-rank training driver.
///
/// Owns the model, the optimizer, and the process group for the lifetime
/// of the run. All cross-rank interaction goes through the group's
/// all-reduce; parameters and optimizer state are never observed by other
/// ranks directly.
pub struct Trainer<M: Model, O: Optimizer> {
    model: M,
    optimizer: O,
    group: ProcessGroup,
    settings: TrainSettings,
    failures: FailureTracker,
}

impl<M: Model, O: Optimizer> Trainer<M, O> {
    /// Creates a trainer.
    #[must_use]
    pub fn new(model: M, optimizer: O, group: ProcessGroup, settings: TrainSettings) -> Self {
        let num_params = model.parameters().len();
        let threshold = settings.failure_threshold;
        Self {
            model,
            optimizer,
            group,
            settings,
            failures: FailureTracker::new(num_params, threshold),
        }
    }

    /// Returns the per-rank batch size.
    #[must_use]
    pub fn per_rank_batch(&self) -> usize {
        (self.settings.batch_size / self.group.world_size()).max(1)
    }

    /// Returns a reference to the model.
    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Returns a reference to the process group.
    #[must_use]
    pub fn group(&self) -> &ProcessGroup {
        &self.group
    }

    /// Trains for the configured number of epochs over this rank's
    /// partition of the dataset.
    pub fn fit<D>(&mut self, dataset: &D) -> Result<Vec<EpochStats>>
    where
        D: Dataset<Item = (Vec<f32>, usize)>,
    {
        let mut sampler = DistributedSampler::new(
            dataset.len(),
            self.group.world_size(),
            self.group.rank(),
            self.settings.shuffle,
            self.settings.seed,
        )?;

        let mut stats = Vec::with_capacity(self.settings.epochs);
        for epoch in 0..self.settings.epochs {
            sampler.set_epoch(epoch as u64);
            let loader = DataLoader::new(dataset, &sampler, self.per_rank_batch());

            let mut correct = 0;
            let mut seen = 0;
            for batch in loader.iter() {
                let logits = self.step(&batch)?;
                let classes = logits.len() / batch.len();
                correct += correct_predictions(&logits, &batch.targets, classes);
                seen += batch.len();
            }

            let epoch_stats = EpochStats {
                epoch: epoch + 1,
                correct,
                seen,
            };
            info!(
                rank = self.group.rank(),
                epoch = epoch_stats.epoch,
                accuracy = %format!("{:.2}%", 100.0 * epoch_stats.accuracy()),
                "training epoch complete"
            );
            stats.push(epoch_stats);
        }
        Ok(stats)
    }

    /// Runs one training step and returns the logits for accuracy
    /// accounting.
    pub fn step(&mut self, batch: &Batch) -> Result<Vec<f32>> {
        self.model.zero_grad();
        let logits = self.model.forward(&batch.inputs, batch.len());
        let classes = logits.len() / batch.len();
        let (_, grad_logits) = cross_entropy(&logits, &batch.targets, classes);
        self.model.backward(&grad_logits, batch.len());
        self.synchronize()?;
        self.optimizer.step();
        Ok(logits)
    }

    /// The synchronization barrier: one all-reduce per parameter gradient
    /// in enumeration order, then averaging.
    fn synchronize(&mut self) -> Result<()> {
        let params = self.model.parameters();
        let handles: Vec<WorkHandle> = params
            .iter()
            .map(|param| self.group.all_reduce(param.grad_buffer(), ReduceOp::Sum))
            .collect();

        let world = self.group.world_size() as f32;
        for (index, (param, handle)) in params.iter().zip(handles.iter()).enumerate() {
            match handle.wait(self.settings.sync_timeout) {
                Ok(()) => {
                    param.scale_grad(1.0 / world);
                    self.failures.record_success(index);
                }
                Err(error @ Error::ShapeMismatch { .. }) => {
                    // A mismatched sum corrupts every rank; never tolerated.
                    return Err(error);
                }
                Err(error) => {
                    warn!(
                        rank = self.group.rank(),
                        parameter = param.name(),
                        %error,
                        "gradient synchronization failed; stepping with unaveraged gradient"
                    );
                    self.failures.record_failure(index, param.name())?;
                }
            }
        }
        Ok(())
    }

    /// Forward-only evaluation over the full held-out set.
    ///
    /// Only rank 0 evaluates; every other rank returns `None`. No
    /// collective is issued here, so the other ranks are free to exit.
    pub fn evaluate<D>(&mut self, dataset: &D) -> Result<Option<EvalReport>>
    where
        D: Dataset<Item = (Vec<f32>, usize)>,
    {
        if !self.group.is_main() {
            return Ok(None);
        }

        let sampler = SequentialSampler::new(dataset.len());
        let loader = DataLoader::new(dataset, &sampler, self.settings.batch_size.max(1));

        let mut correct = 0;
        for batch in loader.iter() {
            let logits = self.model.forward(&batch.inputs, batch.len());
            let classes = logits.len() / batch.len();
            let (loss, _) = cross_entropy(&logits, &batch.targets, classes);
            info!(loss = %format!("{loss:.4}"), "test batch loss");
            correct += correct_predictions(&logits, &batch.targets, classes);
        }

        let report = EvalReport {
            correct,
            total: dataset.len(),
        };
        info!(
            correct = report.correct,
            total = report.total,
            accuracy = %format!("{:.2}%", 100.0 * report.accuracy()),
            "evaluation complete"
        );
        Ok(Some(report))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axonsync_collective::LocalBackend;
    use axonsync_data::SyntheticClassification;
    use axonsync_nn::Mlp;
    use axonsync_optim::SGD;

    fn single_rank_trainer(settings: TrainSettings) -> Trainer<Mlp, SGD> {
        let model = Mlp::new(8, 16, 4, settings.seed);
        let optimizer = SGD::new(model.parameters(), settings.learning_rate);
        let group = ProcessGroup::with_backend(Box::new(LocalBackend::single()));
        Trainer::new(model, optimizer, group, settings)
    }

    #[test]
    fn test_settings_builder() {
        let settings = TrainSettings::new()
            .epochs(3)
            .batch_size(32)
            .learning_rate(0.1)
            .seed(9)
            .shuffle(false)
            .failure_threshold(2);
        assert_eq!(settings.epochs, 3);
        assert_eq!(settings.batch_size, 32);
        assert!(!settings.shuffle);
        assert_eq!(settings.failure_threshold, 2);
    }

    #[test]
    fn test_single_rank_fit_improves_accuracy() {
        let settings = TrainSettings::new().epochs(8).batch_size(16).learning_rate(0.1);
        let mut trainer = single_rank_trainer(settings);
        let dataset = SyntheticClassification::generate(256, 8, 4, 0);

        let stats = trainer.fit(&dataset).unwrap();
        assert_eq!(stats.len(), 8);
        for epoch_stats in &stats {
            assert_eq!(epoch_stats.seen, 256);
        }
        assert!(stats.last().unwrap().accuracy() > stats.first().unwrap().accuracy());
    }

    #[test]
    fn test_rank_zero_evaluates() {
        let settings = TrainSettings::new().epochs(1).batch_size(16);
        let mut trainer = single_rank_trainer(settings);
        let train = SyntheticClassification::generate(64, 8, 4, 0);
        let test = SyntheticClassification::generate(32, 8, 4, 1);

        trainer.fit(&train).unwrap();
        let report = trainer.evaluate(&test).unwrap().unwrap();
        assert_eq!(report.total, 32);
        assert!(report.correct <= 32);
    }

    #[test]
    fn test_epoch_stats_accuracy() {
        let stats = EpochStats {
            epoch: 1,
            correct: 75,
            seen: 100,
        };
        assert!((stats.accuracy() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_failure_tracker_escalates() {
        let mut tracker = FailureTracker::new(2, 3);
        tracker.record_failure(0, "fc1.weight").unwrap();
        tracker.record_failure(0, "fc1.weight").unwrap();
        assert!(tracker.record_failure(0, "fc1.weight").is_err());
    }

    #[test]
    fn test_failure_tracker_resets_on_success() {
        let mut tracker = FailureTracker::new(1, 2);
        tracker.record_failure(0, "p").unwrap();
        tracker.record_success(0);
        tracker.record_failure(0, "p").unwrap();
        tracker.record_success(0);
        assert_eq!(tracker.consecutive[0], 0);
    }
}
